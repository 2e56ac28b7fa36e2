//! Archetype assignment and resistance

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use murmur_core::{
    Archetype, ConfigError, NetworkConfig, NodeIndex, ResistanceSpec, ResistanceValue,
};

/// Archetype of every node plus the reverse index
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    archetypes: Vec<Archetype>,
    distribution: BTreeMap<Archetype, f64>,
    indexes_by_type: BTreeMap<Archetype, Vec<NodeIndex>>,
}

impl Population {
    /// Every node in one archetype
    pub fn uniform(n: usize, archetype: Archetype) -> Self {
        Self::from_parts(vec![archetype; n], BTreeMap::from([(archetype, 1.0)]))
    }

    /// Rebuild from a per-node assignment and the distribution it was drawn from
    pub fn from_parts(archetypes: Vec<Archetype>, distribution: BTreeMap<Archetype, f64>) -> Self {
        let mut population = Self {
            archetypes,
            distribution,
            indexes_by_type: BTreeMap::new(),
        };
        population.reindex();
        population
    }

    /// Assign archetypes according to the configured distribution
    ///
    /// Each archetype gets `floor(p * n)` nodes; nodes left over after
    /// rounding go to the archetype with the fewest (ties favour the later
    /// tag in canonical order). The assignment is then shuffled. A missing or
    /// invalid distribution puts everyone in [`Archetype::R`].
    pub fn mix<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Self {
        let n = config.n;
        let distribution = match config.archetype_distribution() {
            Ok(Some(distribution)) => distribution,
            Ok(None) => return Self::uniform(n, Archetype::R),
            Err(e) => {
                warn!(error = %e, "invalid archetype distribution; assigning every node to R");
                return Self::uniform(n, Archetype::R);
            }
        };

        let mut archetypes = Vec::with_capacity(n);
        let mut smallest: Option<(Archetype, usize)> = None;
        for (&archetype, &proportion) in &distribution {
            let count = (proportion * n as f64).floor() as usize;
            if smallest.is_none_or(|(_, min)| count <= min) {
                smallest = Some((archetype, count));
            }
            archetypes.extend(std::iter::repeat_n(archetype, count));
        }
        archetypes.truncate(n);

        if let Some((filler, _)) = smallest
            && archetypes.len() < n
        {
            debug!(filler = %filler, missing = n - archetypes.len(), "filling rounding remainder");
            archetypes.resize(n, filler);
        }

        archetypes.shuffle(rng);
        Self::from_parts(archetypes, distribution)
    }

    fn reindex(&mut self) {
        self.indexes_by_type.clear();
        for (node, &archetype) in self.archetypes.iter().enumerate() {
            self.indexes_by_type.entry(archetype).or_default().push(node);
        }
    }

    pub fn archetype(&self, node: NodeIndex) -> Archetype {
        self.archetypes[node]
    }

    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub fn distribution(&self) -> &BTreeMap<Archetype, f64> {
        &self.distribution
    }

    pub fn indexes_by_type(&self) -> &BTreeMap<Archetype, Vec<NodeIndex>> {
        &self.indexes_by_type
    }

    /// Nodes of one archetype, in ascending order
    pub fn indexes(&self, archetype: Archetype) -> &[NodeIndex] {
        self.indexes_by_type
            .get(&archetype)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reassign one node, keeping the reverse index in step
    pub fn set_archetype(&mut self, node: NodeIndex, archetype: Archetype) {
        let previous = self.archetypes[node];
        if previous == archetype {
            return;
        }
        if let Some(nodes) = self.indexes_by_type.get_mut(&previous) {
            nodes.retain(|&other| other != node);
            if nodes.is_empty() {
                self.indexes_by_type.remove(&previous);
            }
        }
        let nodes = self.indexes_by_type.entry(archetype).or_default();
        let at = nodes.partition_point(|&other| other < node);
        nodes.insert(at, node);
        self.archetypes[node] = archetype;
    }
}

/// Check a fixed resistance value
pub fn check_resistance(target: impl Into<String>, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::ResistanceOutOfRange {
            target: target.into(),
            value,
        })
    }
}

/// Per-node resistance from the configured spec
///
/// Invalid entries are logged, returned, and skipped; affected nodes keep
/// resistance `0`.
pub fn assign_resistance<R: Rng + ?Sized>(
    population: &Population,
    spec: &ResistanceSpec,
    rng: &mut R,
) -> (Vec<f64>, Vec<ConfigError>) {
    let n = population.archetypes().len();
    let mut resistance = vec![0.0; n];
    let mut problems = Vec::new();

    match spec {
        ResistanceSpec::Uniform(ResistanceValue::Fixed(value)) => {
            match check_resistance("all", *value) {
                Ok(value) => resistance.fill(value),
                Err(e) => problems.push(e),
            }
        }
        ResistanceSpec::Uniform(ResistanceValue::Random) => {
            for slot in &mut resistance {
                *slot = rng.random::<f64>();
            }
        }
        ResistanceSpec::PerArchetype(entries) => {
            for (tag, value) in entries {
                let archetype = match tag.parse::<Archetype>() {
                    Ok(archetype) if population.distribution().contains_key(&archetype) => {
                        archetype
                    }
                    Ok(_) | Err(_) => {
                        problems.push(ConfigError::UnknownArchetype(tag.clone()));
                        continue;
                    }
                };
                match value {
                    ResistanceValue::Fixed(value) => match check_resistance(tag.as_str(), *value) {
                        Ok(value) => {
                            for &node in population.indexes(archetype) {
                                resistance[node] = value;
                            }
                        }
                        Err(e) => problems.push(e),
                    },
                    ResistanceValue::Random => {
                        for &node in population.indexes(archetype) {
                            resistance[node] = rng.random::<f64>();
                        }
                    }
                }
            }
        }
    }

    for problem in &problems {
        warn!(error = %problem, "skipping resistance entry");
    }
    (resistance, problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(n: usize, dist: &[(&str, f64)]) -> NetworkConfig {
        NetworkConfig {
            n,
            type_dist: Some(dist.iter().map(|(t, p)| (t.to_string(), *p)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_mix_without_distribution_is_all_r() {
        let mut rng = StdRng::seed_from_u64(0);
        let population = Population::mix(&NetworkConfig { n: 5, ..Default::default() }, &mut rng);
        assert!(population.archetypes().iter().all(|&a| a == Archetype::R));
        assert_eq!(population.indexes(Archetype::R), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_mix_fills_rounding_remainder() {
        let mut rng = StdRng::seed_from_u64(1);
        // floor(0.5 * 5) = 2 each; the leftover node goes to the later tag on a tie
        let population = Population::mix(&config(5, &[("R", 0.5), ("DA", 0.5)]), &mut rng);
        assert_eq!(population.archetypes().len(), 5);
        assert_eq!(population.indexes(Archetype::R).len(), 2);
        assert_eq!(population.indexes(Archetype::DA).len(), 3);
    }

    #[test]
    fn test_mix_remainder_goes_to_smallest_share() {
        let mut rng = StdRng::seed_from_u64(2);
        let population = Population::mix(
            &config(10, &[("R", 0.55), ("E", 0.25), ("SC", 0.2)]),
            &mut rng,
        );
        assert_eq!(population.indexes(Archetype::R).len(), 5);
        assert_eq!(population.indexes(Archetype::E).len(), 2);
        assert_eq!(population.indexes(Archetype::SC).len(), 3);
    }

    #[test]
    fn test_mix_invalid_distribution_falls_back() {
        let mut rng = StdRng::seed_from_u64(3);
        let population = Population::mix(&config(4, &[("R", 0.5), ("E", 0.1)]), &mut rng);
        assert_eq!(population.indexes(Archetype::R).len(), 4);
    }

    #[test]
    fn test_set_archetype_updates_index() {
        let mut population = Population::uniform(4, Archetype::R);
        population.set_archetype(2, Archetype::SR);
        assert_eq!(population.archetype(2), Archetype::SR);
        assert_eq!(population.indexes(Archetype::R), &[0, 1, 3]);
        assert_eq!(population.indexes(Archetype::SR), &[2]);

        population.set_archetype(2, Archetype::R);
        assert_eq!(population.indexes(Archetype::R), &[0, 1, 2, 3]);
        assert!(population.indexes(Archetype::SR).is_empty());
    }

    #[test]
    fn test_uniform_resistance() {
        let mut rng = StdRng::seed_from_u64(4);
        let population = Population::uniform(3, Archetype::R);
        let (resistance, problems) = assign_resistance(
            &population,
            &ResistanceSpec::Uniform(ResistanceValue::Fixed(0.4)),
            &mut rng,
        );
        assert_eq!(resistance, vec![0.4; 3]);
        assert!(problems.is_empty());

        let (resistance, problems) = assign_resistance(
            &population,
            &ResistanceSpec::Uniform(ResistanceValue::Fixed(1.5)),
            &mut rng,
        );
        assert_eq!(resistance, vec![0.0; 3]);
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn test_per_archetype_resistance_skips_bad_entries() {
        let mut rng = StdRng::seed_from_u64(5);
        let population = Population::from_parts(
            vec![Archetype::R, Archetype::DA, Archetype::R],
            BTreeMap::from([(Archetype::R, 0.5), (Archetype::DA, 0.5)]),
        );
        let spec = ResistanceSpec::PerArchetype(BTreeMap::from([
            ("R".to_string(), ResistanceValue::Fixed(0.3)),
            ("DA".to_string(), ResistanceValue::Random),
            ("E".to_string(), ResistanceValue::Fixed(0.9)), // Not in the distribution
            ("hom".to_string(), ResistanceValue::Fixed(0.9)),
        ]));
        let (resistance, problems) = assign_resistance(&population, &spec, &mut rng);

        assert_eq!(resistance[0], 0.3);
        assert_eq!(resistance[2], 0.3);
        assert!((0.0..1.0).contains(&resistance[1]));
        assert_eq!(problems.len(), 2);
    }
}
