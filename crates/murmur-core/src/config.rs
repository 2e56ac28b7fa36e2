//! Network configuration
//!
//! Supports configuration from:
//! - TOML config files
//! - Struct literals with `..Default::default()`
//!
//! Defaults describe an empty, undirected, one-dimensional
//! network with fully visible opinions and fixed unit weights.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::archetype::Archetype;
use crate::error::ConfigError;

/// Tolerance on archetype proportions summing to one
pub const PROPORTION_TOLERANCE: f64 = 1e-6;

/// Named topology families for the initial edge set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Empty,
    Complete,
    Cycle,
    Random,
    ScaleFree,
    SmallWorld,
    Star,
}

impl Topology {
    pub fn tag(self) -> &'static str {
        match self {
            Topology::Empty => "",
            Topology::Complete => "complete",
            Topology::Cycle => "cycle",
            Topology::Random => "random",
            Topology::ScaleFree => "scale free",
            Topology::SmallWorld => "small world",
            Topology::Star => "star",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Empty => f.write_str("empty"),
            other => f.write_str(other.tag()),
        }
    }
}

impl FromStr for Topology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "" | "empty" => Ok(Topology::Empty),
            "complete" => Ok(Topology::Complete),
            "cycle" => Ok(Topology::Cycle),
            "random" => Ok(Topology::Random),
            "scale free" => Ok(Topology::ScaleFree),
            "small world" => Ok(Topology::SmallWorld),
            "star" => Ok(Topology::Star),
            _ => Err(ConfigError::UnknownTopology(s.to_string())),
        }
    }
}

/// What a node initially perceives of a new neighbour's opinion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Every coordinate is revealed
    #[default]
    Visible,
    /// Each coordinate is revealed independently with probability 0.5
    Random,
}

/// How local averages are computed during the update phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Averaging {
    /// Mean of perceived neighbour opinions plus self
    #[default]
    Arithmetic,
    /// Normalised-weight combination of perceived opinions
    Weighted,
}

/// Raw weight assigned to a new edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrWord", into = "NumberOrWord")]
pub enum WeightMode {
    Fixed(f64),
    /// Independent uniform draw in `[0, 1)`
    Random,
}

impl Default for WeightMode {
    fn default() -> Self {
        WeightMode::Fixed(1.0)
    }
}

/// A single resistance entry: a fixed scalar or a per-node random draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrWord", into = "NumberOrWord")]
pub enum ResistanceValue {
    Fixed(f64),
    Random,
}

/// Resistance assignment: one value for everyone, or one per archetype tag
///
/// Per-archetype keys stay as strings so that unknown tags can be reported and
/// skipped instead of failing the whole configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResistanceSpec {
    PerArchetype(BTreeMap<String, ResistanceValue>),
    Uniform(ResistanceValue),
}

impl Default for ResistanceSpec {
    fn default() -> Self {
        ResistanceSpec::Uniform(ResistanceValue::Fixed(0.0))
    }
}

/// Wire shape shared by [`WeightMode`] and [`ResistanceValue`]: a number or the word `random`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrWord {
    Number(f64),
    Word(String),
}

impl TryFrom<NumberOrWord> for WeightMode {
    type Error = ConfigError;

    fn try_from(raw: NumberOrWord) -> Result<Self, Self::Error> {
        match raw {
            NumberOrWord::Number(w) => Ok(WeightMode::Fixed(w)),
            NumberOrWord::Word(w) if w.eq_ignore_ascii_case("random") => Ok(WeightMode::Random),
            NumberOrWord::Word(w) => Err(ConfigError::InvalidValue {
                field: "weight",
                value: w,
            }),
        }
    }
}

impl From<WeightMode> for NumberOrWord {
    fn from(mode: WeightMode) -> Self {
        match mode {
            WeightMode::Fixed(w) => NumberOrWord::Number(w),
            WeightMode::Random => NumberOrWord::Word("random".to_string()),
        }
    }
}

impl TryFrom<NumberOrWord> for ResistanceValue {
    type Error = ConfigError;

    fn try_from(raw: NumberOrWord) -> Result<Self, Self::Error> {
        match raw {
            NumberOrWord::Number(r) => Ok(ResistanceValue::Fixed(r)),
            NumberOrWord::Word(w) if w.eq_ignore_ascii_case("random") => {
                Ok(ResistanceValue::Random)
            }
            NumberOrWord::Word(w) => Err(ConfigError::InvalidValue {
                field: "resistance",
                value: w,
            }),
        }
    }
}

impl From<ResistanceValue> for NumberOrWord {
    fn from(value: ResistanceValue) -> Self {
        match value {
            ResistanceValue::Fixed(r) => NumberOrWord::Number(r),
            ResistanceValue::Random => NumberOrWord::Word("random".to_string()),
        }
    }
}

/// Every parameter needed to build a network from scratch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Number of nodes
    pub n: usize,
    /// Directed influence edges (otherwise every edge works both ways)
    pub directed: bool,
    /// Mirror every generated or connected edge; forces `directed`
    pub symmetric: bool,
    /// Topology tag, see [`Topology`]
    pub topology: String,
    /// Edge probability for random graphs, neighbourhood fraction for small-world
    pub saturation: f64,
    /// Rewiring probability for small-world graphs
    pub rewire: f64,
    /// Opinion dimensionality
    pub dimensions: usize,
    pub visibility: Visibility,
    pub weight: WeightMode,
    /// Probability of flipping a coordinate that passed the resistance gate
    pub update: f64,
    /// Probability of accepting a rewire-in candidate
    pub friend: f64,
    /// Probability of dropping a low-reward edge
    pub unfriend: f64,
    /// Rewards strictly below this value make an edge a disconnection candidate
    pub unfriend_threshold: f64,
    pub resistance: ResistanceSpec,
    /// Archetype proportions by tag; `None` puts every node in [`Archetype::R`]
    pub type_dist: Option<BTreeMap<String, f64>>,
    pub averaging: Averaging,
    /// Seed for the single shared random stream
    pub seed: Option<u64>,
    /// Keep a per-event log of flips and rewiring
    pub record_events: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            n: 0,
            directed: false,
            symmetric: false,
            topology: String::new(),
            saturation: 0.1,
            rewire: 0.1,
            dimensions: 1,
            visibility: Visibility::Visible,
            weight: WeightMode::default(),
            update: 1.0,
            friend: 0.0,
            unfriend: 1.0,
            unfriend_threshold: 0.0,
            resistance: ResistanceSpec::default(),
            type_dist: None,
            averaging: Averaging::Arithmetic,
            seed: None,
            record_events: false,
        }
    }
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parsed topology tag
    pub fn topology(&self) -> Result<Topology, ConfigError> {
        self.topology.parse()
    }

    /// Parsed archetype distribution, checked to sum to one
    ///
    /// Returns `Ok(None)` when no distribution was configured.
    pub fn archetype_distribution(&self) -> Result<Option<BTreeMap<Archetype, f64>>, ConfigError> {
        let Some(dist) = &self.type_dist else {
            return Ok(None);
        };

        let mut parsed = BTreeMap::new();
        for (tag, proportion) in dist {
            let archetype: Archetype = tag.parse()?;
            *parsed.entry(archetype).or_insert(0.0) += *proportion;
        }

        let total: f64 = parsed.values().sum();
        if (total - 1.0).abs() > PROPORTION_TOLERANCE {
            return Err(ConfigError::ProportionSum(total));
        }
        Ok(Some(parsed))
    }

    /// Repair the configuration in place and report what was repaired
    ///
    /// Every problem is logged and defaulted; none of them stop a network from
    /// being built.
    pub fn normalize(&mut self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if self.symmetric && !self.directed {
            debug!("symmetric networks are directed; setting directed=true");
            self.directed = true;
        }

        if self.dimensions == 0 {
            problems.push(ConfigError::InvalidValue {
                field: "dimensions",
                value: "0".to_string(),
            });
            self.dimensions = 1;
        }

        if let WeightMode::Fixed(w) = self.weight
            && !(w > 0.0 && w.is_finite())
        {
            problems.push(ConfigError::InvalidValue {
                field: "weight",
                value: w.to_string(),
            });
            self.weight = WeightMode::default();
        }

        for (name, value) in [
            ("saturation", &mut self.saturation),
            ("rewire", &mut self.rewire),
            ("update", &mut self.update),
            ("friend", &mut self.friend),
            ("unfriend", &mut self.unfriend),
        ] {
            if !(0.0..=1.0).contains(&*value) {
                problems.push(ConfigError::ProbabilityOutOfRange {
                    name,
                    value: *value,
                });
                *value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
            }
        }

        for problem in &problems {
            warn!(error = %problem, "repaired network configuration");
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.n, 0);
        assert!(!config.directed);
        assert_eq!(config.dimensions, 1);
        assert_eq!(config.visibility, Visibility::Visible);
        assert_eq!(config.weight, WeightMode::Fixed(1.0));
        assert_eq!(config.unfriend, 1.0);
        assert_eq!(config.topology().unwrap(), Topology::Empty);
    }

    #[test]
    fn test_topology_tags() {
        assert_eq!("scale free".parse::<Topology>().unwrap(), Topology::ScaleFree);
        assert_eq!("small-world".parse::<Topology>().unwrap(), Topology::SmallWorld);
        assert_eq!("Small_World".parse::<Topology>().unwrap(), Topology::SmallWorld);
        assert_eq!("".parse::<Topology>().unwrap(), Topology::Empty);
        assert!(matches!(
            "lattice".parse::<Topology>(),
            Err(ConfigError::UnknownTopology(_))
        ));
    }

    #[test]
    fn test_parse_toml() {
        let config = NetworkConfig::from_toml_str(
            r#"
            n = 20
            topology = "small world"
            weight = "random"
            visibility = "random"
            dimensions = 3
            seed = 7

            [type_dist]
            R = 0.5
            DA = 0.5

            [resistance]
            R = 0.25
            DA = "random"
            "#,
        )
        .unwrap();

        assert_eq!(config.n, 20);
        assert_eq!(config.weight, WeightMode::Random);
        assert_eq!(config.visibility, Visibility::Random);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.saturation, 0.1);
        match &config.resistance {
            ResistanceSpec::PerArchetype(map) => {
                assert_eq!(map["R"], ResistanceValue::Fixed(0.25));
                assert_eq!(map["DA"], ResistanceValue::Random);
            }
            other => panic!("unexpected resistance spec: {other:?}"),
        }
        let dist = config.archetype_distribution().unwrap().unwrap();
        assert_eq!(dist[&Archetype::DA], 0.5);
    }

    #[test]
    fn test_uniform_resistance_forms() {
        let config = NetworkConfig::from_toml_str("resistance = \"random\"").unwrap();
        assert_eq!(config.resistance, ResistanceSpec::Uniform(ResistanceValue::Random));

        let config = NetworkConfig::from_toml_str("resistance = 0.3").unwrap();
        assert_eq!(
            config.resistance,
            ResistanceSpec::Uniform(ResistanceValue::Fixed(0.3))
        );

        assert!(NetworkConfig::from_toml_str("weight = \"heavy\"").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = NetworkConfig {
            n: 12,
            topology: "cycle".into(),
            weight: WeightMode::Random,
            resistance: ResistanceSpec::Uniform(ResistanceValue::Random),
            seed: Some(3),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(NetworkConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_distribution_errors() {
        let mut config = NetworkConfig {
            type_dist: Some(BTreeMap::from([("R".to_string(), 0.5), ("E".to_string(), 0.4)])),
            ..Default::default()
        };
        assert!(matches!(
            config.archetype_distribution(),
            Err(ConfigError::ProportionSum(_))
        ));

        config.type_dist = Some(BTreeMap::from([("hom".to_string(), 1.0)]));
        assert_eq!(
            config.archetype_distribution(),
            Err(ConfigError::UnknownArchetype("hom".into()))
        );

        config.type_dist = None;
        assert_eq!(config.archetype_distribution(), Ok(None));
    }

    #[test]
    fn test_normalize() {
        let mut config = NetworkConfig {
            symmetric: true,
            update: 1.5,
            friend: -0.2,
            dimensions: 0,
            weight: WeightMode::Fixed(0.0),
            ..Default::default()
        };
        let problems = config.normalize();

        assert!(config.directed);
        assert_eq!(config.update, 1.0);
        assert_eq!(config.friend, 0.0);
        assert_eq!(config.dimensions, 1);
        assert_eq!(config.weight, WeightMode::Fixed(1.0));
        assert_eq!(problems.len(), 4);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.toml");
        std::fs::write(&path, "n = 5\ntopology = \"cycle\"\n").unwrap();

        let config = NetworkConfig::from_file(&path).unwrap();
        assert_eq!(config.n, 5);
        assert_eq!(config.topology().unwrap(), Topology::Cycle);

        assert!(matches!(
            NetworkConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Read(_))
        ));
    }
}
