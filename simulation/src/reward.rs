//! Reward: how much a node values what it perceives of a neighbour

use murmur_core::{Archetype, Opinion};

/// Fraction of visible coordinates on which `perceived` differs from `own`
///
/// Hidden coordinates (`0`) are ignored. Returns `None` when nothing is visible.
pub fn perceived_distance(own: &[Opinion], perceived: &[Opinion]) -> Option<f64> {
    let (visible, differing) = own
        .iter()
        .zip(perceived)
        .filter(|&(_, &seen)| seen != 0)
        .fold((0usize, 0usize), |(visible, differing), (&mine, &seen)| {
            (visible + 1, differing + usize::from(mine != seen))
        });
    (visible > 0).then(|| differing as f64 / visible as f64)
}

/// Reward for one perceived neighbour; `0` when nothing is visible
pub fn reward(archetype: Archetype, own: &[Opinion], perceived: &[Opinion]) -> f64 {
    perceived_distance(own, perceived)
        .map(|d| archetype.reward_shape().score(d))
        .unwrap_or(0.0)
}
