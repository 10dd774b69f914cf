//! Which ladders a competitor may appear on.
//!
//! Weight groups cascade upwards: a competitor is eligible for their own
//! group, every heavier group and the unbounded group, with both arms.

use crate::config::LadderConfig;
use crate::models::{Arm, LadderKey};

/// Index of the weight group a base class belongs to, if it is recognized.
///
/// Matching ignores case and surrounding whitespace. Lightest-group synonyms
/// (such as "women") resolve to index 0.
pub fn base_group_index(config: &LadderConfig, base_class: &str) -> Option<usize> {
    let base = base_class.trim();
    if base.is_empty() {
        return None;
    }

    if config
        .lightest_synonyms
        .iter()
        .any(|s| s.eq_ignore_ascii_case(base))
    {
        return (!config.weight_groups.is_empty()).then_some(0);
    }

    config
        .weight_groups
        .iter()
        .position(|g| g.eq_ignore_ascii_case(base))
}

/// Every ladder a competitor with this base class is eligible for.
///
/// An unrecognized class yields no ladders at all.
pub fn resolve(config: &LadderConfig, base_class: &str) -> Vec<LadderKey> {
    let Some(start) = base_group_index(config, base_class) else {
        return Vec::new();
    };

    config.weight_groups[start..]
        .iter()
        .flat_map(|g| Arm::ALL.iter().map(move |arm| LadderKey::new(g.clone(), *arm)))
        .collect()
}
