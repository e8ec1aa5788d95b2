// Skill scarcity: teams pay a premium for skills their roster is short on.

use std::collections::BTreeMap;

use courtside_core::league::Skill;

use crate::valuation::asset::Asset;

/// Inflate each asset in `batch` whose skills the team still needs.
///
/// Counts start from the `roster` assets worth at least `baseline`. The batch
/// is walked best-first; every skill on a material asset bumps the running
/// count (the asset itself included) and multiplies its value by 1.1, 1.05
/// or 1.025 when the count is still two-or-more, one, or zero short of the
/// target. Sorts `batch` by value, descending.
pub fn apply_skill_bonus(
    batch: &mut [Asset],
    roster: &[Asset],
    targets: &BTreeMap<Skill, u32>,
    baseline: f64,
) {
    let mut counts: BTreeMap<Skill, i64> = BTreeMap::new();
    for asset in roster.iter().filter(|a| a.value() >= baseline) {
        for skill in asset.skills() {
            *counts.entry(*skill).or_insert(0) += 1;
        }
    }

    batch.sort_by(|a, b| b.value().total_cmp(&a.value()));

    for asset in batch.iter_mut() {
        if asset.value() < baseline {
            continue;
        }
        let skills: Vec<Skill> = asset.skills().to_vec();
        for skill in skills {
            let count = counts.entry(skill).or_insert(0);
            *count += 1;
            let target = i64::from(targets.get(&skill).copied().unwrap_or(0));
            let factor = if *count <= target - 2 {
                1.1
            } else if *count <= target - 1 {
                1.05
            } else if *count <= target {
                1.025
            } else {
                1.0
            };
            asset.scale_value(factor);
        }
    }
}
