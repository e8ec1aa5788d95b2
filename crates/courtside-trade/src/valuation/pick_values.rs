// Draft-pick value curves derived from the undrafted prospect pools.

use std::collections::BTreeMap;

use courtside_core::league::{LeagueContext, LeagueStore, Phase, Prospect};
use tracing::debug;

use crate::trade::TradeError;

/// Typical value by overall pick index for a 30-team, two-round draft.
/// Other league sizes get it resampled by [`default_pick_curve`].
pub const DEFAULT_PICK_CURVE: [f64; 60] = [
    75.0, 73.0, 71.0, 69.0, 68.0, 67.0, 66.0, 65.0, 64.0, 63.0, 62.0, 61.0, 60.0, 59.0, 58.0,
    57.0, 56.0, 55.0, 54.0, 53.0, 52.0, 51.0, 50.0, 50.0, 50.0, 49.0, 49.0, 49.0, 48.0, 48.0,
    48.0, 47.0, 47.0, 47.0, 46.0, 46.0, 46.0, 45.0, 45.0, 45.0, 44.0, 44.0, 44.0, 43.0, 43.0,
    43.0, 42.0, 42.0, 42.0, 41.0, 41.0, 41.0, 40.0, 40.0, 40.0, 39.0, 39.0, 39.0, 38.0, 38.0,
];

/// Number of upcoming draft classes that get their own curve.
const FORWARD_POOLS: usize = 3;

/// The default curve resampled to one value per pick of a two-round draft
/// with `num_teams` teams. Linear interpolation keeps it non-increasing; at
/// 30 teams it is [`DEFAULT_PICK_CURVE`] unchanged.
pub fn default_pick_curve(num_teams: usize) -> Vec<f64> {
    let len = 2 * num_teams.max(1);
    let last = DEFAULT_PICK_CURVE.len() - 1;
    (0..len)
        .map(|i| {
            let x = (i * last) as f64 / (len - 1) as f64;
            let lo = x.floor() as usize;
            let hi = (lo + 1).min(last);
            let t = x - lo as f64;
            DEFAULT_PICK_CURVE[lo] * (1.0 - t) + DEFAULT_PICK_CURVE[hi] * t
        })
        .collect()
}

/// Expected pick value by draft season, best pick first.
#[derive(Debug, Clone, PartialEq)]
pub struct PickValueTable {
    seasons: BTreeMap<i32, Vec<f64>>,
    default: Vec<f64>,
}

impl PickValueTable {
    pub fn new(seasons: BTreeMap<i32, Vec<f64>>, default: Vec<f64>) -> Self {
        PickValueTable { seasons, default }
    }

    /// A table with no season curves, only the default sized for the league.
    pub fn with_default_curve(num_teams: usize) -> Self {
        Self::new(BTreeMap::new(), default_pick_curve(num_teams))
    }

    pub fn season(&self, season: i32) -> Option<&[f64]> {
        self.seasons.get(&season).map(Vec::as_slice)
    }

    pub fn default_curve(&self) -> &[f64] {
        &self.default
    }

    /// Value of the pick at overall `index` in `season`. Falls back to the
    /// default curve when the season's pool is missing or too short; a table
    /// that covers the index in neither is a construction bug.
    pub fn value_at(&self, season: i32, index: usize) -> Result<f64, TradeError> {
        self.season(season)
            .and_then(|curve| curve.get(index))
            .or_else(|| self.default.get(index))
            .copied()
            .ok_or(TradeError::MissingPickValue { season, index })
    }
}

/// Build the pick value table from every undrafted prospect.
///
/// The three earliest draft classes at or after the current season each get
/// a curve: prospects sorted by value, best first, with `prospect_bonus`
/// added for the option value of picking later. During the draft the
/// current class's ungenerated placeholders are dropped; in any other phase
/// a placeholder is priced off the default curve at its rank.
pub fn get_pick_values(prospects: &[Prospect], ctx: &LeagueContext) -> PickValueTable {
    let mut pools: BTreeMap<i32, Vec<&Prospect>> = BTreeMap::new();
    for p in prospects.iter().filter(|p| p.draft_year >= ctx.season) {
        pools.entry(p.draft_year).or_default().push(p);
    }

    let default = default_pick_curve(ctx.num_teams);
    let bonus = ctx.valuation.prospect_bonus;
    let mut seasons = BTreeMap::new();

    for (draft_year, pool) in pools.into_iter().take(FORWARD_POOLS) {
        let strip_placeholders = ctx.phase == Phase::Draft && draft_year == ctx.season;

        let mut values: Vec<f64> = pool
            .iter()
            .filter_map(|p| p.value)
            .map(|v| v + bonus)
            .collect();
        values.sort_by(|a, b| b.total_cmp(a));

        if !strip_placeholders {
            let placeholders = pool.iter().filter(|p| p.value.is_none()).count();
            for _ in 0..placeholders {
                let rank = values.len().min(default.len() - 1);
                values.push(default[rank]);
            }
            values.sort_by(|a, b| b.total_cmp(a));
        }

        if values.is_empty() {
            continue;
        }
        debug!(
            "pick value curve for {}: {} prospects, best {:.1}",
            draft_year,
            values.len(),
            values[0]
        );
        seasons.insert(draft_year, values);
    }

    PickValueTable::new(seasons, default)
}

/// Read the prospect pools from the store and build a fresh table.
pub fn load_pick_values(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
) -> Result<PickValueTable, TradeError> {
    let prospects = store.prospects()?;
    Ok(get_pick_values(&prospects, ctx))
}

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// Keeps one table per (season, phase). Rosters changing within a phase do
/// not invalidate it.
#[derive(Debug, Default)]
pub struct PickValueCache {
    key: Option<(i32, Phase)>,
    table: Option<PickValueTable>,
}

impl PickValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        store: &impl LeagueStore,
        ctx: &LeagueContext,
    ) -> Result<&PickValueTable, TradeError> {
        let key = (ctx.season, ctx.phase);
        let table = match self.table.take() {
            Some(table) if self.key == Some(key) => table,
            _ => load_pick_values(store, ctx)?,
        };
        self.key = Some(key);
        Ok(self.table.insert(table))
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.table = None;
    }
}
