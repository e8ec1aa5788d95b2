// Trade scoring: one signed desirability number for a team given the assets
// it would receive and give up.

use std::collections::HashSet;

use courtside_core::league::{
    LeagueContext, LeagueStore, PickId, PlayerId, Strategy, TeamId, TeamRecord,
};
use tracing::debug;

use crate::trade::TradeError;
use crate::valuation::asset::{estimated_slots, pick_asset, player_asset, Asset};
use crate::valuation::pick_values::{load_pick_values, PickValueTable};
use crate::valuation::skills::apply_skill_bonus;

/// Exponent of the signed power-law aggregation.
const AGGREGATION_EXPONENT: f64 = 1.25;

/// Teams with more cap room than this (thousands) avoid taking on salary
/// during free agency.
const CAP_AVERSION_ROOM: i64 = 2000;

/// Length of the free-agency window in days.
const FREE_AGENCY_DAYS: f64 = 30.0;

/// The assets one team would gain and lose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetChange {
    pub add_players: Vec<PlayerId>,
    pub remove_players: Vec<PlayerId>,
    pub add_picks: Vec<PickId>,
    pub remove_picks: Vec<PickId>,
}

impl AssetChange {
    pub fn is_empty(&self) -> bool {
        self.add_players.is_empty()
            && self.remove_players.is_empty()
            && self.add_picks.is_empty()
            && self.remove_picks.is_empty()
    }

    fn involves_picks(&self) -> bool {
        !self.add_picks.is_empty() || !self.remove_picks.is_empty()
    }
}

/// Score `change` from the point of view of `team_id`. Positive means the
/// team wants the trade.
///
/// `pick_values` is built from the store when `None` and picks are involved.
/// Pure given the store contents: no randomness, no writes.
pub fn value_change(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    team_id: TeamId,
    change: &AssetChange,
    pick_values: Option<&PickValueTable>,
) -> Result<f64, TradeError> {
    let valuation = &ctx.valuation;

    if change.remove_picks.len() > valuation.max_picks_given {
        return Ok(valuation.too_many_picks_score);
    }

    let team = store.team(team_id)?;
    let own_factor = if ctx.is_user_team(team_id) {
        1.0
    } else {
        1.0 + valuation.self_overvaluation
    };

    // ---- Build roster / remove / add ----

    let outgoing: HashSet<PlayerId> = change.remove_players.iter().copied().collect();
    let mut roster: Vec<Asset> = store
        .players_on_team(team_id)?
        .iter()
        .filter(|p| !outgoing.contains(&p.id))
        .map(|p| Asset::Player(player_asset(p, ctx)))
        .collect();

    let mut remove = Vec::with_capacity(change.remove_players.len() + change.remove_picks.len());
    for &pid in &change.remove_players {
        remove.push(Asset::Player(player_asset(&store.player(pid)?, ctx)));
    }
    let mut add = Vec::with_capacity(change.add_players.len() + change.add_picks.len());
    for &pid in &change.add_players {
        add.push(Asset::Player(player_asset(&store.player(pid)?, ctx)));
    }

    if change.involves_picks() {
        let owned;
        let table = match pick_values {
            Some(table) => table,
            None => {
                owned = load_pick_values(store, ctx)?;
                &owned
            }
        };
        let slots = estimated_slots(&store.teams()?);
        for &dpid in &change.remove_picks {
            let pick = store.pick(dpid)?;
            remove.push(Asset::Pick(pick_asset(&pick, &slots, table, ctx)?));
        }
        for &dpid in &change.add_picks {
            let pick = store.pick(dpid)?;
            add.push(Asset::Pick(pick_asset(&pick, &slots, table, ctx)?));
        }
    }

    for asset in roster.iter_mut().chain(remove.iter_mut()) {
        asset.scale_value(own_factor);
    }

    // ---- Skill scarcity ----

    apply_skill_bonus(
        &mut add,
        &roster,
        &ctx.skill_targets,
        valuation.value_baseline,
    );
    let with_add: Vec<Asset> = roster.iter().chain(add.iter()).cloned().collect();
    apply_skill_bonus(
        &mut remove,
        &with_add,
        &ctx.skill_targets,
        valuation.value_baseline,
    );

    // ---- Aggregate ----

    let injuries_count = !ctx.is_user_team(team_id);
    let add_values: Vec<f64> = add
        .iter()
        .map(|a| transform_value(a, team.strategy, injuries_count, ctx))
        .collect();
    let remove_values: Vec<f64> = remove
        .iter()
        .map(|a| transform_value(a, team.strategy, false, ctx))
        .collect();

    let contract = contract_term(&add, &remove, team.strategy, ctx);
    let cap = cap_aversion(&team, &add, &remove, ctx);
    let count = add.len().saturating_sub(remove.len()) as f64;

    let dv = aggregate(&add_values) - aggregate(&remove_values) + contract - cap - count;
    debug!(
        "value_change for team {}: add {} / remove {} assets, contract {:.2}, cap {:.2}, count {:.0} -> {:.2}",
        team_id,
        add.len(),
        remove.len(),
        contract,
        cap,
        count,
        dv
    );
    Ok(dv)
}

// ---------------------------------------------------------------------------
// Per-asset transform
// ---------------------------------------------------------------------------

/// Multiplier a rebuilding team applies for youth, picks and age.
pub fn rebuilding_weight(asset: &Asset) -> f64 {
    if asset.is_pick() {
        return 1.1;
    }
    match asset.age() {
        ..=19 => 1.15,
        20 => 1.1,
        21 => 1.075,
        22 => 1.05,
        23 => 1.025,
        27 => 0.975,
        28 => 0.95,
        29.. => 0.9,
        _ => 1.0,
    }
}

/// Discounted contract length: sub-linear beyond one season.
fn duration_factor(seasons: f64) -> f64 {
    if seasons > 1.0 {
        seasons.powf(0.25)
    } else {
        seasons
    }
}

/// Value of one asset after strategy weighting, the baseline, injuries and
/// the bargain (or overpay) of its contract.
pub fn transform_value(
    asset: &Asset,
    strategy: Strategy,
    discount_injury: bool,
    ctx: &LeagueContext,
) -> f64 {
    let mut value = asset.value();
    if strategy == Strategy::Rebuilding {
        value *= rebuilding_weight(asset);
    }
    value -= ctx.valuation.value_baseline;

    if discount_injury {
        let games = f64::from(asset.injury_games().min(75));
        value *= 1.0 - games / 100.0;
    }
    let value = value.max(0.0);

    let contract = asset.contract();
    let worth = asset.worth();
    let seasons = ctx.contract_seasons_remaining(contract.exp);
    let bargain = (f64::from(worth.amount) - f64::from(contract.amount)) / 1000.0;

    value + 0.5 * bargain * duration_factor(seasons)
}

/// Signed power-law sum: one great asset outweighs several middling ones of
/// the same total.
pub fn aggregate(values: &[f64]) -> f64 {
    let sum: f64 = values
        .iter()
        .map(|v| v.signum() * v.abs().powf(AGGREGATION_EXPONENT))
        .sum();
    if sum == 0.0 {
        return 0.0;
    }
    sum.signum() * sum.abs().powf(1.0 / AGGREGATION_EXPONENT)
}

// ---------------------------------------------------------------------------
// Team-level terms
// ---------------------------------------------------------------------------

fn salary_weight(assets: &[Asset], ctx: &LeagueContext) -> f64 {
    assets
        .iter()
        .filter(|a| !a.is_pick())
        .map(|a| {
            let contract = a.contract();
            let seasons = ctx.contract_seasons_remaining(contract.exp);
            f64::from(contract.amount) / 1000.0 * seasons.powf(0.25)
        })
        .sum()
}

/// Credit for shedding long salary; rebuilding teams care more.
fn contract_term(add: &[Asset], remove: &[Asset], strategy: Strategy, ctx: &LeagueContext) -> f64 {
    let factor = match strategy {
        Strategy::Rebuilding => 0.3,
        Strategy::Contending => 0.1,
    };
    (salary_weight(remove, ctx) - salary_weight(add, ctx)) * factor
}

/// During free agency, teams with room would rather spend it on free agents
/// than absorb salary by trade. Tapers as the window closes.
fn cap_aversion(team: &TeamRecord, add: &[Asset], remove: &[Asset], ctx: &LeagueContext) -> f64 {
    if !ctx.phase.is_free_agency_window() || team.cap_space <= CAP_AVERSION_ROOM {
        return 0.0;
    }
    let salary = |assets: &[Asset]| -> f64 {
        assets
            .iter()
            .filter(|a| !a.is_pick())
            .map(|a| f64::from(a.contract().amount))
            .sum()
    };
    let salary_added = salary(add) - salary(remove);
    if salary_added <= 0.0 {
        return 0.0;
    }
    let days = f64::from(ctx.free_agency_days_remaining).min(FREE_AGENCY_DAYS);
    (0.2 + 0.8 * days / FREE_AGENCY_DAYS) * salary_added / 1000.0
}
