// Asset construction: players and draft picks reduced to the shape the
// scoring function works on.

use std::collections::HashMap;

use courtside_core::league::{
    Contract, Injury, LeagueContext, PickId, PickRecord, PlayerId, PlayerRecord, Skill, TeamId,
    TeamRecord,
};

use crate::trade::TradeError;
use crate::valuation::pick_values::PickValueTable;

/// Nominal age of a drafted rookie.
pub const ROOKIE_AGE: i32 = 19;

/// Draft-position uncertainty reaches its maximum this many seasons out.
const SLOT_HORIZON: f64 = 5.0;

/// Where a pick converges to once its draft is `SLOT_HORIZON` seasons away.
const MIDDLE_SLOT: f64 = 15.0;

// ---------------------------------------------------------------------------
// Asset types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAsset {
    pub id: PlayerId,
    pub value: f64,
    pub skills: Vec<Skill>,
    pub contract: Contract,
    /// What the player would command on the open market.
    pub worth: Contract,
    pub injury: Injury,
    pub age: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickAsset {
    pub id: PickId,
    pub value: f64,
    /// Estimated rookie-scale contract; doubles as the pick's worth.
    pub contract: Contract,
}

/// A single unit of trade value.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Player(PlayerAsset),
    Pick(PickAsset),
}

impl Asset {
    pub fn value(&self) -> f64 {
        match self {
            Asset::Player(p) => p.value,
            Asset::Pick(dp) => dp.value,
        }
    }

    pub fn scale_value(&mut self, factor: f64) {
        match self {
            Asset::Player(p) => p.value *= factor,
            Asset::Pick(dp) => dp.value *= factor,
        }
    }

    pub fn skills(&self) -> &[Skill] {
        match self {
            Asset::Player(p) => &p.skills,
            Asset::Pick(_) => &[],
        }
    }

    pub fn contract(&self) -> Contract {
        match self {
            Asset::Player(p) => p.contract,
            Asset::Pick(dp) => dp.contract,
        }
    }

    pub fn worth(&self) -> Contract {
        match self {
            Asset::Player(p) => p.worth,
            Asset::Pick(dp) => dp.contract,
        }
    }

    pub fn injury_games(&self) -> u32 {
        match self {
            Asset::Player(p) => p.injury.games_remaining,
            Asset::Pick(_) => 0,
        }
    }

    pub fn age(&self) -> i32 {
        match self {
            Asset::Player(p) => p.age,
            Asset::Pick(_) => ROOKIE_AGE,
        }
    }

    pub fn is_pick(&self) -> bool {
        matches!(self, Asset::Pick(_))
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Market-rate salary for a player of the given value, in thousands,
/// rounded to the nearest 50 and clamped to the league's contract range.
pub fn market_worth(value: f64, ctx: &LeagueContext) -> u32 {
    let min = f64::from(ctx.min_contract);
    let max = f64::from(ctx.max_contract);
    let raw = ((value - 1.0) / 100.0 - 0.45) * 3.3 * (max - min) + min;
    let rounded = (raw / 50.0).round() * 50.0;
    rounded.clamp(min, max) as u32
}

pub fn player_asset(player: &PlayerRecord, ctx: &LeagueContext) -> PlayerAsset {
    PlayerAsset {
        id: player.id,
        value: player.value,
        skills: player.skills.clone(),
        contract: player.contract,
        worth: Contract {
            amount: market_worth(player.value, ctx),
            exp: player.contract.exp,
        },
        injury: player.injury,
        age: ctx.season - player.birth_year,
    }
}

// ---------------------------------------------------------------------------
// Draft picks
// ---------------------------------------------------------------------------

/// Projected draft slot (1 = first overall) for every team, worst record
/// first. Ties keep id order.
pub fn estimated_slots(teams: &[TeamRecord]) -> HashMap<TeamId, usize> {
    let mut ranked: Vec<&TeamRecord> = teams.iter().collect();
    ranked.sort_by(|a, b| {
        a.winning_percentage
            .total_cmp(&b.winning_percentage)
            .then(a.id.cmp(&b.id))
    });
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t.id, i + 1))
        .collect()
}

/// Blend the projected slot toward the middle of the draft as the pick gets
/// further away, then convert it to an overall index (0-based, first round
/// followed by second). Drafts have two rounds; anything later is read as
/// the second.
pub fn pick_index(slot: usize, years_out: i32, round: u8, num_teams: usize) -> usize {
    let years_out = f64::from(years_out.clamp(0, SLOT_HORIZON as i32));
    let blended = (slot as f64 * (SLOT_HORIZON - years_out) / SLOT_HORIZON
        + MIDDLE_SLOT * years_out / SLOT_HORIZON)
        .round() as usize;
    let slot = blended.clamp(1, num_teams.max(1));
    slot - 1 + num_teams * usize::from(round.clamp(1, 2) - 1)
}

/// Convert a pick into an asset. `slots` comes from [`estimated_slots`].
pub fn pick_asset(
    pick: &PickRecord,
    slots: &HashMap<TeamId, usize>,
    pick_values: &PickValueTable,
    ctx: &LeagueContext,
) -> Result<PickAsset, TradeError> {
    let slot = slots
        .get(&pick.original_team_id)
        .copied()
        .ok_or(courtside_core::league::StoreError::UnknownTeam(pick.original_team_id))?;
    let index = pick_index(slot, pick.season - ctx.season, pick.round, ctx.num_teams);
    let value = pick_values.value_at(pick.season, index)?;

    Ok(PickAsset {
        id: pick.id,
        value,
        contract: Contract {
            amount: ctx.rookie_salary(index),
            exp: pick.season + 2 + (2 - i32::from(pick.round)),
        },
    })
}
