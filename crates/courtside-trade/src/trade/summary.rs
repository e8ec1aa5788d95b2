// Trade summary: what each side sends, salary totals and the soft-cap check.

use courtside_core::league::{
    Contract, LeagueContext, LeagueStore, PickId, PickRecord, PlayerId,
};

use crate::trade::proposal::TradeProposal;
use crate::trade::TradeError;

#[derive(Debug, Clone, PartialEq)]
pub struct TradedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub contract: Contract,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradedPick {
    pub id: PickId,
    pub description: String,
}

/// One side of the summary. `players` and `picks` are what this team sends.
#[derive(Debug, Clone, PartialEq)]
pub struct SideSummary {
    pub team_name: String,
    pub outgoing_salary: i64,
    pub incoming_salary: i64,
    pub payroll_after_trade: i64,
    pub players: Vec<TradedPlayer>,
    pub picks: Vec<TradedPick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeSummary {
    pub sides: [SideSummary; 2],
    pub warning: Option<String>,
}

/// "2026 1st round pick", with the original owner appended when the pick has
/// changed hands.
pub fn describe_pick(pick: &PickRecord, store: &impl LeagueStore) -> Result<String, TradeError> {
    let round = match pick.round {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{n}th"),
    };
    let mut description = format!("{} {} round pick", pick.season, round);
    if pick.original_team_id != pick.team_id {
        let original = store.team(pick.original_team_id)?;
        description.push_str(&format!(" ({})", original.abbrev));
    }
    Ok(description)
}

/// Incoming salary as a percentage of outgoing salary.
pub fn salary_ratio(incoming: i64, outgoing: i64) -> f64 {
    if outgoing > 0 {
        100.0 * incoming as f64 / outgoing as f64
    } else if incoming > 0 {
        f64::INFINITY
    } else {
        100.0
    }
}

/// Summarize `proposal` against the current store contents.
pub fn summary(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    proposal: &TradeProposal,
) -> Result<TradeSummary, TradeError> {
    let mut players: [Vec<TradedPlayer>; 2] = [Vec::new(), Vec::new()];
    let mut picks: [Vec<TradedPick>; 2] = [Vec::new(), Vec::new()];
    let mut outgoing = [0i64; 2];

    for k in 0..2 {
        for &pid in &proposal.sides[k].player_ids {
            let p = store.player(pid)?;
            outgoing[k] += i64::from(p.contract.amount);
            players[k].push(TradedPlayer {
                id: p.id,
                name: p.name,
                contract: p.contract,
            });
        }
        for &dpid in &proposal.sides[k].pick_ids {
            let dp = store.pick(dpid)?;
            picks[k].push(TradedPick {
                id: dp.id,
                description: describe_pick(&dp, store)?,
            });
        }
    }

    let mut warning = None;
    let mut build_side = |k: usize,
                          players: Vec<TradedPlayer>,
                          picks: Vec<TradedPick>|
     -> Result<SideSummary, TradeError> {
        let team = store.team(proposal.sides[k].team_id)?;
        let incoming = outgoing[1 - k];
        let payroll_after_trade = team.payroll(ctx.salary_cap) - outgoing[k] + incoming;

        let ratio = salary_ratio(incoming, outgoing[k]);
        if warning.is_none()
            && payroll_after_trade > i64::from(ctx.salary_cap)
            && ratio > ctx.negotiation.soft_cap_ratio
        {
            warning = Some(format!(
                "The {} are over the salary cap, so they can receive players with a combined \
                 salary of at most {:.0}% of the salary of the players they trade away. \
                 Currently, that value is {:.0}%.",
                team.display_name(),
                ctx.negotiation.soft_cap_ratio,
                ratio
            ));
        }

        Ok(SideSummary {
            team_name: team.display_name(),
            outgoing_salary: outgoing[k],
            incoming_salary: incoming,
            payroll_after_trade,
            players,
            picks,
        })
    };

    let [players0, players1] = players;
    let [picks0, picks1] = picks;
    let sides = [build_side(0, players0, picks0)?, build_side(1, players1, picks1)?];

    Ok(TradeSummary { sides, warning })
}
