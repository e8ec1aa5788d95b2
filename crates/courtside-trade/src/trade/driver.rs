// AI-to-AI trades: pick two teams, seed an offer, let the builder finish it
// and commit the result if it passes the sanity gates.

use courtside_core::league::{LeagueContext, LeagueStore, TeamRecord, TradeEvent};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::trade::builder::{make_it_work, BuildOutcome};
use crate::trade::commit::process_trade;
use crate::trade::proposal::{is_untradable, TradeProposal};
use crate::trade::summary::summary;
use crate::trade::TradeError;
use crate::valuation::pick_values::PickValueTable;

#[derive(Debug, Clone, PartialEq)]
pub enum AiTradeOutcome {
    Committed(TradeEvent),
    /// No trade this time; the reason is for logs.
    Abandoned(String),
}

fn abandon(reason: impl Into<String>) -> AiTradeOutcome {
    let reason = reason.into();
    debug!("AI trade abandoned: {}", reason);
    AiTradeOutcome::Abandoned(reason)
}

/// Attempt one trade between two random AI teams.
///
/// The initiator shops one of its assets. Its offer goes on the approval
/// side of the proposal, so the builder completes the deal until the
/// initiator likes it; the counterparty then has to clear the sanity margin.
pub fn between_ai_teams(
    store: &mut impl LeagueStore,
    ctx: &LeagueContext,
    pick_values: &PickValueTable,
    rng: &mut impl Rng,
) -> Result<AiTradeOutcome, TradeError> {
    if !ctx.phase.trading_allowed() {
        return Ok(abandon(format!("no trading during the {} phase", ctx.phase)));
    }

    let ai_teams: Vec<TeamRecord> = store
        .teams()?
        .into_iter()
        .filter(|t| !ctx.is_user_team(t.id))
        .collect();
    let Some(initiator) = ai_teams.choose(rng) else {
        return Ok(abandon("no AI teams"));
    };
    let others: Vec<&TeamRecord> = ai_teams.iter().filter(|t| t.id != initiator.id).collect();
    let Some(counterparty) = others.choose(rng) else {
        return Ok(abandon("only one AI team"));
    };

    let players: Vec<_> = store
        .players_on_team(initiator.id)?
        .into_iter()
        .filter(|p| is_untradable(p, ctx).is_none())
        .collect();
    let picks = store.picks_owned_by(initiator.id)?;

    // Side 0 is the counterparty, side 1 the initiator.
    let mut proposal = TradeProposal::new(counterparty.id, initiator.id);
    // Seed with a player 70% of the time, a pick 15%, both 15%.
    let r: f64 = rng.gen();
    let (mut want_player, mut want_pick) = if r < 0.7 {
        (true, false)
    } else if r < 0.85 {
        (false, true)
    } else {
        (true, true)
    };
    if players.is_empty() {
        want_player = false;
        want_pick = true;
    }
    if picks.is_empty() {
        want_pick = false;
        want_player = true;
    }
    if want_player {
        if let Some(p) = players.choose(rng) {
            proposal.include_player(1, p.id);
        }
    }
    if want_pick {
        if let Some(dp) = picks.choose(rng) {
            proposal.include_pick(1, dp.id);
        }
    }
    if proposal.sides[1].is_empty() {
        return Ok(abandon(format!("team {} has nothing tradable", initiator.id)));
    }

    let proposal = match make_it_work(&*store, ctx, proposal, false, pick_values, rng)? {
        BuildOutcome::Accepted { proposal, .. } => proposal,
        BuildOutcome::Rejected => return Ok(abandon("no deal found")),
    };

    if proposal.sides.iter().all(|s| s.player_ids.is_empty()) {
        return Ok(abandon("picks-only trade"));
    }
    if proposal.sides[0].is_empty() {
        return Ok(abandon("counterparty gives up nothing"));
    }
    if let Some(warning) = summary(&*store, ctx, &proposal)?.warning {
        return Ok(abandon(warning));
    }
    let initiator_dv = proposal.score_for(1, &*store, ctx, Some(pick_values))?;
    let counterparty_dv = proposal.score_for(0, &*store, ctx, Some(pick_values))?;
    debug!(
        "AI trade between {} and {}: initiator score {:.2}, counterparty score {:.2}",
        initiator.id, counterparty.id, initiator_dv, counterparty_dv
    );
    if counterparty_dv < ctx.negotiation.ai_sanity_margin {
        return Ok(abandon(format!(
            "counterparty score {counterparty_dv:.2} below sanity margin"
        )));
    }

    let event = process_trade(store, ctx, proposal)?;
    info!("AI trade committed: {}", event.text);
    Ok(AiTradeOutcome::Committed(event))
}
