// Committing trades: user proposals and the final ownership transfer.

use courtside_core::league::{LeagueContext, LeagueStore, TradeEvent};
use tracing::info;

use crate::trade::proposal::TradeProposal;
use crate::trade::summary::{describe_pick, summary};
use crate::trade::{natural_list, TradeError};
use crate::valuation::pick_values::PickValueTable;

#[derive(Debug, Clone, PartialEq)]
pub enum ProposeOutcome {
    Accepted { event: TradeEvent, message: String },
    Rejected { message: String },
}

/// Counterparty's reply to a proposal it turns down, harsher the worse the
/// offer.
pub fn rejection_message(score: f64) -> &'static str {
    if score > -2.0 {
        "Close, but not quite good enough."
    } else if score > -5.0 {
        "That's not a good deal for me."
    } else {
        "What, are you crazy?!"
    }
}

/// Put `proposal` to the counterparty (side 1). Accepted iff the counterparty
/// scores it above zero; `force` skips both the score and the soft-cap
/// warning.
pub fn propose(
    store: &mut impl LeagueStore,
    ctx: &LeagueContext,
    proposal: TradeProposal,
    force: bool,
    pick_values: Option<&PickValueTable>,
) -> Result<ProposeOutcome, TradeError> {
    if !ctx.phase.trading_allowed() {
        return Err(TradeError::NotTradingPeriod(ctx.phase));
    }

    let s = summary(&*store, ctx, &proposal)?;
    if let Some(warning) = s.warning {
        if !force {
            return Ok(ProposeOutcome::Rejected { message: warning });
        }
    }

    let dv = proposal.score_for(1, &*store, ctx, pick_values)?;
    if dv > 0.0 || force {
        let event = process_trade(store, ctx, proposal)?;
        Ok(ProposeOutcome::Accepted {
            event,
            message: "Trade accepted! \"Nice doing business with you!\"".to_string(),
        })
    } else {
        info!(
            "team {} rejected proposal from team {} (score {:.2})",
            proposal.sides[1].team_id, proposal.sides[0].team_id, dv
        );
        Ok(ProposeOutcome::Rejected {
            message: format!("Trade rejected! \"{}\"", rejection_message(dv)),
        })
    }
}

/// Transfer every included asset to the other side and log the trade.
/// Consumes the proposal.
pub fn process_trade(
    store: &mut impl LeagueStore,
    ctx: &LeagueContext,
    proposal: TradeProposal,
) -> Result<TradeEvent, TradeError> {
    let mut assets: [Vec<String>; 2] = [Vec::new(), Vec::new()];
    for (k, names) in assets.iter_mut().enumerate() {
        for &pid in &proposal.sides[k].player_ids {
            names.push(store.player(pid)?.name);
        }
        for &dpid in &proposal.sides[k].pick_ids {
            names.push(describe_pick(&store.pick(dpid)?, &*store)?);
        }
    }

    let names = [
        store.team(proposal.sides[0].team_id)?.display_name(),
        store.team(proposal.sides[1].team_id)?.display_name(),
    ];
    let text = format!(
        "The {} traded {} to the {} for {}.",
        names[0],
        natural_list(&assets[0]),
        names[1],
        natural_list(&assets[1])
    );

    let [first, second] = proposal.sides;
    let event = TradeEvent {
        season: ctx.season,
        phase: ctx.phase,
        team_ids: [first.team_id, second.team_id],
        player_ids: [
            first.player_ids.into_iter().collect(),
            second.player_ids.into_iter().collect(),
        ],
        pick_ids: [
            first.pick_ids.into_iter().collect(),
            second.pick_ids.into_iter().collect(),
        ],
        text,
    };

    store.commit_trade(&event, ctx.negotiation.games_until_tradable)?;
    info!("{}", event.text);
    Ok(event)
}
