// Forward-selection deal builder: add one asset at a time until the
// counterparty says yes or the search gives up.

use courtside_core::league::{LeagueContext, LeagueStore, PickId, PlayerId};
use rand::Rng;
use tracing::{debug, info};

use crate::trade::proposal::{is_untradable, TradeProposal};
use crate::trade::summary::describe_pick;
use crate::trade::{natural_list, TradeError};
use crate::valuation::pick_values::PickValueTable;

/// Additions after which a proposal that started out favoring the
/// counterparty is settled regardless of the coin flip.
const MODERATION_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Accepted {
        proposal: TradeProposal,
        /// Assets the builder added on top of the original proposal.
        added: usize,
    },
    Rejected,
}

/// An asset the builder could add to one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Player { side: usize, id: PlayerId },
    Pick { side: usize, id: PickId },
}

impl Candidate {
    fn apply(self, proposal: &mut TradeProposal) {
        match self {
            Candidate::Player { side, id } => proposal.include_player(side, id),
            Candidate::Pick { side, id } => proposal.include_pick(side, id),
        }
    }
}

/// Try to turn `proposal` into one the counterparty (side 1) accepts.
///
/// If the counterparty already likes the deal the builder instead balances
/// it back toward the initiator, stopping after a coin flip, three
/// additions, or as soon as no asset can move value that way. With
/// `hold_user_constant` only the counterparty's own assets are candidates.
pub fn make_it_work(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    mut proposal: TradeProposal,
    hold_user_constant: bool,
    pick_values: &PickValueTable,
    rng: &mut impl Rng,
) -> Result<BuildOutcome, TradeError> {
    let max_added = ctx.negotiation.max_assets_added;
    let mut added = 0;
    let mut dv = proposal.score_for(1, store, ctx, Some(pick_values))?;
    let initial_sign = if dv > 0.0 { 1 } else { -1 };

    loop {
        if initial_sign == -1 && dv > 0.0 {
            return Ok(accepted(proposal, added));
        }
        if initial_sign == 1 && (added > MODERATION_LIMIT || (added > 0 && rng.gen_bool(0.5))) {
            return Ok(settle(proposal, dv, added));
        }
        if initial_sign == -1 && added >= max_added {
            return Ok(rejected(&proposal, added));
        }

        let step = if initial_sign == 1 {
            moderation_step(store, ctx, &proposal, dv, hold_user_constant, pick_values)?
        } else {
            convincing_step(store, ctx, &proposal, hold_user_constant, pick_values)?
        };
        let Some((candidate, score)) = step else {
            return Ok(if initial_sign == 1 {
                settle(proposal, dv, added)
            } else {
                rejected(&proposal, added)
            });
        };

        debug!(
            "builder step {}: adding {:?}, counterparty score {:.2} -> {:.2}",
            added + 1,
            candidate,
            dv,
            score
        );
        candidate.apply(&mut proposal);
        added += 1;
        dv = score;
    }
}

/// Score every candidate for the counterparty, best first.
fn scored_candidates(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    proposal: &TradeProposal,
    sides: &[usize],
    pick_values: &PickValueTable,
) -> Result<Vec<(Candidate, f64)>, TradeError> {
    let mut scored = Vec::new();
    for candidate in candidates(store, ctx, proposal, sides)? {
        let mut trial = proposal.clone();
        candidate.apply(&mut trial);
        scored.push((candidate, trial.score_for(1, store, ctx, Some(pick_values))?));
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scored)
}

/// The cheapest asset that still keeps the counterparty happy: the one just
/// before the first negative score. When every option is negative, take the
/// least bad.
fn convincing_step(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    proposal: &TradeProposal,
    hold_user_constant: bool,
    pick_values: &PickValueTable,
) -> Result<Option<(Candidate, f64)>, TradeError> {
    let sides: &[usize] = if hold_user_constant { &[1] } else { &[0, 1] };
    let scored = scored_candidates(store, ctx, proposal, sides, pick_values)?;
    if scored.is_empty() {
        return Ok(None);
    }
    let choice = match scored.iter().position(|(_, s)| *s < 0.0) {
        Some(0) => 0,
        Some(j) => j - 1,
        None => scored.len() - 1,
    };
    Ok(Some(scored[choice]))
}

/// One step back toward even for a deal the counterparty already likes.
///
/// Only the initiator's assets are offered, or only the counterparty's when
/// the initiator's package is held constant. A step must lower the
/// counterparty's score without taking it to zero and must leave the
/// initiator better off.
fn moderation_step(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    proposal: &TradeProposal,
    dv: f64,
    hold_user_constant: bool,
    pick_values: &PickValueTable,
) -> Result<Option<(Candidate, f64)>, TradeError> {
    let sides: &[usize] = if hold_user_constant { &[1] } else { &[0] };
    let scored = scored_candidates(store, ctx, proposal, sides, pick_values)?;
    let initiator_now = proposal.score_for(0, store, ctx, Some(pick_values))?;

    // Lowest counterparty score first.
    for &(candidate, score) in scored.iter().rev() {
        if score <= 0.0 || score >= dv {
            continue;
        }
        let mut trial = proposal.clone();
        candidate.apply(&mut trial);
        if trial.score_for(0, store, ctx, Some(pick_values))? > initiator_now {
            return Ok(Some((candidate, score)));
        }
    }
    Ok(None)
}

/// Final answer for a deal that started out favoring the counterparty.
fn settle(proposal: TradeProposal, dv: f64, added: usize) -> BuildOutcome {
    if dv > 0.0 {
        accepted(proposal, added)
    } else {
        rejected(&proposal, added)
    }
}

fn accepted(proposal: TradeProposal, added: usize) -> BuildOutcome {
    info!(
        "teams {} and {}: deal found after {} additions",
        proposal.sides[0].team_id, proposal.sides[1].team_id, added
    );
    BuildOutcome::Accepted { proposal, added }
}

fn rejected(proposal: &TradeProposal, added: usize) -> BuildOutcome {
    info!(
        "teams {} and {}: no deal after {} additions",
        proposal.sides[0].team_id, proposal.sides[1].team_id, added
    );
    BuildOutcome::Rejected
}

/// Every tradable asset on `sides` not already in the proposal or excluded
/// from it.
fn candidates(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    proposal: &TradeProposal,
    sides: &[usize],
) -> Result<Vec<Candidate>, TradeError> {
    let mut out = Vec::new();

    for &side in sides {
        let ts = &proposal.sides[side];
        for p in store.players_on_team(ts.team_id)? {
            if ts.player_ids.contains(&p.id)
                || ts.player_ids_excluded.contains(&p.id)
                || is_untradable(&p, ctx).is_some()
            {
                continue;
            }
            out.push(Candidate::Player { side, id: p.id });
        }
        for dp in store.picks_owned_by(ts.team_id)? {
            if ts.pick_ids.contains(&dp.id) || ts.pick_ids_excluded.contains(&dp.id) {
                continue;
            }
            out.push(Candidate::Pick { side, id: dp.id });
        }
    }
    Ok(out)
}

/// The "what would make this work?" reply: what the builder had to add to
/// each side compared with the original proposal.
pub fn describe_counter_offer(
    store: &impl LeagueStore,
    original: &TradeProposal,
    built: &TradeProposal,
) -> Result<String, TradeError> {
    let mut added: [Vec<String>; 2] = [Vec::new(), Vec::new()];
    for (k, names) in added.iter_mut().enumerate() {
        for pid in built.sides[k].player_ids.difference(&original.sides[k].player_ids) {
            names.push(store.player(*pid)?.name);
        }
        for dpid in built.sides[k].pick_ids.difference(&original.sides[k].pick_ids) {
            names.push(describe_pick(&store.pick(*dpid)?, store)?);
        }
    }

    let counterparty = store.team(built.sides[1].team_id)?.display_name();
    let message = match (added[0].is_empty(), added[1].is_empty()) {
        (true, true) => format!("The {counterparty} are happy with the trade as it is."),
        (false, true) => format!(
            "The {counterparty} would do it if you add {}.",
            natural_list(&added[0])
        ),
        (true, false) => format!(
            "The {counterparty} are willing to add {}.",
            natural_list(&added[1])
        ),
        (false, false) => format!(
            "The {counterparty} would do it if you add {}, and they would include {}.",
            natural_list(&added[0]),
            natural_list(&added[1])
        ),
    };
    Ok(message)
}
