// Trading block: shop a fixed package to every AI team and collect what
// each would give for it.

use courtside_core::league::{LeagueContext, LeagueStore, TeamId};
use rand::Rng;

use crate::trade::builder::{make_it_work, BuildOutcome};
use crate::trade::proposal::{TradeProposal, TradeSide};
use crate::trade::TradeError;
use crate::valuation::pick_values::PickValueTable;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockOffer {
    pub team_id: TeamId,
    pub proposal: TradeProposal,
    /// How much the offering team likes the deal.
    pub user_score: f64,
}

/// Ask every AI team what it would give for `offered`. Only the AI side is
/// built up; the package itself never changes. Offers come back best-first
/// for the offering team.
pub fn trading_block_offers(
    store: &impl LeagueStore,
    ctx: &LeagueContext,
    offered: &TradeSide,
    pick_values: &PickValueTable,
    rng: &mut impl Rng,
) -> Result<Vec<BlockOffer>, TradeError> {
    let mut offers = Vec::new();
    if offered.is_empty() {
        return Ok(offers);
    }

    for team in store.teams()? {
        if team.id == offered.team_id || ctx.is_user_team(team.id) {
            continue;
        }
        let proposal = TradeProposal {
            sides: [offered.clone(), TradeSide::new(team.id)],
        };
        if let BuildOutcome::Accepted { proposal, .. } =
            make_it_work(store, ctx, proposal, true, pick_values, rng)?
        {
            if proposal.sides[1].is_empty() {
                continue;
            }
            let user_score = proposal.score_for(0, store, ctx, Some(pick_values))?;
            offers.push(BlockOffer {
                team_id: team.id,
                proposal,
                user_score,
            });
        }
    }

    offers.sort_by(|a, b| b.user_score.total_cmp(&a.user_score));
    Ok(offers)
}
