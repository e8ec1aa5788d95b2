// Trade proposals: two sides, each with the assets it sends and the assets
// the deal builder must not touch.

use std::collections::BTreeSet;

use courtside_core::league::{
    LeagueContext, LeagueStore, Phase, PickId, PlayerId, PlayerRecord, StoreError, TeamId,
};

use crate::trade::TradeError;
use crate::valuation::pick_values::PickValueTable;
use crate::valuation::score::{value_change, AssetChange};

/// One team's half of a proposal. `player_ids` and `pick_ids` are what this
/// team gives up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeSide {
    pub team_id: TeamId,
    pub player_ids: BTreeSet<PlayerId>,
    pub player_ids_excluded: BTreeSet<PlayerId>,
    pub pick_ids: BTreeSet<PickId>,
    pub pick_ids_excluded: BTreeSet<PickId>,
}

impl TradeSide {
    pub fn new(team_id: TeamId) -> Self {
        TradeSide {
            team_id,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.player_ids.is_empty() && self.pick_ids.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.player_ids.len() + self.pick_ids.len()
    }
}

/// Index 0 is the initiator (the user, in user-facing negotiations); index 1
/// is the counterparty whose approval is sought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeProposal {
    pub sides: [TradeSide; 2],
}

impl TradeProposal {
    pub fn new(initiator: TeamId, counterparty: TeamId) -> Self {
        TradeProposal {
            sides: [TradeSide::new(initiator), TradeSide::new(counterparty)],
        }
    }

    pub fn team_ids(&self) -> [TeamId; 2] {
        [self.sides[0].team_id, self.sides[1].team_id]
    }

    /// Put a player in `side`'s outgoing set, taking it out of the other
    /// side's if it was there.
    pub fn include_player(&mut self, side: usize, id: PlayerId) {
        self.sides[1 - side].player_ids.remove(&id);
        self.sides[side].player_ids.insert(id);
    }

    pub fn include_pick(&mut self, side: usize, id: PickId) {
        self.sides[1 - side].pick_ids.remove(&id);
        self.sides[side].pick_ids.insert(id);
    }

    /// The trade as seen by the team on `side`: it receives what the other
    /// side sends and loses its own outgoing assets.
    pub fn asset_change(&self, side: usize) -> AssetChange {
        let own = &self.sides[side];
        let other = &self.sides[1 - side];
        AssetChange {
            add_players: other.player_ids.iter().copied().collect(),
            remove_players: own.player_ids.iter().copied().collect(),
            add_picks: other.pick_ids.iter().copied().collect(),
            remove_picks: own.pick_ids.iter().copied().collect(),
        }
    }

    /// `value_change` for the team on `side`.
    pub fn score_for(
        &self,
        side: usize,
        store: &impl LeagueStore,
        ctx: &LeagueContext,
        pick_values: Option<&PickValueTable>,
    ) -> Result<f64, TradeError> {
        value_change(
            store,
            ctx,
            self.sides[side].team_id,
            &self.asset_change(side),
            pick_values,
        )
    }

    /// Drop assets that have changed hands or become untradable since the
    /// proposal was drafted.
    pub fn prune(&mut self, store: &impl LeagueStore, ctx: &LeagueContext) -> Result<(), TradeError> {
        for side in self.sides.iter_mut() {
            let mut keep_players = BTreeSet::new();
            for &pid in &side.player_ids {
                match store.player(pid) {
                    Ok(p) if p.team_id == side.team_id && is_untradable(&p, ctx).is_none() => {
                        keep_players.insert(pid);
                    }
                    Ok(_) | Err(StoreError::UnknownPlayer(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            side.player_ids = keep_players;

            let mut keep_picks = BTreeSet::new();
            for &dpid in &side.pick_ids {
                match store.pick(dpid) {
                    Ok(dp) if dp.team_id == side.team_id => {
                        keep_picks.insert(dpid);
                    }
                    Ok(_) | Err(StoreError::UnknownPick(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            side.pick_ids = keep_picks;
        }
        Ok(())
    }
}

/// Why `player` cannot be traded right now, if anything stops it.
///
/// Expiring contracts are frozen from the end of the playoffs until free
/// agency opens; recently acquired players sit out a cooldown.
pub fn is_untradable(player: &PlayerRecord, ctx: &LeagueContext) -> Option<String> {
    let offseason_before_fa = ctx.phase > Phase::Playoffs && ctx.phase <= Phase::ResignPlayers;
    if player.contract.exp <= ctx.season && offseason_before_fa {
        return Some("Cannot trade expiring contracts after the playoffs.".to_string());
    }
    if player.games_until_tradable > 0 {
        return Some(format!(
            "Cannot trade recently acquired player for {} more games.",
            player.games_until_tradable
        ));
    }
    None
}
