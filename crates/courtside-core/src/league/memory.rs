// In-memory league store, used by tests and by embedders that keep their
// own persistence.

use std::collections::BTreeMap;

use super::{
    LeagueState, LeagueStore, PickId, PickRecord, PlayerId, PlayerRecord, Prospect, StoreError,
    TeamId, TeamRecord, TradeEvent,
};

#[derive(Debug, Clone)]
pub struct MemoryLeague {
    state: LeagueState,
    teams: BTreeMap<TeamId, TeamRecord>,
    players: BTreeMap<PlayerId, PlayerRecord>,
    picks: BTreeMap<PickId, PickRecord>,
    prospects: Vec<Prospect>,
    events: Vec<TradeEvent>,
}

impl MemoryLeague {
    pub fn new(state: LeagueState) -> Self {
        MemoryLeague {
            state,
            teams: BTreeMap::new(),
            players: BTreeMap::new(),
            picks: BTreeMap::new(),
            prospects: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn set_state(&mut self, state: LeagueState) {
        self.state = state;
    }

    /// Insert or replace a team.
    pub fn insert_team(&mut self, team: TeamRecord) {
        self.teams.insert(team.id, team);
    }

    /// Insert or replace a player.
    pub fn insert_player(&mut self, player: PlayerRecord) {
        self.players.insert(player.id, player);
    }

    /// Insert or replace a draft pick.
    pub fn insert_pick(&mut self, pick: PickRecord) {
        self.picks.insert(pick.id, pick);
    }

    pub fn insert_prospect(&mut self, prospect: Prospect) {
        self.prospects.push(prospect);
    }

    /// Mutable access for simulations that update records in place
    /// (injuries, cooldowns ticking down).
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(&id)
    }

    pub fn team_mut(&mut self, id: TeamId) -> Option<&mut TeamRecord> {
        self.teams.get_mut(&id)
    }
}

impl LeagueStore for MemoryLeague {
    fn league_state(&self) -> Result<LeagueState, StoreError> {
        Ok(self.state)
    }

    fn team(&self, id: TeamId) -> Result<TeamRecord, StoreError> {
        self.teams.get(&id).cloned().ok_or(StoreError::UnknownTeam(id))
    }

    fn teams(&self) -> Result<Vec<TeamRecord>, StoreError> {
        Ok(self.teams.values().cloned().collect())
    }

    fn player(&self, id: PlayerId) -> Result<PlayerRecord, StoreError> {
        self.players
            .get(&id)
            .cloned()
            .ok_or(StoreError::UnknownPlayer(id))
    }

    fn players_on_team(&self, team_id: TeamId) -> Result<Vec<PlayerRecord>, StoreError> {
        Ok(self
            .players
            .values()
            .filter(|p| p.team_id == team_id)
            .cloned()
            .collect())
    }

    fn pick(&self, id: PickId) -> Result<PickRecord, StoreError> {
        self.picks.get(&id).cloned().ok_or(StoreError::UnknownPick(id))
    }

    fn picks_owned_by(&self, team_id: TeamId) -> Result<Vec<PickRecord>, StoreError> {
        Ok(self
            .picks
            .values()
            .filter(|dp| dp.team_id == team_id)
            .cloned()
            .collect())
    }

    fn prospects(&self) -> Result<Vec<Prospect>, StoreError> {
        Ok(self.prospects.clone())
    }

    fn commit_trade(
        &mut self,
        event: &TradeEvent,
        games_until_tradable: u32,
    ) -> Result<(), StoreError> {
        // Validate everything up front so a bad id leaves the league untouched.
        for k in 0..2 {
            let team_id = event.team_ids[k];
            if !self.teams.contains_key(&team_id) {
                return Err(StoreError::UnknownTeam(team_id));
            }
            for pid in &event.player_ids[k] {
                if !self.players.contains_key(pid) {
                    return Err(StoreError::UnknownPlayer(*pid));
                }
            }
            for dpid in &event.pick_ids[k] {
                if !self.picks.contains_key(dpid) {
                    return Err(StoreError::UnknownPick(*dpid));
                }
            }
        }

        for k in 0..2 {
            let from = event.team_ids[k];
            let to = event.team_ids[1 - k];
            let mut salary_moved: i64 = 0;

            for pid in &event.player_ids[k] {
                if let Some(p) = self.players.get_mut(pid) {
                    p.team_id = to;
                    p.games_until_tradable = games_until_tradable;
                    salary_moved += i64::from(p.contract.amount);
                }
            }
            for dpid in &event.pick_ids[k] {
                if let Some(dp) = self.picks.get_mut(dpid) {
                    dp.team_id = to;
                }
            }

            if let Some(t) = self.teams.get_mut(&from) {
                t.cap_space += salary_moved;
            }
            if let Some(t) = self.teams.get_mut(&to) {
                t.cap_space -= salary_moved;
            }
        }

        self.events.push(event.clone());
        Ok(())
    }

    fn trade_events(&self) -> Result<Vec<TradeEvent>, StoreError> {
        Ok(self.events.clone())
    }
}
