// Explicit league context threaded through valuation and negotiation.

use std::collections::BTreeMap;

use crate::config::{Config, LeagueConfig, NegotiationConfig, TradeConfig, ValuationConfig};

use super::{LeagueState, LeagueStore, Phase, Skill, StoreError, TeamId};

/// Everything the trade engine needs to know about the league besides the
/// rosters themselves: static rules from config plus the current clock.
#[derive(Debug, Clone)]
pub struct LeagueContext {
    pub salary_cap: u32,
    pub min_contract: u32,
    pub max_contract: u32,
    pub num_teams: usize,
    pub num_games: u32,
    pub user_team_id: TeamId,
    pub rookie_scale: Vec<u32>,
    pub season: i32,
    pub phase: Phase,
    pub free_agency_days_remaining: u32,
    pub games_remaining: u32,
    pub valuation: ValuationConfig,
    pub skill_targets: BTreeMap<Skill, u32>,
    pub negotiation: NegotiationConfig,
}

impl LeagueContext {
    pub fn new(league: &LeagueConfig, trade: &TradeConfig, state: LeagueState) -> Self {
        LeagueContext {
            salary_cap: league.salary_cap,
            min_contract: league.min_contract,
            max_contract: league.max_contract,
            num_teams: league.num_teams,
            num_games: league.num_games,
            user_team_id: league.user_team_id,
            rookie_scale: league.rookie_scale.salaries.clone(),
            season: state.season,
            phase: state.phase,
            free_agency_days_remaining: state.free_agency_days_remaining,
            games_remaining: state.games_remaining,
            valuation: trade.valuation.clone(),
            skill_targets: trade.skill_targets.clone(),
            negotiation: trade.negotiation.clone(),
        }
    }

    /// Build a context from config and the store's current clock.
    pub fn load(config: &Config, store: &impl LeagueStore) -> Result<Self, StoreError> {
        let state = store.league_state()?;
        Ok(Self::new(&config.league, &config.trade, state))
    }

    /// Refresh the clock fields after the simulation advanced.
    pub fn set_state(&mut self, state: LeagueState) {
        self.season = state.season;
        self.phase = state.phase;
        self.free_agency_days_remaining = state.free_agency_days_remaining;
        self.games_remaining = state.games_remaining;
    }

    pub fn is_user_team(&self, team_id: TeamId) -> bool {
        team_id == self.user_team_id
    }

    /// Seasons of salary still owed on a contract expiring after season
    /// `exp`, counting the unplayed fraction of the current season.
    pub fn contract_seasons_remaining(&self, exp: i32) -> f64 {
        let current_fraction = match self.phase {
            Phase::Preseason => 1.0,
            Phase::RegularSeason if self.num_games > 0 => {
                f64::from(self.games_remaining.min(self.num_games)) / f64::from(self.num_games)
            }
            _ => 0.0,
        };
        (f64::from(exp - self.season) + current_fraction).max(0.0)
    }

    /// Rookie contract for the pick at overall `index`; picks past the end
    /// of the scale get its last entry.
    pub fn rookie_salary(&self, index: usize) -> u32 {
        self.rookie_scale
            .get(index)
            .or_else(|| self.rookie_scale.last())
            .copied()
            .unwrap_or(self.min_contract)
    }
}
