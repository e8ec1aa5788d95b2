// League records read and written by the trade engine, and the store trait
// that abstracts where they live.

pub mod context;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use context::LeagueContext;
pub use memory::MemoryLeague;

// Database ID types.
pub type PlayerId = u32;
pub type PickId = u32;
pub type TeamId = u32;

// ---------------------------------------------------------------------------
// Team strategy
// ---------------------------------------------------------------------------

/// Team-level tag biasing how assets are valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Contending,
    Rebuilding,
}

impl Strategy {
    pub fn from_str_tag(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contending" => Some(Strategy::Contending),
            "rebuilding" => Some(Strategy::Rebuilding),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Contending => "contending",
            Strategy::Rebuilding => "rebuilding",
        }
    }
}

// ---------------------------------------------------------------------------
// Skill tags
// ---------------------------------------------------------------------------

/// Composite rating badges a player can carry. Teams want a certain number
/// of each on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    ThreePoint,
    Athlete,
    BallHandler,
    InteriorDefender,
    PerimeterDefender,
    PostScorer,
    Passer,
    Rebounder,
}

impl Skill {
    pub const ALL: [Skill; 8] = [
        Skill::ThreePoint,
        Skill::Athlete,
        Skill::BallHandler,
        Skill::InteriorDefender,
        Skill::PerimeterDefender,
        Skill::PostScorer,
        Skill::Passer,
        Skill::Rebounder,
    ];

    /// Parse a short skill tag ("3", "A", "B", "Di", "Dp", "Po", "Ps", "R").
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim() {
            "3" => Some(Skill::ThreePoint),
            "A" => Some(Skill::Athlete),
            "B" => Some(Skill::BallHandler),
            "Di" => Some(Skill::InteriorDefender),
            "Dp" => Some(Skill::PerimeterDefender),
            "Po" => Some(Skill::PostScorer),
            "Ps" => Some(Skill::Passer),
            "R" => Some(Skill::Rebounder),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Skill::ThreePoint => "3",
            Skill::Athlete => "A",
            Skill::BallHandler => "B",
            Skill::InteriorDefender => "Di",
            Skill::PerimeterDefender => "Dp",
            Skill::PostScorer => "Po",
            Skill::Passer => "Ps",
            Skill::Rebounder => "R",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// Season phase
// ---------------------------------------------------------------------------

/// Where the league is in its yearly cycle. Ordering follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preseason,
    RegularSeason,
    AfterTradeDeadline,
    Playoffs,
    DraftLottery,
    Draft,
    AfterDraft,
    ResignPlayers,
    FreeAgency,
}

impl Phase {
    pub fn from_str_phase(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "preseason" => Some(Phase::Preseason),
            "regular_season" => Some(Phase::RegularSeason),
            "after_trade_deadline" => Some(Phase::AfterTradeDeadline),
            "playoffs" => Some(Phase::Playoffs),
            "draft_lottery" => Some(Phase::DraftLottery),
            "draft" => Some(Phase::Draft),
            "after_draft" => Some(Phase::AfterDraft),
            "resign_players" => Some(Phase::ResignPlayers),
            "free_agency" => Some(Phase::FreeAgency),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preseason => "preseason",
            Phase::RegularSeason => "regular_season",
            Phase::AfterTradeDeadline => "after_trade_deadline",
            Phase::Playoffs => "playoffs",
            Phase::DraftLottery => "draft_lottery",
            Phase::Draft => "draft",
            Phase::AfterDraft => "after_draft",
            Phase::ResignPlayers => "resign_players",
            Phase::FreeAgency => "free_agency",
        }
    }

    /// Whether trades may be negotiated in this phase. The window closes at
    /// the trade deadline and reopens once the playoffs are over.
    pub fn trading_allowed(&self) -> bool {
        !matches!(self, Phase::AfterTradeDeadline | Phase::Playoffs)
    }

    /// Re-signing, free agency and the preseason: the stretch where teams
    /// with cap space are shopping for free agents.
    pub fn is_free_agency_window(&self) -> bool {
        matches!(
            self,
            Phase::ResignPlayers | Phase::FreeAgency | Phase::Preseason
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Salary terms. `amount` is in thousands of dollars per season; `exp` is the
/// last season the contract covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub amount: u32,
    pub exp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Injury {
    pub games_remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub team_id: TeamId,
    pub name: String,
    /// Externally supplied trade value (roughly 40 for a fringe player, 80+
    /// for a star).
    pub value: f64,
    pub skills: Vec<Skill>,
    pub contract: Contract,
    #[serde(default)]
    pub injury: Injury,
    pub birth_year: i32,
    /// Games left before a recently acquired player may be traded again.
    #[serde(default)]
    pub games_until_tradable: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRecord {
    pub id: PickId,
    /// Team whose record decides the draft slot.
    pub original_team_id: TeamId,
    /// Team currently holding the pick.
    pub team_id: TeamId,
    pub round: u8,
    pub season: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub region: String,
    pub name: String,
    pub abbrev: String,
    pub strategy: Strategy,
    /// Salary cap minus payroll, in thousands. Negative when over the cap.
    pub cap_space: i64,
    /// Winning percentage over the most recent games, 0.0..=1.0.
    pub winning_percentage: f64,
}

impl TeamRecord {
    /// "Region Name", e.g. "Boston Beans".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.region, self.name)
    }

    pub fn payroll(&self, salary_cap: u32) -> i64 {
        i64::from(salary_cap) - self.cap_space
    }
}

/// An undrafted player in a future draft class. `value` is `None` while the
/// prospect is only a placeholder that has not been generated yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    pub id: PlayerId,
    pub draft_year: i32,
    pub value: Option<f64>,
}

/// The season clock as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueState {
    pub season: i32,
    pub phase: Phase,
    #[serde(default)]
    pub free_agency_days_remaining: u32,
    #[serde(default)]
    pub games_remaining: u32,
}

/// One committed trade. `player_ids[k]` and `pick_ids[k]` are the assets
/// `team_ids[k]` gave up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub season: i32,
    pub phase: Phase,
    pub team_ids: [TeamId; 2],
    pub player_ids: [Vec<PlayerId>; 2],
    pub pick_ids: [Vec<PickId>; 2],
    pub text: String,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown player id {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown draft pick id {0}")]
    UnknownPick(PickId),

    #[error("unknown team id {0}")]
    UnknownTeam(TeamId),

    #[error("store backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

/// Persistent team/roster/contract store consumed by the trade engine.
///
/// Reads are expected to reflect the live state on every call; the engine
/// does not snapshot. Unknown ids are reported as `StoreError::Unknown*`.
pub trait LeagueStore {
    fn league_state(&self) -> Result<LeagueState, StoreError>;

    fn team(&self, id: TeamId) -> Result<TeamRecord, StoreError>;

    /// All teams, ordered by id.
    fn teams(&self) -> Result<Vec<TeamRecord>, StoreError>;

    fn player(&self, id: PlayerId) -> Result<PlayerRecord, StoreError>;

    /// Players on `team_id`, ordered by id.
    fn players_on_team(&self, team_id: TeamId) -> Result<Vec<PlayerRecord>, StoreError>;

    fn pick(&self, id: PickId) -> Result<PickRecord, StoreError>;

    /// Picks currently held by `team_id`, ordered by id.
    fn picks_owned_by(&self, team_id: TeamId) -> Result<Vec<PickRecord>, StoreError>;

    /// Every undrafted prospect across all future draft classes.
    fn prospects(&self) -> Result<Vec<Prospect>, StoreError>;

    /// Apply a trade: move each side's players and picks to the other team,
    /// set the moved players' trade cooldown, shift cap space by the salary
    /// exchanged, and append `event` to the trade log.
    fn commit_trade(
        &mut self,
        event: &TradeEvent,
        games_until_tradable: u32,
    ) -> Result<(), StoreError>;

    /// The trade log, oldest first.
    fn trade_events(&self) -> Result<Vec<TradeEvent>, StoreError>;
}
