// League data import from CSV exports (teams, players, picks, prospects).

use std::io::Read;
use std::path::Path;

use courtside_core::config::DataPaths;
use courtside_core::db::Database;
use courtside_core::league::{
    Contract, Injury, LeagueState, MemoryLeague, PickRecord, PlayerRecord, Prospect, Skill,
    Strategy, TeamRecord,
};
use serde::Deserialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV rows (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: u32,
    region: String,
    name: String,
    abbrev: String,
    strategy: String,
    cap_space: i64,
    winning_percentage: f64,
}

/// `skills` is a space-separated list of tags, e.g. `3 Ps`.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: u32,
    team_id: u32,
    name: String,
    value: f64,
    #[serde(default)]
    skills: String,
    contract_amount: u32,
    contract_exp: i32,
    #[serde(default)]
    injury_games: u32,
    birth_year: i32,
    #[serde(default)]
    games_until_tradable: u32,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    id: u32,
    original_team_id: u32,
    team_id: u32,
    round: u8,
    season: i32,
}

/// An empty `value` marks a placeholder prospect.
#[derive(Debug, Deserialize)]
struct RawProspect {
    id: u32,
    draft_year: i32,
    value: Option<f64>,
}

/// Everything read from one set of CSV files.
#[derive(Debug, Clone, Default)]
pub struct ImportedLeague {
    pub teams: Vec<TeamRecord>,
    pub players: Vec<PlayerRecord>,
    pub picks: Vec<PickRecord>,
    pub prospects: Vec<Prospect>,
}

impl ImportedLeague {
    pub fn into_memory(self, state: LeagueState) -> MemoryLeague {
        let mut league = MemoryLeague::new(state);
        for t in self.teams {
            league.insert_team(t);
        }
        for p in self.players {
            league.insert_player(p);
        }
        for dp in self.picks {
            league.insert_pick(dp);
        }
        for p in self.prospects {
            league.insert_prospect(p);
        }
        league
    }

    /// Upsert every record into `db`. Teams go first so roster rows can
    /// reference them.
    pub fn write_to(&self, db: &Database) -> anyhow::Result<()> {
        for t in &self.teams {
            db.upsert_team(t)?;
        }
        for p in &self.players {
            db.upsert_player(p)?;
        }
        for dp in &self.picks {
            db.upsert_pick(dp)?;
        }
        for p in &self.prospects {
            db.upsert_prospect(p)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<TeamRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut teams = Vec::new();
    for result in reader.deserialize::<RawTeam>() {
        match result {
            Ok(raw) => {
                let Some(strategy) = Strategy::from_str_tag(&raw.strategy) else {
                    warn!("skipping team {}: unknown strategy '{}'", raw.id, raw.strategy);
                    continue;
                };
                if !raw.winning_percentage.is_finite() {
                    warn!("skipping team {}: non-finite winning percentage", raw.id);
                    continue;
                }
                teams.push(TeamRecord {
                    id: raw.id,
                    region: raw.region.trim().to_string(),
                    name: raw.name.trim().to_string(),
                    abbrev: raw.abbrev.trim().to_string(),
                    strategy,
                    cap_space: raw.cap_space,
                    winning_percentage: raw.winning_percentage,
                });
            }
            Err(e) => warn!("skipping malformed team row: {}", e),
        }
    }
    Ok(teams)
}

fn parse_skills(player_id: u32, tags: &str) -> Option<Vec<Skill>> {
    let mut skills = Vec::new();
    for tag in tags.split_whitespace() {
        match Skill::from_tag(tag) {
            Some(s) => skills.push(s),
            None => {
                warn!("skipping player {}: unknown skill tag '{}'", player_id, tag);
                return None;
            }
        }
    }
    Some(skills)
}

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        match result {
            Ok(raw) => {
                if !raw.value.is_finite() {
                    warn!("skipping player '{}': non-finite value", raw.name.trim());
                    continue;
                }
                let Some(skills) = parse_skills(raw.id, &raw.skills) else {
                    continue;
                };
                players.push(PlayerRecord {
                    id: raw.id,
                    team_id: raw.team_id,
                    name: raw.name.trim().to_string(),
                    value: raw.value,
                    skills,
                    contract: Contract {
                        amount: raw.contract_amount,
                        exp: raw.contract_exp,
                    },
                    injury: Injury {
                        games_remaining: raw.injury_games,
                    },
                    birth_year: raw.birth_year,
                    games_until_tradable: raw.games_until_tradable,
                });
            }
            Err(e) => warn!("skipping malformed player row: {}", e),
        }
    }
    Ok(players)
}

fn load_picks_from_reader<R: Read>(rdr: R) -> Result<Vec<PickRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut picks = Vec::new();
    for result in reader.deserialize::<RawPick>() {
        match result {
            Ok(raw) => {
                if !(1..=2).contains(&raw.round) {
                    warn!("skipping pick {}: round {} is not 1 or 2", raw.id, raw.round);
                    continue;
                }
                picks.push(PickRecord {
                    id: raw.id,
                    original_team_id: raw.original_team_id,
                    team_id: raw.team_id,
                    round: raw.round,
                    season: raw.season,
                });
            }
            Err(e) => warn!("skipping malformed pick row: {}", e),
        }
    }
    Ok(picks)
}

fn load_prospects_from_reader<R: Read>(rdr: R) -> Result<Vec<Prospect>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut prospects = Vec::new();
    for result in reader.deserialize::<RawProspect>() {
        match result {
            Ok(raw) => {
                if raw.value.is_some_and(|v| !v.is_finite()) {
                    warn!("skipping prospect {}: non-finite value", raw.id);
                    continue;
                }
                prospects.push(Prospect {
                    id: raw.id,
                    draft_year: raw.draft_year,
                    value: raw.value,
                });
            }
            Err(e) => warn!("skipping malformed prospect row: {}", e),
        }
    }
    Ok(prospects)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open_and_load<T, F>(path: &Path, load: F) -> Result<Vec<T>, ImportError>
where
    F: FnOnce(std::fs::File) -> Result<Vec<T>, csv::Error>,
{
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_teams(path: &Path) -> Result<Vec<TeamRecord>, ImportError> {
    open_and_load(path, load_teams_from_reader)
}

pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, ImportError> {
    open_and_load(path, load_players_from_reader)
}

pub fn load_picks(path: &Path) -> Result<Vec<PickRecord>, ImportError> {
    open_and_load(path, load_picks_from_reader)
}

pub fn load_prospects(path: &Path) -> Result<Vec<Prospect>, ImportError> {
    open_and_load(path, load_prospects_from_reader)
}

/// Load all four files and check that every player and pick belongs to a
/// known team.
pub fn load_league(paths: &DataPaths) -> Result<ImportedLeague, ImportError> {
    let teams = load_teams(Path::new(&paths.teams))?;
    let players = load_players(Path::new(&paths.players))?;
    let picks = load_picks(Path::new(&paths.picks))?;
    let prospects = load_prospects(Path::new(&paths.prospects))?;

    if teams.len() < 2 {
        return Err(ImportError::Validation(format!(
            "team CSV produced {} valid rows; at least two teams are needed",
            teams.len()
        )));
    }
    let known = |id: u32| teams.iter().any(|t| t.id == id);
    if let Some(p) = players.iter().find(|p| !known(p.team_id)) {
        return Err(ImportError::Validation(format!(
            "player {} is on unknown team {}",
            p.id, p.team_id
        )));
    }
    if let Some(dp) = picks
        .iter()
        .find(|dp| !known(dp.team_id) || !known(dp.original_team_id))
    {
        return Err(ImportError::Validation(format!(
            "pick {} references an unknown team",
            dp.id
        )));
    }

    info!(
        "Loaded {} teams, {} players, {} picks, {} prospects",
        teams.len(),
        players.len(),
        picks.len(),
        prospects.len()
    );
    Ok(ImportedLeague {
        teams,
        players,
        picks,
        prospects,
    })
}
