// Configuration loading and parsing (league.toml, trade.toml).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::league::{Skill, TeamId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub trade: TradeConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    /// All money figures are in thousands of dollars.
    pub salary_cap: u32,
    pub min_contract: u32,
    pub max_contract: u32,
    /// Regular season length.
    pub num_games: u32,
    /// The human-controlled team.
    pub user_team_id: TeamId,
    pub rookie_scale: RookieScale,
}

/// Rookie contract amounts by overall pick index (first round, then second).
#[derive(Debug, Clone, Deserialize)]
pub struct RookieScale {
    pub salaries: Vec<u32>,
}

// ---------------------------------------------------------------------------
// trade.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire trade.toml file.
#[derive(Debug, Clone, Deserialize)]
struct TradeFile {
    valuation: ValuationConfig,
    skills: HashMap<String, u32>,
    negotiation: NegotiationConfig,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// The public trade config assembled from the trade.toml sections.
#[derive(Debug, Clone)]
pub struct TradeConfig {
    pub valuation: ValuationConfig,
    /// How many players with each skill a team wants on its roster.
    pub skill_targets: BTreeMap<Skill, u32>,
    pub negotiation: NegotiationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    /// AI teams inflate their own outgoing assets by this fraction.
    pub self_overvaluation: f64,
    /// Value below which an asset is worth nothing in a trade.
    pub value_baseline: f64,
    /// Score returned when a team is asked to give up too many picks.
    pub too_many_picks_score: f64,
    pub max_picks_given: usize,
    /// Added to every prospect when pricing future picks.
    pub prospect_bonus: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NegotiationConfig {
    /// Assets the deal builder may add before giving up.
    pub max_assets_added: usize,
    /// Cooldown applied to players who change teams.
    pub games_until_tradable: u32,
    /// Lowest counterparty score an AI-to-AI trade may commit at.
    pub ai_sanity_margin: f64,
    /// Chance per simulated day that two AI teams attempt a trade.
    pub ai_trade_chance: f64,
    /// Over-the-cap teams may take back at most this percentage of the
    /// salary they send out.
    pub soft_cap_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub teams: String,
    pub players: String,
    pub picks: String,
    pub prospects: String,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationConfig {
            self_overvaluation: 0.05,
            value_baseline: 45.0,
            too_many_picks_score: -1000.0,
            max_picks_given: 2,
            prospect_bonus: 4.0,
        }
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        NegotiationConfig {
            max_assets_added: 5,
            games_until_tradable: 15,
            ai_sanity_margin: -15.0,
            ai_trade_chance: 0.05,
            soft_cap_ratio: 125.0,
        }
    }
}

/// Roster construction targets: about five shooters, three ball handlers,
/// two interior defenders, and so on.
pub fn default_skill_targets() -> BTreeMap<Skill, u32> {
    BTreeMap::from([
        (Skill::ThreePoint, 5),
        (Skill::Athlete, 5),
        (Skill::BallHandler, 3),
        (Skill::InteriorDefender, 2),
        (Skill::PerimeterDefender, 2),
        (Skill::PostScorer, 2),
        (Skill::Passer, 4),
        (Skill::Rebounder, 3),
    ])
}

impl Default for TradeConfig {
    fn default() -> Self {
        TradeConfig {
            valuation: ValuationConfig::default(),
            skill_targets: default_skill_targets(),
            negotiation: NegotiationConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Read `config/league.toml` and `config/trade.toml` under `base_dir` and
/// validate the result. Missing files are an error here; `load_config` fills
/// them in from `defaults/` first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");
    let league: LeagueFile = parse_toml(&config_dir.join("league.toml"))?;
    let trade: TradeFile = parse_toml(&config_dir.join("trade.toml"))?;

    let config = Config {
        league: league.league,
        trade: TradeConfig {
            valuation: trade.valuation,
            skill_targets: parse_skill_targets(&trade.skills)?,
            negotiation: trade.negotiation,
        },
        db_path: trade.database.path,
        data_paths: trade.data_paths,
    };
    validate(&config)?;
    Ok(config)
}

/// Copy every file in `defaults/` that has no counterpart in `config/`,
/// leaving edited files alone. `.example` files are never copied. Returns
/// the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "no defaults/ or config/ directory under {}; start courtside from the project root",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut copied = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let Some(name) = source.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !source.is_file() || name.ends_with(".example") {
            continue;
        }

        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| {
            copy_error(format!(
                "cannot copy {} to {}: {e}",
                source.display(),
                target.display()
            ))
        })?;
        copied.push(target);
    }
    Ok(copied)
}

/// `load_config_from` the working directory after filling in defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

fn parse_skill_targets(raw: &HashMap<String, u32>) -> Result<BTreeMap<Skill, u32>, ConfigError> {
    let mut targets = BTreeMap::new();
    for (tag, &count) in raw {
        let skill = Skill::from_tag(tag).ok_or_else(|| ConfigError::ValidationError {
            field: format!("skills.{tag}"),
            message: "unknown skill tag".into(),
        })?;
        targets.insert(skill, count);
    }
    Ok(targets)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    let positive_fields: &[(&str, u64)] = &[
        ("league.num_teams", league.num_teams as u64),
        ("league.salary_cap", u64::from(league.salary_cap)),
        ("league.min_contract", u64::from(league.min_contract)),
        ("league.num_games", u64::from(league.num_games)),
    ];
    for (name, val) in positive_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be greater than 0".into(),
            });
        }
    }

    if league.max_contract < league.min_contract {
        return Err(ConfigError::ValidationError {
            field: "league.max_contract".into(),
            message: format!(
                "must be at least min_contract ({}), got {}",
                league.min_contract, league.max_contract
            ),
        });
    }

    if league.rookie_scale.salaries.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.rookie_scale.salaries".into(),
            message: "must list at least one salary".into(),
        });
    }

    if league.user_team_id as usize >= league.num_teams {
        return Err(ConfigError::ValidationError {
            field: "league.user_team_id".into(),
            message: format!("must be below num_teams ({})", league.num_teams),
        });
    }

    let valuation = &config.trade.valuation;
    if !(0.0..=1.0).contains(&valuation.self_overvaluation) {
        return Err(ConfigError::ValidationError {
            field: "valuation.self_overvaluation".into(),
            message: format!(
                "must be between 0.0 and 1.0 inclusive, got {}",
                valuation.self_overvaluation
            ),
        });
    }
    if valuation.too_many_picks_score >= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "valuation.too_many_picks_score".into(),
            message: format!("must be negative, got {}", valuation.too_many_picks_score),
        });
    }

    let negotiation = &config.trade.negotiation;
    if negotiation.max_assets_added == 0 {
        return Err(ConfigError::ValidationError {
            field: "negotiation.max_assets_added".into(),
            message: "must be > 0".into(),
        });
    }
    if !(0.0..=1.0).contains(&negotiation.ai_trade_chance) {
        return Err(ConfigError::ValidationError {
            field: "negotiation.ai_trade_chance".into(),
            message: format!(
                "must be between 0.0 and 1.0 inclusive, got {}",
                negotiation.ai_trade_chance
            ),
        });
    }
    if negotiation.soft_cap_ratio < 100.0 {
        return Err(ConfigError::ValidationError {
            field: "negotiation.soft_cap_ratio".into(),
            message: format!("must be >= 100, got {}", negotiation.soft_cap_ratio),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LEAGUE_TOML: &str = r#"
[league]
name = "Test League"
num_teams = 30
salary_cap = 90000
min_contract = 750
max_contract = 30000
num_games = 82
user_team_id = 0

[league.rookie_scale]
salaries = [5000, 4500, 4000, 500]
"#;

    const TRADE_TOML: &str = r#"
[valuation]
self_overvaluation = 0.05
value_baseline = 45.0
too_many_picks_score = -1000.0
max_picks_given = 2
prospect_bonus = 4.0

[skills]
"3" = 5
A = 5
B = 3
Di = 2
Dp = 2
Po = 2
Ps = 4
R = 3

[negotiation]
max_assets_added = 5
games_until_tradable = 15
ai_sanity_margin = -15.0
ai_trade_chance = 0.05
soft_cap_ratio = 125.0

[database]
path = "courtside.db"

[data_paths]
teams = "data/teams.csv"
players = "data/players.csv"
picks = "data/picks.csv"
prospects = "data/prospects.csv"
"#;

    /// Write both config files into a fresh temp dir and return its path.
    fn write_config(dir_name: &str, league: &str, trade: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(dir_name);
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("league.toml"), league).unwrap();
        fs::write(config_dir.join("trade.toml"), trade).unwrap();
        tmp
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config() {
        let tmp = write_config("courtside_config_valid", LEAGUE_TOML, TRADE_TOML);
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.name, "Test League");
        assert_eq!(config.league.num_teams, 30);
        assert_eq!(config.league.salary_cap, 90_000);
        assert_eq!(config.league.rookie_scale.salaries, vec![5000, 4500, 4000, 500]);
        assert!((config.trade.valuation.self_overvaluation - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.trade.skill_targets.get(&Skill::ThreePoint), Some(&5));
        assert_eq!(config.trade.skill_targets.get(&Skill::InteriorDefender), Some(&2));
        assert_eq!(config.trade.negotiation.max_assets_added, 5);
        assert_eq!(config.db_path, "courtside.db");
        assert_eq!(config.data_paths.players, "data/players.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_defaults_match_builtin_defaults() {
        let tmp = write_config("courtside_config_defaults", LEAGUE_TOML, TRADE_TOML);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.trade.skill_targets, default_skill_targets());
        assert_eq!(
            config.trade.negotiation.games_until_tradable,
            NegotiationConfig::default().games_until_tradable
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_num_teams_zero() {
        let league = LEAGUE_TOML.replace("num_teams = 30", "num_teams = 0");
        let tmp = write_config("courtside_config_teams_zero", &league, TRADE_TOML);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "league.num_teams");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_max_contract_below_min() {
        let league = LEAGUE_TOML.replace("max_contract = 30000", "max_contract = 500");
        let tmp = write_config("courtside_config_max_contract", &league, TRADE_TOML);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "league.max_contract");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_user_team_out_of_range() {
        let league = LEAGUE_TOML.replace("user_team_id = 0", "user_team_id = 30");
        let tmp = write_config("courtside_config_user_team", &league, TRADE_TOML);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "league.user_team_id");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_overvaluation_out_of_range() {
        let trade = TRADE_TOML.replace("self_overvaluation = 0.05", "self_overvaluation = 1.5");
        let tmp = write_config("courtside_config_overvaluation", LEAGUE_TOML, &trade);
        expect_validation_field(
            load_config_from(&tmp).unwrap_err(),
            "valuation.self_overvaluation",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_negative_pick_sentinel() {
        let trade = TRADE_TOML.replace("too_many_picks_score = -1000.0", "too_many_picks_score = 0.0");
        let tmp = write_config("courtside_config_sentinel", LEAGUE_TOML, &trade);
        expect_validation_field(
            load_config_from(&tmp).unwrap_err(),
            "valuation.too_many_picks_score",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_skill_tag() {
        let trade = TRADE_TOML.replace("R = 3", "Q = 3");
        let tmp = write_config("courtside_config_skill_tag", LEAGUE_TOML, &trade);
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "skills.Q");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_soft_cap_ratio_below_parity() {
        let trade = TRADE_TOML.replace("soft_cap_ratio = 125.0", "soft_cap_ratio = 90.0");
        let tmp = write_config("courtside_config_soft_cap", LEAGUE_TOML, &trade);
        expect_validation_field(
            load_config_from(&tmp).unwrap_err(),
            "negotiation.soft_cap_ratio",
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_trade_toml() {
        let tmp = write_config("courtside_config_missing_trade", LEAGUE_TOML, TRADE_TOML);
        fs::remove_file(tmp.join("config/trade.toml")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("trade.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = write_config("courtside_config_invalid", "this is not valid [[[ toml", TRADE_TOML);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("league.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_existing() {
        let tmp = std::env::temp_dir().join("courtside_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        fs::write(defaults_dir.join("league.toml"), LEAGUE_TOML).unwrap();
        fs::write(defaults_dir.join("trade.toml"), TRADE_TOML).unwrap();
        fs::write(defaults_dir.join("notes.toml.example"), "# example\n").unwrap();
        fs::write(config_dir.join("league.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("trade.toml"));
        assert_eq!(
            fs::read_to_string(config_dir.join("league.toml")).unwrap(),
            "# custom\n"
        );
        assert!(!config_dir.join("notes.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("courtside_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("no defaults/ or config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
