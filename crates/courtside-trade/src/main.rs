// Courtside entry point.
//
// Usage:
//   courtside import [SEASON]     load the CSV league files into the database
//   courtside simulate DAYS [SEED] run DAYS of AI-to-AI trade attempts
//   courtside log                 print the trade log as JSON lines

use courtside_core::config;
use courtside_core::db::Database;
use courtside_core::league::{LeagueContext, LeagueState, LeagueStore, Phase, StoreError};
use courtside_trade::import;
use courtside_trade::trade::{between_ai_teams, AiTradeOutcome};
use courtside_trade::valuation::PickValueCache;

use anyhow::{bail, Context};
use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Courtside starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, ${}k salary cap",
        config.league.name, config.league.num_teams, config.league.salary_cap
    );

    let mut db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("import") => {
            let season = match args.get(1) {
                Some(s) => s.parse().context("season must be a year")?,
                None => chrono::Local::now().year(),
            };
            run_import(&db, &config, season)
        }
        Some("simulate") => {
            let days: u32 = args
                .get(1)
                .context("simulate needs a number of days")?
                .parse()
                .context("days must be a non-negative integer")?;
            let mut rng = match args.get(2) {
                Some(seed) => StdRng::seed_from_u64(seed.parse().context("seed must be an integer")?),
                None => StdRng::from_entropy(),
            };
            run_simulation(&mut db, &config, days, &mut rng)
        }
        Some("log") => {
            for event in db.trade_events()? {
                println!("{}", serde_json::to_string(&event)?);
            }
            Ok(())
        }
        _ => bail!("usage: courtside import [SEASON] | simulate DAYS [SEED] | log"),
    }
}

fn run_import(db: &Database, config: &config::Config, season: i32) -> anyhow::Result<()> {
    let league = import::load_league(&config.data_paths).context("failed to load league CSVs")?;
    league.write_to(db).context("failed to write league to database")?;

    match db.league_state() {
        Ok(state) => info!("Keeping existing league state: {} {}", state.season, state.phase),
        Err(StoreError::Backend(_)) => {
            db.save_league_state(&LeagueState {
                season,
                phase: Phase::RegularSeason,
                free_agency_days_remaining: 0,
                games_remaining: config.league.num_games,
            })?;
            info!("Initialized league state for season {}", season);
        }
        Err(e) => return Err(e.into()),
    }

    println!(
        "Imported {} teams, {} players, {} picks, {} prospects",
        league.teams.len(),
        league.players.len(),
        league.picks.len(),
        league.prospects.len()
    );
    Ok(())
}

fn run_simulation(
    db: &mut Database,
    config: &config::Config,
    days: u32,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let ctx = LeagueContext::load(config, &*db)?;
    let mut cache = PickValueCache::new();
    let mut committed = 0;

    for day in 1..=days {
        if rng.gen_bool(ctx.negotiation.ai_trade_chance) {
            let pick_values = cache.get(&*db, &ctx)?;
            match between_ai_teams(db, &ctx, pick_values, rng)? {
                AiTradeOutcome::Committed(event) => {
                    committed += 1;
                    println!("Day {day}: {}", event.text);
                }
                AiTradeOutcome::Abandoned(reason) => {
                    info!("Day {}: trade attempt abandoned ({})", day, reason);
                }
            }
        }
        db.advance_cooldowns(1)?;
    }

    println!("{committed} trades in {days} days");
    Ok(())
}

/// Log to `logs/courtside.log`; the terminal is kept for command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("courtside.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("courtside=info,courtside_trade=info,courtside_core=info,warn")
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
