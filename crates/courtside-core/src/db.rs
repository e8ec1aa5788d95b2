// SQLite persistence layer for league rosters, picks and the trade log.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::league::{
    Contract, Injury, LeagueState, LeagueStore, Phase, PickId, PickRecord, PlayerId,
    PlayerRecord, Prospect, Skill, StoreError, Strategy, TeamId, TeamRecord, TradeEvent,
};

/// SQLite-backed `LeagueStore`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the league database at `path`, creating missing tables.
    /// `":memory:"` gives a throwaway database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                id                 INTEGER PRIMARY KEY,
                region             TEXT NOT NULL,
                name               TEXT NOT NULL,
                abbrev             TEXT NOT NULL,
                strategy           TEXT NOT NULL,
                cap_space          INTEGER NOT NULL,
                winning_percentage REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS players (
                id                   INTEGER PRIMARY KEY,
                team_id              INTEGER NOT NULL REFERENCES teams(id),
                name                 TEXT NOT NULL,
                value                REAL NOT NULL,
                skills               TEXT NOT NULL,
                contract_amount      INTEGER NOT NULL,
                contract_exp         INTEGER NOT NULL,
                injury_games         INTEGER NOT NULL DEFAULT 0,
                birth_year           INTEGER NOT NULL,
                games_until_tradable INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                id               INTEGER PRIMARY KEY,
                original_team_id INTEGER NOT NULL REFERENCES teams(id),
                team_id          INTEGER NOT NULL REFERENCES teams(id),
                round            INTEGER NOT NULL,
                season           INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS prospects (
                id         INTEGER PRIMARY KEY,
                draft_year INTEGER NOT NULL,
                value      REAL
            );

            CREATE TABLE IF NOT EXISTS trade_events (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                season     INTEGER NOT NULL,
                phase      TEXT NOT NULL,
                team_ids   TEXT NOT NULL,
                player_ids TEXT NOT NULL,
                pick_ids   TEXT NOT NULL,
                text       TEXT NOT NULL,
                timestamp  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS league_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_players_team_id ON players(team_id);
            CREATE INDEX IF NOT EXISTS idx_draft_picks_team_id ON draft_picks(team_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics only if a previous holder of the lock panicked.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // League state (key-value)
    // ------------------------------------------------------------------

    const STATE_KEY: &'static str = "league_state";

    /// Persist the season clock. Uses INSERT OR REPLACE so repeated saves
    /// overwrite the previous value.
    pub fn save_league_state(&self, state: &LeagueState) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(state).context("failed to serialize league state")?;
        conn.execute(
            "INSERT OR REPLACE INTO league_state (key, value) VALUES (?1, ?2)",
            params![Self::STATE_KEY, json_str],
        )
        .context("failed to save league state")?;
        Ok(())
    }

    fn load_league_state(&self) -> Result<LeagueState> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM league_state WHERE key = ?1",
                params![Self::STATE_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query league state")?;
        let json_str = json_str.ok_or_else(|| anyhow!("league state has not been saved"))?;
        serde_json::from_str(&json_str).context("failed to deserialize league state")
    }

    // ------------------------------------------------------------------
    // Imports (upserts)
    // ------------------------------------------------------------------

    pub fn upsert_team(&self, team: &TeamRecord) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO teams
                (id, region, name, abbrev, strategy, cap_space, winning_percentage)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                team.id,
                team.region,
                team.name,
                team.abbrev,
                team.strategy.as_str(),
                team.cap_space,
                team.winning_percentage,
            ],
        )
        .context("failed to upsert team")?;
        Ok(())
    }

    /// Skills are stored as a JSON array of tags (e.g. `["3","Ps"]`).
    pub fn upsert_player(&self, player: &PlayerRecord) -> Result<()> {
        let conn = self.conn();
        let tags: Vec<&str> = player.skills.iter().map(|s| s.tag()).collect();
        let skills_json = serde_json::to_string(&tags).context("failed to serialize skills")?;
        conn.execute(
            "INSERT OR REPLACE INTO players
                (id, team_id, name, value, skills, contract_amount, contract_exp,
                 injury_games, birth_year, games_until_tradable)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                player.id,
                player.team_id,
                player.name,
                player.value,
                skills_json,
                player.contract.amount,
                player.contract.exp,
                player.injury.games_remaining,
                player.birth_year,
                player.games_until_tradable,
            ],
        )
        .context("failed to upsert player")?;
        Ok(())
    }

    pub fn upsert_pick(&self, pick: &PickRecord) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO draft_picks (id, original_team_id, team_id, round, season)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pick.id,
                pick.original_team_id,
                pick.team_id,
                pick.round,
                pick.season,
            ],
        )
        .context("failed to upsert draft pick")?;
        Ok(())
    }

    pub fn upsert_prospect(&self, prospect: &Prospect) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO prospects (id, draft_year, value) VALUES (?1, ?2, ?3)",
            params![prospect.id, prospect.draft_year, prospect.value],
        )
        .context("failed to upsert prospect")?;
        Ok(())
    }

    /// Tick every player's trade cooldown down by `games` (saturating).
    pub fn advance_cooldowns(&self, games: u32) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE players SET games_until_tradable = MAX(games_until_tradable - ?1, 0)",
            params![games],
        )
        .context("failed to advance trade cooldowns")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn query_teams(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<TeamRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql).context("failed to prepare team query")?;
        let raw = stmt
            .query_map(args, |row| {
                Ok((
                    row.get::<_, TeamId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, f64>(6)?,
                ))
            })
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;

        raw.into_iter()
            .map(|(id, region, name, abbrev, strategy, cap_space, winning_percentage)| {
                let strategy = Strategy::from_str_tag(&strategy)
                    .ok_or_else(|| anyhow!("team {id} has unknown strategy '{strategy}'"))?;
                Ok(TeamRecord {
                    id,
                    region,
                    name,
                    abbrev,
                    strategy,
                    cap_space,
                    winning_percentage,
                })
            })
            .collect()
    }

    fn query_players(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<PlayerRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql).context("failed to prepare player query")?;
        let raw = stmt
            .query_map(args, RawPlayer::from_row)
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;
        raw.into_iter().map(RawPlayer::into_record).collect()
    }

    fn query_picks(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<PickRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql).context("failed to prepare pick query")?;
        let picks = stmt
            .query_map(args, |row| {
                Ok(PickRecord {
                    id: row.get(0)?,
                    original_team_id: row.get(1)?,
                    team_id: row.get(2)?,
                    round: row.get(3)?,
                    season: row.get(4)?,
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;
        Ok(picks)
    }

    /// Shared body of `commit_trade`: one transaction, rolled back on error.
    fn apply_trade(&self, event: &TradeEvent, games_until_tradable: u32) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin trade transaction")?;

        for k in 0..2 {
            let from = event.team_ids[k];
            let to = event.team_ids[1 - k];
            let mut salary_moved: i64 = 0;

            for pid in &event.player_ids[k] {
                let amount: i64 = tx
                    .query_row(
                        "SELECT contract_amount FROM players WHERE id = ?1 AND team_id = ?2",
                        params![pid, from],
                        |row| row.get(0),
                    )
                    .optional()
                    .context("failed to look up traded player")?
                    .ok_or_else(|| anyhow!("player {pid} is not on team {from}"))?;
                tx.execute(
                    "UPDATE players SET team_id = ?1, games_until_tradable = ?2 WHERE id = ?3",
                    params![to, games_until_tradable, pid],
                )
                .context("failed to transfer player")?;
                salary_moved += amount;
            }

            for dpid in &event.pick_ids[k] {
                let changed = tx
                    .execute(
                        "UPDATE draft_picks SET team_id = ?1 WHERE id = ?2 AND team_id = ?3",
                        params![to, dpid, from],
                    )
                    .context("failed to transfer draft pick")?;
                if changed == 0 {
                    return Err(anyhow!("draft pick {dpid} is not held by team {from}"));
                }
            }

            tx.execute(
                "UPDATE teams SET cap_space = cap_space + ?1 WHERE id = ?2",
                params![salary_moved, from],
            )
            .context("failed to update cap space")?;
            tx.execute(
                "UPDATE teams SET cap_space = cap_space - ?1 WHERE id = ?2",
                params![salary_moved, to],
            )
            .context("failed to update cap space")?;
        }

        let team_ids = serde_json::to_string(&event.team_ids).context("failed to serialize team ids")?;
        let player_ids =
            serde_json::to_string(&event.player_ids).context("failed to serialize player ids")?;
        let pick_ids =
            serde_json::to_string(&event.pick_ids).context("failed to serialize pick ids")?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        tx.execute(
            "INSERT INTO trade_events (season, phase, team_ids, player_ids, pick_ids, text, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.season,
                event.phase.as_str(),
                team_ids,
                player_ids,
                pick_ids,
                event.text,
                timestamp,
            ],
        )
        .context("failed to log trade event")?;

        tx.commit().context("failed to commit trade")?;
        debug!(
            "trade between teams {} and {} written to the database",
            event.team_ids[0], event.team_ids[1]
        );
        Ok(())
    }

    fn load_trade_events(&self) -> Result<Vec<TradeEvent>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT season, phase, team_ids, player_ids, pick_ids, text
                 FROM trade_events ORDER BY id",
            )
            .context("failed to prepare trade event query")?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .context("failed to query trade events")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map trade event rows")?;

        raw.into_iter()
            .map(|(season, phase, team_ids, player_ids, pick_ids, text)| {
                Ok(TradeEvent {
                    season,
                    phase: Phase::from_str_phase(&phase)
                        .ok_or_else(|| anyhow!("unknown phase '{phase}' in trade log"))?,
                    team_ids: serde_json::from_str(&team_ids)
                        .context("failed to deserialize team ids")?,
                    player_ids: serde_json::from_str(&player_ids)
                        .context("failed to deserialize player ids")?,
                    pick_ids: serde_json::from_str(&pick_ids)
                        .context("failed to deserialize pick ids")?,
                    text,
                })
            })
            .collect()
    }
}

const PLAYER_COLUMNS: &str = "id, team_id, name, value, skills, contract_amount, contract_exp,
     injury_games, birth_year, games_until_tradable";

/// Player row before skill tags are parsed.
struct RawPlayer {
    id: PlayerId,
    team_id: TeamId,
    name: String,
    value: f64,
    skills_json: String,
    contract_amount: u32,
    contract_exp: i32,
    injury_games: u32,
    birth_year: i32,
    games_until_tradable: u32,
}

impl RawPlayer {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawPlayer {
            id: row.get(0)?,
            team_id: row.get(1)?,
            name: row.get(2)?,
            value: row.get(3)?,
            skills_json: row.get(4)?,
            contract_amount: row.get(5)?,
            contract_exp: row.get(6)?,
            injury_games: row.get(7)?,
            birth_year: row.get(8)?,
            games_until_tradable: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<PlayerRecord> {
        let tags: Vec<String> = serde_json::from_str(&self.skills_json)
            .with_context(|| format!("failed to parse skills for player {}", self.id))?;
        let skills = tags
            .iter()
            .map(|t| {
                Skill::from_tag(t)
                    .ok_or_else(|| anyhow!("player {} has unknown skill tag '{t}'", self.id))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PlayerRecord {
            id: self.id,
            team_id: self.team_id,
            name: self.name,
            value: self.value,
            skills,
            contract: Contract {
                amount: self.contract_amount,
                exp: self.contract_exp,
            },
            injury: Injury {
                games_remaining: self.injury_games,
            },
            birth_year: self.birth_year,
            games_until_tradable: self.games_until_tradable,
        })
    }
}

impl LeagueStore for Database {
    fn league_state(&self) -> Result<LeagueState, StoreError> {
        Ok(self.load_league_state()?)
    }

    fn team(&self, id: TeamId) -> Result<TeamRecord, StoreError> {
        self.query_teams(
            "SELECT id, region, name, abbrev, strategy, cap_space, winning_percentage
             FROM teams WHERE id = ?1",
            &[&id],
        )?
        .into_iter()
        .next()
        .ok_or(StoreError::UnknownTeam(id))
    }

    fn teams(&self) -> Result<Vec<TeamRecord>, StoreError> {
        Ok(self.query_teams(
            "SELECT id, region, name, abbrev, strategy, cap_space, winning_percentage
             FROM teams ORDER BY id",
            &[],
        )?)
    }

    fn player(&self, id: PlayerId) -> Result<PlayerRecord, StoreError> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?1");
        self.query_players(&sql, &[&id])?
            .into_iter()
            .next()
            .ok_or(StoreError::UnknownPlayer(id))
    }

    fn players_on_team(&self, team_id: TeamId) -> Result<Vec<PlayerRecord>, StoreError> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE team_id = ?1 ORDER BY id");
        Ok(self.query_players(&sql, &[&team_id])?)
    }

    fn pick(&self, id: PickId) -> Result<PickRecord, StoreError> {
        self.query_picks(
            "SELECT id, original_team_id, team_id, round, season FROM draft_picks WHERE id = ?1",
            &[&id],
        )?
        .into_iter()
        .next()
        .ok_or(StoreError::UnknownPick(id))
    }

    fn picks_owned_by(&self, team_id: TeamId) -> Result<Vec<PickRecord>, StoreError> {
        Ok(self.query_picks(
            "SELECT id, original_team_id, team_id, round, season
             FROM draft_picks WHERE team_id = ?1 ORDER BY id",
            &[&team_id],
        )?)
    }

    fn prospects(&self) -> Result<Vec<Prospect>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, draft_year, value FROM prospects ORDER BY id")
            .context("failed to prepare prospect query")?;
        let prospects = stmt
            .query_map([], |row| {
                Ok(Prospect {
                    id: row.get(0)?,
                    draft_year: row.get(1)?,
                    value: row.get(2)?,
                })
            })
            .context("failed to query prospects")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map prospect rows")?;
        Ok(prospects)
    }

    fn commit_trade(
        &mut self,
        event: &TradeEvent,
        games_until_tradable: u32,
    ) -> Result<(), StoreError> {
        Ok(self.apply_trade(event, games_until_tradable)?)
    }

    fn trade_events(&self) -> Result<Vec<TradeEvent>, StoreError> {
        Ok(self.load_trade_events()?)
    }
}
