// Integration tests for the trade engine.
//
// These drive the public API end-to-end: CSV import into both stores, the
// valuation score, the deal builder, user proposals, the trading block and
// the AI-to-AI driver, checked against the properties every trade must
// respect.

use courtside_core::config::{Config, DataPaths, LeagueConfig, RookieScale, TradeConfig};
use courtside_core::db::Database;
use courtside_core::league::{
    Contract, Injury, LeagueContext, LeagueState, LeagueStore, MemoryLeague, Phase, PickRecord,
    PlayerId, PlayerRecord, Skill, Strategy, TeamId, TeamRecord,
};
use courtside_trade::import::{self, ImportedLeague};
use courtside_trade::trade::{
    between_ai_teams, make_it_work, propose, summary, trading_block_offers, AiTradeOutcome,
    BuildOutcome, ProposeOutcome, TradeProposal, TradeSide,
};
use courtside_trade::valuation::asset::market_worth;
use courtside_trade::valuation::score::aggregate;
use courtside_trade::valuation::{get_pick_values, value_change, AssetChange, PickValueTable};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn league_config(num_teams: usize) -> LeagueConfig {
    LeagueConfig {
        name: "Integration League".into(),
        num_teams,
        salary_cap: 90_000,
        min_contract: 750,
        max_contract: 30_000,
        num_games: 82,
        user_team_id: 0,
        rookie_scale: RookieScale {
            salaries: vec![5000, 4500, 4000, 3500, 3000, 2500, 2000, 1800],
        },
    }
}

fn fixture_config() -> Config {
    Config {
        league: league_config(4),
        trade: TradeConfig::default(),
        db_path: ":memory:".into(),
        data_paths: DataPaths {
            teams: format!("{FIXTURES}/teams.csv"),
            players: format!("{FIXTURES}/players.csv"),
            picks: format!("{FIXTURES}/picks.csv"),
            prospects: format!("{FIXTURES}/prospects.csv"),
        },
    }
}

fn state(phase: Phase) -> LeagueState {
    LeagueState {
        season: 2025,
        phase,
        free_agency_days_remaining: 0,
        games_remaining: 41,
    }
}

fn context(num_teams: usize, phase: Phase) -> LeagueContext {
    LeagueContext::new(&league_config(num_teams), &TradeConfig::default(), state(phase))
}

fn imported() -> ImportedLeague {
    import::load_league(&fixture_config().data_paths).unwrap()
}

/// The four-team fixture league in memory, mid regular season.
fn fixture_league() -> (MemoryLeague, LeagueContext) {
    let league = imported().into_memory(state(Phase::RegularSeason));
    let ctx = LeagueContext::load(&fixture_config(), &league).unwrap();
    (league, ctx)
}

fn fixture_pick_values(league: &MemoryLeague, ctx: &LeagueContext) -> PickValueTable {
    get_pick_values(&league.prospects().unwrap(), ctx)
}

fn team(id: TeamId, strategy: Strategy, cap_space: i64) -> TeamRecord {
    TeamRecord {
        id,
        region: format!("Region{id}"),
        name: format!("Team{id}"),
        abbrev: format!("T{id}"),
        strategy,
        cap_space,
        winning_percentage: 0.5,
    }
}

fn player(
    id: PlayerId,
    team_id: TeamId,
    value: f64,
    amount: u32,
    exp: i32,
    birth_year: i32,
) -> PlayerRecord {
    PlayerRecord {
        id,
        team_id,
        name: format!("Player {id}"),
        value,
        skills: vec![],
        contract: Contract { amount, exp },
        injury: Injury::default(),
        birth_year,
        games_until_tradable: 0,
    }
}

fn pick(id: u32, team_id: TeamId, round: u8, season: i32) -> PickRecord {
    PickRecord {
        id,
        original_team_id: team_id,
        team_id,
        round,
        season,
    }
}

/// A user team plus two AI teams with random rosters and picks.
fn random_league(rng: &mut StdRng) -> MemoryLeague {
    let mut league = MemoryLeague::new(state(Phase::RegularSeason));
    league.insert_team(team(0, Strategy::Contending, 5000));
    for team_id in 1..=2u32 {
        let strategy = if rng.gen_bool(0.5) {
            Strategy::Contending
        } else {
            Strategy::Rebuilding
        };
        league.insert_team(team(team_id, strategy, rng.gen_range(-5000..20_000)));
        for k in 0..rng.gen_range(2..8u32) {
            league.insert_player(player(
                team_id * 100 + k,
                team_id,
                rng.gen_range(40.0..85.0),
                rng.gen_range(750..25_000),
                2025 + rng.gen_range(0..4),
                rng.gen_range(1990..2005),
            ));
        }
        for k in 0..rng.gen_range(0..4u32) {
            let (round, season) = (1 + (k % 2) as u8, 2025 + (k / 2) as i32);
            league.insert_pick(pick(team_id * 100 + k, team_id, round, season));
        }
    }
    league
}

// ===========================================================================
// CSV import
// ===========================================================================

#[test]
fn fixture_csvs_import_completely() {
    let league = imported();
    assert_eq!(league.teams.len(), 4);
    assert_eq!(league.players.len(), 24);
    assert_eq!(league.picks.len(), 16);
    assert_eq!(league.prospects.len(), 14);
    assert_eq!(league.prospects.iter().filter(|p| p.value.is_none()).count(), 2);

    let mills = league.players.iter().find(|p| p.id == 13).unwrap();
    assert_eq!(mills.skills, vec![Skill::ThreePoint, Skill::Athlete, Skill::Passer]);
    assert_eq!(mills.contract, Contract { amount: 30_000, exp: 2028 });

    let swapped = league.picks.iter().find(|dp| dp.id == 11).unwrap();
    assert_eq!(swapped.original_team_id, 2);
    assert_eq!(swapped.team_id, 3);
}

#[test]
fn import_into_database_matches_memory() {
    let league = imported();
    let db = Database::open(":memory:").unwrap();
    league.write_to(&db).unwrap();
    db.save_league_state(&state(Phase::RegularSeason)).unwrap();
    let memory = league.into_memory(state(Phase::RegularSeason));

    assert_eq!(db.teams().unwrap().len(), 4);
    for team_id in 0..4 {
        let mut from_db: Vec<PlayerId> =
            db.players_on_team(team_id).unwrap().iter().map(|p| p.id).collect();
        let mut from_memory: Vec<PlayerId> =
            memory.players_on_team(team_id).unwrap().iter().map(|p| p.id).collect();
        from_db.sort_unstable();
        from_memory.sort_unstable();
        assert_eq!(from_db, from_memory, "roster mismatch for team {team_id}");
        assert_eq!(
            db.picks_owned_by(team_id).unwrap().len(),
            memory.picks_owned_by(team_id).unwrap().len()
        );
    }
    assert_eq!(db.player(19).unwrap().skills, memory.player(19).unwrap().skills);
    assert_eq!(db.league_state().unwrap(), state(Phase::RegularSeason));
}

#[test]
fn fixture_prospects_build_pick_curves() {
    let (league, ctx) = fixture_league();
    let table = fixture_pick_values(&league, &ctx);

    let current = table.season(2025).unwrap();
    assert_eq!(current.len(), 8);
    assert!(approx_eq(current[0], 70.0, 1e-9));

    // Two placeholders priced off the default curve join the 2026 class.
    let next = table.season(2026).unwrap();
    assert_eq!(next.len(), 6);
    assert!(next.windows(2).all(|w| w[0] >= w[1]));
}

// ===========================================================================
// Valuation properties
// ===========================================================================

#[test]
fn empty_change_scores_zero_for_every_team() {
    let (league, ctx) = fixture_league();
    for t in league.teams().unwrap() {
        let dv = value_change(&league, &ctx, t.id, &AssetChange::default(), None).unwrap();
        assert_eq!(dv, 0.0, "team {}", t.id);
    }
}

#[test]
fn adding_a_valuable_player_never_lowers_the_score() {
    let (league, ctx) = fixture_league();
    let table = fixture_pick_values(&league, &ctx);

    for (team_id, outgoing) in [(2, 16), (3, 22)] {
        let base = AssetChange {
            remove_players: vec![outgoing],
            ..AssetChange::default()
        };
        let mut more = base.clone();
        more.add_players.push(7);

        let before = value_change(&league, &ctx, team_id, &base, Some(&table)).unwrap();
        let after = value_change(&league, &ctx, team_id, &more, Some(&table)).unwrap();
        assert!(after >= before, "team {team_id}: {after} < {before}");
    }
}

#[test]
fn one_star_outweighs_two_role_players() {
    let ctx = context(3, Phase::RegularSeason);
    let mut league = MemoryLeague::new(state(Phase::RegularSeason));
    league.insert_team(team(0, Strategy::Contending, 5000));
    league.insert_team(team(1, Strategy::Contending, 20_000));
    league.insert_team(team(2, Strategy::Contending, 20_000));
    // Everyone paid exactly their market rate so only value differs.
    league.insert_player(player(1, 2, 85.0, market_worth(85.0, &ctx), 2026, 2000));
    league.insert_player(player(2, 2, 65.0, market_worth(65.0, &ctx), 2026, 2000));
    league.insert_player(player(3, 2, 65.0, market_worth(65.0, &ctx), 2026, 2000));

    let star = AssetChange {
        add_players: vec![1],
        ..AssetChange::default()
    };
    let role_players = AssetChange {
        add_players: vec![2, 3],
        ..AssetChange::default()
    };
    let one_role_player = AssetChange {
        add_players: vec![2],
        ..AssetChange::default()
    };

    let star_dv = value_change(&league, &ctx, 1, &star, None).unwrap();
    let pair_dv = value_change(&league, &ctx, 1, &role_players, None).unwrap();
    let single_dv = value_change(&league, &ctx, 1, &one_role_player, None).unwrap();
    assert!(star_dv > pair_dv, "{star_dv} <= {pair_dv}");
    assert!(pair_dv <= 2.0 * single_dv);

    assert!(aggregate(&[40.0]) > aggregate(&[20.0, 20.0]));
    assert!(aggregate(&[20.0, 20.0]) <= 2.0 * aggregate(&[20.0]));
}

#[test]
fn giving_up_three_picks_hits_the_sentinel() {
    let (league, ctx) = fixture_league();

    let change = AssetChange {
        remove_picks: vec![1, 5, 9],
        add_players: vec![13],
        ..AssetChange::default()
    };
    let dv = value_change(&league, &ctx, 0, &change, None).unwrap();
    assert_eq!(dv, ctx.valuation.too_many_picks_score);

    let mut proposal = TradeProposal::new(0, 2);
    for dpid in [1, 5, 9] {
        proposal.include_pick(0, dpid);
    }
    proposal.include_player(1, 13);
    let dv = proposal.score_for(0, &league, &ctx, None).unwrap();
    assert_eq!(dv, -1000.0);
}

// ===========================================================================
// Deal builder
// ===========================================================================

#[test]
fn builder_always_terminates_within_bounds() {
    let ctx = context(3, Phase::RegularSeason);
    let table = PickValueTable::with_default_curve(ctx.num_teams);

    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let league = random_league(&mut rng);

        let mut proposal = TradeProposal::new(1, 2);
        let offered = league.players_on_team(1).unwrap();
        proposal.include_player(0, offered[rng.gen_range(0..offered.len())].id);
        if let Some(dp) = league.picks_owned_by(1).unwrap().first() {
            if rng.gen_bool(0.3) {
                proposal.include_pick(0, dp.id);
            }
        }

        let initial = proposal.score_for(1, &league, &ctx, Some(&table)).unwrap();
        match make_it_work(&league, &ctx, proposal, false, &table, &mut rng).unwrap() {
            BuildOutcome::Accepted { proposal, added } => {
                if initial > 0.0 {
                    assert!(added <= 3, "seed {seed}: moderated with {added} additions");
                } else {
                    assert!(
                        added <= ctx.negotiation.max_assets_added,
                        "seed {seed}: {added} additions"
                    );
                }
                let dv = proposal.score_for(1, &league, &ctx, Some(&table)).unwrap();
                assert!(dv > 0.0, "seed {seed}: accepted at {dv}");
            }
            BuildOutcome::Rejected => {}
        }
    }
}

#[test]
fn lopsided_gift_needs_nothing_back() {
    let ctx = context(3, Phase::RegularSeason);
    let table = PickValueTable::with_default_curve(ctx.num_teams);
    let mut league = MemoryLeague::new(state(Phase::RegularSeason));
    league.insert_team(team(0, Strategy::Contending, 5000));
    league.insert_team(team(1, Strategy::Contending, 10_000));
    league.insert_team(team(2, Strategy::Rebuilding, 40_000));
    // A contender with a 70-value core on fair deals.
    league.insert_player(player(1, 1, 80.0, 8000, 2026, 2000));
    league.insert_player(player(2, 1, 70.0, 12_000, 2027, 1999));
    league.insert_player(player(3, 1, 70.0, 12_000, 2027, 1999));
    league.insert_pick(pick(1, 1, 1, 2026));
    // A rebuilding side with a normal roster and picks of its own.
    league.insert_player(player(10, 2, 62.0, 6000, 2026, 2001));
    league.insert_player(player(11, 2, 55.0, 4000, 2027, 1998));
    league.insert_player(player(12, 2, 50.0, 2500, 2026, 2002));
    league.insert_pick(pick(2, 2, 1, 2026));

    let gift = AssetChange {
        add_players: vec![1],
        ..AssetChange::default()
    };
    assert!(value_change(&league, &ctx, 2, &gift, Some(&table)).unwrap() > 0.0);

    let mut proposal = TradeProposal::new(1, 2);
    proposal.include_player(0, 1);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        match make_it_work(&league, &ctx, proposal.clone(), false, &table, &mut rng).unwrap() {
            BuildOutcome::Accepted {
                proposal: built,
                added,
            } => {
                assert_eq!(added, 0, "seed {seed}");
                assert_eq!(built, proposal, "seed {seed}");
                assert!(built.sides[1].is_empty(), "seed {seed}");
            }
            BuildOutcome::Rejected => panic!("seed {seed}: a free star should be accepted"),
        }
    }
}

// ===========================================================================
// Salary cap
// ===========================================================================

#[test]
fn soft_cap_warning_starts_above_125_percent() {
    let ctx = context(3, Phase::RegularSeason);
    let warned = |incoming: u32| {
        let mut league = MemoryLeague::new(state(Phase::RegularSeason));
        league.insert_team(team(0, Strategy::Contending, -5000));
        league.insert_team(team(1, Strategy::Contending, 30_000));
        league.insert_player(player(1, 0, 60.0, 10_000, 2026, 1998));
        league.insert_player(player(2, 1, 60.0, incoming, 2026, 1998));
        let mut proposal = TradeProposal::new(0, 1);
        proposal.include_player(0, 1);
        proposal.include_player(1, 2);
        summary(&league, &ctx, &proposal).unwrap().warning
    };

    assert!(warned(12_500).is_none());
    let warning = warned(12_600).unwrap();
    assert!(warning.contains("Region0 Team0"));
    assert!(warning.contains("126%"));
}

// ===========================================================================
// User proposals and the trading block
// ===========================================================================

#[test]
fn accepted_proposal_is_persisted_in_the_database() {
    let config = fixture_config();
    let mut db = Database::open(&config.db_path).unwrap();
    imported().write_to(&db).unwrap();
    db.save_league_state(&state(Phase::RegularSeason)).unwrap();
    let ctx = LeagueContext::load(&config, &db).unwrap();

    let mut proposal = TradeProposal::new(0, 1);
    proposal.include_player(0, 2);
    match propose(&mut db, &ctx, proposal, false, None).unwrap() {
        ProposeOutcome::Accepted { event, message } => {
            assert_eq!(message, "Trade accepted! \"Nice doing business with you!\"");
            assert_eq!(
                event.text,
                "The Boston Beans traded Ben Brooks to the Denver Dragons for nothing."
            );
        }
        ProposeOutcome::Rejected { message } => panic!("gift rejected: {message}"),
    }

    let moved = db.player(2).unwrap();
    assert_eq!(moved.team_id, 1);
    assert_eq!(moved.games_until_tradable, ctx.negotiation.games_until_tradable);
    assert_eq!(db.team(0).unwrap().cap_space, 17_000);
    assert_eq!(db.team(1).unwrap().cap_space, 11_000);
    assert_eq!(db.trade_events().unwrap().len(), 1);

    // The cooldown now blocks flipping him straight back.
    let mut flip = TradeProposal::new(1, 0);
    flip.include_player(0, 2);
    flip.prune(&db, &ctx).unwrap();
    assert!(flip.sides[0].is_empty());
}

#[test]
fn rejected_proposal_changes_nothing() {
    let (mut league, ctx) = fixture_league();
    let mut proposal = TradeProposal::new(0, 1);
    proposal.include_player(0, 3);
    proposal.include_player(1, 8);

    match propose(&mut league, &ctx, proposal, false, None).unwrap() {
        ProposeOutcome::Rejected { message } => assert!(message.starts_with("Trade rejected!")),
        ProposeOutcome::Accepted { .. } => panic!("an expiring deal for a young starter was accepted"),
    }
    assert_eq!(league.player(8).unwrap().team_id, 1);
    assert!(league.trade_events().unwrap().is_empty());
}

#[test]
fn trading_block_offers_leave_the_package_alone() {
    let (league, ctx) = fixture_league();
    let table = fixture_pick_values(&league, &ctx);
    let mut offered = TradeSide::new(0);
    offered.player_ids.insert(1);

    let mut rng = StdRng::seed_from_u64(11);
    let offers = trading_block_offers(&league, &ctx, &offered, &table, &mut rng).unwrap();

    assert!(!offers.is_empty());
    for offer in &offers {
        assert_ne!(offer.team_id, 0);
        assert_eq!(offer.proposal.sides[0], offered);
        assert_eq!(offer.proposal.sides[1].team_id, offer.team_id);
        assert!(!offer.proposal.sides[1].is_empty());
    }
    assert!(offers.windows(2).all(|w| w[0].user_score >= w[1].user_score));
}

// ===========================================================================
// AI-to-AI trades
// ===========================================================================

#[test]
fn ai_trades_commit_between_ai_teams_only() {
    let mut committed = 0;
    for seed in 0..30 {
        let (mut league, ctx) = fixture_league();
        let before = league.clone();
        let table = fixture_pick_values(&league, &ctx);
        let mut rng = StdRng::seed_from_u64(seed);

        match between_ai_teams(&mut league, &ctx, &table, &mut rng).unwrap() {
            AiTradeOutcome::Committed(event) => {
                committed += 1;
                assert!(!event.team_ids.contains(&ctx.user_team_id));
                assert!(event.player_ids.iter().any(|ids| !ids.is_empty()));
                for k in 0..2 {
                    assert!(
                        !event.player_ids[k].is_empty() || !event.pick_ids[k].is_empty(),
                        "seed {seed}: side {k} gave nothing"
                    );
                }
                for (k, ids) in event.player_ids.iter().enumerate() {
                    for &pid in ids {
                        let p = league.player(pid).unwrap();
                        assert_eq!(p.team_id, event.team_ids[1 - k]);
                        assert_eq!(p.games_until_tradable, 15);
                    }
                }

                // Rebuild the deal against the pre-trade league: the shopping
                // team wanted it and the other side cleared the sanity margin.
                let mut proposal = TradeProposal::new(event.team_ids[0], event.team_ids[1]);
                for k in 0..2 {
                    for &pid in &event.player_ids[k] {
                        proposal.include_player(k, pid);
                    }
                    for &dpid in &event.pick_ids[k] {
                        proposal.include_pick(k, dpid);
                    }
                }
                let initiator = proposal.score_for(1, &before, &ctx, Some(&table)).unwrap();
                let counterparty = proposal.score_for(0, &before, &ctx, Some(&table)).unwrap();
                assert!(initiator > 0.0, "seed {seed}: initiator scored {initiator}");
                assert!(
                    counterparty >= ctx.negotiation.ai_sanity_margin,
                    "seed {seed}: counterparty scored {counterparty}"
                );

                assert_eq!(league.trade_events().unwrap(), vec![event]);
            }
            AiTradeOutcome::Abandoned(_) => {
                assert!(league.trade_events().unwrap().is_empty());
            }
        }
    }
    assert!(committed > 0, "no AI trade went through in 30 attempts");
}

#[test]
fn pick_only_rosters_never_trade() {
    let ctx = context(3, Phase::RegularSeason);
    let mut league = MemoryLeague::new(state(Phase::RegularSeason));
    league.insert_team(team(0, Strategy::Contending, 5000));
    for team_id in 1..=2u32 {
        league.insert_team(team(team_id, Strategy::Rebuilding, 20_000));
        for (k, (round, season)) in [(1, 2025), (2, 2025), (1, 2026)].into_iter().enumerate() {
            league.insert_pick(pick(team_id * 10 + k as u32, team_id, round, season));
        }
    }
    let table = get_pick_values(&[], &ctx);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = between_ai_teams(&mut league, &ctx, &table, &mut rng).unwrap();
        assert!(matches!(outcome, AiTradeOutcome::Abandoned(_)), "seed {seed}");
    }
    assert!(league.trade_events().unwrap().is_empty());

    let all_three = AssetChange {
        remove_picks: vec![10, 11, 12],
        ..AssetChange::default()
    };
    let dv = value_change(&league, &ctx, 1, &all_three, Some(&table)).unwrap();
    assert_eq!(dv, ctx.valuation.too_many_picks_score);
}

#[test]
fn no_ai_trades_after_the_deadline() {
    let (mut league, _) = fixture_league();
    let ctx = LeagueContext::new(
        &league_config(4),
        &TradeConfig::default(),
        state(Phase::AfterTradeDeadline),
    );
    let table = PickValueTable::with_default_curve(ctx.num_teams);
    let mut rng = StdRng::seed_from_u64(3);

    let outcome = between_ai_teams(&mut league, &ctx, &table, &mut rng).unwrap();
    assert!(matches!(outcome, AiTradeOutcome::Abandoned(_)));
    assert!(league.trade_events().unwrap().is_empty());
}
