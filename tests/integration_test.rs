//! Integration tests for the engine and the polling worker.
//!
//! Tests cover:
//! - Engine scenarios across several ticks (gale ladder, white, duplicates)
//! - Tenant independence and malformed-strategy isolation
//! - Worker polling with mock feed, strategy store, notifier and result log
//! - Dispatch failure handling
//! - SQLite-backed strategy store and result log

mod common;

use common::*;
use ghostsignal::domain::engine::Engine;
use ghostsignal::domain::error::GhostError;
use ghostsignal::domain::gale::Resolution;
use ghostsignal::domain::outcome::{Color, ColorScheme};
use ghostsignal::domain::signal::ResultKind;
use ghostsignal::domain::strategy::{PatternElement, StrategyKind};
use ghostsignal::worker::Worker;
use std::time::Duration;

mod engine_scenarios {
    use super::*;

    #[test]
    fn black_black_black_opens_then_gales() {
        let strategies = vec![color_strategy("S1", "U", &[black(), black()], Color::Red, 2)];
        let mut engine = Engine::new();
        let run = color_run(&[Color::Black, Color::Black, Color::Black], 0);

        let t1 = engine.tick(run[0], &strategies);
        assert!(t1.opened.is_empty());
        assert!(engine.tracker("U", "S1").is_none());

        let t2 = engine.tick(run[1], &strategies);
        assert_eq!(t2.opened.len(), 1);
        assert_eq!(t2.opened[0].strategy_id, "S1");
        assert!(t2.advanced.is_empty());

        let t3 = engine.tick(run[2], &strategies);
        assert!(t3.opened.is_empty());
        assert_eq!(t3.advanced.len(), 1);
        assert_eq!(t3.advanced[0].gale, 1);
        let tracker = engine.tracker("U", "S1").unwrap();
        assert!(tracker.is_open());
        assert_eq!(tracker.gale_count, 1);
    }

    #[test]
    fn full_ladder_ends_in_loss_and_frees_the_pair() {
        let strategies = vec![color_strategy("S1", "U", &[black(), black()], Color::Red, 2)];
        let mut engine = Engine::new();
        let run = color_run(
            &[Color::Black, Color::Black, Color::Black, Color::Black, Color::Black],
            0,
        );

        let mut results = run.iter().map(|o| engine.tick(*o, &strategies));
        let _ = results.next();
        assert_eq!(results.next().unwrap().opened.len(), 1);
        assert_eq!(results.next().unwrap().advanced[0].gale, 1);
        assert_eq!(results.next().unwrap().advanced[0].gale, 2);

        let last = results.next().unwrap();
        assert_eq!(last.resolved.len(), 1);
        assert_eq!(last.resolved[0].resolution, Resolution::Loss);
        // the suffix still matches, but the gate ran before resolution
        assert!(last.opened.is_empty());
        drop(results);
        assert!(engine.tracker("U", "S1").is_none());

        let next = engine.tick(outcome(12, Color::Black, 1000), &strategies);
        assert_eq!(next.opened.len(), 1);
    }

    #[test]
    fn white_resolves_regardless_of_gale() {
        let strategies = vec![color_strategy("S1", "U", &[black(), black()], Color::Red, 2)];
        let mut engine = Engine::new();
        for o in color_run(&[Color::Black, Color::Black, Color::Black, Color::White], 0) {
            let tick = engine.tick(o, &strategies);
            if o.color == Color::White {
                assert_eq!(tick.resolved.len(), 1);
                assert_eq!(tick.resolved[0].resolution, Resolution::White);
                assert_eq!(tick.resolved[0].gales_used, 1);
            }
        }
        assert_eq!(engine.open_trackers().count(), 0);
    }

    #[test]
    fn wildcard_strategy_matches_any_second_color() {
        let strategies = vec![color_strategy(
            "W",
            "U",
            &[red(), PatternElement::Wildcard],
            Color::Black,
            1,
        )];

        for second in [Color::White, Color::Black, Color::Red] {
            let mut engine = Engine::new();
            let run = color_run(&[Color::Red, second], 0);
            engine.tick(run[0], &strategies);
            assert_eq!(engine.tick(run[1], &strategies).opened.len(), 1, "{second:?}");
        }

        let mut engine = Engine::new();
        let run = color_run(&[Color::Black, Color::Red], 0);
        engine.tick(run[0], &strategies);
        assert!(engine.tick(run[1], &strategies).opened.is_empty());
    }

    #[test]
    fn number_pattern_is_suffix_only() {
        let strategies = vec![number_strategy("N", "U", &[8, 8], 14, 1)];
        let mut engine = Engine::new();
        engine.tick(outcome(8, Color::Black, 0), &strategies);
        assert_eq!(engine.tick(outcome(8, Color::Black, 30), &strategies).opened.len(), 1);

        // [8, 8, 3]: only the trailing [8, 3] is compared
        let tail_pattern = vec![number_strategy("T", "U", &[8, 3], 14, 1)];
        let mut engine = Engine::new();
        engine.tick(outcome(8, Color::Black, 0), &tail_pattern);
        assert!(engine.tick(outcome(8, Color::Black, 30), &tail_pattern).opened.is_empty());
        assert_eq!(engine.tick(outcome(3, Color::Red, 60), &tail_pattern).opened.len(), 1);
    }

    #[test]
    fn number_target_ignores_white_rule() {
        let strategies = vec![number_strategy("N", "U", &[8], 0, 1)];
        let mut engine = Engine::new();
        engine.tick(outcome(8, Color::Black, 0), &strategies);
        let tick = engine.tick(outcome(0, Color::White, 30), &strategies);
        assert_eq!(tick.resolved.len(), 1);
        assert_eq!(tick.resolved[0].resolution, Resolution::Win);
    }

    #[test]
    fn duplicate_outcome_is_a_no_op() {
        let strategies = vec![color_strategy("S1", "U", &[black()], Color::Red, 2)];
        let mut engine = Engine::new();
        let first = outcome(10, Color::Black, 0);

        assert_eq!(engine.tick(first, &strategies).opened.len(), 1);
        let again = engine.tick(first, &strategies);
        assert!(again.is_empty());
        assert_eq!(engine.window().len(), 1);
        assert_eq!(engine.tracker("U", "S1").unwrap().gale_count, 0);
    }

    #[test]
    fn tenants_track_identical_strategies_independently() {
        let strategies = vec![
            color_strategy("S", "alice", &[black()], Color::Red, 1),
            color_strategy("S", "bob", &[red()], Color::Black, 1),
        ];
        let mut engine = Engine::new();

        let t1 = engine.tick(outcome(10, Color::Black, 0), &strategies);
        assert_eq!(t1.opened.len(), 1);
        assert_eq!(t1.opened[0].owner_id, "alice");

        let t2 = engine.tick(outcome(3, Color::Red, 30), &strategies);
        assert_eq!(t2.opened.len(), 1);
        assert_eq!(t2.opened[0].owner_id, "bob");
        assert_eq!(t2.resolved.len(), 1);
        assert_eq!(t2.resolved[0].owner_id, "alice");
        assert_eq!(t2.resolved[0].resolution, Resolution::Win);
        assert!(engine.tracker("bob", "S").unwrap().is_open());
    }

    #[test]
    fn malformed_strategy_does_not_block_others() {
        let mut broken = color_strategy("bad", "U1", &[], Color::Red, 2);
        broken.kind = StrategyKind::Unknown("zigzag".into());
        let mut no_target = color_strategy("none", "U2", &[black()], Color::Red, 2);
        no_target.target = None;
        let strategies = vec![
            broken,
            no_target,
            color_strategy("good", "U3", &[black()], Color::Red, 2),
        ];

        let mut engine = Engine::new();
        let tick = engine.tick(outcome(10, Color::Black, 0), &strategies);
        assert_eq!(tick.opened.len(), 1);
        assert_eq!(tick.opened[0].strategy_id, "good");
    }

    #[test]
    fn disabled_strategies_never_open() {
        let mut strategy = color_strategy("S1", "U", &[black()], Color::Red, 2);
        strategy.enabled = false;
        let mut engine = Engine::new();
        assert!(engine.tick(outcome(10, Color::Black, 0), &[strategy]).is_empty());
    }
}

mod worker_polling {
    use super::*;

    fn double_black() -> Vec<ghostsignal::domain::strategy::StrategyDefinition> {
        vec![color_strategy("s1", "u1", &[black(), black()], Color::Red, 2)]
    }

    #[test]
    fn poll_dispatches_notices_and_records() {
        let feed = MockFeed::new(vec![
            feed_record(9, 1, 0),
            feed_record(11, 1, 30),
            feed_record(12, 1, 60),
            feed_record(4, 2, 90),
        ]);
        let strategies = MockStrategies::new(double_black());
        let notifier = RecordingNotifier::default();
        let log = MemoryResultLog::default();
        let mut worker =
            Worker::new(ColorScheme::ColorId, &strategies, &notifier).with_result_log(&log);

        for _ in 0..4 {
            worker.poll_once(&feed).unwrap();
        }

        let texts = notifier.texts_for("u1");
        assert_eq!(texts.len(), 3);
        assert!(texts[0].starts_with("🎯 *Signal* ➜ RED"));
        assert!(texts[0].contains("Sequence detected: BLACK - BLACK"));
        assert_eq!(texts[1], "🔁 Gale 1/2 ➜ RED");
        assert!(texts[2].starts_with("✅ WIN"));
        assert!(texts[2].contains("(gale 1)"));

        let records = log.records.borrow();
        let kinds: Vec<ResultKind> = records.iter().map(|r| r.result).collect();
        assert_eq!(kinds, vec![ResultKind::Launched, ResultKind::Win]);
        let payload: serde_json::Value = serde_json::from_str(&records[0].raw_payload).unwrap();
        assert_eq!(payload["target"], "RED");
    }

    #[test]
    fn unchanged_head_skips_strategy_load() {
        let feed = MockFeed::new(vec![feed_record(9, 1, 0)]);
        let strategies = MockStrategies::new(double_black());
        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::ColorId, &strategies, &notifier);

        for _ in 0..5 {
            worker.poll_once(&feed).unwrap();
        }
        assert_eq!(strategies.loads.get(), 1);
        assert_eq!(worker.stats().polls, 5);
        assert_eq!(worker.stats().outcomes, 1);
    }

    #[test]
    fn strategy_edits_apply_from_next_tick() {
        let feed = MockFeed::new(vec![feed_record(9, 1, 0), feed_record(10, 1, 30)]);
        let strategies = MockStrategies::new(Vec::new());
        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::ColorId, &strategies, &notifier);

        worker.poll_once(&feed).unwrap();
        *strategies.strategies.borrow_mut() = double_black();
        let tick = worker.poll_once(&feed).unwrap();
        assert_eq!(tick.opened.len(), 1);
    }

    #[test]
    fn roll_scheme_decodes_from_number() {
        // color_id disagrees with the roll; the roll scheme ignores it
        let feed = MockFeed::new(vec![feed_record(9, 2, 0), feed_record(14, 2, 30)]);
        let strategies = MockStrategies::new(double_black());
        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::RollNumber, &strategies, &notifier);

        worker.poll_once(&feed).unwrap();
        assert_eq!(worker.poll_once(&feed).unwrap().opened.len(), 1);
    }

    #[test]
    fn run_survives_feed_and_dispatch_failures() {
        let feed = MockFeed::default();
        feed.push_error("timeout");
        feed.push(feed_record(9, 1, 0));
        feed.push(feed_record(10, 1, 30));
        feed.push(feed_record(3, 2, 60));

        let strategies = MockStrategies::new(double_black());
        let notifier = RecordingNotifier::default();
        notifier.fail.set(true);
        let log = MemoryResultLog::default();
        log.fail.set(true);

        let mut worker =
            Worker::new(ColorScheme::ColorId, &strategies, &notifier).with_result_log(&log);
        let stats = worker.run(&feed, Duration::from_millis(1), Some(4));

        assert_eq!(stats.polls, 4);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.opened, 1);
        assert_eq!(stats.resolved, 1);
        // two notices and two records, all failed
        assert_eq!(stats.dispatch_failures, 4);
        assert_eq!(worker.engine().open_trackers().count(), 0);
    }

    #[test]
    fn strategy_store_outage_ticks_with_last_snapshot() {
        let feed = MockFeed::new(vec![
            feed_record(9, 1, 0),
            feed_record(10, 1, 30),
            feed_record(3, 2, 60),
            feed_record(11, 1, 90),
        ]);
        let strategies = MockStrategies::new(double_black());
        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::ColorId, &strategies, &notifier);

        worker.poll_once(&feed).unwrap();
        assert_eq!(worker.poll_once(&feed).unwrap().opened.len(), 1);

        strategies.fail.set(true);
        let on_red = worker.poll_once(&feed).unwrap();
        assert_eq!(on_red.resolved.len(), 1);
        assert_eq!(on_red.resolved[0].resolution, Resolution::Win);
        assert_eq!(worker.engine().window().len(), 3);

        let on_black = worker.poll_once(&feed).unwrap();
        assert!(on_black.advanced.is_empty());
        assert!(on_black.resolved.is_empty());
        assert_eq!(worker.engine().window().len(), 4);
        assert_eq!(worker.stats().stale_snapshots, 2);
    }

    #[test]
    fn store_down_from_start_still_records_outcomes() {
        let feed = MockFeed::new(vec![feed_record(9, 1, 0)]);
        let strategies = MockStrategies::new(double_black());
        strategies.fail.set(true);
        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::ColorId, &strategies, &notifier);

        let tick = worker.poll_once(&feed).unwrap();
        assert!(tick.opened.is_empty());
        assert_eq!(worker.engine().window().len(), 1);
    }

    #[test]
    fn replay_requires_strategies_up_front() {
        let strategies = MockStrategies::new(double_black());
        strategies.fail.set(true);
        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::ColorId, &strategies, &notifier);

        assert!(matches!(
            worker.replay_records(&[feed_record(9, 1, 0)]),
            Err(GhostError::StrategyLoad { .. })
        ));
        assert!(worker.engine().window().is_empty());
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_store {
    use super::*;
    use ghostsignal::adapters::sqlite_adapter::SqliteAdapter;
    use ghostsignal::domain::summary::StrategySummary;

    #[test]
    fn worker_reads_strategies_and_logs_results() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.initialize_schema().unwrap();
        db.upsert_strategy(
            "s1",
            "u1",
            "Double black",
            r#"{"type":"color_sequence","sequence":["black","black"],"signal":"red"}"#,
            true,
        )
        .unwrap();
        db.upsert_strategy(
            "s2",
            "u2",
            "Eights",
            r#"{"type":"number_sequence","sequence":[8,8],"signal":8,"gales":0}"#,
            true,
        )
        .unwrap();

        let notifier = RecordingNotifier::default();
        let mut worker = Worker::new(ColorScheme::ColorId, &db, &notifier).with_result_log(&db);
        worker
            .replay_records(&[
                feed_record(8, 1, 0),
                feed_record(8, 1, 30),
                feed_record(9, 1, 60),
            ])
            .unwrap();

        let summaries = StrategySummary::compute(&db.results().unwrap());
        assert_eq!(summaries.len(), 2);

        let s1 = &summaries[0];
        assert_eq!((s1.owner_id.as_str(), s1.strategy_id.as_str()), ("u1", "s1"));
        assert_eq!(s1.launched, 1);
        assert_eq!(s1.resolved(), 0);

        let s2 = &summaries[1];
        assert_eq!(s2.launched, 1);
        assert_eq!(s2.losses, 1);
    }
}
