//! End-to-end match tests with scripted players and runtimes.
//!
//! Each test lays out a working directory the way CI does (challenger at the
//! root, game and challengee branches fetched into `branches/`), then drives
//! `run_duel`/`run_solo` with a scripted invoker and in-memory hosting.

use std::fs;
use std::path::PathBuf;

use arena::core::challenge::ChallengeContext;
use arena::core::summary::Summary;
use arena::core::types::Outcome;
use arena::duel::run_duel;
use arena::error::{MatchError, match_error};
use arena::io::config::ArenaConfig;
use arena::io::context::{load_summary, write_context};
use arena::play::Services;
use arena::solo::run_solo;
use arena::test_support::{
    FakeBranches, RecordingHosting, ScriptedInvoker, duel_context, solo_context,
};

const PLAYER_CONFIG: &str = r#"{"runnerType": "node", "runnerPath": "bot.js"}"#;
const RUNNING: &str = r#"{"runnerState": {"done": false, "outcome": "running"}}"#;
const HEADER: &str = "# header";

struct Arena {
    _temp: tempfile::TempDir,
    root: PathBuf,
    context_path: PathBuf,
    branches: FakeBranches,
    hosting: RecordingHosting,
}

impl Arena {
    fn new(context: &ChallengeContext) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().to_path_buf();
        fs::write(root.join("player.config.json"), PLAYER_CONFIG).expect("write config");
        let context_path = root.join("challengeContext.json");
        write_context(&context_path, context).expect("write context");
        let branches = FakeBranches::default()
            .with_file("main", &context.game_details.path, "")
            .with_file("bob-bot", "player.config.json", PLAYER_CONFIG);
        let hosting = RecordingHosting::default().with_comment(900, HEADER);
        Self {
            _temp: temp,
            root,
            context_path,
            branches,
            hosting,
        }
    }

    fn duel(&self, invoker: &ScriptedInvoker, cfg: &ArenaConfig) -> anyhow::Result<Summary> {
        let services = Services {
            invoker,
            hosting: &self.hosting,
            branches: &self.branches,
        };
        run_duel(&self.root, &self.context_path, cfg, &services)
    }

    fn solo(&self, invoker: &ScriptedInvoker) -> anyhow::Result<Summary> {
        let services = Services {
            invoker,
            hosting: &self.hosting,
            branches: &self.branches,
        };
        run_solo(&self.root, &self.context_path, &ArenaConfig::default(), &services)
    }

    fn status(&self) -> String {
        self.hosting.comment_body(900).expect("status comment")
    }

    fn summary_path(&self) -> PathBuf {
        self.root.join("summary.json")
    }
}

fn labels(invoker: &ScriptedInvoker) -> Vec<String> {
    invoker.calls().into_iter().map(|(label, _)| label).collect()
}

fn args_of(invoker: &ScriptedInvoker, index: usize) -> Vec<String> {
    invoker.calls()[index].1.clone()
}

/// A single winning guess ends the duel on turn 1 in the challenger's favour.
#[test]
fn first_turn_win_goes_to_challenger() {
    let arena = Arena::new(&duel_context());
    let invoker = ScriptedInvoker::new([
        r#"{"gameData": {}, "gameSecrets": {"n": 7}}"#,
        r#"{"action": {"guess": 7}, "stash": null}"#,
        r#"{"runnerState": {"done": true, "outcome": "win"}}"#,
    ]);

    let summary = arena
        .duel(&invoker, &ArenaConfig::default())
        .expect("duel");

    assert_eq!(summary.turns_played, 1);
    assert_eq!(summary.outcome, Outcome::Win);
    assert_eq!(summary.winner.as_deref(), Some("alice"));
    assert_eq!(load_summary(&arena.summary_path()).expect("summary"), summary);
    invoker.assert_drained();

    assert_eq!(
        labels(&invoker),
        vec!["game runtime (ctf)", "player P1 (alice)", "game runtime (ctf)"]
    );
    assert!(args_of(&invoker, 0).is_empty());
    assert_eq!(args_of(&invoker, 1), vec![r#"{"publicState":{},"stash":null}"#]);
    assert_eq!(
        args_of(&invoker, 2),
        vec![r#"{"n":7}"#, "{}", r#"{"guess":7}"#]
    );

    let status = arena.status();
    assert!(status.starts_with("# header\n:ballot_box_with_check: Fetch players and game branches ("));
    assert!(status.contains("### :tada::tada: alice wins this round! :tada::tada:"));
    assert!(status.ends_with("```\nTurns played: 1\n```"));
    assert_eq!(
        arena.branches.fetched(),
        vec![
            ("bob-bot".to_string(), arena.root.join("branches/player2")),
            ("main".to_string(), arena.root.join("branches/game")),
        ]
    );
}

/// Players alternate and each sees the stash it returned on its previous turn.
#[test]
fn players_alternate_and_keep_their_own_stash() {
    let arena = Arena::new(&duel_context());
    let invoker = ScriptedInvoker::new([
        r#"{"gameData": {"board": 0}}"#,
        r#"{"action": "a1", "stash": {"mine": "p1-t1"}}"#,
        r#"{"gameData": {"board": 1}}"#,
        r#"{"action": "b1", "stash": {"mine": "p2-t2"}}"#,
        r#"{"gameData": {"board": 2}}"#,
        r#"{"action": "a2"}"#,
        RUNNING,
        r#"{"action": "b2", "stash": [1, 2]}"#,
        r#"{"runnerState": {"done": true, "outcome": "win"}}"#,
    ]);

    let summary = arena
        .duel(&invoker, &ArenaConfig::default())
        .expect("duel");

    let players: Vec<String> = labels(&invoker)
        .into_iter()
        .filter(|label| label.starts_with("player"))
        .collect();
    assert_eq!(
        players,
        vec![
            "player P1 (alice)",
            "player P2 (bob)",
            "player P1 (alice)",
            "player P2 (bob)"
        ]
    );
    assert_eq!(
        args_of(&invoker, 5),
        vec![r#"{"publicState":{"board":2},"stash":{"mine":"p1-t1"}}"#]
    );
    assert_eq!(
        args_of(&invoker, 7),
        vec![r#"{"publicState":{"board":2},"stash":{"mine":"p2-t2"}}"#]
    );

    // A win reported on an even turn is credited to the challengee.
    assert_eq!(summary.turns_played, 4);
    assert_eq!(summary.winner.as_deref(), Some("bob"));
}

#[test]
fn draw_has_no_winner() {
    let arena = Arena::new(&duel_context());
    let invoker = ScriptedInvoker::new([
        "{}",
        r#"{"action": 1}"#,
        r#"{"runnerState": {"done": true, "outcome": "draw"}}"#,
    ]);

    let summary = arena
        .duel(&invoker, &ArenaConfig::default())
        .expect("duel");

    assert_eq!(summary.outcome, Outcome::Draw);
    assert_eq!(summary.winner, None);
    assert!(arena.status().contains("### :sweat_smile: Womp womp. It's a draw!"));
    let raw = fs::read_to_string(arena.summary_path()).expect("read summary");
    assert!(!raw.contains("winner"));
}

#[test]
fn configured_duel_ceiling_times_out() {
    let arena = Arena::new(&duel_context());
    let invoker = ScriptedInvoker::new(["{}"]);
    let invoker = (0..3).fold(invoker, |inv, _| inv.then(r#"{"action": 0}"#).then(RUNNING));
    let cfg = ArenaConfig {
        duel_max_turns: Some(3),
        ..ArenaConfig::default()
    };

    let summary = arena.duel(&invoker, &cfg).expect("duel");

    assert_eq!(summary.turns_played, 3);
    assert_eq!(summary.outcome, Outcome::TimeOut);
    assert_eq!(summary.winner.as_deref(), Some("bob"));
    invoker.assert_drained();
}

/// Only a draw leaves a duel without a winner; a reported time-out on an odd
/// turn still goes to the challengee.
#[test]
fn reported_time_out_credits_challengee() {
    let arena = Arena::new(&duel_context());
    let invoker = ScriptedInvoker::new([
        "{}",
        r#"{"action": "stall"}"#,
        r#"{"runnerState": {"done": true, "outcome": "time_out"}}"#,
    ]);

    let summary = arena
        .duel(&invoker, &ArenaConfig::default())
        .expect("duel");

    assert_eq!(summary.turns_played, 1);
    assert_eq!(summary.outcome, Outcome::TimeOut);
    assert_eq!(summary.winner.as_deref(), Some("bob"));
    let status = arena.status();
    assert!(status.contains("### :tada::tada: bob wins this round! :tada::tada:"));
    assert!(!status.contains("It's a draw"));
}

/// A solo run whose runtime never finishes is timed out after 50 turns.
#[test]
fn solo_run_times_out_after_fifty_turns() {
    let arena = Arena::new(&solo_context());
    let invoker = (0..50).fold(ScriptedInvoker::new(["{}"]), |inv, turn| {
        inv.then(format!(r#"{{"action": {{"guess": {turn}}}, "stash": {turn}}}"#))
            .then(RUNNING)
    });

    let summary = arena.solo(&invoker).expect("solo");

    assert_eq!(summary.turns_played, 50);
    assert_eq!(summary.outcome, Outcome::TimeOut);
    assert_eq!(summary.winner, None);
    invoker.assert_drained();

    let runtime_args = args_of(&invoker, 2);
    assert_eq!(runtime_args[2], "player");
    assert_eq!(runtime_args.len(), 4);

    let status = arena.status();
    assert!(status.contains("Fetch player and game branches"));
    assert!(status.contains(":sweat_smile: Womp womp. Your solution didn't pan out in time."));
    assert!(status.contains("<details><summary>Moves</summary>Turn 0 - {\"guess\":0}</br>"));
    assert!(status.contains("Turn 49 - {\"guess\":49}</details>"));
    assert_eq!(arena.branches.fetched().len(), 1);
}

#[test]
fn solo_win_credits_the_challenger() {
    let arena = Arena::new(&solo_context());
    let invoker = ScriptedInvoker::new([
        r#"{"gameSecrets": {"n": 2}}"#,
        r#"{"action": {"guess": 1}}"#,
        RUNNING,
        r#"{"action": {"guess": 2}}"#,
        r#"{"runnerState": {"done": true, "outcome": "win"}}"#,
    ]);

    let summary = arena.solo(&invoker).expect("solo");

    assert_eq!(summary.winner.as_deref(), Some("alice"));
    assert!(arena.status().contains(":tada::tada: You won this round! :tada::tada:"));
}

/// Non-JSON player output aborts the match before the runtime is invoked.
#[test]
fn malformed_player_output_aborts_match() {
    let arena = Arena::new(&duel_context());
    let invoker = ScriptedInvoker::new(["{}", "I move north"]);

    let err = arena
        .duel(&invoker, &ArenaConfig::default())
        .expect_err("should fail");

    assert!(matches!(match_error(&err), Some(MatchError::Parse(_))));
    assert_eq!(invoker.calls().len(), 2);
    assert!(!arena.summary_path().exists());
    let status = arena.status();
    let last_line = status.lines().last().expect("status lines");
    assert!(last_line.starts_with("💥 Oh no! parse failure: player P1 (alice) printed invalid JSON"));
}

#[test]
fn runtime_timeout_is_reported() {
    let arena = Arena::new(&solo_context());
    let invoker = ScriptedInvoker::new(["{}", r#"{"action": 1}"#]).then_fail(
        MatchError::SubprocessTimeout {
            program: "game runtime (number-guessing)".to_string(),
            timeout: std::time::Duration::from_millis(5000),
        },
    );

    let err = arena.solo(&invoker).expect_err("should fail");

    assert!(matches!(
        match_error(&err),
        Some(MatchError::SubprocessTimeout { .. })
    ));
    assert!(
        arena
            .status()
            .ends_with("💥 Oh no! game runtime (number-guessing) timed out after 5000ms")
    );
}

#[test]
fn failed_failure_report_keeps_original_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let context_path = root.join("challengeContext.json");
    write_context(&context_path, &duel_context()).expect("write context");
    let hosting = RecordingHosting::default()
        .with_comment(900, HEADER)
        .failing_writes();
    // The challengee branch is missing, so fetching fails before any write.
    let branches = FakeBranches::default().with_file("main", "games/ctf/index.js", "");
    let invoker = ScriptedInvoker::default();
    let services = Services {
        invoker: &invoker,
        hosting: &hosting,
        branches: &branches,
    };

    let err = run_duel(root, &context_path, &ArenaConfig::default(), &services)
        .expect_err("should fail");

    assert!(format!("{err:#}").contains("bob-bot"));
    assert_eq!(hosting.calls(), vec!["read 900", "upsert 900"]);
    assert_eq!(hosting.comment_body(900).as_deref(), Some(HEADER));
    assert!(invoker.calls().is_empty());
}

#[test]
fn missing_context_fails_without_side_effects() {
    let temp = tempfile::tempdir().expect("tempdir");
    let hosting = RecordingHosting::default();
    let branches = FakeBranches::default();
    let invoker = ScriptedInvoker::default();
    let services = Services {
        invoker: &invoker,
        hosting: &hosting,
        branches: &branches,
    };

    let err = run_solo(
        temp.path(),
        &temp.path().join("nope.json"),
        &ArenaConfig::default(),
        &services,
    )
    .expect_err("should fail");

    assert!(err.to_string().contains("nope.json"));
    assert!(hosting.calls().is_empty());
    assert!(branches.fetched().is_empty());
    assert!(!temp.path().join("summary.json").exists());
}
