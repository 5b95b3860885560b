//! A complete solo match between real shell programs.
//!
//! The game hides the number 3; the player counts upwards, keeping its last
//! guess in its stash. The match therefore ends with a win on turn 3, which
//! only happens if the stash survives between turns.

use std::fs;

use arena::core::challenge::{GameDetails, RunnerType};
use arena::core::types::Outcome;
use arena::io::config::ArenaConfig;
use arena::io::context::{load_summary, write_context};
use arena::io::invoker::{EnvScrubber, ProcessInvoker};
use arena::play::Services;
use arena::solo::run_solo;
use arena::test_support::{FakeBranches, RecordingHosting, solo_context};

const GAME: &str = r#"if [ $# -eq 0 ]; then
  echo '{"gameData": {"range": [1, 10]}, "gameSecrets": {"target": 3}}'
  exit 0
fi
[ "$3" = "player" ] || { echo "missing role token" >&2; exit 2; }
case "$4" in
  *'"guess":3'*) echo '{"runnerState": {"done": true, "outcome": "win"}}' ;;
  *) echo '{"runnerState": {"done": false, "outcome": "running"}}' ;;
esac
"#;

const PLAYER: &str = r#"n=$(printf '%s' "$1" | sed -n 's/.*"stash":\([0-9][0-9]*\)}.*/\1/p')
n=$(( ${n:-0} + 1 ))
echo "{\"action\": {\"guess\": $n}, \"stash\": $n}"
"#;

#[test]
fn shell_player_wins_on_third_guess() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::write(root.join("bot.sh"), PLAYER).expect("write player");
    fs::write(
        root.join("player.config.json"),
        r#"{"runnerType": "shell", "runnerPath": "bot.sh"}"#,
    )
    .expect("write player config");

    let mut context = solo_context();
    context.game_details = GameDetails {
        description: "Guess the number".to_string(),
        path: "games/guess.sh".to_string(),
        runner_type: RunnerType::Shell,
    };
    let context_path = root.join("challengeContext.json");
    write_context(&context_path, &context).expect("write context");

    let cfg = ArenaConfig::default();
    let invoker = ProcessInvoker::new(
        cfg.exec_timeout(),
        cfg.output_limit_bytes,
        EnvScrubber::new(&cfg.scrub_env_patterns).expect("patterns"),
    );
    let hosting = RecordingHosting::default().with_comment(900, "# header");
    let branches = FakeBranches::default().with_file("main", "games/guess.sh", GAME);
    let services = Services {
        invoker: &invoker,
        hosting: &hosting,
        branches: &branches,
    };

    let summary = run_solo(root, &context_path, &cfg, &services).expect("solo");

    assert_eq!(summary.turns_played, 3);
    assert_eq!(summary.outcome, Outcome::Win);
    assert_eq!(summary.winner.as_deref(), Some("alice"));
    assert_eq!(
        load_summary(&root.join("summary.json")).expect("summary"),
        summary
    );
    let status = hosting.comment_body(900).expect("status");
    assert!(status.contains(
        "Turn 0 - {\"guess\":1}</br>Turn 1 - {\"guess\":2}</br>Turn 2 - {\"guess\":3}"
    ));
}
