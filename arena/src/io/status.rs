//! Progress reporting in the pull-request status comment.
//!
//! Each stage of a match appends one rendered block to a single comment, so
//! the challenger can follow the match from the pull request.

use std::time::Duration;

use anyhow::Result;
use minijinja::{Environment, context};
use tracing::debug;

use crate::core::challenge::ChallengeContext;
use crate::core::format::MatchFormat;
use crate::core::summary::{Summary, headline, round_centis};
use crate::core::types::TurnRecord;
use crate::io::hosting::{Hosting, Repo};

const HEADER_DUEL_TEMPLATE: &str = include_str!("templates/header_duel.md");
const HEADER_SOLO_TEMPLATE: &str = include_str!("templates/header_solo.md");
const FETCHED_TEMPLATE: &str = include_str!("templates/fetched.md");
const SUMMARY_TEMPLATE: &str = include_str!("templates/summary.md");
const FAILURE_TEMPLATE: &str = include_str!("templates/failure.md");

/// Renders status comment blocks.
pub struct StatusText {
    env: Environment<'static>,
}

impl Default for StatusText {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusText {
    pub fn new() -> Self {
        let mut env = Environment::new();
        for (name, source) in [
            ("header_duel", HEADER_DUEL_TEMPLATE),
            ("header_solo", HEADER_SOLO_TEMPLATE),
            ("fetched", FETCHED_TEMPLATE),
            ("summary", SUMMARY_TEMPLATE),
            ("failure", FAILURE_TEMPLATE),
        ] {
            env.add_template(name, source)
                .expect("status templates should be valid");
        }
        Self { env }
    }

    /// Opening block posted when a challenge is accepted.
    pub fn header(&self, context: &ChallengeContext) -> Result<String> {
        let name = match context.challengee {
            Some(_) => "header_duel",
            None => "header_solo",
        };
        let rendered = self.env.get_template(name)?.render(context! {
            challenger => &context.challenger,
            challenger_branch => &context.challenger_branch,
            challengee => &context.challengee,
            challengee_branch => &context.challengee_branch,
            game => &context.game,
        })?;
        Ok(rendered)
    }

    pub fn fetched(&self, format: MatchFormat, elapsed: Duration) -> Result<String> {
        let rendered = self.env.get_template("fetched")?.render(context! {
            duel => format == MatchFormat::Duel,
            seconds => seconds(elapsed),
        })?;
        Ok(rendered)
    }

    /// Result block. `moves` is only rendered when non-empty.
    pub fn summary(
        &self,
        format: MatchFormat,
        summary: &Summary,
        moves: &[TurnRecord],
    ) -> Result<String> {
        // The move log is indexed from 0, unlike the turn counter.
        let moves: Vec<String> = moves
            .iter()
            .enumerate()
            .map(|(index, record)| format!("Turn {index} - {}", record.action))
            .collect();
        let rendered = self.env.get_template("summary")?.render(context! {
            seconds => format!("{:.2}", summary.game_time_seconds),
            headline => headline(format, summary),
            turns_played => summary.turns_played,
            moves => moves,
        })?;
        Ok(rendered)
    }

    pub fn failure(&self, message: &str) -> Result<String> {
        let rendered = self
            .env
            .get_template("failure")?
            .render(context! { message => message })?;
        Ok(rendered)
    }
}

fn seconds(elapsed: Duration) -> String {
    format!("{:.2}", round_centis(elapsed))
}

/// The status comment of one match.
pub struct StatusBoard<'a, H: Hosting + ?Sized> {
    hosting: &'a H,
    repo: Repo,
    pull: u64,
    comment_id: Option<u64>,
    text: StatusText,
}

impl<'a, H: Hosting + ?Sized> StatusBoard<'a, H> {
    pub fn new(hosting: &'a H, repo: Repo, pull: u64, comment_id: Option<u64>) -> Self {
        Self {
            hosting,
            repo,
            pull,
            comment_id,
            text: StatusText::new(),
        }
    }

    pub fn for_context(hosting: &'a H, context: &ChallengeContext) -> Self {
        Self::new(hosting, Repo::of(context), context.pull_number, context.comment_id)
    }

    pub fn comment_id(&self) -> Option<u64> {
        self.comment_id
    }

    pub fn text(&self) -> &StatusText {
        &self.text
    }

    /// Overwrite the comment (creating it on first use) with `body`.
    pub fn post(&mut self, body: &str) -> Result<u64> {
        let id = self
            .hosting
            .upsert_comment(&self.repo, self.pull, self.comment_id, body)?;
        self.comment_id = Some(id);
        Ok(id)
    }

    /// Append `block` on a new line of the current comment body.
    pub fn append(&mut self, block: &str) -> Result<u64> {
        let body = match self.comment_id {
            Some(id) => {
                let current = self.hosting.read_comment(&self.repo, id)?;
                format!("{current}\n{block}")
            }
            None => block.to_string(),
        };
        debug!(comment_id = ?self.comment_id, "appending status block");
        self.post(&body)
    }

    /// Post a failure message as a fresh comment on the pull request.
    pub fn report_failure(&self, message: &str) -> Result<u64> {
        let body = self.text.failure(message)?;
        self.hosting.upsert_comment(&self.repo, self.pull, None, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Blob, Outcome, PlayerLabel};
    use crate::test_support::{RecordingHosting, duel_context, solo_context};
    use serde_json::json;

    fn summary(winner: Option<&str>) -> Summary {
        Summary {
            turns_played: 3,
            outcome: Outcome::Win,
            winner: winner.map(str::to_string),
            game_time_seconds: 1.5,
        }
    }

    #[test]
    fn duel_header_names_both_sides() {
        let text = StatusText::new().header(&duel_context()).expect("render");
        assert_eq!(
            text,
            "# 💀 Two players enter the arena, only one will leave 💀\n\
             ## alice's `alice-bot` v. bob's `bob-bot`\n\
             :ballot_box_with_check: Prepare challenge"
        );
    }

    #[test]
    fn solo_header_names_the_game() {
        let text = StatusText::new().header(&solo_context()).expect("render");
        assert!(text.contains("alice takes on `number-guessing`"));
        assert!(!text.contains(" v. "));
    }

    #[test]
    fn fetched_line_pluralizes_for_duels() {
        let text = StatusText::new();
        assert_eq!(
            text.fetched(MatchFormat::Duel, Duration::from_millis(1234))
                .expect("render"),
            ":ballot_box_with_check: Fetch players and game branches (1.23s)"
        );
        assert!(
            text.fetched(MatchFormat::Solo, Duration::ZERO)
                .expect("render")
                .contains("Fetch player and game branches (0.00s)")
        );
    }

    #[test]
    fn duel_summary_has_no_move_log() {
        let text = StatusText::new()
            .summary(MatchFormat::Duel, &summary(Some("alice")), &[])
            .expect("render");
        assert_eq!(
            text,
            ":ballot_box_with_check: Run game (1.50s)\n## Game summary\n\
             ### :tada::tada: alice wins this round! :tada::tada:\n\
             ```\nTurns played: 3\n```"
        );
    }

    #[test]
    fn solo_summary_lists_moves() {
        let moves = vec![
            TurnRecord {
                turn: 1,
                player: PlayerLabel::P1,
                action: Blob::new(json!({"guess": 50})),
            },
            TurnRecord {
                turn: 2,
                player: PlayerLabel::P1,
                action: Blob::new(json!({"guess": 25})),
            },
        ];
        let text = StatusText::new()
            .summary(MatchFormat::Solo, &summary(Some("alice")), &moves)
            .expect("render");
        assert!(text.ends_with(
            "```\n<details><summary>Moves</summary>Turn 0 - {\"guess\":50}</br>Turn 1 - {\"guess\":25}</details>"
        ));
    }

    #[test]
    fn append_reads_then_rewrites_comment() {
        let hosting = RecordingHosting::default();
        let mut board = StatusBoard::new(&hosting, Repo::new("acme", "games"), 12, None);
        let id = board.append("first").expect("create");
        board.append("second").expect("append");

        assert_eq!(board.comment_id(), Some(id));
        assert_eq!(hosting.comment_body(id).as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn failure_is_posted_as_new_comment() {
        let hosting = RecordingHosting::default();
        let mut board = StatusBoard::new(&hosting, Repo::new("acme", "games"), 12, None);
        let header = board.post("header").expect("post");
        let failure = board.report_failure("parse failure: nope").expect("report");

        assert_ne!(header, failure);
        assert_eq!(
            hosting.comment_body(failure).as_deref(),
            Some("💥 Oh no! parse failure: nope")
        );
    }
}
