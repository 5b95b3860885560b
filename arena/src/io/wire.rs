//! Decoders for subprocess stdout.
//!
//! Every document printed by a player or game runtime is parsed as JSON,
//! validated against its schema and only then deserialized. A failure at any
//! of these steps is a [`MatchError::Parse`].

use anyhow::{Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::types::{PlayerOutput, RunnerOutput, SetupOutput};
use crate::error::MatchError;

const SETUP_OUTPUT_SCHEMA: &str = include_str!("../../schemas/setup_output.schema.json");
const PLAYER_OUTPUT_SCHEMA: &str = include_str!("../../schemas/player_output.schema.json");
const RUNNER_OUTPUT_SCHEMA: &str = include_str!("../../schemas/runner_output.schema.json");

/// Compiled validators for the three subprocess documents.
pub struct WireDecoder {
    setup: Validator,
    player: Validator,
    runner: Validator,
}

impl WireDecoder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            setup: compile(SETUP_OUTPUT_SCHEMA)?,
            player: compile(PLAYER_OUTPUT_SCHEMA)?,
            runner: compile(RUNNER_OUTPUT_SCHEMA)?,
        })
    }

    pub fn setup(&self, label: &str, stdout: &str) -> Result<SetupOutput, MatchError> {
        decode(&self.setup, label, stdout)
    }

    pub fn player(&self, label: &str, stdout: &str) -> Result<PlayerOutput, MatchError> {
        decode(&self.player, label, stdout)
    }

    pub fn runner(&self, label: &str, stdout: &str) -> Result<RunnerOutput, MatchError> {
        decode(&self.runner, label, stdout)
    }
}

fn compile(raw: &str) -> Result<Validator> {
    let schema: Value = serde_json::from_str(raw).map_err(|err| anyhow!("parse schema: {err}"))?;
    validator_for(&schema).map_err(|err| anyhow!("invalid schema: {err}"))
}

fn decode<T: DeserializeOwned>(
    validator: &Validator,
    label: &str,
    stdout: &str,
) -> Result<T, MatchError> {
    let value: Value = serde_json::from_str(stdout.trim())
        .map_err(|err| MatchError::parse(format!("{label} printed invalid JSON: {err}")))?;
    if !validator.is_valid(&value) {
        let messages = validator
            .iter_errors(&value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(MatchError::parse(format!(
            "{label} output failed schema validation: {}",
            messages.join("; ")
        )));
    }
    debug!(label, "decoded subprocess output");
    serde_json::from_value(value)
        .map_err(|err| MatchError::parse(format!("{label} output: {err}")))
}
