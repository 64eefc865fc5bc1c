//! Wire shapes shared by every endpoint.
//!
//! Mutating endpoints answer with `{ "state": "ok" | "error", "message"?: ..., ... }`.
//! [`Envelope`] turns that loose object into a two-way variant so callers
//! cannot forget the error arm.
//!
//! Two readings exist.  Writes only fail on an explicit `"error"`
//! ([`Envelope::from_value`]); the capacity poll only trusts an explicit
//! `"ok"` ([`Envelope::require_ok`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const MISSING_MESSAGE: &str = "server reported an error without a message";
const MISSING_STATE: &str = "response carries no state";

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Accepted by the reading in use.  Holds the whole decoded object.
    Ok(Value),
    Error { message: String },
}

impl Envelope {
    /// Reading used after writes: anything but `state == "error"` is success,
    /// including an absent or unrecognised state.
    pub fn from_value(value: Value) -> Self {
        match state_of(&value).as_deref() {
            Some("error") => Self::Error {
                message: message_of(&value),
            },
            _ => Self::Ok(value),
        }
    }

    /// Reading used for status reports: only `state == "ok"` is success.
    pub fn require_ok(value: Value) -> Self {
        match state_of(&value).as_deref() {
            Some("ok") => Self::Ok(value),
            Some("error") => Self::Error {
                message: message_of(&value),
            },
            Some(unknown) => Self::Error {
                message: format!("unexpected response state '{unknown}'"),
            },
            None => Self::Error {
                message: MISSING_STATE.to_string(),
            },
        }
    }

    pub fn into_result(self) -> crate::Result<Value> {
        match self {
            Self::Ok(payload) => Ok(payload),
            Self::Error { message } => Err(crate::ClientError::Application(message)),
        }
    }
}

fn state_of(value: &Value) -> Option<String> {
    value.get("state").map(|state| match state {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn message_of(value: &Value) -> String {
    match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => MISSING_MESSAGE.to_string(),
        Some(other) => other.to_string(),
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// Discrete counter operations accepted by `POST /cmd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Increment,
    Decrement,
    Reset,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Increment, Command::Decrement, Command::Reset];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown command '{s}' (expected increment, decrement or reset)"))
    }
}

/// Body of `POST /cmd`.  Built per user action and never retried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRequest {
    pub cmd: Command,
    pub data: Value,
}

impl CommandRequest {
    pub fn new(cmd: Command) -> Self {
        Self {
            cmd,
            data: Value::Null,
        }
    }

    pub fn with_data(cmd: Command, data: Value) -> Self {
        Self { cmd, data }
    }
}

/// Payload of a successful `GET /capacity`.  Each field is optional on its
/// own; a missing one leaves that part of the display as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CapacityReport {
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub visualisation: Option<String>,
}
