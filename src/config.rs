//! Runtime configuration parsed from environment variables.
//!
//! Optional:
//! - `SKETCHBOARD_API_URL`: shapes endpoint (default `http://localhost:4000/api/shapes`)
//! - `SKETCHBOARD_DEFAULT_BOARD`: board shown at startup (default `default`)
//! - `SKETCHBOARD_REQUEST_TIMEOUT_SECS`: default 30
//! - `SKETCHBOARD_CONNECT_TIMEOUT_SECS`: default 10
//! - `SKETCHBOARD_COLOR`: initial stroke color (default `#000000`)
//! - `SKETCHBOARD_STROKE_WIDTH`: initial stroke width (default 2)
//!
//! Unparseable numbers fall back to their defaults; values that parse but
//! make no sense (empty URL, zero stroke) are rejected.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

use crate::board::{BoardError, BoardId, DEFAULT_BOARD_ID};
use crate::error::ErrorCode;
use crate::shape::{DEFAULT_COLOR, DEFAULT_STROKE_WIDTH, Style};

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api/shapes";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
    #[error("{key} must be positive")]
    NotPositive { key: &'static str },
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "E_CONFIG_EMPTY",
            Self::NotPositive { .. } => "E_CONFIG_NOT_POSITIVE",
            Self::Board(e) => e.error_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub default_board: BoardId,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub style: Style,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            default_board: BoardId::default_board(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            style: Style::default(),
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if a set variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    ///
    /// # Errors
    ///
    /// Returns an error if a present value is empty, zero, or an invalid
    /// board id.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("SKETCHBOARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_url = api_url.trim().trim_end_matches('/').to_owned();
        if api_url.is_empty() {
            return Err(ConfigError::Empty { key: "SKETCHBOARD_API_URL" });
        }

        let board = lookup("SKETCHBOARD_DEFAULT_BOARD").unwrap_or_else(|| DEFAULT_BOARD_ID.to_owned());
        let default_board = BoardId::parse(&board)?;

        let color = lookup("SKETCHBOARD_COLOR").unwrap_or_else(|| DEFAULT_COLOR.to_owned());
        if color.trim().is_empty() {
            return Err(ConfigError::Empty { key: "SKETCHBOARD_COLOR" });
        }
        let stroke_width = parse_or(&lookup, "SKETCHBOARD_STROKE_WIDTH", DEFAULT_STROKE_WIDTH);
        if stroke_width == 0 {
            return Err(ConfigError::NotPositive { key: "SKETCHBOARD_STROKE_WIDTH" });
        }

        Ok(Self {
            api_url,
            default_board,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SKETCHBOARD_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SKETCHBOARD_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
            style: Style { color: color.trim().to_owned(), stroke_width },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
