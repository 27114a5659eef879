//! Scheduler service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default solver hard deadline in milliseconds.
pub const DEFAULT_SOLVER_TIMEOUT_MS: u64 = 5_000;

/// Maximum configurable solver deadline in milliseconds.
pub const MAX_SOLVER_TIMEOUT_MS: u64 = 60_000;

/// Default availability grid increment in minutes.
pub const DEFAULT_SLOT_INCREMENT_MINUTES: u32 = 15;

/// Default interval of the background pending sweep, in seconds.
pub const DEFAULT_PENDING_CHECK_INTERVAL_SECONDS: u64 = 60;

/// Default availability search window, in days.
pub const DEFAULT_SEARCH_WINDOW_DAYS: u32 = 7;

/// Scheduler service configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Whether the decision backend starts enabled (default: true).
    /// The switch stays live at runtime; this only sets the initial state.
    pub solver_enabled: bool,

    /// Hard deadline for one decision-backend call in milliseconds
    /// (default: 5000).
    pub solver_timeout_ms: u64,

    /// Availability grid increment in minutes (default: 15).
    pub slot_increment_minutes: u32,

    /// Interval of the background pending sweep in seconds (default: 60).
    pub pending_check_interval_seconds: u64,

    /// Default availability search window in days (default: 7).
    pub search_window_days: u32,
}

/// Custom Debug implementation that redacts the database URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("solver_enabled", &self.solver_enabled)
            .field("solver_timeout_ms", &self.solver_timeout_ms)
            .field("slot_increment_minutes", &self.slot_increment_minutes)
            .field(
                "pending_check_interval_seconds",
                &self.pending_check_interval_seconds,
            )
            .field("search_window_days", &self.search_window_days)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid solver configuration: {0}")]
    InvalidSolver(String),

    #[error("Invalid availability configuration: {0}")]
    InvalidAvailability(String),

    #[error("Invalid pending sweep configuration: {0}")]
    InvalidPendingSweep(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let solver_enabled = if let Some(value_str) = vars.get("SOLVER_ENABLED") {
            value_str.parse().map_err(|_| {
                ConfigError::InvalidSolver(format!(
                    "SOLVER_ENABLED must be 'true' or 'false', got '{}'",
                    value_str
                ))
            })?
        } else {
            true
        };

        let solver_timeout_ms = if let Some(value_str) = vars.get("SOLVER_TIMEOUT_MS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidSolver(format!(
                    "SOLVER_TIMEOUT_MS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidSolver(
                    "SOLVER_TIMEOUT_MS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_SOLVER_TIMEOUT_MS {
                return Err(ConfigError::InvalidSolver(format!(
                    "SOLVER_TIMEOUT_MS must not exceed {}, got {}",
                    MAX_SOLVER_TIMEOUT_MS, value
                )));
            }

            value
        } else {
            DEFAULT_SOLVER_TIMEOUT_MS
        };

        let slot_increment_minutes = if let Some(value_str) = vars.get("SLOT_INCREMENT_MINUTES") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidAvailability(format!(
                    "SLOT_INCREMENT_MINUTES must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > 24 * 60 {
                return Err(ConfigError::InvalidAvailability(format!(
                    "SLOT_INCREMENT_MINUTES must be between 1 and 1440, got {}",
                    value
                )));
            }

            value
        } else {
            DEFAULT_SLOT_INCREMENT_MINUTES
        };

        let pending_check_interval_seconds =
            if let Some(value_str) = vars.get("PENDING_CHECK_INTERVAL_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidPendingSweep(format!(
                        "PENDING_CHECK_INTERVAL_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidPendingSweep(
                        "PENDING_CHECK_INTERVAL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_PENDING_CHECK_INTERVAL_SECONDS
            };

        let search_window_days = if let Some(value_str) = vars.get("SEARCH_WINDOW_DAYS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidAvailability(format!(
                    "SEARCH_WINDOW_DAYS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidAvailability(
                    "SEARCH_WINDOW_DAYS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_SEARCH_WINDOW_DAYS
        };

        Ok(Config {
            database_url,
            bind_address,
            solver_enabled,
            solver_timeout_ms,
            slot_increment_minutes,
            pending_check_interval_seconds,
            search_window_days,
        })
    }

    /// The solver deadline as a [`Duration`].
    pub fn solver_timeout(&self) -> Duration {
        Duration::from_millis(self.solver_timeout_ms)
    }
}
