//! Logger configuration.
//!
//! Configuration is loaded from environment variables. A `.env` file is
//! honoured when present.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the runtime environment.
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Runtime environment of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Local development; debug records are emitted
    Development,
    /// Production; the default when nothing is configured
    #[default]
    Production,
    /// Automated tests
    Test,
}

impl Environment {
    /// Read the environment from [`ENVIRONMENT_VAR`].
    ///
    /// Missing or unrecognized values fall back to [`Environment::Production`].
    #[must_use]
    pub fn from_env() -> Self {
        env::var(ENVIRONMENT_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Whether debug records should be emitted.
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// Runtime environment
    pub environment: Environment,
}

impl LoggerConfig {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            environment: Environment::from_env(),
        }
    }

    /// Create config with a custom environment.
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}
