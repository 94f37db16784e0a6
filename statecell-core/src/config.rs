//! Runtime mode selection

/// Environment variable consulted by [`Mode::current`]
pub const MODE_ENV_VAR: &str = "STATECELL_ENV";

/// Whether development-only diagnostics run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Shape and key warnings are emitted
    Development,
    /// All warnings are skipped
    Production,
}

impl Mode {
    /// Development in debug builds, Production in release builds.
    ///
    /// `STATECELL_ENV=production` (or `development`) overrides the build profile.
    pub fn current() -> Self {
        Self::from_env_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    /// Mode for a raw `STATECELL_ENV` value; unset or unknown values fall
    /// back to the build profile.
    pub fn from_env_value(value: Option<&str>) -> Self {
        value
            .and_then(Self::parse)
            .unwrap_or_else(Self::from_build)
    }

    /// Parse a mode name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }

    fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::current()
    }
}
