use harkonnen_core::{CoreError, SourceError, ValidationError};
use harkonnen_influence::{ConfigError, ResolveError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(inner) => Self::Validation(inner),
            CoreError::Serialization(inner) => Self::Serialization(inner),
            CoreError::Io { path, source } => Self::Read { path, source },
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Command(_) => 2,
            Self::Source(_) => 3,
            Self::Resolve(_) => 3,
            Self::Serialization(_) => 4,
            Self::Read { .. } => 10,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_category() {
        let io = CoreError::Io {
            path: String::from("prices.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(CliError::from(io).exit_code(), 10);

        let validation = CoreError::Validation(ValidationError::EmptySymbol);
        assert_eq!(CliError::from(validation).exit_code(), 2);
    }

    #[test]
    fn upstream_failures_exit_with_three() {
        let error = CliError::from(SourceError::unavailable("chart endpoint down"));
        assert_eq!(error.exit_code(), 3);
    }
}
