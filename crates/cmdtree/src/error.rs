use thiserror::Error;

use crate::flags::Kind;
use crate::lifecycle::Stage;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything `execute` can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A fallible lifecycle callback returned an error.
    #[error("{error:#}")]
    Lifecycle { stage: Stage, error: anyhow::Error },

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The lifecycle stage that failed, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Lifecycle { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A malformed flag token or a value that does not convert to its flag's kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown flag: --{0}")]
    UnknownFlag(String),

    #[error("unknown shorthand flag: '{shorthand}' in {token}")]
    UnknownShorthand { shorthand: char, token: String },

    #[error("flag needs an argument: {0}")]
    MissingValue(String),

    #[error("invalid argument {value:?} for {flag:?} flag: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },
}

/// A positional-argument contract was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Typed flag accessor failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("flag accessed but not defined: {0}")]
    NotFound(String),

    #[error("trying to get {requested} value of flag of type {actual}: {name}")]
    WrongType {
        name: String,
        requested: Kind,
        actual: Kind,
    },
}
