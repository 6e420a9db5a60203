use std::fmt;
use std::str::FromStr;

use tracing::error;

use crate::errors::{
    SimError,
    SimResult,
};

/// What to do with a defect that is not structurally fatal.
///
/// Threaded explicitly through validation and synthesis calls so that a diagnostic run can
/// report every problem in a dictionary while a strict run stops at the first one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Emit an error log line and keep going.
    #[default]
    Log,
    /// Return the defect to the caller, aborting the current operation.
    Raise,
}

impl FailurePolicy {
    /// Apply the policy to `err`.
    ///
    /// Under `Log` the error is logged and swallowed; under `Raise` it is handed back.
    pub fn report(self, err: SimError) -> SimResult<()> {
        match self {
            Self::Log => {
                error!("{err}");
                Ok(())
            },
            Self::Raise => Err(err),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(Self::Log),
            "raise" => Ok(Self::Raise),
            other => Err(SimError::UnsupportedPolicy(other.into())),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Raise => write!(f, "raise"),
        }
    }
}
