//! Command-line input validation.
//!
//! Runs before any domain object is constructed, so a malformed invocation
//! never touches the runtime.

use crate::controller::{ControllerSet, ControllerSetError};

/// Number of controller sets accepted on the command line: one shared set,
/// or one per site plus one for the metro core
pub const VALID_SET_COUNTS: [usize; 2] = [1, 4];

/// Malformed command-line invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UsageError {
    #[error("requires one or four sets of comma-separated controller IPs, got {count}")]
    WrongSetCount { count: usize },

    #[error("invalid controller set '{arg}': {source}")]
    InvalidSet {
        arg: String,
        #[source]
        source: ControllerSetError,
    },
}

/// Validate and parse the positional controller-set arguments
///
/// # Examples
/// ```
/// use netdomains::utils::validation::{validate_controller_args, UsageError};
///
/// assert_eq!(validate_controller_args(&["10.0.0.1,10.0.0.2"]).unwrap().len(), 1);
/// assert_eq!(
///     validate_controller_args(&["10.0.0.1", "10.0.0.2"]),
///     Err(UsageError::WrongSetCount { count: 2 })
/// );
/// ```
pub fn validate_controller_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<ControllerSet>, UsageError> {
    if !VALID_SET_COUNTS.contains(&args.len()) {
        return Err(UsageError::WrongSetCount { count: args.len() });
    }

    args.iter()
        .map(|arg| {
            arg.as_ref().parse::<ControllerSet>().map_err(|source| UsageError::InvalidSet {
                arg: arg.as_ref().to_string(),
                source,
            })
        })
        .collect()
}
