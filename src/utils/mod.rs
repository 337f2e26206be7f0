//! Shared utilities: entity attributes and command-line validation.

pub mod options;
pub mod validation;

pub use options::{merge_options, options_to_args, Attrs, OptionValue};
pub use validation::{validate_controller_args, UsageError};
