//! Command handlers for the KorQA CLI.

pub mod ask;
pub mod clean;
pub mod load;
pub mod status;
pub mod validate;

pub use ask::AskCommand;
pub use clean::CleanCommand;
pub use load::LoadCommand;
pub use status::StatusCommand;
pub use validate::ValidateCommand;

use korqa_core::AppResult;
use serde::Serialize;

/// Knowledge base used when `--base` is not given.
pub const DEFAULT_BASE: &str = "korquad";

pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
