//! Programmer-bug error type (§7 `UsageError`).

use thiserror::Error;

/// Misuse of a component's API, surfaced immediately rather than handled
/// locally — these indicate a caller bug, not a data or geometry problem.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Raytracer::execute called a second time on the same instance")]
    DoubleExecute,

    #[error("query issued before the world finished loading")]
    QueryBeforeLoad,
}

pub type UsageResult<T> = Result<T, UsageError>;
