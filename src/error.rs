//! Interpreter errors

use std::path::PathBuf;

use thiserror::Error;

use crate::boundary::{Access, Edge};
use crate::vector::Vector2;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Conditions that stop a step. Stack underflow and an empty undo log are
/// not errors and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot {access} past {edge} of grid at {position}")]
    Boundary {
        edge: Edge,
        access: Access,
        position: Vector2,
    },

    #[error("'{op}' by zero at {position}")]
    DivisionByZero { op: char, position: Vector2 },

    #[error("grid of {width}x{height} exceeds the limit of {limit} cells")]
    GridTooLarge {
        width: usize,
        height: usize,
        limit: usize,
    },

    #[error("input exhausted")]
    InputExhausted,

    #[error("file {} is not found", .0.display())]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
