pub mod vector;
pub mod stack;
pub mod error;
pub mod boundary;
pub mod io;
pub mod grid;
pub mod opcode;
pub mod delta;
pub mod engine;
pub mod run;

pub use error::{Error, Result};
