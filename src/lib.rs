//! An eight-register, 256-byte toy machine that runs programs written as
//! one binary literal per line.

pub mod computer;
pub mod config;
pub mod loader;
