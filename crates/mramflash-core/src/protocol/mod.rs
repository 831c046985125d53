//! Protocol implementations
//!
//! This module contains the command sequences for the supported chips.

pub mod mr25h;

pub use mr25h::*;
