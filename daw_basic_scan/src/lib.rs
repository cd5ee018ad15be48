//! Lexical scanning primitives for DAW BASIC.
//!
//! This crate knows nothing about variables, keywords, or values. It
//! only answers "where does this token end", given a `&str` slice of
//! source text. The engine crate (`daw_basic`) drives these functions
//! while it tokenizes a line and decides what to do with each piece.

mod error;
mod scan;

pub use error::{ScanError, ScanResult};
pub use scan::{
    find_end_of_bracket, find_end_of_operand, find_end_of_string, split_in_two_on_char,
    split_statements, SplitTwo,
};
