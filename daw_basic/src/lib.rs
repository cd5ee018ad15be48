//! DAW BASIC — an interactive interpreter for a dialect of BASIC.
//!
//! This crate is the engine: tokenizer/evaluator, symbol environment,
//! statement dispatcher, and program-execution driver. It depends on
//! [`daw_basic_scan`] for the pure lexical boundary-finding functions
//! and exposes nothing that isn't part of the public API an embedder
//! (a REPL loop, a test harness, the `basicr` binary) would need: feed
//! it lines of text, read back values, list program state.
//!
//! The REPL loop itself, terminal I/O, and the executable entry point
//! are collaborators outside this crate's concern (see the `basicr`
//! binary, gated behind the `repl` feature); this crate only fixes the
//! interface they call through ([`Engine::parse_line`]).

mod builtins;
mod dispatcher;
mod engine;
mod environment;
mod error;
mod evaluator;
mod keywords;
mod program;
mod rng;
mod value;

pub use engine::{Engine, RunMode};
pub use environment::{
    ArrayEntry, BinaryOperatorEntry, ConstantEntry, FunctionEntry, KeywordEntry, UnaryOperatorEntry,
};
pub use error::{EngineError, EngineResult};
pub use program::{LoopFrame, ProgramLine};
pub use value::{determine_result_type, Value, ValueKind};
