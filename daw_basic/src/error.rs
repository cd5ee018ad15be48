use std::fmt;

/// The two error kinds the engine ever raises.
///
/// `Syntax` is always recoverable from the dispatcher's point of view:
/// it gets reported to the user and the REPL keeps going. `Fatal`
/// means an invariant of the engine itself was violated (not user
/// error) and the REPL is expected to terminate.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Syntax(String),
    Fatal(String),
}

impl EngineError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        EngineError::Syntax(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        EngineError::Fatal(msg.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Fatal(_))
    }

    pub fn message(&self) -> &str {
        match self {
            EngineError::Syntax(m) => m,
            EngineError::Fatal(m) => m,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Syntax(m) => write!(f, "SYNTAX ERROR: {m}"),
            EngineError::Fatal(m) => write!(f, "FATAL ERROR: {m}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<daw_basic_scan::ScanError> for EngineError {
    fn from(e: daw_basic_scan::ScanError) -> Self {
        EngineError::syntax(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
