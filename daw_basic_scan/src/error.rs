use thiserror::Error;

/// Errors raised while scanning a line into boundaries.
///
/// These are always recoverable from the caller's point of view: the
/// engine wraps every one of them into its own `SYNTAX` error kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unmatched closing bracket")]
    UnmatchedCloseBracket,

    #[error("missing closing bracket")]
    MissingCloseBracket,

    #[error("unexpected '\"' inside operand")]
    QuoteInOperand,

    #[error("unexpected ')' inside operand")]
    UnmatchedCloseBracketInOperand,

    #[error("operand reopened brackets after they were closed")]
    ReopenedBracketInOperand,
}

pub type ScanResult<T> = Result<T, ScanError>;
