//! Error types for arena allocation and lexing.

/// Arena allocation failure.
///
/// Arenas never partially satisfy a request: on error nothing was allocated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("arena out of memory: requested {requested} bytes, {remaining} remaining")]
    OutOfMemory { requested: usize, remaining: usize },
    #[error("allocation of {0} bytes exceeds the addressable span size")]
    TooLarge(usize),
}

/// Failure to decode a C-style escape sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscapeError {
    #[error("unterminated escape sequence")]
    Unterminated,
    #[error("\\x must be followed by at least one hex digit")]
    MissingHexDigit,
    #[error("octal escape \\{0:o} exceeds 8 bits")]
    OctalOverflow(u32),
    #[error("unknown escape sequence: \\{0}")]
    Unknown(char),
}
