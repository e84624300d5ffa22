use thiserror::Error;

/// Fatal conditions while reading the chain streams.
///
/// Malformed input aborts the run before any report is written; there is no
/// partial-result recovery. A bad chain file indicates an unrecoverable
/// upstream problem.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("I/O error reading chain stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: cannot parse '{token}' as a number")]
    Parse { line: usize, token: String },
    #[error("line {line}: unexpected end of stream")]
    UnexpectedEof { line: usize },
    #[error("mass chains disagree on star count ({0} vs {1})")]
    StarCountMismatch(usize, usize),
    #[error("need at least a one-star mass chain, found {0} stars")]
    BadStarCount(usize),
    #[error("{0} is not a valid magnitude index, choose 0, 1 or 2")]
    BadMagIndex(usize),
    #[error("magnitude index {index} exceeds the {active} active filters")]
    MagIndexOutOfRange { index: usize, active: usize },
}
