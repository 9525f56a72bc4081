mod code;
mod logger;
mod position;
use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A wrapper for the grammar description text with lazily indexed line information.
pub struct Code<'c> {
    pub value: &'c [u8],
    line_starts: OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
/// Severity and verbosity ladder shared by the generator diagnostics and the
/// emitted parser. A level admits every message at or below its position.
pub enum Verbosity {
    Error,
    Warning,
    Success,
    Debug1,
    Info,
    Debug2,
    Debug3,
    All,
}
