use std::fmt;

/// Errors surfaced by the recoverable call sites of this crate.
///
/// Programmer errors called out in the design (rotating a black link,
/// `inf(0)`, a nil-key upsert/insert, a reader-slot timeout) remain
/// `panic!`s at their call site, matching the source this crate is
/// modeled on — they are not represented here.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// `validate()` found two consecutive red links on some path.
    ConsecutiveReds,
    /// `validate()` found mismatched black-link counts on two sibling
    /// paths, `(left, right)`.
    UnbalancedBlacks(usize, usize),
    /// `validate()` found an out-of-order key pair.
    SortError(String, String),
    /// `validate()` found a count that disagrees with an in-order walk.
    CountMismatch(usize, usize),
    /// An unrecognized command name reached the validation harness.
    UnknownCommand(String),
    /// The validation harness found the oracle and the tree disagree on
    /// the outcome of an operation: `(operation, want, got)`.
    ValidationMismatch(&'static str, String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConsecutiveReds => write!(f, "consecutive red links"),
            Error::UnbalancedBlacks(l, r) => {
                write!(f, "unbalanced black links, left:{} right:{}", l, r)
            }
            Error::SortError(a, b) => write!(f, "sort order violated between {} and {}", a, b),
            Error::CountMismatch(want, got) => {
                write!(f, "count mismatch, want:{} got:{}", want, got)
            }
            Error::UnknownCommand(name) => write!(f, "unknown command {:?}", name),
            Error::ValidationMismatch(op, want, got) => {
                write!(f, "{}: expected {} got {}", op, want, got)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
