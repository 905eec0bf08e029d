//! Runtime errors and the per-thread "last error" slot
//!
//! Every public operation that fails goes through [`RuntimeError::raise`],
//! which records the failure kind before the error is returned. Callers that
//! only see a sentinel (the C ABI) read it back with [`last_error`].

use std::cell::Cell;
use std::fmt;

thread_local! {
    static LAST_ERROR: Cell<Option<ErrorKind>> = const { Cell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    AllocationFailed,
    Exists,
    NotFound,
}

impl ErrorKind {
    /// Stable code exported through the C ABI (0 means no error)
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidArgument => 1,
            Self::AllocationFailed => 2,
            Self::Exists => 3,
            Self::NotFound => 4,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::AllocationFailed => write!(f, "allocation failed"),
            Self::Exists => write!(f, "already exists"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl RuntimeError {
    /// Build an error without touching the last-error slot
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Build an error and record its kind in the last-error slot
    pub fn raise(kind: ErrorKind, detail: impl Into<String>) -> Self {
        set_last_error(kind);
        Self::new(kind, detail)
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::raise(ErrorKind::InvalidArgument, detail)
    }

    pub fn allocation_failed(detail: impl Into<String>) -> Self {
        Self::raise(ErrorKind::AllocationFailed, detail)
    }

    pub fn exists(detail: impl Into<String>) -> Self {
        Self::raise(ErrorKind::Exists, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::raise(ErrorKind::NotFound, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.detail)
        }
    }
}

impl std::error::Error for RuntimeError {}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Kind of the most recent failure on this thread
pub fn last_error() -> Option<ErrorKind> {
    LAST_ERROR.with(Cell::get)
}

pub fn set_last_error(kind: ErrorKind) {
    LAST_ERROR.with(|slot| slot.set(Some(kind)));
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| slot.set(None));
}

/// Run `f` and put the last-error slot back the way it was.
///
/// For internal checks whose failure is handled locally and must not leak
/// into what the caller observes.
pub fn probe<T>(f: impl FnOnce() -> T) -> T {
    let saved = last_error();
    let out = f();
    LAST_ERROR.with(|slot| slot.set(saved));
    out
}
