use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// Longest source path kept in an [`Origin`], in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Caller-supplied classification of an allocation.
///
/// The category has no effect on how a block is tracked; it is carried along
/// so reports can tell short-lived scratch buffers apart from long-lived state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Compile-time sized memory
    Static,
    /// Runtime heap allocation
    Dynamic,
    /// Short-lived allocation
    Temporary,
    /// Long-lived allocation
    Persistent,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Static => write!(f, "Static"),
            Category::Dynamic => write!(f, "Dynamic"),
            Category::Temporary => write!(f, "Temporary"),
            Category::Persistent => write!(f, "Persistent"),
        }
    }
}

/// Lifecycle tag of a block record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Allocated,
    Freed,
    Corrupted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Allocated => write!(f, "Allocated"),
            Status::Freed => write!(f, "Freed"),
            Status::Corrupted => write!(f, "Corrupted"),
        }
    }
}

/// Call site of an allocate or free request.
///
/// Build one with [`Origin::new`], [`Origin::caller`] or the [`origin!`](crate::origin)
/// macro. File names longer than [`MAX_FILENAME_LENGTH`] bytes are truncated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub file: String,
    pub line: u32,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        let mut file = file.into();
        if file.len() > MAX_FILENAME_LENGTH {
            let mut end = MAX_FILENAME_LENGTH;
            while !file.is_char_boundary(end) {
                end -= 1;
            }
            file.truncate(end);
        }

        Self { file, line }
    }

    /// Origin of whoever called the function this is invoked from.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One outstanding allocation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    /// Numeric identity of the memory. Never dereferenced by the registry.
    pub address: usize,
    /// Requested byte count, always > 0.
    pub size: usize,
    pub origin: Origin,
    pub category: Category,
    pub status: Status,
    /// Assigned at allocation time, strictly increasing over the registry's lifetime.
    pub sequence: u64,
}
