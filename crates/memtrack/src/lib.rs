//! A small allocation registry for hunting leaks.
//!
//! Allocations made through a [`Registry`] are recorded with their size, call
//! site and category until they are freed. At any point the registry can tell
//! how many blocks and bytes are outstanding and print a report listing them.
//! The registry is bounded: once every slot is taken further allocations fail
//! with [`TrackError::CapacityExhausted`] instead of growing without limit.
//!
//! ```rust
//! use memtrack::{origin, Category, Registry};
//!
//! let mut registry = Registry::new();
//! let ptr = registry.track_allocate(20, origin!(), Category::Dynamic).unwrap();
//! assert_eq!(registry.outstanding_bytes(), 20);
//!
//! unsafe { registry.track_free(ptr.as_ptr(), origin!()) };
//! assert_eq!(registry.outstanding_count(), 0);
//! ```
//!
//! A process-wide registry lives in [`global`], driven by the [`allocate!`]
//! and [`deallocate!`] macros.

mod block;
mod config;
mod error;
pub mod global;
mod heap;
mod output;
mod registry;
mod reporters;

pub use block::{BlockRecord, Category, Origin, Status, MAX_FILENAME_LENGTH};
pub use config::{RegistryBuilder, CAPACITY_ENV, DEFAULT_CAPACITY, TRACKING_ENV};
pub use error::{ConfigError, TrackError};
pub use heap::{HeapSource, LibcHeap};
pub use output::{format_bytes, BlockEntry, Format, Report, Reporter, JSON_ENV};
pub use registry::{FreeOutcome, Registry};

/// [`Origin`] of the macro invocation.
#[macro_export]
macro_rules! origin {
    () => {
        $crate::Origin::new(file!(), line!())
    };
}

/// Allocate through the process-wide registry, recording the call site.
///
/// ```rust
/// use memtrack::{allocate, deallocate, Category};
///
/// let ptr = allocate!(64, Category::Temporary).unwrap();
/// unsafe { deallocate!(ptr.as_ptr()) };
/// ```
#[macro_export]
macro_rules! allocate {
    ($size:expr, $category:expr) => {
        $crate::global::allocate($size, $crate::origin!(), $category)
    };
}

/// Free through the process-wide registry, recording the call site.
///
/// Takes a raw pointer of any type. Must be used inside `unsafe`, with the
/// same contract as [`global::free`].
#[macro_export]
macro_rules! deallocate {
    ($ptr:expr) => {
        $crate::global::free(($ptr).cast::<u8>(), $crate::origin!())
    };
}
