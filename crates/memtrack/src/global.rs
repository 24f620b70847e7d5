//! Process-wide registry.
//!
//! The registry behind these functions is created on first use from the
//! `MEMTRACK_*` environment, unless [`configure`] installed one earlier. It is
//! guarded by a single mutex, so every operation
//! is serialized and the byte and block totals always match the tracked
//! blocks. Prefer the [`allocate!`](crate::allocate) and
//! [`deallocate!`](crate::deallocate) macros, which fill in the call site.

use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::block::{Category, Origin};
use crate::config::RegistryBuilder;
use crate::error::{ConfigError, TrackError};
use crate::output::{Format, Report};
use crate::registry::{FreeOutcome, Registry};

static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY
        .get_or_init(|| Mutex::new(configured()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn configured() -> Registry {
    match Registry::builder().with_env().and_then(|builder| builder.build()) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring memtrack environment configuration");
            Registry::new()
        }
    }
}

/// Install a registry built from `builder`.
///
/// Must run before anything else touches the process-wide registry. Fails with
/// [`ConfigError::AlreadyConfigured`] once it exists, whether it came from an
/// earlier `configure` or from the environment on first use.
pub fn configure(builder: RegistryBuilder) -> Result<(), ConfigError> {
    let registry = builder.build()?;
    REGISTRY
        .set(Mutex::new(registry))
        .map_err(|_| ConfigError::AlreadyConfigured)
}

/// Forget every tracked block. See [`Registry::init`].
pub fn init() {
    registry().init();
}

/// See [`Registry::track_allocate`].
pub fn allocate(size: usize, origin: Origin, category: Category) -> Result<NonNull<u8>, TrackError> {
    registry().track_allocate(size, origin, category)
}

/// See [`Registry::track_free`].
///
/// # Safety
///
/// `ptr` must be null, or a live pointer returned by [`allocate`] (or by
/// `malloc`) that has not been freed yet.
pub unsafe fn free(ptr: *mut u8, origin: Origin) -> FreeOutcome {
    unsafe { registry().track_free(ptr, origin) }
}

pub fn snapshot() -> Report {
    registry().snapshot()
}

pub fn generate_report() -> String {
    registry().generate_report()
}

/// See [`Registry::print_report`].
pub fn print_report(format: Format) -> Result<(), Box<dyn std::error::Error>> {
    // snapshot first so the lock is not held while writing to stdout
    let report = snapshot();
    report.print(format)
}

pub fn outstanding_bytes() -> usize {
    registry().outstanding_bytes()
}

pub fn outstanding_count() -> usize {
    registry().outstanding_count()
}
