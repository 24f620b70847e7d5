use crate::error::ConfigError;
use crate::heap::{HeapSource, LibcHeap};
use crate::registry::Registry;

/// Number of blocks a registry can hold unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 1000;

pub const CAPACITY_ENV: &str = "MEMTRACK_CAPACITY";
pub const TRACKING_ENV: &str = "MEMTRACK_TRACKING";

/// Builder for a [`Registry`].
///
/// # Examples
///
/// ```rust
/// use memtrack::RegistryBuilder;
///
/// let registry = RegistryBuilder::new()
///     .capacity(16)
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.capacity(), 16);
/// assert_eq!(registry.outstanding_count(), 0);
/// ```
///
/// Environment overrides are applied with [`RegistryBuilder::with_env`]:
///
/// * `MEMTRACK_CAPACITY` - maximum number of tracked blocks
/// * `MEMTRACK_TRACKING` - `0`, `false` or `off` turns tracking into a pass-through
#[derive(Debug, Clone)]
pub struct RegistryBuilder<H = LibcHeap> {
    capacity: usize,
    tracking: bool,
    heap: H,
}

impl RegistryBuilder<LibcHeap> {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            tracking: true,
            heap: LibcHeap,
        }
    }
}

impl Default for RegistryBuilder<LibcHeap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HeapSource> RegistryBuilder<H> {
    /// Maximum number of blocks tracked at once. Default: 1000
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// When disabled, allocations and frees go straight to the heap and
    /// nothing is recorded. Default: enabled
    pub fn tracking(mut self, enabled: bool) -> Self {
        self.tracking = enabled;
        self
    }

    /// Swap the underlying allocation primitive.
    pub fn heap<S: HeapSource>(self, heap: S) -> RegistryBuilder<S> {
        RegistryBuilder {
            capacity: self.capacity,
            tracking: self.tracking,
            heap,
        }
    }

    /// Apply `MEMTRACK_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn with_lookup<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(CAPACITY_ENV) {
            self.capacity = value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: CAPACITY_ENV,
                    value: value.clone(),
                    reason: "expected a positive integer",
                })?;
        }

        if let Some(value) = lookup(TRACKING_ENV) {
            self.tracking = parse_switch(&value).ok_or_else(|| ConfigError::InvalidEnv {
                var: TRACKING_ENV,
                value: value.clone(),
                reason: "expected one of 1/0, true/false, on/off",
            })?;
        }

        Ok(self)
    }

    pub fn build(self) -> Result<Registry<H>, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Registry::with_parts(self.capacity, self.tracking, self.heap))
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    let value = value.trim();
    if value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("on") {
        Some(true)
    } else if value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        None
    }
}
