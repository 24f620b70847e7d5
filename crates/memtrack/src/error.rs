use crate::block::Origin;

/// Why a tracked allocation produced no memory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("zero-byte allocation requested at {origin}")]
    ZeroSize { origin: Origin },

    #[error("allocation of {size} bytes failed at {origin}")]
    AllocationFailed { size: usize, origin: Origin },

    #[error("memory tracker full ({capacity} blocks), allocation at {origin} released")]
    CapacityExhausted { capacity: usize, origin: Origin },
}

impl TrackError {
    /// Call site the failed request came from.
    pub fn origin(&self) -> &Origin {
        match self {
            TrackError::ZeroSize { origin }
            | TrackError::AllocationFailed { origin, .. }
            | TrackError::CapacityExhausted { origin, .. } => origin,
        }
    }

    /// Zero-size requests are caller slips rather than failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, TrackError::ZeroSize { .. })
    }
}

/// Malformed registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("registry capacity must be at least 1")]
    ZeroCapacity,

    #[error("the process-wide registry is already in use")]
    AlreadyConfigured,

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}
