use serde::{Deserialize, Serialize};
use std::fmt;

use super::metrics::{BoundedList, GpuMetrics};
use crate::error::Result;

/// Which GPU source was bound at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Vendor management library with full telemetry
    Vendor,
    /// Device enumeration only, names without telemetry
    Fallback,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Vendor => write!(f, "vendor"),
            BackendKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// Trait for GPU metric backends
///
/// Implementations live in the platform layer. A backend reports every GPU it
/// can see in one call and releases its resources on `shutdown`.
pub trait GpuBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Collect metrics for all visible GPUs
    fn collect(&mut self) -> Result<BoundedList<GpuMetrics>>;

    /// Release the backend. Calling this more than once is harmless.
    fn shutdown(&mut self);
}

/// Owns the GPU backend chosen for the lifetime of the collector
pub struct GpuMonitor {
    backend: Box<dyn GpuBackend>,
    shut_down: bool,
}

impl GpuMonitor {
    /// Bind the vendor backend, or use `fallback` when binding fails.
    ///
    /// Binding is attempted exactly once; the choice is never revisited.
    pub fn select<B, F>(bind_vendor: B, fallback: F) -> Self
    where
        B: FnOnce() -> Result<Box<dyn GpuBackend>>,
        F: FnOnce() -> Box<dyn GpuBackend>,
    {
        let backend = match bind_vendor() {
            Ok(backend) => {
                log::info!("GPU backend: vendor library bound");
                backend
            }
            Err(e) => {
                log::info!("GPU backend: using device enumeration fallback ({})", e);
                fallback()
            }
        };
        Self::with_backend(backend)
    }

    pub fn with_backend(backend: Box<dyn GpuBackend>) -> Self {
        Self {
            backend,
            shut_down: false,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn collect(&mut self) -> Result<BoundedList<GpuMetrics>> {
        self.backend.collect()
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.backend.shutdown();
        log::debug!("GPU backend ({}) shut down", self.backend.kind());
    }
}

impl Drop for GpuMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
