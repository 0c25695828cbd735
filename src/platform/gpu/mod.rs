//! GPU-specific platform code.
//!
//! NVIDIA GPUs are read through NVML when the library can be bound. Every other
//! host falls back to DRM sysfs enumeration, which reports names only.

mod nvidia;
mod sysfs;

pub use nvidia::{NvidiaBackend, NVML_ENTRY_POINTS};
pub use sysfs::SysfsBackend;

use crate::core::config::Config;
use crate::core::system_monitor::{GpuBackend, GpuMonitor};

/// Select the GPU backend for the lifetime of a collector
///
/// Tries to bind NVML from each configured library name in order, falling
/// back to sysfs enumeration. The vendor bind is attempted once.
pub fn select_gpu_backend(config: &Config) -> GpuMonitor {
    GpuMonitor::select(
        || {
            NvidiaBackend::bind(&config.nvml_libraries, SysfsBackend::new(&config.sys_root))
                .map(|backend| Box::new(backend) as Box<dyn GpuBackend>)
        },
        || Box::new(SysfsBackend::new(&config.sys_root)),
    )
}
