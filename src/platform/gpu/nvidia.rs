#[cfg(feature = "nvml")]
use nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml};

use super::sysfs::SysfsBackend;
use crate::core::system_monitor::{BackendKind, BoundedList, GpuBackend, GpuMetrics};
use crate::error::{MonitorError, Result};

/// Functions the management library must export before it is used
pub const NVML_ENTRY_POINTS: [&str; 10] = [
    "nvmlInit_v2",
    "nvmlShutdown",
    "nvmlDeviceGetCount_v2",
    "nvmlDeviceGetHandleByIndex_v2",
    "nvmlDeviceGetName",
    "nvmlDeviceGetTemperature",
    "nvmlDeviceGetUtilizationRates",
    "nvmlDeviceGetMemoryInfo",
    "nvmlDeviceGetPowerUsage",
    "nvmlDeviceGetFanSpeed",
];

/// NVIDIA GPU backend using NVML
pub struct NvidiaBackend {
    #[cfg(feature = "nvml")]
    nvml: Option<Nvml>,
    /// Used for polls where the device count cannot be read
    fallback: SysfsBackend,
}

impl NvidiaBackend {
    /// Bind the first candidate library that loads, exports every entry point
    /// and initializes.
    pub fn bind(candidates: &[String], fallback: SysfsBackend) -> Result<Self> {
        #[cfg(feature = "nvml")]
        {
            let mut last_error =
                MonitorError::backend_unavailable("no NVML library candidates configured");

            for name in candidates {
                match init_library(name) {
                    Ok(nvml) => {
                        log::debug!("Bound NVML from {}", name);
                        return Ok(Self {
                            nvml: Some(nvml),
                            fallback,
                        });
                    }
                    Err(e) => {
                        log::debug!("NVML candidate rejected: {}", e);
                        last_error = e;
                    }
                }
            }

            Err(last_error)
        }
        #[cfg(not(feature = "nvml"))]
        {
            let _ = (candidates, fallback);
            Err(MonitorError::backend_unavailable(
                "NVIDIA GPU support not enabled",
            ))
        }
    }
}

#[cfg(feature = "nvml")]
fn init_library(name: &str) -> Result<Nvml> {
    use std::ffi::OsStr;

    probe_library(name)?;
    Nvml::builder()
        .lib_path(OsStr::new(name))
        .init()
        .map_err(|e| MonitorError::backend_unavailable(format!("{}: init failed: {}", name, e)))
}

/// Check that `name` loads and resolves every NVML entry point
#[cfg(feature = "nvml")]
pub fn probe_library(name: &str) -> Result<()> {
    let library = unsafe { libloading::Library::new(name) }
        .map_err(|e| MonitorError::backend_unavailable(format!("{}: {}", name, e)))?;

    for symbol in NVML_ENTRY_POINTS {
        let resolved = unsafe { library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) };
        if resolved.is_err() {
            return Err(MonitorError::backend_unavailable(format!(
                "{}: missing entry point {}",
                name, symbol
            )));
        }
    }

    Ok(())
}

/// Keep a field query's value, logging and zeroing it on failure
#[cfg(feature = "nvml")]
fn field<T: Default, E: std::fmt::Display>(
    index: u32,
    metric: &'static str,
    value: std::result::Result<T, E>,
) -> T {
    value.unwrap_or_else(|e| {
        log::debug!("{}", MonitorError::degraded(index, metric, e));
        T::default()
    })
}

impl GpuBackend for NvidiaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Vendor
    }

    fn collect(&mut self) -> Result<BoundedList<GpuMetrics>> {
        #[cfg(feature = "nvml")]
        {
            use crate::core::system_monitor::{GpuVendor, MAX_GPUS};

            let mut gpus = BoundedList::with_capacity(MAX_GPUS);
            let Some(nvml) = self.nvml.as_ref() else {
                return Ok(gpus);
            };

            let count = match nvml.device_count() {
                Ok(count) => count,
                Err(e) => {
                    log::warn!("NVML device count failed, enumerating sysfs: {}", e);
                    return self.fallback.collect();
                }
            };

            for index in 0..count {
                let mut gpu = GpuMetrics {
                    index,
                    vendor: GpuVendor::Nvidia,
                    supported: true,
                    ..Default::default()
                };

                match nvml.device_by_index(index) {
                    Ok(device) => {
                        gpu.name = field(index, "name", device.name());
                        gpu.temperature_celsius = field(
                            index,
                            "temperature",
                            device.temperature(TemperatureSensor::Gpu),
                        );
                        gpu.utilization_percent = field(
                            index,
                            "utilization",
                            device.utilization_rates().map(|u| u.gpu as f64),
                        );
                        match device.memory_info() {
                            Ok(memory) => {
                                gpu.memory_total_bytes = memory.total;
                                gpu.memory_used_bytes = memory.used;
                                gpu.memory_free_bytes = memory.free;
                            }
                            Err(e) => {
                                log::debug!("{}", MonitorError::degraded(index, "memory", e))
                            }
                        }
                        gpu.power_usage_mw = field(index, "power", device.power_usage());
                        gpu.fan_speed_percent = field(index, "fan", device.fan_speed(0));
                    }
                    Err(e) => log::debug!("{}", MonitorError::degraded(index, "handle", e)),
                }

                if !gpus.push(gpu) {
                    log::debug!("GPU limit of {} reached, {} devices present", MAX_GPUS, count);
                    break;
                }
            }

            Ok(gpus)
        }
        #[cfg(not(feature = "nvml"))]
        {
            self.fallback.collect()
        }
    }

    fn shutdown(&mut self) {
        #[cfg(feature = "nvml")]
        if let Some(nvml) = self.nvml.take() {
            if let Err(e) = nvml.shutdown() {
                log::warn!("NVML shutdown failed: {}", e);
            }
        }
    }
}
