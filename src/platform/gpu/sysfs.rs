use std::fs;
use std::path::{Path, PathBuf};

use crate::core::system_monitor::{
    BackendKind, BoundedList, GpuBackend, GpuMetrics, GpuVendor, MAX_GPUS,
};
use crate::error::Result;

/// Highest DRM card index probed
const MAX_CARD_INDEX: u32 = 16;

const UNKNOWN_GPU: &str = "Unknown GPU";

/// Device enumeration through DRM sysfs, names only
#[derive(Debug, Clone)]
pub struct SysfsBackend {
    drm_root: PathBuf,
}

impl SysfsBackend {
    pub fn new<P: AsRef<Path>>(sys_root: P) -> Self {
        Self {
            drm_root: sys_root.as_ref().join("class").join("drm"),
        }
    }

    /// Enumerate cards that expose a PCI vendor id
    pub fn enumerate(&self) -> BoundedList<GpuMetrics> {
        let mut gpus = BoundedList::with_capacity(MAX_GPUS);

        for index in 0..MAX_CARD_INDEX {
            let device_dir = self.drm_root.join(format!("card{}", index)).join("device");
            let Ok(vendor_id) = fs::read_to_string(device_dir.join("vendor")) else {
                continue;
            };

            let gpu = GpuMetrics {
                index,
                vendor: GpuVendor::from_pci_id(&vendor_id),
                name: read_first_line(&device_dir.join("product"))
                    .unwrap_or_else(|| UNKNOWN_GPU.to_string()),
                supported: false,
                ..Default::default()
            };

            if !gpus.push(gpu) {
                log::debug!("GPU limit of {} reached at card{}", MAX_GPUS, index);
                break;
            }
        }

        gpus
    }
}

fn read_first_line(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let line = content.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

impl GpuBackend for SysfsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn collect(&mut self) -> Result<BoundedList<GpuMetrics>> {
        Ok(self.enumerate())
    }

    fn shutdown(&mut self) {}
}
