// Platform-specific code module

pub mod gpu;
pub mod procfs;

// Re-exports for shorter imports
pub use gpu::select_gpu_backend;
pub use procfs::ProcfsSource;
