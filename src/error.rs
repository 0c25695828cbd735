use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Subsystem sampled by one stage of a poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Cpu,
    Memory,
    Disk,
    Network,
    Gpu,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Cpu => "cpu",
            Subsystem::Memory => "memory",
            Subsystem::Disk => "disk",
            Subsystem::Network => "network",
            Subsystem::Gpu => "gpu",
        };
        f.write_str(name)
    }
}

/// Error type for hostmon
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Counter source unavailable: {path:?}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed record in {origin}: {detail}")]
    MalformedRecord { origin: String, detail: String },

    #[error("GPU {index} {metric} unavailable: {detail}")]
    EntityDegraded {
        index: u32,
        metric: &'static str,
        detail: String,
    },

    #[error("GPU backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{subsystem} sampling failed: {source}")]
    Partial {
        subsystem: Subsystem,
        #[source]
        source: Box<MonitorError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for hostmon
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    pub fn source_unavailable<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        MonitorError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn malformed<O: Into<String>, D: Into<String>>(origin: O, detail: D) -> Self {
        MonitorError::MalformedRecord {
            origin: origin.into(),
            detail: detail.into(),
        }
    }

    pub fn degraded<D: fmt::Display>(index: u32, metric: &'static str, detail: D) -> Self {
        MonitorError::EntityDegraded {
            index,
            metric,
            detail: detail.to_string(),
        }
    }

    pub fn backend_unavailable<S: Into<String>>(msg: S) -> Self {
        MonitorError::BackendUnavailable(msg.into())
    }

    /// Wrap an error as the failure of one subsystem within a poll cycle
    pub fn partial(subsystem: Subsystem, source: MonitorError) -> Self {
        MonitorError::Partial {
            subsystem,
            source: Box::new(source),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Subsystem that aborted the cycle, if this is a `Partial` error
    pub fn failed_subsystem(&self) -> Option<Subsystem> {
        match self {
            MonitorError::Partial { subsystem, .. } => Some(*subsystem),
            _ => None,
        }
    }
}
