//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log levels via environment or config file
//! - Zero-cost when disabled
//! - Optional JSON output and span events
//! - Optional file output through `tracing-appender`

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::name::Name;

// Re-export tracing macros for use throughout the runtime
pub use tracing::{debug, error, info, trace, warn};

/// Set once the global subscriber is installed; holds the file writer guard
static LOGGER: OnceCell<Option<WorkerGuard>> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; console output when absent
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // OBJCORE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("OBJCORE_LOG_LEVEL") {
            config.level = parse_level(&level_str).unwrap_or(Level::INFO);
        }

        // OBJCORE_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("OBJCORE_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("OBJCORE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("OBJCORE_LOG_SPANS").is_ok();

        config
    }

    /// Minimal logging for release builds of the engine
    pub fn performance() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Verbose logging, including every refcount transition
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: Some("objcore.log".to_string()),
            json_format: false,
            show_spans: true,
        }
    }
}

/// Parse a level name the way `OBJCORE_LOG_LEVEL` and the config file spell it
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration (first call wins)
pub fn init_with_config(config: LogConfig) {
    LOGGER.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("objcore={}", config.level.as_str().to_lowercase()))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let (writer, guard) = match &config.log_path {
            Some(path) => {
                let path = Path::new(path);
                let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
                let file = path
                    .file_name()
                    .map(|name| name.to_os_string())
                    .unwrap_or_else(|| "objcore.log".into());
                let appender = tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), file);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
            }
            None => (fmt::writer::BoxMakeWriter::new(io::stdout), None),
        };

        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(cfg!(debug_assertions))
            .with_line_number(cfg!(debug_assertions));

        let layer = if config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        };

        // Another subscriber (a host application or test harness) may already be set
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init();

        guard
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

// ============================================================================
// Runtime-specific logging functions
// ============================================================================

/// Log object storage allocation
#[inline]
pub fn log_allocation(size: usize, ptr: *const u8, type_name: &Name) {
    trace!(
        event = "allocation",
        size_bytes = size,
        address = ?ptr,
        type_name = %type_name,
        "object allocated"
    );
}

/// Log object storage release
#[inline]
pub fn log_deallocation(size: usize, ptr: *const u8) {
    trace!(
        event = "deallocation",
        size_bytes = size,
        address = ?ptr,
        "object storage released"
    );
}

/// Log a container growing its bucket array
pub fn log_container_grow(from: usize, to: usize, len: usize) {
    debug!(
        event = "container_grow",
        from_buckets = from,
        to_buckets = to,
        len,
        "hash container resized"
    );
}

/// Log a new type entering the registry
pub fn log_type_registered(name: &Name, parent: Option<&Name>) {
    debug!(
        event = "type_registered",
        name = %name,
        parent = ?parent,
        "type declared"
    );
}

/// Log a rejected re-declaration
pub fn log_duplicate_type(name: &Name) {
    warn!(
        event = "duplicate_type",
        name = %name,
        "type already registered"
    );
}

/// Log the last share of a descriptor going away
pub fn log_type_finalized(name: &Name) {
    trace!(
        event = "type_finalized",
        name = %name,
        "type descriptor finalized"
    );
}

/// Log registry open
pub fn log_registry_open(capacity: usize) {
    info!(
        event = "registry_open",
        capacity,
        "type registry opened"
    );
}

/// Log registry close
pub fn log_registry_close(live_types: usize) {
    info!(
        event = "registry_close",
        live_types,
        "type registry closed"
    );
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
