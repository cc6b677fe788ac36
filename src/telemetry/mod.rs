//! Training telemetry and log archival.

pub mod archive;
pub mod record;
pub mod sink;

pub use archive::archive_logs;
pub use record::{RecordKind, TelemetryRecord};
pub use sink::{JsonlTelemetry, MemoryTelemetry, TelemetrySink};
