#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON logging and telemetry events shared by the sandbox crates.

/// Append-only JSON-lines logger with a level floor.
#[path = "../logging.rs"]
pub mod logging;

/// Telemetry event records, publishers, and subscribers.
#[path = "../events.rs"]
pub mod events;

/// Cloneable telemetry handle used by the endpoint and the renderer.
#[path = "../handle.rs"]
pub mod handle;

pub use events::{EventPublisher, EventRecord, EventSubscriber, FileEventPublisher, MemoryEventBus};
pub use handle::{Telemetry, TelemetryBuilder};
pub use logging::{JsonLogger, LogLevel, LogRecord};
