//! # Dispatcher
//!
//! Overlay frame export.
//!
//! Responsibilities:
//! - Consume `RenderedFrame`s
//! - Fan out to multiple sinks (log, PNG, JSON lines)
//! - Give each sink its own bounded queue; full queues wait or drop per sink
//! - Rasterise draw commands (`RasterCanvas`)

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod raster;
pub mod sinks;

pub use contracts::{OverlaySink, RenderedFrame};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use raster::RasterCanvas;
pub use sinks::{JsonSink, LogSink, PngSink};
