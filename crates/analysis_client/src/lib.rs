//! # Analysis Client
//!
//! Talks to the external analysis API.
//!
//! Responsibilities:
//! - Fetch analysis results, video metadata and task status (REST)
//! - Read and edit manual jersey mappings
//! - Follow analysis progress over the progress socket, falling back to
//!   task polling when the socket fails
//!
//! ## Usage Example
//!
//! ```ignore
//! use analysis_client::{watch, AnalysisApi, ProgressMonitor};
//! use tokio_util::sync::CancellationToken;
//!
//! let api = AnalysisApi::new(&config.api)?;
//! let video = api.get_video("abc").await?;
//! let mut monitor = ProgressMonitor::new(&config, &video.id, video.task_id.clone(), api);
//! let outcome = watch(&mut monitor, &CancellationToken::new(), |u| {
//!     println!("{:?} {:.0}%", u.status, u.percent());
//! })
//! .await?;
//! ```

mod api;
mod error;
mod monitor;
mod progress;

// Re-exports
pub use api::{AnalysisApi, LocalTaskStatusFetcher, TaskStatusFetcher};
pub use error::{ClientError, Result};
pub use monitor::{watch, ProgressMonitor, WatchOutcome};
pub use progress::{PollingProgress, WebSocketProgress};
