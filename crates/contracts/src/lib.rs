//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Playback time is seconds (f64) on the source video clock
//! - `frame` is the 0-based frame index at the video's fixed frame rate,
//!   `frame = round(time * fps)`
//!
//! ## Coordinate Model
//! - Every bbox/point is in source-video pixel space
//! - Canvases are sized to the source resolution, so no scaling happens at draw time

mod canvas;
mod detection;
mod error;
mod jersey;
mod overlay_config;
mod progress;
mod results;
mod sink;
mod video;
mod viewer_config;

pub use canvas::*;
pub use detection::*;
pub use error::*;
pub use jersey::*;
pub use overlay_config::*;
pub use progress::*;
pub use results::*;
pub use sink::*;
pub use video::*;
pub use viewer_config::*;
