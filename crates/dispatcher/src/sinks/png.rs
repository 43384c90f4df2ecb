//! PngSink - rasterises frames into transparent PNGs

use contracts::{Canvas, ContractError, OverlaySink, RenderedFrame};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

use crate::raster::RasterCanvas;

/// Sink that writes one `frame_{sequence:06}.png` per rendered frame
///
/// Files are numbered by output sequence, so an export stepped faster than
/// the source frame rate keeps every frame even when two share a source index.
pub struct PngSink {
    name: String,
    dir: PathBuf,
    canvas: RasterCanvas,
    written: u64,
}

impl PngSink {
    /// Create a new PngSink writing into `dir` (created if missing)
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            name: name.into(),
            dir,
            canvas: RasterCanvas::new(Default::default()),
            written: 0,
        })
    }

    /// Create from params map (for factory); `path` is the output directory
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, super::path_param(params)?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output path of the frame with output sequence `sequence`
    pub fn frame_path(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("frame_{sequence:06}.png"))
    }

    fn persist_frame(&mut self, frame: &RenderedFrame) -> Result<(), ContractError> {
        if !frame.size.is_valid() {
            debug!(sink = %self.name, frame_index = frame.frame_index, "Skipping frame without size");
            return Ok(());
        }
        if self.canvas.size() != frame.size {
            self.canvas.resize(frame.size);
        }
        self.canvas.paint(&frame.commands);

        let path = self.frame_path(frame.sequence);
        self.canvas.image().save(&path).map_err(|e| {
            error!(sink = %self.name, path = %path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;
        self.written += 1;
        Ok(())
    }
}

impl OverlaySink for PngSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "png_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame_index = frame.frame_index)
    )]
    async fn write(&mut self, frame: &RenderedFrame) -> Result<(), ContractError> {
        self.persist_frame(frame)
    }

    #[instrument(name = "png_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "png_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, written = self.written, "PngSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::test_frame;
    use contracts::VideoSize;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_png_sink_write() {
        let dir = tempdir().unwrap();
        let mut sink = PngSink::new("frames", dir.path()).unwrap();

        sink.write(&test_frame(7)).await.unwrap();
        sink.flush().await.unwrap();

        let path = dir.path().join("frame_000007.png");
        assert!(path.exists());

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (32, 24));
        // Box outline is opaque, interior and corners stay transparent
        assert_eq!(img.get_pixel(4, 10).0, [0x34, 0xd3, 0x99, 255]);
        assert_eq!(img.get_pixel(12, 10).0[3], 0);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[tokio::test]
    async fn test_frames_sharing_source_index_get_own_files() {
        let dir = tempdir().unwrap();
        let mut sink = PngSink::new("frames", dir.path()).unwrap();

        // 60 fps output over a 30 fps source: two renders per source frame
        for sequence in 0..4 {
            let mut frame = test_frame(sequence);
            frame.frame_index = sequence / 2;
            sink.write(&frame).await.unwrap();
        }

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
        assert!(dir.path().join("frame_000003.png").exists());
    }

    #[tokio::test]
    async fn test_png_sink_skips_unsized_frame() {
        let dir = tempdir().unwrap();
        let mut sink = PngSink::new("frames", dir.path()).unwrap();
        let mut frame = test_frame(1);
        frame.size = VideoSize::new(0, 0);

        sink.write(&frame).await.unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_from_params_requires_path() {
        assert!(PngSink::from_params("frames", &HashMap::new()).is_err());

        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let params = HashMap::from([("path".to_string(), out.display().to_string())]);
        let sink = PngSink::from_params("frames", &params).unwrap();
        assert!(out.is_dir());
        assert_eq!(sink.frame_path(12), out.join("frame_000012.png"));
    }
}
