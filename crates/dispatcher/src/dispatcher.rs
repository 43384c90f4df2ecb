//! Dispatcher - fans rendered frames out to every configured sink

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{RenderedFrame, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{JsonSink, LogSink, PngSink};

/// Per-sink metrics once every sink has drained, in configuration order
pub type DispatchReport = Vec<(String, MetricsSnapshot)>;

/// Reads frames from one channel and hands each to every sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<RenderedFrame>,
}

impl Dispatcher {
    pub fn new(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<RenderedFrame>) -> Self {
        Self { handles, input_rx }
    }

    /// Open every configured sink; fails on the first sink that cannot be opened
    #[instrument(name = "dispatcher_from_configs", skip_all, fields(sinks = configs.len()))]
    pub fn from_configs(
        configs: &[SinkConfig],
        input_rx: mpsc::Receiver<RenderedFrame>,
    ) -> Result<Self, DispatcherError> {
        let handles = configs
            .iter()
            .map(open_sink)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(handles, input_rx))
    }

    pub fn metrics(&self) -> DispatchReport {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Deliver frames until the input closes, then drain and close every sink
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> DispatchReport {
        info!(sinks = self.handles.len(), "Dispatcher started");
        let tracked: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();

        let mut frames: u64 = 0;
        while let Some(frame) = self.input_rx.recv().await {
            frames += 1;
            self.dispatch_frame(frame).await;
            if frames % 100 == 0 {
                debug!(frames, "Dispatcher progress");
            }
        }

        info!(frames, "Dispatcher input closed, draining sinks");
        for handle in self.handles {
            handle.shutdown().await;
        }

        tracked
            .into_iter()
            .map(|(name, metrics)| (name, metrics.snapshot()))
            .collect()
    }

    pub fn spawn(self) -> JoinHandle<DispatchReport> {
        tokio::spawn(self.run())
    }

    /// Blocking sinks hold up the next frame until they have room
    async fn dispatch_frame(&self, frame: RenderedFrame) {
        let Some((last, rest)) = self.handles.split_last() else {
            return;
        };
        for handle in rest {
            handle.deliver(frame.clone()).await;
        }
        last.deliver(frame).await;
    }
}

#[instrument(
    name = "dispatcher_open_sink",
    skip(config),
    fields(sink = %config.name, sink_type = %config.sink_type)
)]
fn open_sink(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let creation_failed =
        |e: std::io::Error| DispatcherError::sink_creation(&config.name, e.to_string());
    let (capacity, overflow) = (config.queue_capacity, config.overflow);

    let handle = match config.sink_type {
        SinkType::Log => SinkHandle::spawn(LogSink::new(&config.name), capacity, overflow),
        SinkType::Png => SinkHandle::spawn(
            PngSink::from_params(&config.name, &config.params).map_err(creation_failed)?,
            capacity,
            overflow,
        ),
        SinkType::Json => SinkHandle::spawn(
            JsonSink::from_params(&config.name, &config.params).map_err(creation_failed)?,
            capacity,
            overflow,
        ),
    };
    debug!(?overflow, capacity, "Sink opened");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::test_frame;
    use contracts::OverflowPolicy;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sink_config(name: &str, sink_type: SinkType, path: Option<std::path::PathBuf>) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type,
            queue_capacity: 50,
            overflow: OverflowPolicy::Block,
            params: path
                .map(|p| HashMap::from([("path".to_string(), p.display().to_string())]))
                .unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_every_sink_sees_every_frame() {
        let (input_tx, input_rx) = mpsc::channel(10);
        let handles = vec![
            SinkHandle::spawn(LogSink::new("a"), 10, OverflowPolicy::Block),
            SinkHandle::spawn(LogSink::new("b"), 10, OverflowPolicy::Block),
        ];
        let handle = Dispatcher::new(handles, input_rx).spawn();

        for i in 0..5 {
            input_tx.send(test_frame(i)).await.unwrap();
        }
        drop(input_tx);

        let report = handle.await.unwrap();
        let names: Vec<_> = report.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        for (_, snapshot) in &report {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.dropped_count, 0);
        }
    }

    #[tokio::test]
    async fn test_from_configs_opens_file_sinks() {
        let dir = tempdir().unwrap();
        let (input_tx, input_rx) = mpsc::channel(10);
        let configs = vec![
            sink_config("log", SinkType::Log, None),
            sink_config("frames", SinkType::Png, Some(dir.path().join("png"))),
            sink_config("commands", SinkType::Json, Some(dir.path().join("frames.jsonl"))),
        ];

        let handle = Dispatcher::from_configs(&configs, input_rx).unwrap().spawn();
        input_tx.send(test_frame(3)).await.unwrap();
        drop(input_tx);
        handle.await.unwrap();

        assert!(dir.path().join("png/frame_000003.png").exists());
        let lines = std::fs::read_to_string(dir.path().join("frames.jsonl")).unwrap();
        assert_eq!(lines.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_file_sink_without_path_fails() {
        let (_tx, input_rx) = mpsc::channel(1);
        let configs = vec![sink_config("frames", SinkType::Png, None)];

        let err = Dispatcher::from_configs(&configs, input_rx).err().unwrap();
        assert!(matches!(err, DispatcherError::SinkCreation { .. }));
    }

    #[tokio::test]
    async fn test_no_sinks_still_drains_input() {
        let (input_tx, input_rx) = mpsc::channel(2);
        let handle = Dispatcher::new(Vec::new(), input_rx).spawn();
        for i in 0..4 {
            input_tx.send(test_frame(i)).await.unwrap();
        }
        drop(input_tx);
        assert!(handle.await.unwrap().is_empty());
    }
}
