//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ContractError, OverflowPolicy, OverlaySink, RenderedFrame};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    queue: mpsc::Sender<RenderedFrame>,
    overflow: OverflowPolicy,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Start a worker draining a queue of `queue_capacity` frames into `sink`
    pub fn spawn<S: OverlaySink + Send + 'static>(
        sink: S,
        queue_capacity: usize,
        overflow: OverflowPolicy,
    ) -> Self {
        let name = sink.name().to_string();
        let (queue, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = tokio::spawn(drain_queue(
            sink,
            rx,
            Arc::clone(&metrics),
            name.clone(),
        ));

        Self {
            name,
            queue,
            overflow,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a frame according to the overflow policy
    ///
    /// Returns false when the frame never reached the queue.
    pub async fn deliver(&self, frame: RenderedFrame) -> bool {
        match self.overflow {
            OverflowPolicy::Block => self.send(frame).await,
            OverflowPolicy::Drop => self.try_send(frame),
        }
    }

    /// Queue a frame, waiting for room
    pub async fn send(&self, frame: RenderedFrame) -> bool {
        if self.queue.send(frame).await.is_err() {
            error!(sink = %self.name, "Sink worker gone, frame lost");
            return false;
        }
        self.record_queued();
        true
    }

    /// Queue a frame if there is room, otherwise drop it
    pub fn try_send(&self, frame: RenderedFrame) -> bool {
        match self.queue.try_send(frame) {
            Ok(()) => {
                self.record_queued();
                true
            }
            Err(mpsc::error::TrySendError::Full(frame)) => {
                self.metrics.inc_dropped_count();
                observability::record_frame_dispatched(&self.name, false);
                warn!(
                    sink = %self.name,
                    sequence = frame.sequence,
                    frame_index = frame.frame_index,
                    "Queue full, frame dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker gone, frame lost");
                false
            }
        }
    }

    fn record_queued(&self) {
        let queued = self.queue.max_capacity() - self.queue.capacity();
        self.metrics.set_queue_len(queued);
    }

    /// Close the queue and wait until the worker has written, flushed and
    /// closed the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        let Self { name, queue, worker, .. } = self;
        drop(queue);
        if let Err(e) = worker.await {
            error!(sink = %name, error = ?e, "Sink worker panicked");
        }
    }
}

#[instrument(name = "sink_worker", skip(sink, rx, metrics), fields(sink = %name))]
async fn drain_queue<S: OverlaySink>(
    mut sink: S,
    mut rx: mpsc::Receiver<RenderedFrame>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    while let Some(frame) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        let outcome = sink.write(&frame).await;
        record_write(&metrics, &name, &frame, outcome);
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }
    debug!(
        sink = %name,
        written = metrics.write_count(),
        failed = metrics.failure_count(),
        "Sink worker stopped"
    );
}

/// A failed write is counted and logged; the worker keeps going
fn record_write(
    metrics: &SinkMetrics,
    name: &str,
    frame: &RenderedFrame,
    outcome: Result<(), ContractError>,
) {
    match outcome {
        Ok(()) => {
            metrics.inc_write_count();
            metrics.set_last_frame(frame.frame_index);
            observability::record_frame_dispatched(name, true);
        }
        Err(e) => {
            metrics.inc_failure_count();
            observability::record_frame_dispatched(name, false);
            error!(
                sink = %name,
                sequence = frame.sequence,
                frame_index = frame.frame_index,
                error = %e,
                "Write failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::test_frame;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Counts writes, optionally slow or failing
    struct CountingSink {
        name: String,
        writes: Arc<AtomicU64>,
        closed: Arc<AtomicU64>,
        fail: bool,
        delay: Duration,
    }

    impl CountingSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                writes: Arc::new(AtomicU64::new(0)),
                closed: Arc::new(AtomicU64::new(0)),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn slow(name: &str, delay_ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                ..Self::new(name)
            }
        }
    }

    impl OverlaySink for CountingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _frame: &RenderedFrame) -> Result<(), ContractError> {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if self.fail {
                return Err(ContractError::sink_write(&self.name, "disk full"));
            }
            self.writes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_and_closes() {
        let sink = CountingSink::new("frames");
        let writes = Arc::clone(&sink.writes);
        let closed = Arc::clone(&sink.closed);

        let handle = SinkHandle::spawn(sink, 10, OverflowPolicy::Block);
        for i in 0..5 {
            assert!(handle.deliver(test_frame(i)).await);
        }

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(writes.load(Ordering::Relaxed), 5);
        assert_eq!(closed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.snapshot().last_frame, Some(4));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_policy_waits_for_slow_sink() {
        let sink = CountingSink::slow("slow", 5);
        let writes = Arc::clone(&sink.writes);

        let handle = SinkHandle::spawn(sink, 2, OverflowPolicy::Block);
        for i in 0..12 {
            assert!(handle.deliver(test_frame(i)).await);
        }

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(writes.load(Ordering::Relaxed), 12);
        assert_eq!(metrics.dropped_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_policy_sheds_when_full() {
        let handle = SinkHandle::spawn(CountingSink::slow("live", 100), 2, OverflowPolicy::Drop);
        let mut queued = 0;
        for i in 0..10 {
            if handle.deliver(test_frame(i)).await {
                queued += 1;
            }
        }

        assert!(queued < 10);
        assert_eq!(handle.metrics().dropped_count(), 10 - queued);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted() {
        let mut sink = CountingSink::new("failing");
        sink.fail = true;

        let handle = SinkHandle::spawn(sink, 10, OverflowPolicy::Block);
        for i in 0..3 {
            handle.deliver(test_frame(i)).await;
        }

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(metrics.failure_count(), 3);
        assert_eq!(metrics.snapshot().last_frame, None);
    }
}
