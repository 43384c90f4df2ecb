//! ProgressMonitor - one progress source over two strategies.
//!
//! Starts on the progress socket and switches to task polling the first
//! time the socket fails to connect or breaks. Polling needs a task id;
//! without one the socket error propagates.

use std::time::Duration;

use contracts::{ContractError, ProgressSource, ProgressUpdate, ViewerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::TaskStatusFetcher;
use crate::progress::{PollingProgress, WebSocketProgress};

enum Strategy<F> {
    Disconnected,
    Socket(WebSocketProgress),
    Polling(PollingProgress<F>),
}

/// Progress of one video's analysis
pub struct ProgressMonitor<F> {
    video_id: String,
    socket_url: String,
    task_id: Option<String>,
    fetcher: Option<F>,
    poll_interval: Duration,
    strategy: Strategy<F>,
    finished: bool,
}

impl<F> ProgressMonitor<F>
where
    F: TaskStatusFetcher + Sync,
{
    pub fn new(
        config: &ViewerConfig,
        video_id: impl Into<String>,
        task_id: Option<String>,
        fetcher: F,
    ) -> Self {
        let video_id = video_id.into();
        Self {
            socket_url: config.progress_url(&video_id),
            video_id,
            task_id,
            fetcher: Some(fetcher),
            poll_interval: Duration::from_millis(config.api.poll_interval_ms),
            strategy: Strategy::Disconnected,
            finished: false,
        }
    }

    /// Override the socket URL
    pub fn with_socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// True once the monitor has fallen back to polling
    pub fn is_polling(&self) -> bool {
        matches!(self.strategy, Strategy::Polling(_))
    }

    fn fall_back(&mut self, cause: ContractError) -> Result<(), ContractError> {
        let (Some(task_id), Some(fetcher)) = (self.task_id.clone(), self.fetcher.take()) else {
            self.finished = true;
            return Err(cause);
        };
        warn!(
            video_id = %self.video_id,
            task_id = %task_id,
            error = %cause,
            "Progress socket failed, falling back to polling"
        );
        metrics::counter!("analysis_progress_fallbacks_total").increment(1);
        self.strategy = Strategy::Polling(PollingProgress::new(fetcher, task_id, self.poll_interval));
        Ok(())
    }
}

impl<F> ProgressSource for ProgressMonitor<F>
where
    F: TaskStatusFetcher + Sync,
{
    fn name(&self) -> &str {
        match &self.strategy {
            Strategy::Polling(p) => p.name(),
            _ => "websocket",
        }
    }

    async fn next_update(&mut self) -> Result<Option<ProgressUpdate>, ContractError> {
        loop {
            if self.finished {
                return Ok(None);
            }

            if matches!(self.strategy, Strategy::Disconnected) {
                match WebSocketProgress::connect(&self.socket_url).await {
                    Ok(socket) => self.strategy = Strategy::Socket(socket),
                    Err(e) => self.fall_back(e.into())?,
                }
                continue;
            }

            let on_socket = matches!(self.strategy, Strategy::Socket(_));
            let result = match &mut self.strategy {
                Strategy::Socket(socket) => socket.next_update().await,
                Strategy::Polling(polling) => polling.next_update().await,
                Strategy::Disconnected => continue,
            };

            match result {
                Ok(Some(update)) => {
                    if update.status.is_terminal() {
                        self.finished = true;
                    }
                    observability::record_analysis_progress(self.name(), update.percent());
                    return Ok(Some(update));
                }
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) if on_socket => self.fall_back(e)?,
                Err(e) => return Err(e),
            }
        }
    }
}

/// How a watch ended
#[derive(Debug, Clone, Default)]
pub struct WatchOutcome {
    /// Updates received
    pub updates: usize,
    /// Last update seen
    pub last: Option<ProgressUpdate>,
    /// Stopped by the cancellation token
    pub cancelled: bool,
}

impl WatchOutcome {
    /// Ended on a terminal status
    pub fn is_terminal(&self) -> bool {
        self.last
            .as_ref()
            .is_some_and(|u| u.status.is_terminal())
    }
}

/// Drain a progress source until it ends or `cancel` fires
///
/// Every update is handed to `on_update` as it arrives.
#[instrument(skip_all, fields(source = source.name()))]
pub async fn watch<S, H>(
    source: &mut S,
    cancel: &CancellationToken,
    mut on_update: H,
) -> Result<WatchOutcome, ContractError>
where
    S: ProgressSource,
    H: FnMut(&ProgressUpdate) + Send,
{
    let mut outcome = WatchOutcome::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(updates = outcome.updates, "Progress watch cancelled");
                outcome.cancelled = true;
                return Ok(outcome);
            }
            next = source.next_update() => {
                match next? {
                    Some(update) => {
                        on_update(&update);
                        outcome.updates += 1;
                        outcome.last = Some(update);
                    }
                    None => {
                        info!(updates = outcome.updates, "Progress stream ended");
                        return Ok(outcome);
                    }
                }
            }
        }
    }
}
