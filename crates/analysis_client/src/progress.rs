//! Progress sources: the progress WebSocket and task-status polling.

use std::time::Duration;

use contracts::{ContractError, ProgressSource, ProgressUpdate};
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::api::TaskStatusFetcher;
use crate::error::{ClientError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Progress pushed over `ws_url/ws/progress/{video_id}`
///
/// Each text frame is one JSON [`ProgressUpdate`]. Frames that do not parse
/// are logged and skipped. A close frame or a terminal status ends the
/// stream.
pub struct WebSocketProgress {
    url: String,
    stream: WsStream,
    finished: bool,
}

impl WebSocketProgress {
    /// Open the socket
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| ClientError::Connection {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
        info!(url, "Connected to progress socket");
        Ok(Self {
            url: url.to_string(),
            stream,
            finished: false,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn close_quietly(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(url = %self.url, error = %e, "Progress socket close failed");
        }
    }
}

impl ProgressSource for WebSocketProgress {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn next_update(&mut self) -> std::result::Result<Option<ProgressUpdate>, ContractError> {
        if self.finished {
            return Ok(None);
        }

        while let Some(msg_result) = self.stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ProgressUpdate>(&text) {
                        Ok(update) => {
                            if update.status.is_terminal() {
                                self.finished = true;
                                self.close_quietly().await;
                            }
                            return Ok(Some(update));
                        }
                        Err(e) => {
                            warn!(url = %self.url, error = %e, "Skipping unparsable progress message");
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!(url = %self.url, ?frame, "Progress socket closed by server");
                    self.finished = true;
                    return Ok(None);
                }
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => {
                    self.finished = true;
                    return Err(ClientError::Protocol(e.to_string()).into());
                }
            }
        }

        self.finished = true;
        Ok(None)
    }
}

/// Progress polled from `GET /analysis/{task_id}`
///
/// Waits one interval before every request. Failed polls are logged and
/// retried on the next tick; they never end the stream.
pub struct PollingProgress<F> {
    fetcher: F,
    task_id: String,
    interval: Duration,
    finished: bool,
    failed_polls: u64,
}

impl<F> PollingProgress<F>
where
    F: TaskStatusFetcher + Sync,
{
    pub fn new(fetcher: F, task_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            fetcher,
            task_id: task_id.into(),
            interval,
            finished: false,
            failed_polls: 0,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Polls that failed so far
    pub fn failed_polls(&self) -> u64 {
        self.failed_polls
    }
}

impl<F> ProgressSource for PollingProgress<F>
where
    F: TaskStatusFetcher + Sync,
{
    fn name(&self) -> &str {
        "polling"
    }

    async fn next_update(&mut self) -> std::result::Result<Option<ProgressUpdate>, ContractError> {
        while !self.finished {
            tokio::time::sleep(self.interval).await;

            match self.fetcher.fetch_task_status(&self.task_id).await {
                Ok(task) => {
                    let update = ProgressUpdate::from(task);
                    if update.status.is_terminal() {
                        self.finished = true;
                    }
                    return Ok(Some(update));
                }
                Err(e) => {
                    self.failed_polls += 1;
                    metrics::counter!("analysis_poll_errors_total").increment(1);
                    warn!(task_id = %self.task_id, error = %e, "Poll error");
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use contracts::AnalysisTask;

    use crate::api::TaskStatusFetcher;
    use crate::error::{ClientError, Result};

    /// Fetcher answering from a script; an exhausted script keeps failing
    #[derive(Default)]
    pub struct ScriptedFetcher {
        script: Mutex<VecDeque<Result<AnalysisTask>>>,
    }

    impl ScriptedFetcher {
        pub fn new(script: Vec<Result<AnalysisTask>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }

        pub fn task(status: &str, progress: f64) -> Result<AnalysisTask> {
            Ok(AnalysisTask {
                video_id: "v1".into(),
                status: status.into(),
                progress,
                ..Default::default()
            })
        }

        pub fn failure() -> Result<AnalysisTask> {
            Err(ClientError::Api {
                status: 503,
                body: "busy".into(),
            })
        }
    }

    impl TaskStatusFetcher for ScriptedFetcher {
        async fn fetch_task_status(&self, _task_id: &str) -> Result<AnalysisTask> {
            let next = self.script.lock().map(|mut s| s.pop_front()).ok().flatten();
            next.unwrap_or_else(Self::failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ScriptedFetcher;
    use super::*;
    use contracts::ProgressStatus;
    use futures::SinkExt;
    use tokio::net::TcpListener;

    const TICK: Duration = Duration::from_millis(5);

    #[tokio::test]
    async fn test_polling_maps_tasks_until_terminal() {
        let fetcher = ScriptedFetcher::new(vec![
            ScriptedFetcher::task("processing", 35.0),
            ScriptedFetcher::task("completed", 98.0),
        ]);
        let mut source = PollingProgress::new(fetcher, "t1", TICK);

        let first = source.next_update().await.unwrap().unwrap();
        assert_eq!(first.status, ProgressStatus::Processing);
        assert_eq!(first.progress, 35.0);

        let second = source.next_update().await.unwrap().unwrap();
        assert_eq!(second.status, ProgressStatus::Completed);
        assert_eq!(second.progress, 100.0);

        assert!(source.next_update().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_polling_retries_after_errors() {
        let fetcher = ScriptedFetcher::new(vec![
            ScriptedFetcher::failure(),
            ScriptedFetcher::failure(),
            ScriptedFetcher::task("failed", 10.0),
        ]);
        let mut source = PollingProgress::new(fetcher, "t1", TICK);

        let update = source.next_update().await.unwrap().unwrap();
        assert_eq!(update.status, ProgressStatus::Failed);
        assert_eq!(source.failed_polls(), 2);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let err = WebSocketProgress::connect("ws://127.0.0.1:1/ws/progress/v1")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_websocket_skips_garbage_and_ends_on_terminal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            for text in [
                "not json",
                r#"{"status": "processing", "progress": 40}"#,
                r#"{"status": "completed", "progress": 100}"#,
            ] {
                ws.send(Message::Text(text.into())).await.unwrap();
            }
            // Drain until the client closes
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = format!("ws://{addr}/ws/progress/v1");
        let mut source = WebSocketProgress::connect(&url).await.unwrap();

        let first = source.next_update().await.unwrap().unwrap();
        assert_eq!(first.status, ProgressStatus::Processing);
        assert_eq!(first.percent(), 40.0);

        let second = source.next_update().await.unwrap().unwrap();
        assert!(second.status.is_terminal());

        assert!(source.next_update().await.unwrap().is_none());
        server.await.unwrap();
    }
}
