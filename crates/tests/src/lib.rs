//! # Integration Tests
//!
//! End-to-end flows across crates:
//! - Results JSON -> OverlayRenderer -> Dispatcher -> PNG/JSON sinks
//! - Config file -> overlay visibility and tuning
//! - Progress socket failure -> polling fallback

#[cfg(test)]
mod fixtures {
    use contracts::AnalysisResults;

    /// 64x48 clip at 10 fps: one player wearing #9, a slow ball, one spike
    pub const RESULTS_JSON: &str = r#"{
        "video_info": {"width": 64, "height": 48, "fps": 10, "total_frames": 20, "duration": 2},
        "players_tracking": [
            {"frame": 0, "players": [{"id": 1, "bbox": [10, 10, 30, 30], "jersey_number": 9}]},
            {"frame": 10, "players": [{"id": 1, "bbox": [12, 10, 32, 30], "jersey_number": 9}]}
        ],
        "ball_tracking": {"trajectory": [
            {"frame": 0, "center": [50, 20], "confidence": 0.9},
            {"frame": 5, "center": [52, 22], "confidence": 0.9},
            {"frame": 6, "center": [300, 45], "confidence": 0.9},
            {"frame": 10, "center": [54, 24], "confidence": 0.05}
        ]},
        "action_recognition": {"actions": [
            {"frame": 5, "action": "spike", "player_id": 1, "bbox": [8, 8, 34, 34]}
        ]}
    }"#;

    pub fn results() -> AnalysisResults {
        serde_json::from_str(RESULTS_JSON).unwrap()
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use contracts::{
        OverflowPolicy, OverlayConfig, OverlayVisibility, RenderedFrame, SinkConfig, SinkType,
        VideoSize,
    };
    use dispatcher::{Dispatcher, RasterCanvas};
    use overlay_engine::{OverlayRenderer, OverlayState, PLAYER_COLOR};
    use tokio::sync::mpsc;

    use super::fixtures;

    fn sink(name: &str, sink_type: SinkType, path: Option<&std::path::Path>) -> SinkConfig {
        let mut params = HashMap::new();
        if let Some(path) = path {
            params.insert("path".to_string(), path.display().to_string());
        }
        SinkConfig {
            name: name.to_string(),
            sink_type,
            queue_capacity: 16,
            overflow: OverflowPolicy::Block,
            params,
        }
    }

    /// End-to-end: results -> renderer -> dispatcher -> png + json + log sinks
    #[tokio::test]
    async fn test_e2e_render_export() {
        let dir = tempfile::tempdir().unwrap();
        let png_dir = dir.path().join("frames");
        let json_path = dir.path().join("commands.jsonl");

        let results = fixtures::results();
        let renderer = OverlayRenderer::new(&results, OverlayConfig::default());
        let state = OverlayState::new(OverlayVisibility::default());

        let (tx, rx) = mpsc::channel::<RenderedFrame>(8);
        let dispatcher = Dispatcher::from_configs(
            &[
                sink("frames", SinkType::Png, Some(&png_dir)),
                sink("commands", SinkType::Json, Some(&json_path)),
                sink("log", SinkType::Log, None),
            ],
            rx,
        )
        .unwrap();
        let handle = dispatcher.spawn();

        for (sequence, time) in [0.0, 0.5, 1.0].into_iter().enumerate() {
            tx.send(renderer.render_frame(sequence as u64, time, &state))
                .await
                .unwrap();
        }
        drop(tx);

        let report = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatcher timed out")
            .unwrap();
        assert_eq!(report.len(), 3);
        for (name, snapshot) in &report {
            assert_eq!(snapshot.write_count, 3, "sink {name}");
            assert_eq!(snapshot.failure_count, 0, "sink {name}");
        }

        // Left edge of the player box at frame 0, clear of the label plate
        let first = image::open(png_dir.join("frame_000000.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(first.dimensions(), (64, 48));
        let edge = first.get_pixel(10, 20).0;
        assert_eq!(
            edge,
            [PLAYER_COLOR.r, PLAYER_COLOR.g, PLAYER_COLOR.b, 255]
        );
        assert_eq!(first.get_pixel(62, 46).0[3], 0, "background stays transparent");
        assert!(png_dir.join("frame_000001.png").exists());
        assert!(png_dir.join("frame_000002.png").exists());

        let lines: Vec<serde_json::Value> = std::fs::read_to_string(&json_path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1]["frame_index"], 5);
        let labels: Vec<&str> = lines[1]["commands"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|c| c["kind"] == "label")
            .filter_map(|c| c["text"].as_str())
            .collect();
        assert!(labels.contains(&"#9"), "labels: {labels:?}");
        assert!(labels.contains(&"SPIKE #9"), "labels: {labels:?}");
    }

    /// Rendering the same instant twice leaves a pixel-identical canvas
    #[test]
    fn test_repeat_render_is_pixel_identical() {
        let results = fixtures::results();
        let renderer = OverlayRenderer::new(&results, OverlayConfig::default());
        let state = OverlayState::new(OverlayVisibility::all());
        let mut canvas = RasterCanvas::new(VideoSize::new(1, 1));

        renderer.render(&mut canvas, 0.5, &state);
        let once = canvas.image().as_raw().clone();
        assert_eq!(canvas.image().dimensions(), (64, 48));
        assert!(once.iter().any(|&byte| byte != 0));

        renderer.render(&mut canvas, 0.5, &state);
        assert_eq!(canvas.image().as_raw(), &once);

        // Another instant in between leaves nothing behind
        renderer.render(&mut canvas, 1.0, &state);
        renderer.render(&mut canvas, 0.5, &state);
        assert_eq!(canvas.image().as_raw(), &once);
    }

    /// The outlier ball point and the low-confidence one never reach the trail
    #[test]
    fn test_ball_outliers_filtered_end_to_end() {
        let results = fixtures::results();
        let renderer = OverlayRenderer::new(&results, OverlayConfig::default());

        let accepted: Vec<u64> = renderer
            .ball_trail()
            .points()
            .iter()
            .map(|p| p.frame)
            .collect();
        assert_eq!(accepted, vec![0, 5]);
        let rejected = renderer.ball_trail().rejected();
        assert_eq!(rejected.jump, 1);
        assert_eq!(rejected.low_confidence, 1);
    }

    /// Manual mappings beat the tracker's majority vote
    #[test]
    fn test_manual_mapping_overrides_vote() {
        let results = fixtures::results();
        let mappings: contracts::JerseyMappingsResponse =
            serde_json::from_str(r#"{"mappings": {"1": {"jersey_number": 23, "frame": 0}}}"#)
                .unwrap();
        let renderer = OverlayRenderer::new(&results, OverlayConfig::default())
            .with_jersey_mappings(&mappings.by_track_id(), HashMap::new());

        assert_eq!(renderer.jerseys().label(1), "#23");
        let frame = renderer.render_frame(0, 0.0, &OverlayState::new(OverlayVisibility::default()));
        assert!(frame.commands.iter().any(|c| matches!(
            c,
            contracts::DrawCommand::Label { text, .. } if text == "#23"
        )));
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use overlay_engine::{OverlayRenderer, OverlayState};

    use super::fixtures;

    const CONFIG: &str = r#"
version = "V1"

[api]
base_url = "http://analysis.local:8000"
ws_url = "ws://analysis.local:8000"

[overlay]
frame_tolerance = 2

[visibility]
player_boxes = true
action_boxes = false
ball_trail = false
heatmap = true
"#;

    /// Config file drives visibility and frame tolerance of a render
    #[test]
    fn test_config_drives_render() {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(
            config.progress_url("v7"),
            "ws://analysis.local:8000/ws/progress/v7"
        );

        let results = fixtures::results();
        let renderer = OverlayRenderer::new(&results, config.overlay.clone());
        let state = OverlayState::new(config.visibility);

        let stats = renderer.render_frame(0, 1.0, &state).stats;
        assert!(stats.drawn);
        assert_eq!(stats.frame_index, 10);
        assert!(stats.heatmap_cells > 0);
        assert_eq!(stats.player_boxes, 1);
        assert_eq!(stats.action_boxes, 0);
        assert_eq!(stats.ball_points, 0);

        // Frame 5 is three frames from the nearest track, beyond a tolerance of 2
        let stats = renderer.render_frame(1, 0.5, &state).stats;
        assert_eq!(stats.player_boxes, 0);
    }

    #[test]
    fn test_config_roundtrip_keeps_overrides() {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let toml = ConfigLoader::to_toml(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.overlay.frame_tolerance, 2);
        assert_eq!(reloaded.visibility, config.visibility);
    }
}

#[cfg(test)]
mod progress_tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use analysis_client::{watch, ClientError, ProgressMonitor, TaskStatusFetcher};
    use contracts::{AnalysisTask, ProgressStatus, ViewerConfig};
    use futures::SinkExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_util::sync::CancellationToken;

    struct Tasks(Mutex<VecDeque<AnalysisTask>>);

    impl TaskStatusFetcher for Tasks {
        async fn fetch_task_status(&self, _task_id: &str) -> analysis_client::Result<AnalysisTask> {
            let next = self.0.lock().ok().and_then(|mut q| q.pop_front());
            next.ok_or(ClientError::Api {
                status: 404,
                body: "no such task".into(),
            })
        }
    }

    fn task(status: &str, progress: f64) -> AnalysisTask {
        AnalysisTask {
            video_id: "v1".into(),
            status: status.into(),
            progress,
            ..Default::default()
        }
    }

    /// Socket drops mid-analysis; the monitor finishes over polling
    #[tokio::test]
    async fn test_socket_drop_falls_back_to_polling() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(
                r#"{"status": "processing", "progress": 30, "message": "tracking"}"#.into(),
            ))
            .await
            .unwrap();
            // Dropped without a close handshake
        });

        let fetcher = Tasks(Mutex::new(VecDeque::from([
            task("processing", 70.0),
            task("completed", 100.0),
        ])));
        let mut monitor = ProgressMonitor::new(&ViewerConfig::default(), "v1", Some("t1".into()), fetcher)
            .with_socket_url(format!("ws://{addr}/ws/progress/v1"))
            .with_poll_interval(Duration::from_millis(5));

        let mut seen = Vec::new();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            watch(&mut monitor, &CancellationToken::new(), |u| {
                seen.push((u.status, u.percent()))
            }),
        )
        .await
        .expect("watch timed out")
        .unwrap();

        assert!(monitor.is_polling());
        assert!(outcome.is_terminal());
        assert_eq!(
            seen,
            vec![
                (ProgressStatus::Processing, 30.0),
                (ProgressStatus::Processing, 70.0),
                (ProgressStatus::Completed, 100.0),
            ]
        );
    }
}
