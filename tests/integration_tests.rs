use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use smart_counter::{
    create_app, AppState, DeviceLink, ReaderConfig, ReaderLoop, StateStore, WebConfig,
};
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;
use tower::ServiceExt;

/// A device fed line by line from the test through a channel.
struct ChannelDevice {
    lines: Receiver<String>,
    pending: Option<String>,
}

impl DeviceLink for ChannelDevice {
    fn has_data_available(&mut self) -> smart_counter::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        match self.lines.try_recv() {
            Ok(line) => {
                self.pending = Some(line);
                Ok(true)
            }
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected").into())
            }
        }
    }

    fn read_line(&mut self, timeout: Duration) -> smart_counter::Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        match self.lines.recv_timeout(timeout) {
            Ok(line) => Ok(Some(line)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected").into())
            }
        }
    }

    fn address(&self) -> &str {
        "test-channel"
    }
}

struct Harness {
    app: Router,
    store: StateStore,
    device_tx: Option<Sender<String>>,
    stop_tx: watch::Sender<bool>,
    reader: JoinHandle<()>,
}

impl Harness {
    fn start() -> Self {
        let (device_tx, lines) = mpsc::channel();
        let device = ChannelDevice {
            lines,
            pending: None,
        };
        let store = StateStore::new();
        let config = ReaderConfig {
            read_timeout: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
        };
        let (stop_tx, stop_rx) = watch::channel(false);
        let reader = ReaderLoop::new(device, store.clone(), config).spawn(stop_rx);

        let web_config = WebConfig::default().with_device_label("test-channel");
        let app = create_app(AppState::new(store.clone(), web_config));

        Self {
            app,
            store,
            device_tx: Some(device_tx),
            stop_tx,
            reader,
        }
    }

    fn send(&self, line: &str) {
        self.device_tx
            .as_ref()
            .expect("device still connected")
            .send(line.to_string())
            .expect("reader should be receiving");
    }

    fn disconnect(&mut self) {
        self.device_tx = None;
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn latest(&self) -> serde_json::Value {
        let (status, body) = self.get("/api/latest").await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_str(&body).expect("latest should be JSON")
    }

    /// Poll `/api/latest` until `COUNT` reaches `count`.
    async fn wait_for_count(&self, count: u64) -> serde_json::Value {
        for _ in 0..200 {
            let latest = self.latest().await;
            if latest["COUNT"] == count {
                return latest;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("COUNT never reached {}", count);
    }

    async fn stop(self) {
        self.stop_tx.send(true).unwrap();
        let joined = tokio::time::timeout(Duration::from_secs(2), self.reader)
            .await
            .expect("reader should stop promptly");
        assert_ok!(joined);
    }
}

#[tokio::test]
async fn test_end_to_end_partial_updates() {
    let harness = Harness::start();

    let initial = harness.latest().await;
    assert_eq!(initial["COUNT"], 0);
    assert_eq!(initial["USAGE_S"], 0);
    assert_eq!(initial["LIGHT"], "OFF");
    let initial_timestamp = initial["timestamp"].as_i64().unwrap();

    harness.send("COUNT:5,USAGE_S:10,LIGHT:ON");
    let latest = harness.wait_for_count(5).await;
    assert_eq!(latest["USAGE_S"], 10);
    assert_eq!(latest["LIGHT"], "ON");
    assert!(latest["timestamp"].as_i64().unwrap() >= initial_timestamp);

    harness.send("COUNT:6");
    let latest = harness.wait_for_count(6).await;
    assert_eq!(latest["USAGE_S"], 10);
    assert_eq!(latest["LIGHT"], "ON");

    assert_eq!(harness.store.updates_applied(), 2);
    harness.stop().await;
}

#[tokio::test]
async fn test_bad_lines_do_not_stop_the_reader() {
    let harness = Harness::start();

    harness.send("garbage");
    harness.send("COUNT:abc,LIGHT:ON");
    harness.send("");
    harness.send("LIGHT:ON:OFF,USAGE_S:3");
    harness.send("COUNT:9");

    let latest = harness.wait_for_count(9).await;
    assert_eq!(latest["LIGHT"], "ON");
    assert_eq!(latest["USAGE_S"], 3);

    harness.stop().await;
}

#[tokio::test]
async fn test_last_reading_survives_disconnect() {
    let mut harness = Harness::start();

    harness.send("COUNT:3,LIGHT:ON");
    let before = harness.wait_for_count(3).await;

    harness.disconnect();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let after = harness.latest().await;
    assert_eq!(after, before);

    harness.stop().await;
}

#[tokio::test]
async fn test_status_page() {
    let harness = Harness::start();
    harness.send("COUNT:12,LIGHT:ON");
    harness.wait_for_count(12).await;

    let (status, body) = harness.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Smart Counter Server Running"));
    assert!(body.contains("Data Source: test-channel"));
    assert!(body.contains("&quot;COUNT&quot;: 12"));
    assert!(body.contains("/api/latest"));

    harness.stop().await;
}

#[tokio::test]
async fn test_health_check() {
    let harness = Harness::start();

    let (status, body) = harness.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["device"], "test-channel");
    assert_eq!(health["updates_applied"], 0);

    harness.stop().await;
}

#[tokio::test]
async fn test_latest_content_type() {
    let harness = Harness::start();

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/latest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );

    harness.stop().await;
}
