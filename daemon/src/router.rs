//! Route validation and dispatch
//!
//! Maps a decoded request onto a collection-store operation or the static
//! dashboard passthrough, and fires the plug threshold hook on sensor
//! writes. Store and validation failures become `STATUS: ...` plain-text
//! bodies here; the transport status stays 200 either way.

use crate::http::{Method, RawRequest};
use sensord_core::actuator::{PlugChannel, PlugControl};
use sensord_core::config::ActuatorConfig;
use sensord_core::store::CollectionStore;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Reserved route serving the static dashboard.
const DASHBOARD_ROUTE: &str = "sensors";

const CONTENT_TYPE_TEXT: &str = "text/plain";
const CONTENT_TYPE_HTML: &str = "text/html";

/// Sensor collections exposed over HTTP. Requests outside this list are
/// rejected before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Temperature,
    Humidity,
    Light,
    AirQuality,
    Co,
}

impl Sensor {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "temperature" => Some(Sensor::Temperature),
            "humidity" => Some(Sensor::Humidity),
            "light" => Some(Sensor::Light),
            "air_quality" => Some(Sensor::AirQuality),
            "co" => Some(Sensor::Co),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensor::Temperature => "temperature",
            Sensor::Humidity => "humidity",
            Sensor::Light => "light",
            Sensor::AirQuality => "air_quality",
            Sensor::Co => "co",
        }
    }
}

/// A response body plus its content type; byte-level encoding happens at the
/// connection boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub body: String,
    pub content_type: &'static str,
}

impl Reply {
    fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: CONTENT_TYPE_TEXT,
        }
    }

    fn html(body: String) -> Self {
        Self {
            body,
            content_type: CONTENT_TYPE_HTML,
        }
    }

    fn status(message: impl Display) -> Self {
        Self::text(format!("STATUS: {message}"))
    }
}

/// Request dispatcher over the collection store and the plug actuator.
pub struct Router {
    store: Arc<CollectionStore>,
    plug: Arc<dyn PlugControl>,
    template_path: PathBuf,
    actuator: ActuatorConfig,
}

impl Router {
    pub fn new(
        store: Arc<CollectionStore>,
        plug: Arc<dyn PlugControl>,
        template_path: PathBuf,
        actuator: ActuatorConfig,
    ) -> Self {
        Self {
            store,
            plug,
            template_path,
            actuator,
        }
    }

    /// Produce the reply for one decoded request.
    pub async fn route(&self, request: &RawRequest) -> Reply {
        let path = request.path.strip_prefix('/').unwrap_or(&request.path);

        // Hard validation gate before any route matching: no multi-segment
        // paths, which also rules out traversal by construction.
        if path.contains('/') {
            warn!(path, "rejected multi-segment path");
            return Reply::status("Slash is not allowed in URL");
        }

        if path == DASHBOARD_ROUTE {
            return self.dashboard();
        }

        let Some(sensor) = Sensor::parse(path) else {
            warn!(path, "unknown route");
            return Reply::status("Invalid URL");
        };

        match request.method {
            Method::Post => self.append(sensor, &request.body).await,
            Method::Delete => self.delete(sensor, &request.body).await,
            // GET and anything unrecognized resolve to a read
            _ => self.read(sensor).await,
        }
    }

    /// Static-asset passthrough: the dashboard page is served unchanged.
    fn dashboard(&self) -> Reply {
        match std::fs::read_to_string(&self.template_path) {
            Ok(page) => Reply::html(page),
            Err(e) => {
                warn!(
                    "could not read dashboard template {:?}: {}",
                    self.template_path, e
                );
                Reply::status("Could not open index.html")
            }
        }
    }

    async fn read(&self, sensor: Sensor) -> Reply {
        match self.store.read(sensor.as_str()).await {
            Ok(data) => Reply::text(data),
            Err(e) => Reply::status(e),
        }
    }

    async fn append(&self, sensor: Sensor, body: &str) -> Reply {
        let reply = match self.store.append(sensor.as_str(), body).await {
            Ok(()) => Reply::status("Data written successfully"),
            Err(e) => Reply::status(e),
        };

        // The hook fires on every sensor write, whether or not the append
        // was accepted; its outcome never changes the reply.
        self.threshold_hook(sensor, body).await;
        reply
    }

    async fn delete(&self, sensor: Sensor, body: &str) -> Reply {
        let outcome = if body.is_empty() {
            self.store
                .clear(sensor.as_str())
                .await
                .map(|()| "Collection cleared")
        } else {
            self.store
                .delete_record(sensor.as_str(), body)
                .await
                .map(|()| "Data deleted successfully")
        };

        match outcome {
            Ok(message) => Reply::status(message),
            Err(e) => Reply::status(e),
        }
    }

    async fn threshold_hook(&self, sensor: Sensor, body: &str) {
        let (channel, threshold) = match sensor {
            Sensor::Temperature => (PlugChannel::Temperature, self.actuator.temperature_threshold),
            Sensor::Humidity => (PlugChannel::Humidity, self.actuator.humidity_threshold),
            _ => return,
        };

        // atoi semantics: unparsable readings count as zero
        let value: i32 = body.trim().parse().unwrap_or(0);
        let on = value > threshold;
        info!(
            channel = channel.arg(),
            value, on, "evaluated plug threshold"
        );

        if let Err(e) = self.plug.set(channel, on).await {
            warn!("plug toggle failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sensord_core::actuator::NoopPlug;
    use tempfile::{tempdir, TempDir};

    /// Records every plug invocation for assertions.
    #[derive(Default)]
    struct RecordingPlug {
        calls: std::sync::Mutex<Vec<(PlugChannel, bool)>>,
    }

    #[async_trait]
    impl PlugControl for RecordingPlug {
        async fn set(&self, channel: PlugChannel, on: bool) -> sensord_core::Result<()> {
            self.calls.lock().unwrap().push((channel, on));
            Ok(())
        }
    }

    fn router_with_plug(dir: &TempDir, plug: Arc<dyn PlugControl>) -> Router {
        Router::new(
            Arc::new(CollectionStore::new(dir.path().join("data"))),
            plug,
            dir.path().join("index.html"),
            ActuatorConfig::default(),
        )
    }

    fn router(dir: &TempDir) -> Router {
        router_with_plug(dir, Arc::new(NoopPlug))
    }

    fn request(method: Method, path: &str, body: &str) -> RawRequest {
        RawRequest {
            method,
            path: path.to_string(),
            body: body.to_string(),
            authorization: None,
        }
    }

    #[tokio::test]
    async fn multi_segment_path_is_rejected_regardless_of_method() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        for method in [Method::Get, Method::Post, Method::Delete] {
            let reply = router
                .route(&request(method, "/temperature/extra", ""))
                .await;
            assert_eq!(reply.body, "STATUS: Slash is not allowed in URL");
            assert_eq!(reply.content_type, "text/plain");
        }
    }

    #[tokio::test]
    async fn unknown_collection_is_invalid_url() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        let reply = router.route(&request(Method::Get, "/bogus", "")).await;
        assert_eq!(reply.body, "STATUS: Invalid URL");
    }

    #[tokio::test]
    async fn degenerate_empty_request_is_invalid_url() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        let reply = router.route(&RawRequest::default()).await;
        assert_eq!(reply.body, "STATUS: Invalid URL");
    }

    #[tokio::test]
    async fn read_of_never_written_collection_reports_not_found() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        let reply = router.route(&request(Method::Get, "/co", "")).await;
        assert_eq!(reply.body, "STATUS: Collection not found");
    }

    #[tokio::test]
    async fn post_then_get_round_trip() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        let reply = router
            .route(&request(Method::Post, "/light", "480"))
            .await;
        assert_eq!(reply.body, "STATUS: Data written successfully");

        let reply = router.route(&request(Method::Get, "/light", "")).await;
        assert!(reply.body.starts_with("480 | "));
    }

    #[tokio::test]
    async fn unrecognized_method_resolves_to_read() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        router
            .route(&request(Method::Post, "/light", "480"))
            .await;
        let reply = router
            .route(&request(Method::Other("PATCH".to_string()), "/light", ""))
            .await;
        assert!(reply.body.starts_with("480 | "));
    }

    #[tokio::test]
    async fn record_with_newline_is_rejected() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        let reply = router
            .route(&request(Method::Post, "/light", "1\n2"))
            .await;
        assert_eq!(
            reply.body,
            "STATUS: Newline character is not allowed in data"
        );
    }

    #[tokio::test]
    async fn high_temperature_turns_the_plug_on() {
        let dir = tempdir().unwrap();
        let plug = Arc::new(RecordingPlug::default());
        let router = router_with_plug(&dir, plug.clone());

        router
            .route(&request(Method::Post, "/temperature", "30"))
            .await;

        let calls = plug.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(PlugChannel::Temperature, true)]);
    }

    #[tokio::test]
    async fn low_temperature_turns_the_plug_off() {
        let dir = tempdir().unwrap();
        let plug = Arc::new(RecordingPlug::default());
        let router = router_with_plug(&dir, plug.clone());

        router
            .route(&request(Method::Post, "/temperature", "10"))
            .await;

        let calls = plug.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(PlugChannel::Temperature, false)]);
    }

    #[tokio::test]
    async fn humidity_threshold_is_sixty() {
        let dir = tempdir().unwrap();
        let plug = Arc::new(RecordingPlug::default());
        let router = router_with_plug(&dir, plug.clone());

        router
            .route(&request(Method::Post, "/humidity", "61"))
            .await;
        router
            .route(&request(Method::Post, "/humidity", "60"))
            .await;

        let calls = plug.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(PlugChannel::Humidity, true), (PlugChannel::Humidity, false)]
        );
    }

    #[tokio::test]
    async fn non_integer_body_degrades_to_zero_without_failing_the_request() {
        let dir = tempdir().unwrap();
        let plug = Arc::new(RecordingPlug::default());
        let router = router_with_plug(&dir, plug.clone());

        let reply = router
            .route(&request(Method::Post, "/temperature", "warm"))
            .await;
        assert_eq!(reply.body, "STATUS: Data written successfully");

        // 0 is below the threshold, so the plug is switched off
        let calls = plug.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(PlugChannel::Temperature, false)]);
    }

    #[tokio::test]
    async fn non_threshold_sensors_never_touch_the_plug() {
        let dir = tempdir().unwrap();
        let plug = Arc::new(RecordingPlug::default());
        let router = router_with_plug(&dir, plug.clone());

        router.route(&request(Method::Post, "/light", "999")).await;
        router.route(&request(Method::Post, "/co", "999")).await;

        assert!(plug.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_with_record_body_removes_that_line() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        router
            .route(&request(Method::Post, "/light", "480"))
            .await;
        let stored = router.route(&request(Method::Get, "/light", "")).await;
        let line = stored.body.lines().next().unwrap().to_string();

        let reply = router
            .route(&request(Method::Delete, "/light", &line))
            .await;
        assert_eq!(reply.body, "STATUS: Data deleted successfully");

        let after = router.route(&request(Method::Get, "/light", "")).await;
        assert!(after.body.is_empty());
    }

    #[tokio::test]
    async fn delete_of_absent_record_reports_not_found() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        router
            .route(&request(Method::Post, "/light", "480"))
            .await;
        let reply = router
            .route(&request(Method::Delete, "/light", "481 | 2026-08-24T10:00:00"))
            .await;
        assert_eq!(reply.body, "STATUS: Data not found");
    }

    #[tokio::test]
    async fn delete_without_body_clears_the_collection() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        router.route(&request(Method::Post, "/co", "3")).await;
        router.route(&request(Method::Post, "/co", "4")).await;

        let reply = router.route(&request(Method::Delete, "/co", "")).await;
        assert_eq!(reply.body, "STATUS: Collection cleared");

        let after = router.route(&request(Method::Get, "/co", "")).await;
        assert!(after.body.is_empty());
    }

    #[tokio::test]
    async fn dashboard_serves_the_template_as_html() {
        let dir = tempdir().unwrap();
        let router = router(&dir);
        std::fs::write(dir.path().join("index.html"), "<html>dash</html>").unwrap();

        let reply = router.route(&request(Method::Get, "/sensors", "")).await;
        assert_eq!(reply.content_type, "text/html");
        assert_eq!(reply.body, "<html>dash</html>");
    }

    #[tokio::test]
    async fn missing_dashboard_template_is_a_status_message() {
        let dir = tempdir().unwrap();
        let router = router(&dir);

        let reply = router.route(&request(Method::Get, "/sensors", "")).await;
        assert_eq!(reply.content_type, "text/plain");
        assert_eq!(reply.body, "STATUS: Could not open index.html");
    }
}
