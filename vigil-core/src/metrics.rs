use leptos::{create_rw_signal, RwSignal, SignalGetUntracked, SignalSet};
use serde::{Deserialize, Serialize};

use crate::http::Gateway;
use crate::polling::RequestSequence;

const ROI_DEFAULT_DAYS: u32 = 30;
const DETECTION_DEFAULT_DAYS: u32 = 7;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiReport {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub period_days: u32,
    #[serde(default)]
    pub prevented_loss: f64,
    #[serde(default)]
    pub security_investment: f64,
    #[serde(default)]
    pub roi_percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyDetections {
    pub hour: String,
    #[serde(default)]
    pub incidents: u32,
    #[serde(default)]
    pub detections: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub period_days: u32,
    #[serde(default)]
    pub total_detections: u64,
    #[serde(default)]
    pub accuracy_percent: f64,
    #[serde(default)]
    pub hourly: Vec<HourlyDetections>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatZone {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub detections: u64,
    #[serde(default)]
    pub risk_level: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapReport {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub zones: Vec<HeatZone>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskPattern {
    pub name: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub occurrences: u32,
    #[serde(default)]
    pub peak_hour: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub patterns: Vec<RiskPattern>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_incidents_24h: u32,
    #[serde(default)]
    pub active_cameras: u32,
    #[serde(default)]
    pub total_cameras: u32,
    #[serde(default)]
    pub total_detections_24h: u32,
}

#[derive(Clone, Debug, Deserialize)]
struct DashboardResponse {
    #[serde(default)]
    summary: DashboardSummary,
    #[serde(default)]
    hourly_detections: Vec<HourlyDetections>,
}

/// All four constituents of one consistent analytics snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsSnapshot {
    pub roi: RoiReport,
    pub detections: DetectionReport,
    pub heatmap: HeatmapReport,
    pub patterns: PatternReport,
}

/// Fetches the analytics resources and merges them into one consistent view.
///
/// `fetch_all` is atomic: the four sub-documents are committed together or
/// not at all, so a partially-failed batch can never mix fresh and missing
/// data. The standalone fetchers update their own document independently,
/// each keeping the previous value on failure.
#[derive(Clone)]
pub struct MetricsStore {
    gateway: Gateway,
    seq: RequestSequence,
    pub roi: RwSignal<Option<RoiReport>>,
    pub detections: RwSignal<Option<DetectionReport>>,
    pub heatmap: RwSignal<Option<HeatmapReport>>,
    pub patterns: RwSignal<Option<PatternReport>>,
    pub dashboard: RwSignal<Option<DashboardSummary>>,
    pub hourly: RwSignal<Vec<HourlyDetections>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
}

impl MetricsStore {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            seq: RequestSequence::default(),
            roi: create_rw_signal(None),
            detections: create_rw_signal(None),
            heatmap: create_rw_signal(None),
            patterns: create_rw_signal(None),
            dashboard: create_rw_signal(None),
            hourly: create_rw_signal(Vec::new()),
            loading: create_rw_signal(false),
            error: create_rw_signal(None),
        }
    }

    pub fn snapshot(&self) -> Option<MetricsSnapshot> {
        Some(MetricsSnapshot {
            roi: self.roi.get_untracked()?,
            detections: self.detections.get_untracked()?,
            heatmap: self.heatmap.get_untracked()?,
            patterns: self.patterns.get_untracked()?,
        })
    }

    pub async fn fetch_roi(&self, store_id: &str) -> bool {
        self.fetch_one(
            "/analytics/roi",
            &[
                ("store_id", store_id.to_string()),
                ("days", ROI_DEFAULT_DAYS.to_string()),
            ],
            self.roi,
        )
        .await
    }

    pub async fn fetch_detections(&self, store_id: &str) -> bool {
        self.fetch_one(
            "/analytics/detections",
            &[
                ("store_id", store_id.to_string()),
                ("days", DETECTION_DEFAULT_DAYS.to_string()),
            ],
            self.detections,
        )
        .await
    }

    pub async fn fetch_heatmap(&self, store_id: &str) -> bool {
        self.fetch_one(
            "/analytics/heatmap",
            &[("store_id", store_id.to_string())],
            self.heatmap,
        )
        .await
    }

    pub async fn fetch_patterns(&self, store_id: &str) -> bool {
        self.fetch_one(
            "/analytics/patterns",
            &[("store_id", store_id.to_string())],
            self.patterns,
        )
        .await
    }

    /// General-panel counters; standalone by design, not part of the atomic
    /// snapshot.
    pub async fn fetch_dashboard(&self, store_id: &str) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let result = self
            .gateway
            .get_json::<DashboardResponse>(
                "/analytics/dashboard",
                &[("store_id", store_id.to_string())],
            )
            .await;
        self.loading.set(false);

        match result {
            Ok(response) => {
                self.dashboard.set(Some(response.summary));
                self.hourly.set(response.hourly_detections);
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    /// Issues the four fetches as one concurrent batch, waits for all of
    /// them, and commits only if every constituent succeeded. One failure
    /// discards the whole batch and leaves whatever snapshot was previously
    /// displayed.
    pub async fn fetch_all(&self, store_id: &str) -> bool {
        let ticket = self.seq.begin();
        self.loading.set(true);
        self.error.set(None);

        let store = store_id.to_string();
        let roi_query = [("store_id", store.clone()), ("days", ROI_DEFAULT_DAYS.to_string())];
        let detection_query = [
            ("store_id", store.clone()),
            ("days", DETECTION_DEFAULT_DAYS.to_string()),
        ];
        let heatmap_query = [("store_id", store.clone())];
        let pattern_query = [("store_id", store)];
        let (roi, detections, heatmap, patterns) = futures::join!(
            self.gateway.get_json::<RoiReport>("/analytics/roi", &roi_query),
            self.gateway.get_json::<DetectionReport>("/analytics/detections", &detection_query),
            self.gateway
                .get_json::<HeatmapReport>("/analytics/heatmap", &heatmap_query),
            self.gateway
                .get_json::<PatternReport>("/analytics/patterns", &pattern_query),
        );
        self.loading.set(false);

        match (roi, detections, heatmap, patterns) {
            (Ok(roi), Ok(detections), Ok(heatmap), Ok(patterns)) => {
                if !self.seq.try_commit(ticket) {
                    log::debug!("discarding superseded metrics batch");
                    return false;
                }
                self.roi.set(Some(roi));
                self.detections.set(Some(detections));
                self.heatmap.set(Some(heatmap));
                self.patterns.set(Some(patterns));
                true
            }
            (roi, detections, heatmap, patterns) => {
                let mut failed = Vec::new();
                if let Err(err) = roi {
                    failed.push(format!("roi: {err}"));
                }
                if let Err(err) = detections {
                    failed.push(format!("detections: {err}"));
                }
                if let Err(err) = heatmap {
                    failed.push(format!("heatmap: {err}"));
                }
                if let Err(err) = patterns {
                    failed.push(format!("patterns: {err}"));
                }
                self.error
                    .set(Some(format!("metrics refresh failed: {}", failed.join("; "))));
                false
            }
        }
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    async fn fetch_one<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        slot: RwSignal<Option<T>>,
    ) -> bool
    where
        T: serde::de::DeserializeOwned + 'static,
    {
        self.loading.set(true);
        self.error.set(None);

        let result = self.gateway.get_json::<T>(path, query).await;
        self.loading.set(false);

        match result {
            Ok(document) => {
                slot.set(Some(document));
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use futures::executor::block_on;

    const ROI_DOC: &str = r#"{"store_id": "STORE-001", "period_days": 30, "prevented_loss": 1200.5, "security_investment": 800.0, "roi_percent": 50.1}"#;
    const DETECTIONS_DOC: &str = r#"{"store_id": "STORE-001", "period_days": 7, "total_detections": 100, "hourly": [{"hour": "12:00", "incidents": 3, "detections": 26}]}"#;
    const HEATMAP_DOC: &str = r#"{"store_id": "STORE-001", "zones": [{"id": "zone-1", "name": "Main entrance", "detections": 1247, "risk_level": "high"}]}"#;
    const PATTERNS_DOC: &str = r#"{"store_id": "STORE-001", "patterns": [{"name": "after-hours presence", "risk_level": "high", "occurrences": 4, "peak_hour": "21:00"}]}"#;

    fn push_full_batch(h: &TestHarness) {
        h.transport.push_ok(200, ROI_DOC);
        h.transport.push_ok(200, DETECTIONS_DOC);
        h.transport.push_ok(200, HEATMAP_DOC);
        h.transport.push_ok(200, PATTERNS_DOC);
    }

    #[test]
    fn fetch_all_commits_every_document_together() {
        let h = TestHarness::new();
        push_full_batch(&h);

        assert!(block_on(h.stores.metrics.fetch_all("STORE-001")));

        let snapshot = h.stores.metrics.snapshot().expect("snapshot");
        assert_eq!(snapshot.roi.roi_percent, 50.1);
        assert_eq!(snapshot.detections.total_detections, 100);
        assert_eq!(snapshot.heatmap.zones[0].id, "zone-1");
        assert_eq!(snapshot.patterns.patterns[0].peak_hour, "21:00");
        h.dispose();
    }

    #[test]
    fn one_failed_fetch_discards_the_whole_batch() {
        let h = TestHarness::new();
        push_full_batch(&h);
        assert!(block_on(h.stores.metrics.fetch_all("STORE-001")));
        let before = h.stores.metrics.snapshot().expect("snapshot");

        // Second round: heatmap fails, the other three succeed.
        h.transport.push_ok(200, ROI_DOC);
        h.transport.push_ok(200, DETECTIONS_DOC);
        h.transport.push_ok(503, r#"{"detail": "heatmap source down"}"#);
        h.transport.push_ok(200, PATTERNS_DOC);

        assert!(!block_on(h.stores.metrics.fetch_all("STORE-001")));

        assert_eq!(h.stores.metrics.snapshot().expect("snapshot"), before);
        let error = h.stores.metrics.error.get_untracked().expect("error");
        assert!(error.contains("heatmap"));
        h.dispose();
    }

    #[test]
    fn partial_failure_without_prior_snapshot_leaves_none() {
        let h = TestHarness::new();
        h.transport.push_transport_error("refused");
        h.transport.push_ok(200, DETECTIONS_DOC);
        h.transport.push_ok(200, HEATMAP_DOC);
        h.transport.push_ok(200, PATTERNS_DOC);

        assert!(!block_on(h.stores.metrics.fetch_all("STORE-001")));

        assert!(h.stores.metrics.snapshot().is_none());
        assert!(h.stores.metrics.roi.get_untracked().is_none());
        h.dispose();
    }

    #[test]
    fn standalone_fetcher_keeps_previous_document_on_failure() {
        let h = TestHarness::new();
        h.transport.push_ok(200, ROI_DOC);
        assert!(block_on(h.stores.metrics.fetch_roi("STORE-001")));

        h.transport.push_transport_error("refused");
        assert!(!block_on(h.stores.metrics.fetch_roi("STORE-001")));

        let roi = h.stores.metrics.roi.get_untracked().expect("roi");
        assert_eq!(roi.prevented_loss, 1200.5);
        h.dispose();
    }

    #[test]
    fn fetch_dashboard_fills_summary_and_hourly_series() {
        let h = TestHarness::new();
        h.transport.push_ok(
            200,
            r#"{"status": "success", "summary": {"total_incidents_24h": 4, "active_cameras": 4, "total_cameras": 6, "total_detections_24h": 100}, "hourly_detections": [{"hour": "08:00", "incidents": 2, "detections": 18}]}"#,
        );

        assert!(block_on(h.stores.metrics.fetch_dashboard("STORE-001")));

        let summary = h.stores.metrics.dashboard.get_untracked().expect("summary");
        assert_eq!(summary.total_incidents_24h, 4);
        assert_eq!(h.stores.metrics.hourly.get_untracked().len(), 1);
        h.dispose();
    }

    #[test]
    fn fetch_all_sends_store_and_window_parameters() {
        let h = TestHarness::new();
        push_full_batch(&h);
        assert!(block_on(h.stores.metrics.fetch_all("STORE-002")));

        let urls: Vec<String> = h
            .transport
            .requests()
            .iter()
            .map(|r| r.url.clone())
            .collect();
        assert!(urls
            .iter()
            .any(|u| u.ends_with("/analytics/roi?store_id=STORE-002&days=30")));
        assert!(urls
            .iter()
            .any(|u| u.ends_with("/analytics/detections?store_id=STORE-002&days=7")));
        assert!(urls
            .iter()
            .any(|u| u.ends_with("/analytics/heatmap?store_id=STORE-002")));
        assert!(urls
            .iter()
            .any(|u| u.ends_with("/analytics/patterns?store_id=STORE-002")));
        h.dispose();
    }
}
