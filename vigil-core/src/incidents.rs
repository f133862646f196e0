use leptos::{create_rw_signal, RwSignal, SignalGet, SignalSet, SignalUpdate};
use serde::{Deserialize, Serialize};

use crate::http::Gateway;
use crate::polling::RequestSequence;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Investigating,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Active => "active",
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub zone: String,
    pub severity: Severity,
    #[serde(default)]
    pub risk_level: String,
    pub status: IncidentStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub user_confirmed: Option<bool>,
}

/// Pure predicate state over the cached collection; never mutates it.
/// `"all"` is the wildcard for the categorical fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncidentFilters {
    pub risk_level: String,
    pub status: String,
    pub search_term: String,
}

impl Default for IncidentFilters {
    fn default() -> Self {
        Self {
            risk_level: "all".to_string(),
            status: "all".to_string(),
            search_term: String::new(),
        }
    }
}

impl IncidentFilters {
    /// Conjunctive across all three fields; the free-text term matches the
    /// description case-insensitively.
    pub fn matches(&self, incident: &Incident) -> bool {
        if self.risk_level != "all" && incident.risk_level != self.risk_level {
            return false;
        }
        if self.status != "all" && incident.status.as_str() != self.status {
            return false;
        }
        if !self.search_term.is_empty()
            && !incident
                .description
                .to_lowercase()
                .contains(&self.search_term.to_lowercase())
        {
            return false;
        }
        true
    }
}

#[derive(Clone, Debug, Default)]
pub struct IncidentQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub risk_level: Option<String>,
    pub camera_id: Option<String>,
}

impl IncidentQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(risk_level) = &self.risk_level {
            pairs.push(("risk_level", risk_level.clone()));
        }
        if let Some(camera_id) = &self.camera_id {
            pairs.push(("camera_id", camera_id.clone()));
        }
        pairs
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewIncident {
    #[serde(rename = "type")]
    pub kind: String,
    pub zone: String,
    pub severity: Severity,
    pub risk_level: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
}

/// Partial update. `user_confirmed` can only ever be raised to a decision;
/// there is deliberately no way to reset it back to undecided.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IncidentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_confirmed: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
struct IncidentListResponse {
    #[serde(default)]
    incidents: Vec<Incident>,
}

/// Cache of the incident collection with server-confirmed mutations.
///
/// Writes are never optimistic: the cache only changes once the backend has
/// answered, and always with the backend's canonical entity. A failed
/// refresh keeps the previous collection (stale beats empty).
#[derive(Clone)]
pub struct IncidentStore {
    gateway: Gateway,
    seq: RequestSequence,
    pub incidents: RwSignal<Vec<Incident>>,
    pub selected: RwSignal<Option<Incident>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    pub filters: RwSignal<IncidentFilters>,
}

impl IncidentStore {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            seq: RequestSequence::default(),
            incidents: create_rw_signal(Vec::new()),
            selected: create_rw_signal(None),
            loading: create_rw_signal(false),
            error: create_rw_signal(None),
            filters: create_rw_signal(IncidentFilters::default()),
        }
    }

    pub async fn refresh(&self) -> bool {
        self.refresh_with(&IncidentQuery::default()).await
    }

    /// Replaces the cached collection wholesale with the server's answer.
    /// A response that lost the race against a newer poll is discarded
    /// without touching the cache.
    pub async fn refresh_with(&self, query: &IncidentQuery) -> bool {
        let ticket = self.seq.begin();
        self.loading.set(true);
        self.error.set(None);

        let result = self
            .gateway
            .get_json::<IncidentListResponse>("/incidents", &query.to_pairs())
            .await;
        self.loading.set(false);

        match result {
            Ok(page) => {
                if !self.seq.try_commit(ticket) {
                    log::debug!("discarding superseded incident refresh");
                    return false;
                }
                self.incidents.set(page.incidents);
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    /// Sends the draft and prepends the server-assigned entity on success.
    /// No local insert happens before the backend confirms.
    pub async fn create(&self, draft: &NewIncident) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let result = self
            .gateway
            .post_json::<_, Incident>("/incidents", draft)
            .await;
        self.loading.set(false);

        match result {
            Ok(created) => {
                self.incidents.update(|list| list.insert(0, created));
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    /// On success the cached entry is replaced by the canonical response,
    /// never merged locally, so the cache cannot drift from server truth.
    pub async fn update(&self, id: &str, patch: &IncidentPatch) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let result = self
            .gateway
            .put_json::<_, Incident>(&format!("/incidents/{id}"), patch)
            .await;
        self.loading.set(false);

        match result {
            Ok(updated) => {
                self.incidents.update(|list| {
                    if let Some(slot) = list.iter_mut().find(|i| i.id == id) {
                        *slot = updated;
                    }
                });
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    /// Records the operator's decision; valid transitions are only from
    /// undecided to confirmed or dismissed.
    pub async fn confirm(&self, id: &str, confirmed: bool) -> bool {
        self.update(
            id,
            &IncidentPatch {
                user_confirmed: Some(confirmed),
                ..IncidentPatch::default()
            },
        )
        .await
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let result = self.gateway.delete(&format!("/incidents/{id}")).await;
        self.loading.set(false);

        match result {
            Ok(()) => {
                self.incidents.update(|list| list.retain(|i| i.id != id));
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    pub fn select(&self, incident: Option<Incident>) {
        self.selected.set(incident);
    }

    pub fn set_risk_level(&self, value: &str) {
        self.filters.update(|f| f.risk_level = value.to_string());
    }

    pub fn set_status(&self, value: &str) {
        self.filters.update(|f| f.status = value.to_string());
    }

    pub fn set_search(&self, value: &str) {
        self.filters.update(|f| f.search_term = value.to_string());
    }

    /// Recomputed from the current cache and filters on every call; the
    /// cache itself is untouched.
    pub fn filtered(&self) -> Vec<Incident> {
        let filters = self.filters.get();
        self.incidents
            .get()
            .into_iter()
            .filter(|incident| filters.matches(incident))
            .collect()
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{incident_json, TestHarness};
    use futures::executor::block_on;
    use leptos::SignalGetUntracked;

    fn seeded(h: &TestHarness, incidents: &[(&str, &str, &str)]) {
        let docs: Vec<String> = incidents
            .iter()
            .map(|(id, status, risk)| incident_json(id, status, risk))
            .collect();
        h.transport.push_ok(
            200,
            &format!(r#"{{"status": "success", "incidents": [{}]}}"#, docs.join(",")),
        );
        assert!(block_on(h.stores.incidents.refresh()));
    }

    #[test]
    fn refresh_replaces_collection_wholesale() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high"), ("INC-002", "resolved", "low")]);
        assert_eq!(h.stores.incidents.incidents.get_untracked().len(), 2);

        seeded(&h, &[("INC-003", "active", "medium")]);
        let cache = h.stores.incidents.incidents.get_untracked();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].id, "INC-003");
        h.dispose();
    }

    #[test]
    fn failed_refresh_keeps_previous_collection_and_sets_error() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        h.transport.push_transport_error("connection refused");
        assert!(!block_on(h.stores.incidents.refresh()));

        let cache = h.stores.incidents.incidents.get_untracked();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].id, "INC-001");
        assert!(h.stores.incidents.error.get_untracked().is_some());
        h.dispose();
    }

    #[test]
    fn create_prepends_server_canonical_entity() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        h.transport
            .push_ok(201, &incident_json("INC-SRV", "active", "high"));
        let draft = NewIncident {
            kind: "intrusion_detected".into(),
            zone: "Loading dock".into(),
            severity: Severity::High,
            risk_level: "high".into(),
            description: "After-hours presence".into(),
            camera_id: None,
        };
        assert!(block_on(h.stores.incidents.create(&draft)));

        let cache = h.stores.incidents.incidents.get_untracked();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache[0].id, "INC-SRV");
        h.dispose();
    }

    #[test]
    fn create_failure_leaves_cache_untouched() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        h.transport.push_ok(422, r#"{"detail": "zone is required"}"#);
        let draft = NewIncident {
            kind: "loitering".into(),
            zone: String::new(),
            severity: Severity::Low,
            risk_level: "low".into(),
            description: String::new(),
            camera_id: None,
        };
        assert!(!block_on(h.stores.incidents.create(&draft)));

        assert_eq!(h.stores.incidents.incidents.get_untracked().len(), 1);
        assert_eq!(
            h.stores.incidents.error.get_untracked(),
            Some("zone is required".to_string())
        );
        h.dispose();
    }

    #[test]
    fn update_replaces_cache_entry_with_canonical_response() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        // The server's canonical answer differs from the patch we sent; the
        // cache must end up equal to the server's version.
        let mut canonical: Incident =
            serde_json::from_str(&incident_json("INC-001", "resolved", "high")).expect("doc");
        canonical.description = "resolved by patrol".into();
        h.transport
            .push_ok(200, &serde_json::to_string(&canonical).expect("json"));

        let patch = IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..IncidentPatch::default()
        };
        assert!(block_on(h.stores.incidents.update("INC-001", &patch)));

        let cache = h.stores.incidents.incidents.get_untracked();
        assert_eq!(cache[0], canonical);
        h.dispose();
    }

    #[test]
    fn repeated_updates_track_last_server_value() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        for status in ["investigating", "resolved"] {
            h.transport
                .push_ok(200, &incident_json("INC-001", status, "high"));
            let patch = IncidentPatch::default();
            assert!(block_on(h.stores.incidents.update("INC-001", &patch)));
        }

        let cache = h.stores.incidents.incidents.get_untracked();
        assert_eq!(cache[0].status, IncidentStatus::Resolved);
        h.dispose();
    }

    #[test]
    fn confirm_sends_decision_in_patch() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        h.transport
            .push_ok(200, &incident_json("INC-001", "active", "high"));
        assert!(block_on(h.stores.incidents.confirm("INC-001", true)));

        let last = h.transport.requests().last().expect("request").clone();
        assert_eq!(last.url, "http://backend/api/v1/incidents/INC-001");
        assert_eq!(last.body.as_deref(), Some(r#"{"user_confirmed":true}"#));
        h.dispose();
    }

    #[test]
    fn remove_drops_exactly_one_entry_by_id() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high"), ("INC-002", "resolved", "low")]);

        h.transport.push_ok(204, "");
        assert!(block_on(h.stores.incidents.remove("INC-002")));

        let cache = h.stores.incidents.incidents.get_untracked();
        assert_eq!(cache.len(), 1);
        assert!(cache.iter().all(|i| i.id != "INC-002"));
        h.dispose();
    }

    #[test]
    fn remove_failure_keeps_entry() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-001", "active", "high")]);

        h.transport.push_ok(404, r#"{"detail": "not found"}"#);
        assert!(!block_on(h.stores.incidents.remove("INC-001")));

        assert_eq!(h.stores.incidents.incidents.get_untracked().len(), 1);
        h.dispose();
    }

    #[test]
    fn wildcard_filters_return_full_collection_in_order() {
        let h = TestHarness::new();
        seeded(
            &h,
            &[
                ("INC-001", "active", "high"),
                ("INC-002", "resolved", "low"),
                ("INC-003", "investigating", "medium"),
            ],
        );

        let filtered = h.stores.incidents.filtered();
        let ids: Vec<&str> = filtered.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["INC-001", "INC-002", "INC-003"]);
        h.dispose();
    }

    #[test]
    fn status_filter_selects_exactly_matching_incidents() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-1", "active", "high"), ("INC-2", "resolved", "low")]);

        h.stores.incidents.set_status("resolved");
        let filtered = h.stores.incidents.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "INC-2");
        h.dispose();
    }

    #[test]
    fn filters_are_conjunctive_and_search_is_case_insensitive() {
        let h = TestHarness::new();
        seeded(&h, &[("INC-1", "active", "high"), ("INC-2", "active", "low")]);

        h.stores.incidents.set_risk_level("high");
        h.stores.incidents.set_status("active");
        h.stores.incidents.set_search("DESCRIPTION FOR inc-1");

        let filtered = h.stores.incidents.filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "INC-1");

        h.stores.incidents.set_risk_level("low");
        assert!(h.stores.incidents.filtered().is_empty());
        h.dispose();
    }

    #[test]
    fn refresh_query_parameters_reach_the_wire() {
        let h = TestHarness::new();
        h.transport
            .push_ok(200, r#"{"status": "success", "incidents": []}"#);
        let query = IncidentQuery {
            limit: Some(100),
            risk_level: Some("high".into()),
            ..IncidentQuery::default()
        };
        assert!(block_on(h.stores.incidents.refresh_with(&query)));

        let seen = h.transport.requests();
        assert_eq!(
            seen[0].url,
            "http://backend/api/v1/incidents?limit=100&risk_level=high"
        );
        h.dispose();
    }
}
