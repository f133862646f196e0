//! Client-side session and data-synchronization layer for the vigil
//! security-monitoring dashboard.
//!
//! Everything above this crate is a pure function of the signals it
//! exposes: the stores own the authenticated session, the incident cache,
//! and the analytics snapshot, and keep them fresh over a polling cadence.
//! The backend is an external collaborator reached only through its HTTP
//! contract.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod incidents;
pub mod metrics;
pub mod polling;
pub mod session;
pub mod storage;

use std::rc::Rc;

use leptos::create_rw_signal;

pub use app::{AppStore, Camera, Notification, DEFAULT_STORE_ID};
pub use config::ApiConfig;
pub use error::ApiError;
pub use http::{Gateway, Transport};
pub use incidents::{
    Incident, IncidentFilters, IncidentPatch, IncidentQuery, IncidentStatus, IncidentStore,
    NewIncident, Severity,
};
pub use metrics::{
    DashboardSummary, DetectionReport, HeatZone, HeatmapReport, HourlyDetections,
    MetricsSnapshot, MetricsStore, PatternReport, RiskPattern, RoiReport,
};
pub use polling::{Poller, RequestSequence, DEFAULT_POLL_INTERVAL_MS};
pub use session::{AuthSession, SessionKind, SessionStore, UserProfile, DEMO_TOKEN};
pub use storage::{MemoryTokenStore, TokenStore, TOKEN_STORAGE_KEY};

#[cfg(target_arch = "wasm32")]
pub use http::FetchTransport;
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserTokenStore;

/// One set of state containers per application root.
///
/// Nothing here is a process-wide singleton: tests build as many isolated
/// instances as they need, each with its own transport and token store.
/// The session token signal is created here and threaded into the gateway
/// read-only; only the session store writes it.
#[derive(Clone)]
pub struct Stores {
    pub session: SessionStore,
    pub incidents: IncidentStore,
    pub metrics: MetricsStore,
    pub app: AppStore,
}

impl Stores {
    pub fn new(config: ApiConfig, transport: Rc<dyn Transport>, tokens: Rc<dyn TokenStore>) -> Self {
        let token = create_rw_signal(None::<String>);
        let gateway = Gateway::new(&config, token, transport);
        Self {
            session: SessionStore::new(gateway.clone(), tokens, token),
            incidents: IncidentStore::new(gateway.clone()),
            metrics: MetricsStore::new(gateway.clone()),
            app: AppStore::new(gateway),
        }
    }

    /// Browser wiring: fetch transport, localStorage token persistence,
    /// compile-time backend URL.
    #[cfg(target_arch = "wasm32")]
    pub fn new_browser() -> Self {
        Self::new(
            ApiConfig::from_env(),
            Rc::new(FetchTransport),
            Rc::new(BrowserTokenStore),
        )
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use async_trait::async_trait;
    use leptos::{create_runtime, RuntimeId};

    use crate::config::ApiConfig;
    use crate::http::{HttpRequest, HttpResponse, Transport};
    use crate::storage::MemoryTokenStore;
    use crate::Stores;

    /// Scripted transport: responses are served in FIFO order and every
    /// request is recorded for assertion.
    #[derive(Default)]
    pub struct StubTransport {
        responses: RefCell<VecDeque<Result<HttpResponse, String>>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl StubTransport {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub fn push_ok(&self, status: u16, body: &str) {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
        }

        pub fn push_transport_error(&self, message: &str) {
            self.responses
                .borrow_mut()
                .push_back(Err(message.to_string()));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl Transport for StubTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted response left".to_string()))
        }
    }

    /// Isolated store instances over a scripted transport and in-memory
    /// token persistence, inside their own reactive runtime.
    pub struct TestHarness {
        runtime: RuntimeId,
        pub stores: Stores,
        pub transport: Rc<StubTransport>,
        pub tokens: Rc<MemoryTokenStore>,
    }

    impl TestHarness {
        pub fn new() -> Self {
            let runtime = create_runtime();
            let transport = StubTransport::new();
            let tokens = Rc::new(MemoryTokenStore::default());
            let stores = Stores::new(
                ApiConfig::new("http://backend/api/v1"),
                transport.clone(),
                tokens.clone(),
            );
            Self {
                runtime,
                stores,
                transport,
                tokens,
            }
        }

        pub fn dispose(self) {
            self.runtime.dispose();
        }
    }

    pub fn incident_json(id: &str, status: &str, risk_level: &str) -> String {
        format!(
            r#"{{"id": "{id}", "type": "intrusion_detected", "zone": "Main entrance", "severity": "high", "risk_level": "{risk_level}", "status": "{status}", "description": "Description for {id}", "timestamp": "2026-02-23T21:15:00Z", "user_confirmed": null}}"#
        )
    }
}
