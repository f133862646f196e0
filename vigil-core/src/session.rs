use std::rc::Rc;

use leptos::{create_rw_signal, RwSignal, SignalGetUntracked, SignalSet};
use serde::{Deserialize, Serialize};

use crate::http::Gateway;
use crate::storage::TokenStore;

/// Token minted locally when the auth backend is unreachable. Recognized on
/// restore so an offline session reloads as the offline variant.
pub const DEMO_TOKEN: &str = "demo-local-token";

const DEMO_ROLE: &str = "viewer";

fn default_role() -> String {
    DEMO_ROLE.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

/// Distinguishes a backend-issued session from one synthesized locally while
/// the backend was unreachable. Downstream code can gate privileged
/// operations on this tag instead of guessing from the token shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Real,
    OfflineDemo,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub kind: SessionKind,
    /// `None` only for a session restored from a bare persisted token, where
    /// the profile is not known until the backend is asked again.
    pub user: Option<UserProfile>,
}

impl AuthSession {
    pub fn is_offline_demo(&self) -> bool {
        self.kind == SessionKind::OfflineDemo
    }
}

#[derive(Clone, Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Clone, Debug, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

/// Owns the one session per running client.
///
/// The token signal handed in at construction is shared read-only with the
/// gateway (and through it every other store); this store is the only
/// writer. Exactly one `SessionStore` exists per application root.
#[derive(Clone)]
pub struct SessionStore {
    gateway: Gateway,
    tokens: Rc<dyn TokenStore>,
    token: RwSignal<Option<String>>,
    pub session: RwSignal<Option<AuthSession>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
}

impl SessionStore {
    pub fn new(gateway: Gateway, tokens: Rc<dyn TokenStore>, token: RwSignal<Option<String>>) -> Self {
        Self {
            gateway,
            tokens,
            token,
            session: create_rw_signal(None),
            loading: create_rw_signal(false),
            error: create_rw_signal(None),
        }
    }

    /// Authenticates against the backend.
    ///
    /// A transport-level failure (nothing reached the backend) falls back to
    /// an offline demo session so the dashboard stays usable disconnected. A
    /// backend rejection is a real answer: its message is surfaced and no
    /// session is established.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let request = LoginRequest { email, password };
        let result = self
            .gateway
            .post_json::<_, LoginResponse>("/auth/login", &request)
            .await;
        self.loading.set(false);

        match result {
            Ok(response) => {
                let user = response
                    .user
                    .unwrap_or_else(|| derived_profile(email, None));
                self.install(AuthSession {
                    token: response.access_token,
                    kind: SessionKind::Real,
                    user: Some(user),
                });
                true
            }
            Err(err) if err.is_transport() => {
                log::warn!("auth backend unreachable, starting offline demo session: {err}");
                self.install(offline_demo_session(email, None));
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    /// Registers a new account. A successful response only opens a session
    /// when the backend returns one; the offline fallback mirrors `login`.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let request = RegisterRequest {
            email,
            password,
            name,
        };
        let result = self
            .gateway
            .post_json::<_, RegisterResponse>("/auth/register", &request)
            .await;
        self.loading.set(false);

        match result {
            Ok(response) => {
                if let Some(token) = response.access_token {
                    let user = response
                        .user
                        .unwrap_or_else(|| derived_profile(email, Some(name)));
                    self.install(AuthSession {
                        token,
                        kind: SessionKind::Real,
                        user: Some(user),
                    });
                }
                true
            }
            Err(err) if err.is_transport() => {
                log::warn!("auth backend unreachable, starting offline demo session: {err}");
                self.install(offline_demo_session(email, Some(name)));
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }

    /// Synchronous and infallible: drops the persisted token and resets the
    /// session to empty.
    pub fn logout(&self) {
        self.tokens.clear();
        self.token.set(None);
        self.session.set(None);
        self.loading.set(false);
        self.error.set(None);
    }

    /// Startup path. A persisted demo token resurrects the offline variant;
    /// any other token is assumed backend-issued, with the profile unknown
    /// until re-fetched. No persisted key means unauthenticated.
    pub fn restore(&self) {
        let Some(token) = self.tokens.load() else {
            return;
        };
        let kind = if token == DEMO_TOKEN {
            SessionKind::OfflineDemo
        } else {
            SessionKind::Real
        };
        self.token.set(Some(token.clone()));
        self.session.set(Some(AuthSession {
            token,
            kind,
            user: None,
        }));
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.get_untracked().is_some()
    }

    /// Header set for outgoing requests; empty when signed out.
    pub fn auth_header(&self) -> Option<(&'static str, String)> {
        self.token
            .get_untracked()
            .map(|token| ("Authorization", format!("Bearer {token}")))
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    fn install(&self, session: AuthSession) {
        self.tokens.save(&session.token);
        self.token.set(Some(session.token.clone()));
        self.session.set(Some(session));
        self.error.set(None);
    }
}

fn derived_profile(email: &str, name: Option<&str>) -> UserProfile {
    let local_part = email.split('@').next().unwrap_or_default();
    let fallback = if local_part.is_empty() {
        "Demo User".to_string()
    } else {
        local_part.to_string()
    };
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
        .unwrap_or(fallback);
    UserProfile {
        email: email.to_string(),
        name,
        role: default_role(),
    }
}

fn offline_demo_session(email: &str, name: Option<&str>) -> AuthSession {
    AuthSession {
        token: DEMO_TOKEN.to_string(),
        kind: SessionKind::OfflineDemo,
        user: Some(derived_profile(email, name)),
    }
}
