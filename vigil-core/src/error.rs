use thiserror::Error;

/// Failure taxonomy for backend calls.
///
/// `Transport` means no response reached the client at all (connection
/// refused, DNS failure); it is the only class that triggers the offline
/// demo fallback during authentication. `Rejected` carries the backend's
/// own message for a non-2xx response and is surfaced verbatim to the UI.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pulls a human-readable message out of a backend error body.
///
/// The backend is FastAPI-shaped (`{"detail": ...}`), but `message` and
/// `error` keys show up from proxies in front of it.
pub fn rejection_message(status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        })
}
