use std::cell::Cell;
use std::rc::Rc;

use leptos::{create_rw_signal, RwSignal, SignalSet, SignalUpdate};
use serde::{Deserialize, Serialize};

use crate::http::Gateway;

pub const DEFAULT_STORE_ID: &str = "STORE-001";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fps: u32,
    #[serde(default, rename = "lastSeen")]
    pub last_seen: String,
    #[serde(default)]
    pub detections: u64,
}

#[derive(Clone, Debug, Deserialize)]
struct CameraListResponse {
    #[serde(default)]
    cameras: Vec<Camera>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: String,
    pub message: String,
}

/// Application chrome: notification feed, selected store, camera inventory.
/// Camera entries are data only; playback happens elsewhere.
#[derive(Clone)]
pub struct AppStore {
    gateway: Gateway,
    next_notification_id: Rc<Cell<u64>>,
    pub current_store_id: RwSignal<String>,
    pub notifications: RwSignal<Vec<Notification>>,
    pub cameras: RwSignal<Vec<Camera>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
}

impl AppStore {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            next_notification_id: Rc::new(Cell::new(0)),
            current_store_id: create_rw_signal(DEFAULT_STORE_ID.to_string()),
            notifications: create_rw_signal(Vec::new()),
            cameras: create_rw_signal(Vec::new()),
            loading: create_rw_signal(false),
            error: create_rw_signal(None),
        }
    }

    /// Prepends a notification and returns its id for later dismissal.
    pub fn notify(&self, kind: &str, message: &str) -> u64 {
        let id = self.next_notification_id.get() + 1;
        self.next_notification_id.set(id);
        self.notifications.update(|feed| {
            feed.insert(
                0,
                Notification {
                    id,
                    kind: kind.to_string(),
                    message: message.to_string(),
                },
            );
        });
        id
    }

    pub fn dismiss(&self, id: u64) {
        self.notifications.update(|feed| feed.retain(|n| n.id != id));
    }

    pub fn clear_notifications(&self) {
        self.notifications.set(Vec::new());
    }

    pub fn set_current_store(&self, store_id: &str) {
        self.current_store_id.set(store_id.to_string());
    }

    pub async fn fetch_cameras(&self) -> bool {
        self.loading.set(true);
        self.error.set(None);

        let result = self
            .gateway
            .get_json::<CameraListResponse>("/cameras", &[])
            .await;
        self.loading.set(false);

        match result {
            Ok(page) => {
                self.cameras.set(page.cameras);
                true
            }
            Err(err) => {
                self.error.set(Some(err.to_string()));
                false
            }
        }
    }
}
