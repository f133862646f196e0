use std::cell::RefCell;

/// Single well-known key holding the session token across reloads. Nothing
/// else is persisted.
pub const TOKEN_STORAGE_KEY: &str = "vigil.access_token";

/// Durable token persistence. Absence of the key on startup means
/// "unauthenticated". `save`/`clear` swallow storage failures so logout can
/// never fail.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// In-memory store for tests and non-browser builds.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn save(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.borrow_mut() = None;
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserTokenStore;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{TokenStore, TOKEN_STORAGE_KEY};

    /// localStorage-backed token persistence.
    pub struct BrowserTokenStore;

    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    impl TokenStore for BrowserTokenStore {
        fn load(&self) -> Option<String> {
            local_storage()?.get_item(TOKEN_STORAGE_KEY).ok()?
        }

        fn save(&self, token: &str) {
            let Some(storage) = local_storage() else {
                log::warn!("local storage unavailable, session will not survive reload");
                return;
            };
            if storage.set_item(TOKEN_STORAGE_KEY, token).is_err() {
                log::warn!("failed to persist session token");
            }
        }

        fn clear(&self) {
            if let Some(storage) = local_storage() {
                let _ = storage.remove_item(TOKEN_STORAGE_KEY);
            }
        }
    }
}
