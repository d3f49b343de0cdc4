//! Durable client-side key/value storage.
//!
//! The client keeps a handful of small string values between runs: the
//! serialized cart, the auth token, the cached user profile, and UI flags.
//! All access is synchronous so a mutation can persist before it returns.
//!
//! # Backends
//!
//! - [`FileStorage`] - one file per key in a directory (durable)
//! - [`MemoryStorage`] - process lifetime only (session-scoped logins, tests)

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that cannot be mapped to a storage slot.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A synchronous string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn KeyValueStore>;

/// Storage keys used by the client.
pub mod keys {
    /// Serialized cart state.
    pub const CART_STATE: &str = "cart_state";

    /// Bearer token for the backend API.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Serialized profile of the logged-in user.
    pub const AUTH_USER: &str = "auth_user";

    /// Set once the onboarding modal was dismissed.
    pub const ONBOARDING_SEEN: &str = "wph_coach_modal_seen";

    /// Summary of the last successful checkout.
    pub const CHECKOUT_SUCCESS: &str = "checkout_success";
}
