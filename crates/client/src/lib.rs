//! Foody client library.
//!
//! Everything behind the Foody ordering screens except the widgets: the
//! persistent cart store, cart reconciliation against the backend,
//! optimistic cart mutations with rollback, checkout, login sessions and
//! the typed backend API client.
//!
//! # Modules
//!
//! - [`store`] - Persistent local cart
//! - [`reconcile`] - Decides whether a server cart replaces the local one
//! - [`sync`] - Cart operations tied to the backend
//! - [`optimistic`] - Apply-submit-commit/rollback protocol
//! - [`api`] - Typed HTTP client for the Foody backend
//! - [`app`] - Composition root for one client session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod cache;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filters;
pub mod notify;
pub mod optimistic;
pub mod reconcile;
pub mod remote;
pub mod review;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod view;

pub use api::{ApiClient, ApiError, Credentials};
pub use app::FoodyApp;
pub use cache::QueryCache;
pub use checkout::{CheckoutError, CheckoutReceipt, DeliveryDetails, OrderRemote};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use filters::{Distance, RestaurantFilters};
pub use notify::{Level, Notification, Notifier, Toasts};
pub use reconcile::{Reconciled, reconcile};
pub use remote::CartRemote;
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, SharedStorage, StorageError};
pub use store::CartStore;
pub use sync::{CartError, CartSync, MenuSelection, MountOutcome};
pub use view::CartView;
