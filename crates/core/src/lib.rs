//! Foody Core - Shared types library.
//!
//! This crate provides the types shared by every Foody client component:
//! - `client` - Cart store, reconciler and backend API client
//! - `integration-tests` - Cross-module cart scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no storage, no HTTP clients. This keeps it lightweight and lets the cart
//! rules be tested without any runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, phones and statuses
//! - [`cart`] - Local cart lines and the in-memory cart state
//! - [`snapshot`] - The server's grouped view of a cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod snapshot;
pub mod types;

pub use cart::{CartLine, CartState};
pub use snapshot::{CartMenu, CartSummary, RemoteCartItem, RemoteCartSnapshot, RestaurantCart, RestaurantRef};
pub use types::*;
