//! Core types and trait definitions for the Agora content API.
//!
//! No HTTP or database dependencies live here.
//! Storage backends implement [`store::ContentStore`]; the HTTP layer drives
//! the gates in [`access`] before touching the store.

// Native `async fn` in traits; the store trait spells out `Send` futures itself.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod content;
pub mod error;
pub mod store;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
