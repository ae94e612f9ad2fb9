//! Core types and trait definitions for the Threadline messaging backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; storage backends implement
//! [`store::MessageStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod message;
pub mod notification;
pub mod store;
pub mod thread;

pub use error::{Classify, Error, ErrorKind, Result};
