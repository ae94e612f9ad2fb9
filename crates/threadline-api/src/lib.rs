//! JSON REST API for Threadline.
//!
//! Exposes an axum [`Router`] backed by any
//! [`threadline_core::store::MessageStore`]. Authentication, TLS, and
//! transport concerns are the caller's responsibility; the authenticated user
//! is read from the [`actor::ACTOR_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", threadline_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod error;
pub mod identities;
pub mod messages;
pub mod notifications;
pub mod threads;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use threadline_core::store::MessageStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: MessageStore + 'static,
{
  Router::new()
    // Identities
    .route("/identities", post(identities::create::<S>))
    .route(
      "/identities/{id}",
      get(identities::get_one::<S>).delete(identities::delete_one::<S>),
    )
    .route("/identities/{id}/unread", get(identities::unread::<S>))
    .route("/identities/{id}/notifications", get(identities::notifications::<S>))
    // Messages
    .route(
      "/messages",
      get(messages::list::<S>).post(messages::create::<S>),
    )
    .route(
      "/messages/{id}",
      get(messages::get_one::<S>).patch(messages::edit::<S>),
    )
    .route("/messages/{id}/history", get(messages::history::<S>))
    .route("/messages/{id}/read", post(messages::mark_read::<S>))
    // Threads
    .route("/threads/{id}", get(threads::handler::<S>))
    // Notifications
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    .with_state(store)
}
