//! Paginated, debounced catalog search.
//!
//! [`controller::CatalogSearchController`] holds the session state machine,
//! [`service`] runs it on a single task and publishes snapshots.

pub mod controller;
pub mod debounce;
pub mod events;
pub mod service;
pub mod session;

pub use controller::SearchSnapshot;
pub use service::{SearchHandle, ServiceStopped};
pub use session::SearchPhase;
