//! Request-lifecycle core for the HRM employee self-service screens.
//!
//! The same submit -> pending -> decision -> history workflow shows up three
//! times in the product (leave requests, timesheet adjustments,
//! reimbursements). This crate factors it out once: a
//! [`crate::core::RequestStore`] holds the working set per kind, the
//! [`crate::core::LifecycleController`] owns every status transition, the
//! [`crate::core::HistoryCache`] keeps the durable decided-request log, and
//! [`crate::core::project`] derives what a given role may see and do. The
//! REST backend is reached only through the [`api::RequestBackend`] trait.

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod model;

use std::sync::Arc;

use crate::api::RequestBackend;
use crate::config::Config;
use crate::core::{HistoryCache, LifecycleController, RequestStore};
use crate::model::RequestKind;

/// Wires a controller for one request kind: store, history cache (restored
/// from disk), and the shared backend.
pub fn controller_for(
    config: &Config,
    backend: Arc<dyn RequestBackend>,
    kind: RequestKind,
) -> Arc<LifecycleController> {
    let store = Arc::new(RequestStore::new(kind));
    let history = Arc::new(HistoryCache::new(kind, config.history_dir.clone()));
    history.load_from_disk();
    Arc::new(LifecycleController::new(backend, store, history))
}
