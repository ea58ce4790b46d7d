// HTTP boundary for the ranking pipeline
// Serves snapshots to the web frontend and exposes the manual batch trigger

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

use std::sync::Arc;

use crate::orchestrator::Orchestrator;
use crate::scheduler::Scheduler;

pub use server::ApiServer;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub scheduler: Arc<Scheduler>,
}
