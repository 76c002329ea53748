//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the workflow engine, the session store and the agent
//! profile.

use crate::config::Config;
use crate::sessions::SessionStore;
use std::sync::Arc;
use techsupport_core::{
    directory::CustomerDirectory,
    knowledge::KnowledgeBase,
    profile::AgentProfile,
    registry::ActionRegistry,
    ticket::SequentialTicketIds,
    workflow::WorkflowEngine,
};

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub sessions: Arc<SessionStore>,
    pub profile: Arc<AgentProfile>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the state from configuration and an already assembled profile.
    pub fn new(config: Config, profile: AgentProfile) -> Self {
        let engine = WorkflowEngine::new(
            Arc::new(ActionRegistry::with_support_actions()),
            Arc::new(CustomerDirectory::default()),
            Arc::new(config.specialists.clone()),
            Arc::new(KnowledgeBase::default()),
            Arc::new(SequentialTicketIds::starting_after(config.ticket_counter_start)),
        );
        Self {
            engine: Arc::new(engine),
            sessions: Arc::new(SessionStore::new()),
            profile: Arc::new(profile.with_route(config.route.clone())),
            config: Arc::new(config),
        }
    }
}
