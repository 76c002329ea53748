//! TechSupport MCP Service
//!
//! Exposes the support workflow over the Model Context Protocol so an LLM can
//! drive a single conversation through tool calls. Every tool runs through the
//! [`WorkflowEngine`], so stage gating applies exactly as it does for the
//! HTTP service.

use crate::actions::{
    CheckKnowledgeBaseArgs, CreateTicketArgs, DescribeIssueArgs, EscalateTicketArgs,
    GetStatusArgs, IdentifyCustomerArgs, ResolveTicketArgs, ScheduleCallbackArgs,
};
use crate::session::SessionState;
use crate::workflow::{Action, WorkflowEngine};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

/// MCP server over one conversation.
pub struct SupportService {
    engine: Arc<WorkflowEngine>,
    /// The conversation this service drives.
    pub session: Arc<Mutex<SessionState>>,
    /// Optional channel notified with the session after every action.
    pub state_tx: Option<mpsc::Sender<SessionState>>,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for SupportService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "TechSupport Pro support workflow. Identify the customer first; the \
                 tools available depend on the current stage."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl SupportService {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        session: Arc<Mutex<SessionState>>,
        state_tx: Option<mpsc::Sender<SessionState>>,
    ) -> Self {
        Self {
            engine,
            session,
            state_tx,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Get the current stage and global data of the support conversation."
    )]
    pub async fn get_session(&self) -> Result<String, String> {
        info!("Executing tool 'get_session'");
        let session = self.session.lock().await;
        serde_json::to_string(&json!({
            "stage": session.stage(),
            "ended": session.is_ended(),
            "global_data": session.global_data(),
        }))
        .map_err(|e| format!("Failed to serialize session: {}", e))
    }

    #[tool(description = "Identify customer by email or phone number")]
    pub async fn identify_customer(
        &self,
        args: Parameters<IdentifyCustomerArgs>,
    ) -> Result<String, String> {
        self.run(Action::IdentifyCustomer, &args.0).await
    }

    #[tool(description = "Get system status, or the status of a ticket by ID")]
    pub async fn get_status(&self, args: Parameters<GetStatusArgs>) -> Result<String, String> {
        self.run(Action::GetStatus, &args.0).await
    }

    #[tool(description = "Record details about the customer's issue")]
    pub async fn describe_issue(
        &self,
        args: Parameters<DescribeIssueArgs>,
    ) -> Result<String, String> {
        self.run(Action::DescribeIssue, &args.0).await
    }

    #[tool(description = "Create a support ticket")]
    pub async fn create_ticket(&self, args: Parameters<CreateTicketArgs>) -> Result<String, String> {
        self.run(Action::CreateTicket, &args.0).await
    }

    #[tool(description = "Search knowledge base for solutions")]
    pub async fn check_knowledge_base(
        &self,
        args: Parameters<CheckKnowledgeBaseArgs>,
    ) -> Result<String, String> {
        self.run(Action::CheckKnowledgeBase, &args.0).await
    }

    #[tool(description = "Mark ticket as resolved")]
    pub async fn resolve_ticket(
        &self,
        args: Parameters<ResolveTicketArgs>,
    ) -> Result<String, String> {
        self.run(Action::ResolveTicket, &args.0).await
    }

    #[tool(description = "Escalate ticket to a specialist")]
    pub async fn escalate_ticket(
        &self,
        args: Parameters<EscalateTicketArgs>,
    ) -> Result<String, String> {
        self.run(Action::EscalateTicket, &args.0).await
    }

    #[tool(description = "Schedule a callback from support")]
    pub async fn schedule_callback(
        &self,
        args: Parameters<ScheduleCallbackArgs>,
    ) -> Result<String, String> {
        self.run(Action::ScheduleCallback, &args.0).await
    }

    #[tool(description = "Enter secure mode - pauses recording for sensitive data")]
    pub async fn secure_mode(&self) -> Result<String, String> {
        self.run(Action::SecureMode, &json!({})).await
    }

    #[tool(description = "Leave secure mode - resumes recording")]
    pub async fn end_secure_mode(&self) -> Result<String, String> {
        self.run(Action::EndSecureMode, &json!({})).await
    }
}

impl SupportService {
    /// Runs one action against the session and returns the serialized
    /// response. Workflow errors are reported back to the model as tool errors.
    async fn run<A: Serialize>(&self, action: Action, args: &A) -> Result<String, String> {
        info!(%action, "Executing tool");
        let args = serde_json::to_value(args).map_err(|e| e.to_string())?;

        let mut session = self.session.lock().await;
        let response = self
            .engine
            .invoke_action(&mut session, action, args)
            .map_err(|e| e.to_string())?;

        if let Some(tx) = &self.state_tx {
            if tx.send(session.clone()).await.is_err() {
                warn!("Failed to broadcast session update: receiver dropped.");
            }
        }

        serde_json::to_string(&response)
            .map_err(|e| format!("Failed to serialize action response: {}", e))
    }
}
