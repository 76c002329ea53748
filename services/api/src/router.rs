//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation. The API is served under
//! the agent's configured route.

use crate::{
    handlers,
    models::{
        ActionDescriptor, ActionResult, ErrorResponse, InvokeActionPayload, OpenSessionPayload,
        Session, SessionStatus,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa::openapi::server::Server;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::open_session,
        handlers::get_session,
        handlers::close_session,
        handlers::invoke_action,
        handlers::list_actions,
        handlers::get_profile,
    ),
    components(
        schemas(Session, SessionStatus, OpenSessionPayload, InvokeActionPayload, ActionResult, ActionDescriptor, ErrorResponse)
    ),
    tags(
        (name = "TechSupport API", description = "Conversation workflow for the technical support agent")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document for an API served under `route`. Paths stay
/// relative; the route becomes the document's server so generated clients
/// and Swagger UI call the prefixed paths.
pub fn api_doc(route: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if route != "/" {
        doc.servers = Some(vec![Server::new(route)]);
    }
    doc
}

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let route = app_state.config.route.clone();

    let api_router = Router::new()
        .route("/sessions", post(handlers::open_session))
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route("/sessions/{id}/actions", post(handlers::invoke_action))
        .route("/actions", get(handlers::list_actions))
        .route("/profile", get(handlers::get_profile))
        .with_state(app_state);

    // Axum refuses to nest at the root.
    let api_router = if route == "/" {
        api_router
    } else {
        Router::new().nest(&route, api_router)
    };

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(&route)))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/sessions",
            "/sessions/{id}",
            "/sessions/{id}/actions",
            "/actions",
            "/profile",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }

    #[test]
    fn test_openapi_document_points_at_agent_route() {
        let doc = api_doc("/support");
        let servers = doc.servers.expect("servers should be set");
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].url, "/support");

        assert!(api_doc("/").servers.is_none());
    }
}
