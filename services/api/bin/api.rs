//! Main Entrypoint for the TechSupport API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Assembling the agent profile, applying prompt overrides from disk.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use std::{collections::HashMap, fs, net::SocketAddr, path::Path, sync::Arc};
use techsupport_api::{config::Config, router::create_router, state::AppState};
use techsupport_core::profile::AgentProfile;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Waits for `Ctrl+C` so the server can shut down gracefully.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// Loads every `.md` file in a directory, keyed by file stem.
fn load_prompts(prompts_path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in fs::read_dir(prompts_path)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt {}", path.display()))?;
            prompts.insert(key, content);
        }
    }
    Ok(prompts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Assembling agent profile...");

    // --- 3. Agent Profile ---
    let mut profile = AgentProfile::default();
    if config.prompts_path.is_dir() {
        let overrides = load_prompts(&config.prompts_path)?;
        info!(
            path = %config.prompts_path.display(),
            sections = overrides.len(),
            "Applying prompt overrides"
        );
        profile = profile.with_prompt_overrides(&overrides);
    } else {
        warn!(
            path = %config.prompts_path.display(),
            "Prompts directory not found, using built-in prompt"
        );
    }

    let app_state = Arc::new(AppState::new(config.clone(), profile));

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        route = %config.route,
        bind_address = %config.bind_address,
        first_ticket = config.ticket_counter_start + 1,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
