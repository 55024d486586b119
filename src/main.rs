mod auth;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod room;
mod routes;
mod services;
mod websocket;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use std::panic;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use docs::ApiDoc;
use room::{MutationRelay, RoomHandle};
use routes::api::create_api_routes;
use websocket::handler::board_ws_handler;

/// Shared state handed to API routes and the WebSocket handler.
#[derive(Clone)]
pub struct AppState {
    pub room: RoomHandle,
    pub relay: MutationRelay,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "taskly_board=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    config::init_config(config.clone());
    if config.is_development() {
        info!("Running in development mode");
    }

    // The board cannot run without its task store
    match &config.db_url {
        Some(db_url) => match db::dbtasks::init_db(db_url).await {
            Ok(_) => info!("Database initialized successfully"),
            Err(e) => {
                error!("Fatal: failed to initialize database: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            error!("Fatal: missing DB_URL in environment variables");
            std::process::exit(1);
        }
    }

    // Spawn the community room task; all realtime state lives behind it
    let room = room::spawn(Duration::from_secs(config.indicator_ttl_secs));
    let relay = MutationRelay::new(room.clone());
    let state = AppState { room, relay };

    // Create API routes
    let api_routes = create_api_routes(state.clone());

    // The SPA is served from another origin
    let cors = match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    // Combine all routes
    let app_routes = Router::new()
        // Mount API routes
        .nest("/api", api_routes)
        // Mount the board WebSocket
        .merge(
            Router::new()
                .route("/ws/board", get(board_ws_handler))
                .with_state(state),
        )
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("Server running on http://{}", config.server_address());
    info!("Board WebSocket available at ws://{}/ws/board", config.server_address());
    info!("Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
