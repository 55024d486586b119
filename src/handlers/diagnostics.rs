use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::{error, info};

use crate::models::{DiagnosticsResponse, ErrorResponse, Identity};
use crate::AppState;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Room and process statistics
pub async fn diagnostics(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {
    // Ask the room task for its counters
    let stats = match state.room.stats().await {
        Some(stats) => stats,
        None => {
            error!("Room task did not answer the stats query");
            return Err(ErrorResponse::with_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Room unavailable",
            ));
        }
    };

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics for {}: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Conn: {}, Participants: {}",
        user.email,
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        stats.connections,
        stats.participants
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn: stats.connections,
            n_participants: stats.participants,
            n_editing: stats.editing,
            n_typing: stats.typing,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}
