use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated user a connection or request acts as.
///
/// Built once from verified token claims and threaded through every room
/// event; never taken from per-event client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}
