use axum::{http::StatusCode, Json};

use crate::db::dbtasks::TaskRow;
use crate::models::{ErrorResponse, Identity};

/// Board tasks may only be changed by their author.
pub fn ensure_author(identity: &Identity, task: &TaskRow) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if task.owner == identity.id {
        return Ok(());
    }
    Err(ErrorResponse::with_status(
        StatusCode::FORBIDDEN,
        "Only the task author can modify it",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn task_owned_by(owner: Uuid) -> TaskRow {
        TaskRow {
            id: Uuid::new_v4(),
            owner,
            owner_name: "Alice Example".to_string(),
            owner_email: "alice@example.com".to_string(),
            title: "title".to_string(),
            description: String::new(),
            status: "Pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_the_author_passes() {
        let author = Identity {
            id: Uuid::new_v4(),
            full_name: "Alice Example".to_string(),
            email: "alice@example.com".to_string(),
        };
        let intruder = Identity {
            id: Uuid::new_v4(),
            full_name: "Bob Example".to_string(),
            email: "bob@example.com".to_string(),
        };
        let task = task_owned_by(author.id);

        assert!(ensure_author(&author, &task).is_ok());
        let (status, _) = ensure_author(&intruder, &task).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
