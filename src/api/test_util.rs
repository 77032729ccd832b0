use crate::domain;
use crate::domain::auth::Identity;
use crate::domain::task::{Task, TaskPriority, TaskStatus};
use crate::domain::user::Role;
use crate::domain::work_update::{Intensity, WorkUpdate};
use axum::body;
use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;

/// Used in tests to both extract the raw bytes from the HTTP response body and then deserialize them into the
/// requested type. Will panic and fail the test if either step fails somehow.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse body content into data structure! Error: {}, Received body: {:?}",
            err, bytes
        )
    })
}

pub fn test_identity(id: i32, role: Role) -> Identity {
    Identity {
        id,
        name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        role,
    }
}

/// A task owned by manager 1 and assigned to employee 2
pub fn sample_task(id: i32) -> Task {
    let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    Task {
        id,
        title: format!("Task {id}"),
        description: Some("Write the quarterly report".to_owned()),
        status: TaskStatus::InProgress,
        priority: Some(TaskPriority::High),
        manager: domain::UserRef {
            id: 1,
            name: "User 1".to_owned(),
        },
        assignee: Some(domain::UserRef {
            id: 2,
            name: "User 2".to_owned(),
        }),
        due_date: None,
        created_at,
        updated_at: created_at,
    }
}

/// A work update on the given task written by employee 2
pub fn sample_update(id: i32, task_id: i32) -> WorkUpdate {
    let created_at = Utc.with_ymd_and_hms(2025, 3, 2, 17, 30, 0).unwrap();

    WorkUpdate {
        id,
        task_id,
        author: domain::UserRef {
            id: 2,
            name: "User 2".to_owned(),
        },
        update_text: "Drafted the intro".to_owned(),
        percentage_complete: 40,
        intensity: Intensity::Medium,
        manager_remark: None,
        is_acknowledged: false,
        created_at,
        updated_at: created_at,
    }
}
