use crate::domain;
use crate::domain::task::{TaskChanges, TaskPatch, TaskPriority, TaskStatus};
use crate::dto::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

/// DTO for creating a new task via the API
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[schema(example = "Write the quarterly report")]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to "To Do"
    #[schema(value_type = Option<String>, example = "To Do")]
    pub status: Option<TaskStatus>,
    #[schema(value_type = Option<String>, example = "High")]
    pub priority: Option<TaskPriority>,
    /// ID of the employee the task is for
    #[schema(example = 4)]
    pub assigned_to: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            title: value.title,
            description: value.description,
            status: value.status.unwrap_or_default(),
            priority: value.priority,
            assigned_to: value.assigned_to,
            due_date: value.due_date,
        }
    }
}

/// DTO for changing a task. The task's assignee may only send `status` on its own;
/// its manager may change any field, and sending `null` clears an optional one.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Default))]
pub struct UpdateTask {
    #[serde(default, deserialize_with = "sent_or_null")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "sent_or_null")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "sent_or_null")]
    #[schema(value_type = Option<String>, example = "In Progress")]
    pub status: Option<Option<TaskStatus>>,
    #[serde(default, deserialize_with = "sent_or_null")]
    #[schema(value_type = Option<String>, example = "Medium")]
    pub priority: Option<Option<TaskPriority>>,
    #[serde(default, deserialize_with = "sent_or_null")]
    #[schema(value_type = Option<i32>)]
    pub assigned_to: Option<Option<i32>>,
    #[serde(default, deserialize_with = "sent_or_null")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Keys this API doesn't know about. Kept so a body with extra keys isn't mistaken for a status-only change.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub unknown_fields: HashMap<String, Value>,
}

/// Only runs for keys present in the body, so a `null` value comes out as `Some(None)`
fn sent_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<UpdateTask> for TaskPatch {
    fn from(value: UpdateTask) -> Self {
        let only_status = value.title.is_none()
            && value.description.is_none()
            && value.priority.is_none()
            && value.assigned_to.is_none()
            && value.due_date.is_none()
            && value.unknown_fields.is_empty();

        match value.status {
            Some(Some(status)) if only_status => TaskPatch::StatusOnly(status),
            _ => TaskPatch::Full(TaskChanges {
                title: value.title,
                description: value.description,
                status: value.status,
                priority: value.priority,
                assigned_to: value.assigned_to,
                due_date: value.due_date,
            }),
        }
    }
}

/// DTO for a task returned from the API
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct Task {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = "Write the quarterly report")]
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "To Do")]
    pub status: TaskStatus,
    #[schema(value_type = Option<String>, example = "High")]
    pub priority: Option<TaskPriority>,
    /// The manager who owns the task
    pub manager: UserSummary,
    pub assigned_to: Option<UserSummary>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
            priority: value.priority,
            manager: UserSummary::from(value.manager),
            assigned_to: value.assignee.map(UserSummary::from),
            due_date: value.due_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
