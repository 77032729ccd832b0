use crate::domain;
use crate::domain::work_update::Intensity;
use crate::dto::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DTO for posting progress on a task
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewWorkUpdate {
    #[schema(example = "Drafted the introduction and gathered the sales figures")]
    pub update_text: String,
    #[schema(example = 40, minimum = 0, maximum = 100)]
    pub percentage_complete: i32,
    #[schema(value_type = String, example = "Medium")]
    pub intensity: Intensity,
}

impl From<NewWorkUpdate> for domain::work_update::NewWorkUpdate {
    fn from(value: NewWorkUpdate) -> Self {
        domain::work_update::NewWorkUpdate {
            update_text: value.update_text,
            percentage_complete: value.percentage_complete,
            intensity: value.intensity,
        }
    }
}

/// DTO for a manager's remark on a work update
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct RemarkBody {
    #[schema(example = "Good progress, keep it up")]
    pub remark: String,
}

impl From<RemarkBody> for domain::work_update::Remark {
    fn from(value: RemarkBody) -> Self {
        domain::work_update::Remark { text: value.remark }
    }
}

/// DTO for a work update returned from the API
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct WorkUpdate {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = 12)]
    pub task_id: i32,
    /// The employee who posted the update
    pub author: UserSummary,
    pub update_text: String,
    #[schema(example = 40)]
    pub percentage_complete: i32,
    #[schema(value_type = String, example = "Medium")]
    pub intensity: Intensity,
    /// Empty until the task's manager leaves a remark
    pub manager_remark: String,
    pub is_acknowledged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::work_update::WorkUpdate> for WorkUpdate {
    fn from(value: domain::work_update::WorkUpdate) -> Self {
        WorkUpdate {
            id: value.id,
            task_id: value.task_id,
            author: UserSummary::from(value.author),
            update_text: value.update_text,
            percentage_complete: value.percentage_complete,
            intensity: value.intensity,
            manager_remark: value.manager_remark.unwrap_or_default(),
            is_acknowledged: value.is_acknowledged,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
