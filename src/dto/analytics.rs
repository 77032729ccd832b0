use crate::domain;
use crate::domain::task::{TaskPriority, TaskStatus};
use crate::dto::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[cfg(test)]
use serde::Deserialize;

#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct StatusCount {
    #[schema(value_type = String, example = "In Progress")]
    pub status: TaskStatus,
    #[schema(example = 3)]
    pub count: i64,
}

impl From<domain::analytics::StatusCount> for StatusCount {
    fn from(value: domain::analytics::StatusCount) -> Self {
        StatusCount {
            status: value.status,
            count: value.count,
        }
    }
}

/// Tasks without a priority are counted under a null priority
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct PriorityCount {
    #[schema(value_type = Option<String>, example = "High")]
    pub priority: Option<TaskPriority>,
    #[schema(example = 2)]
    pub count: i64,
}

impl From<domain::analytics::PriorityCount> for PriorityCount {
    fn from(value: domain::analytics::PriorityCount) -> Self {
        PriorityCount {
            priority: value.priority,
            count: value.count,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct EmployeeTaskTotal {
    pub employee: UserSummary,
    #[schema(example = 5)]
    pub task_count: i64,
}

impl From<domain::analytics::EmployeeTaskTotal> for EmployeeTaskTotal {
    fn from(value: domain::analytics::EmployeeTaskTotal) -> Self {
        EmployeeTaskTotal {
            employee: UserSummary::from(value.employee),
            task_count: value.total,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct ProgressPoint {
    pub created_at: DateTime<Utc>,
    #[schema(example = 60)]
    pub percentage_complete: i32,
}

impl From<domain::analytics::ProgressPoint> for ProgressPoint {
    fn from(value: domain::analytics::ProgressPoint) -> Self {
        ProgressPoint {
            created_at: value.recorded_at,
            percentage_complete: value.percentage_complete,
        }
    }
}

/// Aggregates across every task a manager owns
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct TeamSummary {
    pub status_summary: Vec<StatusCount>,
    pub tasks_per_employee: Vec<EmployeeTaskTotal>,
    /// Percentage of tasks which are done, with one decimal place
    #[schema(example = "30.0")]
    pub completion_percentage: String,
    #[schema(example = 10)]
    pub total_tasks: i64,
    #[schema(example = 3)]
    pub done_tasks: i64,
}

impl From<domain::analytics::TeamSummary> for TeamSummary {
    fn from(value: domain::analytics::TeamSummary) -> Self {
        TeamSummary {
            status_summary: value.status_summary.into_iter().map(StatusCount::from).collect(),
            tasks_per_employee: value
                .tasks_per_employee
                .into_iter()
                .map(EmployeeTaskTotal::from)
                .collect(),
            completion_percentage: value.completion.percentage(),
            total_tasks: value.completion.total_tasks,
            done_tasks: value.completion.done_tasks,
        }
    }
}

/// Aggregates across the tasks a manager has given one employee
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct EmployeeSummary {
    pub status_summary: Vec<StatusCount>,
    pub priority_summary: Vec<PriorityCount>,
    #[schema(example = "50.0")]
    pub completion_percentage: String,
    #[schema(example = 4)]
    pub total_tasks: i64,
    #[schema(example = 2)]
    pub done_tasks: i64,
}

impl From<domain::analytics::EmployeeSummary> for EmployeeSummary {
    fn from(value: domain::analytics::EmployeeSummary) -> Self {
        EmployeeSummary {
            status_summary: value.status_summary.into_iter().map(StatusCount::from).collect(),
            priority_summary: value
                .priority_summary
                .into_iter()
                .map(PriorityCount::from)
                .collect(),
            completion_percentage: value.completion.percentage(),
            total_tasks: value.completion.total_tasks,
            done_tasks: value.completion.done_tasks,
        }
    }
}
