//! Read-only aggregates over a manager's tasks and the work updates posted against them.

use crate::domain;
use crate::domain::UserRef;
use crate::domain::analytics::driven_ports::AnalyticsReader;
use crate::domain::auth::Identity;
use crate::domain::task::driven_ports::TaskReader;
use crate::domain::task::{TaskPriority, TaskStatus};
use crate::domain::user::Role;
use crate::domain::user::driven_ports::UserReader;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

/// Tasks created without a priority are grouped under [None]
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PriorityCount {
    pub priority: Option<TaskPriority>,
    pub count: i64,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct EmployeeTaskTotal {
    pub employee: UserRef,
    pub total: i64,
}

/// One point on a task's progress trend line
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ProgressPoint {
    pub recorded_at: DateTime<Utc>,
    pub percentage_complete: i32,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Completion {
    pub total_tasks: i64,
    pub done_tasks: i64,
}

impl Completion {
    pub fn from_status_counts(counts: &[StatusCount]) -> Completion {
        Completion {
            total_tasks: counts.iter().map(|entry| entry.count).sum(),
            done_tasks: counts
                .iter()
                .filter(|entry| entry.status == TaskStatus::Done)
                .map(|entry| entry.count)
                .sum(),
        }
    }

    /// Share of done tasks as a percentage with one decimal place, e.g. "30.0".
    /// Halves round up, and an empty task set is "0.0".
    pub fn percentage(&self) -> String {
        if self.total_tasks <= 0 {
            return "0.0".to_owned();
        }

        let tenths = (self.done_tasks * 2000 + self.total_tasks) / (2 * self.total_tasks);
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TeamSummary {
    pub status_summary: Vec<StatusCount>,
    pub tasks_per_employee: Vec<EmployeeTaskTotal>,
    pub completion: Completion,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct EmployeeSummary {
    pub status_summary: Vec<StatusCount>,
    pub priority_summary: Vec<PriorityCount>,
    pub completion: Completion,
}

pub mod driven_ports {
    use super::*;

    pub trait AnalyticsReader {
        /// Counts a manager's tasks per status, optionally only those assigned to one employee
        async fn status_counts(
            &self,
            manager_id: i32,
            assignee_id: Option<i32>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<StatusCount>, anyhow::Error>;

        async fn priority_counts(
            &self,
            manager_id: i32,
            assignee_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<PriorityCount>, anyhow::Error>;

        /// Totals for every employee holding at least one of the manager's tasks, ordered by name
        async fn tasks_per_employee(
            &self,
            manager_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<EmployeeTaskTotal>, anyhow::Error>;

        /// Percentages reported on a task, oldest first
        async fn progress_history(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<ProgressPoint>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait AnalyticsPort {
        async fn team_summary(
            &self,
            identity: &Identity,
            ext_cxn: &mut impl ExternalConnectivity,
            a_read: &impl AnalyticsReader,
        ) -> Result<TeamSummary, domain::Error>;

        async fn employee_summary(
            &self,
            identity: &Identity,
            employee_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl UserReader,
            a_read: &impl AnalyticsReader,
        ) -> Result<EmployeeSummary, domain::Error>;

        async fn task_progress(
            &self,
            identity: &Identity,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
            a_read: &impl AnalyticsReader,
        ) -> Result<Vec<ProgressPoint>, domain::Error>;
    }
}

pub struct AnalyticsService {}

impl driving_ports::AnalyticsPort for AnalyticsService {
    async fn team_summary(
        &self,
        identity: &Identity,
        ext_cxn: &mut impl ExternalConnectivity,
        a_read: &impl AnalyticsReader,
    ) -> Result<TeamSummary, domain::Error> {
        identity.authorize(&[Role::Manager])?;

        let status_summary = a_read
            .status_counts(identity.id, None, &mut *ext_cxn)
            .await
            .context("counting team tasks by status")?;
        let tasks_per_employee = a_read
            .tasks_per_employee(identity.id, &mut *ext_cxn)
            .await
            .context("counting tasks per employee")?;

        Ok(TeamSummary {
            completion: Completion::from_status_counts(&status_summary),
            status_summary,
            tasks_per_employee,
        })
    }

    async fn employee_summary(
        &self,
        identity: &Identity,
        employee_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl UserReader,
        a_read: &impl AnalyticsReader,
    ) -> Result<EmployeeSummary, domain::Error> {
        identity.authorize(&[Role::Manager])?;

        let employee = u_read
            .get_by_id(employee_id, &mut *ext_cxn)
            .await
            .context("looking up employee for summary")?;
        if !employee.is_some_and(|user| user.role == Role::Employee) {
            return Err(domain::Error::DoesNotExist("employee"));
        }

        let status_summary = a_read
            .status_counts(identity.id, Some(employee_id), &mut *ext_cxn)
            .await
            .context("counting employee tasks by status")?;
        let priority_summary = a_read
            .priority_counts(identity.id, employee_id, &mut *ext_cxn)
            .await
            .context("counting employee tasks by priority")?;

        Ok(EmployeeSummary {
            completion: Completion::from_status_counts(&status_summary),
            status_summary,
            priority_summary,
        })
    }

    async fn task_progress(
        &self,
        identity: &Identity,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        a_read: &impl AnalyticsReader,
    ) -> Result<Vec<ProgressPoint>, domain::Error> {
        domain::task::accessible_task(identity, task_id, &mut *ext_cxn, task_read).await?;

        let history = a_read
            .progress_history(task_id, &mut *ext_cxn)
            .await
            .context("fetching task progress history")?;

        Ok(history)
    }
}
