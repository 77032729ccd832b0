use crate::domain;
use crate::domain::UserRef;
use crate::domain::auth::Identity;
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::user::Role;
use crate::domain::user::driven_ports::UserReader;
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "To Do" => Ok(Self::ToDo),
            "In Progress" => Ok(Self::InProgress),
            "Done" => Ok(Self::Done),
            other => Err(anyhow!("unknown task status: {other}")),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(anyhow!("unknown task priority: {other}")),
        }
    }
}

/// A task with its owning manager and (optional) assignee resolved to display names
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub manager: UserRef,
    pub assignee: Option<UserRef>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The relationship a user has with a task, which decides what they may do with it
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TaskAccess {
    Owner,
    Assignee,
}

impl Task {
    /// Works out how the given user relates to this task. Unassigned tasks never match an assignee.
    pub fn access_for(&self, identity: &Identity) -> Option<TaskAccess> {
        if self.manager.id == identity.id {
            Some(TaskAccess::Owner)
        } else if self
            .assignee
            .as_ref()
            .is_some_and(|assignee| assignee.id == identity.id)
        {
            Some(TaskAccess::Assignee)
        } else {
            None
        }
    }
}

#[derive(Validate, Debug)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct NewTask {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A set of field changes to apply to a task. The outer [Option] says whether the field was sent at all,
/// so `Some(None)` clears a field while `None` leaves it alone.
#[derive(Debug, Default, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct TaskChanges {
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub status: Option<Option<TaskStatus>>,
    pub priority: Option<Option<TaskPriority>>,
    pub assigned_to: Option<Option<i32>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl Validate for TaskChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.title {
            Some(None) => errors.add("title", ValidationError::new("required")),
            Some(Some(title)) if !(1..=200).contains(&title.chars().count()) => {
                errors.add("title", ValidationError::new("length"))
            }
            _ => {}
        }
        if self.status == Some(None) {
            errors.add("status", ValidationError::new("required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// An update request, classified by shape. Assignees may only submit [TaskPatch::StatusOnly];
/// the owning manager may submit either.
#[derive(Debug)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub enum TaskPatch {
    StatusOnly(TaskStatus),
    Full(TaskChanges),
}

impl TaskPatch {
    fn to_changes(&self) -> TaskChanges {
        match self {
            Self::StatusOnly(status) => TaskChanges {
                status: Some(Some(*status)),
                ..TaskChanges::default()
            },
            Self::Full(changes) => changes.clone(),
        }
    }
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        async fn tasks_managed_by(
            &self,
            manager_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;

        async fn tasks_assigned_to(
            &self,
            employee_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task(
            &self,
            manager_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn update_task(
            &self,
            task_id: i32,
            changes: &TaskChanges,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait TaskPort {
        async fn list_tasks(
            &self,
            identity: &Identity,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
        ) -> Result<Vec<Task>, domain::Error>;

        async fn get_task(
            &self,
            identity: &Identity,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
        ) -> Result<Task, domain::Error>;

        async fn create_task(
            &self,
            identity: &Identity,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl UserReader,
            task_read: &impl TaskReader,
            task_write: &impl TaskWriter,
        ) -> Result<Task, domain::Error>;

        async fn update_task(
            &self,
            identity: &Identity,
            task_id: i32,
            patch: &TaskPatch,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl UserReader,
            task_read: &impl TaskReader,
            task_write: &impl TaskWriter,
        ) -> Result<Task, domain::Error>;

        async fn delete_task(
            &self,
            identity: &Identity,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
            task_write: &impl TaskWriter,
        ) -> Result<(), domain::Error>;
    }
}

/// Fetches a task and confirms the requester is its owning manager or its assignee.
/// Shared by every operation that reads "through" a task, such as work updates and progress history.
pub(super) async fn accessible_task(
    identity: &Identity,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_read: &impl TaskReader,
) -> Result<(Task, TaskAccess), domain::Error> {
    let task = task_read
        .task_by_id(task_id, &mut *ext_cxn)
        .await
        .context("fetching a task by id")?
        .ok_or(domain::Error::DoesNotExist("task"))?;

    match task.access_for(identity) {
        Some(access) => Ok((task, access)),
        None => Err(domain::Error::forbidden(
            "user not authorized to access this task",
        )),
    }
}

/// Re-reads a task after a write so callers get the stored state back
async fn reload_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_read: &impl TaskReader,
) -> Result<Task, domain::Error> {
    let reloaded = task_read
        .task_by_id(task_id, &mut *ext_cxn)
        .await
        .context("reloading a task after writing it")?;

    reloaded.ok_or(domain::Error::DoesNotExist("task"))
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn list_tasks(
        &self,
        identity: &Identity,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, domain::Error> {
        let tasks = match identity.role {
            Role::Manager => task_read
                .tasks_managed_by(identity.id, &mut *ext_cxn)
                .await
                .context("listing a manager's tasks")?,
            Role::Employee => task_read
                .tasks_assigned_to(identity.id, &mut *ext_cxn)
                .await
                .context("listing an employee's tasks")?,
        };

        Ok(tasks)
    }

    async fn get_task(
        &self,
        identity: &Identity,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Task, domain::Error> {
        let (task, _) = accessible_task(identity, task_id, &mut *ext_cxn, task_read).await?;
        Ok(task)
    }

    async fn create_task(
        &self,
        identity: &Identity,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl UserReader,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<Task, domain::Error> {
        identity.authorize(&[Role::Manager])?;
        new_task.validate()?;
        if let Some(assignee_id) = new_task.assigned_to {
            domain::user::verify_employee(assignee_id, &mut *ext_cxn, u_read).await?;
        }

        let task_id = task_write
            .create_task(identity.id, new_task, &mut *ext_cxn)
            .await
            .context("creating a task")?;
        info!(task_id, manager_id = identity.id, "Created task");

        reload_task(task_id, &mut *ext_cxn, task_read).await
    }

    async fn update_task(
        &self,
        identity: &Identity,
        task_id: i32,
        patch: &TaskPatch,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl UserReader,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<Task, domain::Error> {
        let (_, access) = accessible_task(identity, task_id, &mut *ext_cxn, task_read).await?;
        if access == TaskAccess::Assignee && !matches!(patch, TaskPatch::StatusOnly(_)) {
            return Err(domain::Error::forbidden(
                "employees can only update status",
            ));
        }

        let changes = patch.to_changes();
        changes.validate()?;
        if let Some(Some(assignee_id)) = changes.assigned_to {
            domain::user::verify_employee(assignee_id, &mut *ext_cxn, u_read).await?;
        }

        task_write
            .update_task(task_id, &changes, &mut *ext_cxn)
            .await
            .context("updating a task")?;

        reload_task(task_id, &mut *ext_cxn, task_read).await
    }

    async fn delete_task(
        &self,
        identity: &Identity,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), domain::Error> {
        let (_, access) = accessible_task(identity, task_id, &mut *ext_cxn, task_read).await?;
        if access != TaskAccess::Owner {
            return Err(domain::Error::forbidden(
                "only the task's manager may delete it",
            ));
        }

        task_write
            .delete_task(task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;
        info!(task_id, manager_id = identity.id, "Deleted task");

        Ok(())
    }
}
