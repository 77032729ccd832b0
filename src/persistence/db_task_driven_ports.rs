use crate::domain;
use crate::domain::UserRef;
use crate::domain::task::{NewTask, Task, TaskChanges};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

/// Selects every column of [TaskRow], resolving the manager's and assignee's names
const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.status, t.priority, \
    t.manager_id, m.name AS manager_name, t.assignee_id, a.name AS assignee_name, \
    t.due_date, t.created_at, t.updated_at \
    FROM task t \
    JOIN app_user m ON m.id = t.manager_id \
    LEFT JOIN app_user a ON a.id = t.assignee_id";

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: Option<String>,
    status: String,
    priority: Option<String>,
    manager_id: i32,
    manager_name: String,
    assignee_id: Option<i32>,
    assignee_name: Option<String>,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(value: TaskRow) -> Result<Self, Self::Error> {
        let assignee = match (value.assignee_id, value.assignee_name) {
            (Some(id), Some(name)) => Some(UserRef { id, name }),
            _ => None,
        };

        Ok(Task {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status.parse()?,
            priority: value.priority.map(|p| p.parse()).transpose()?,
            manager: UserRef {
                id: value.manager_id,
                name: value.manager_name,
            },
            assignee,
            due_date: value.due_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub struct DbTaskReader;

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let task_row = query_as::<_, TaskRow>(&format!("{TASK_SELECT} WHERE t.id = $1"))
            .bind(task_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to fetch a task by ID")?;

        task_row.map(Task::try_from).transpose()
    }

    async fn tasks_managed_by(
        &self,
        manager_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query_as::<_, TaskRow>(&format!(
            "{TASK_SELECT} WHERE t.manager_id = $1 ORDER BY t.created_at, t.id"
        ))
        .bind(manager_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch the tasks a manager owns")?
        .into_iter()
        .map(Task::try_from)
        .collect()
    }

    async fn tasks_assigned_to(
        &self,
        employee_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query_as::<_, TaskRow>(&format!(
            "{TASK_SELECT} WHERE t.assignee_id = $1 ORDER BY t.created_at, t.id"
        ))
        .bind(employee_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch the tasks assigned to an employee")?
        .into_iter()
        .map(Task::try_from)
        .collect()
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        manager_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_id = query_as::<_, super::NewId>(
            "INSERT INTO task(title, description, status, priority, manager_id, assignee_id, due_date) \
            VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING task.id",
        )
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.status.as_str())
        .bind(new_task.priority.map(|p| p.as_str()))
        .bind(manager_id)
        .bind(new_task.assigned_to)
        .bind(new_task.due_date)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id.id)
    }

    async fn update_task(
        &self,
        task_id: i32,
        changes: &TaskChanges,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        // Each clearable column gets a "was sent" flag so an explicit null overwrites the stored value
        query(
            "UPDATE task SET \
                title = COALESCE($1, title), \
                description = CASE WHEN $2 THEN $3 ELSE description END, \
                status = COALESCE($4, status), \
                priority = CASE WHEN $5 THEN $6 ELSE priority END, \
                assignee_id = CASE WHEN $7 THEN $8 ELSE assignee_id END, \
                due_date = CASE WHEN $9 THEN $10 ELSE due_date END, \
                updated_at = now() \
            WHERE id = $11",
        )
        .bind(changes.title.clone().flatten())
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.status.flatten().map(|s| s.as_str()))
        .bind(changes.priority.is_some())
        .bind(changes.priority.flatten().map(|p| p.as_str()))
        .bind(changes.assigned_to.is_some())
        .bind(changes.assigned_to.flatten())
        .bind(changes.due_date.is_some())
        .bind(changes.due_date.flatten())
        .bind(task_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(())
    }
}
