use crate::domain;
use crate::domain::UserRef;
use crate::domain::analytics::{EmployeeTaskTotal, PriorityCount, ProgressPoint, StatusCount};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::query_as;

#[derive(sqlx::FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct PriorityCountRow {
    priority: Option<String>,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct EmployeeTotalRow {
    employee_id: i32,
    employee_name: String,
    total: i64,
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    created_at: DateTime<Utc>,
    percentage_complete: i32,
}

pub struct DbAnalyticsReader;

impl domain::analytics::driven_ports::AnalyticsReader for DbAnalyticsReader {
    async fn status_counts(
        &self,
        manager_id: i32,
        assignee_id: Option<i32>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<StatusCount>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let rows = query_as::<_, StatusCountRow>(
            "SELECT t.status, count(*) AS count FROM task t \
            WHERE t.manager_id = $1 AND ($2::INTEGER IS NULL OR t.assignee_id = $2) \
            GROUP BY t.status ORDER BY t.status",
        )
        .bind(manager_id)
        .bind(assignee_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("counting tasks by status")?;

        rows.into_iter()
            .map(|row| -> Result<StatusCount, Error> {
                Ok(StatusCount {
                    status: row.status.parse()?,
                    count: row.count,
                })
            })
            .collect()
    }

    async fn priority_counts(
        &self,
        manager_id: i32,
        assignee_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<PriorityCount>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let rows = query_as::<_, PriorityCountRow>(
            "SELECT t.priority, count(*) AS count FROM task t \
            WHERE t.manager_id = $1 AND t.assignee_id = $2 \
            GROUP BY t.priority ORDER BY t.priority NULLS FIRST",
        )
        .bind(manager_id)
        .bind(assignee_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("counting tasks by priority")?;

        rows.into_iter()
            .map(|row| -> Result<PriorityCount, Error> {
                Ok(PriorityCount {
                    priority: row.priority.map(|p| p.parse()).transpose()?,
                    count: row.count,
                })
            })
            .collect()
    }

    async fn tasks_per_employee(
        &self,
        manager_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<EmployeeTaskTotal>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let rows = query_as::<_, EmployeeTotalRow>(
            "SELECT au.id AS employee_id, au.name AS employee_name, count(*) AS total \
            FROM task t JOIN app_user au ON au.id = t.assignee_id \
            WHERE t.manager_id = $1 \
            GROUP BY au.id, au.name ORDER BY au.name, au.id",
        )
        .bind(manager_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("counting tasks per employee")?;

        Ok(rows
            .into_iter()
            .map(|row| EmployeeTaskTotal {
                employee: UserRef {
                    id: row.employee_id,
                    name: row.employee_name,
                },
                total: row.total,
            })
            .collect())
    }

    async fn progress_history(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<ProgressPoint>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let rows = query_as::<_, ProgressRow>(
            "SELECT wu.created_at, wu.percentage_complete FROM work_update wu \
            WHERE wu.task_id = $1 ORDER BY wu.created_at, wu.id",
        )
        .bind(task_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("fetching task progress history")?;

        Ok(rows
            .into_iter()
            .map(|row| ProgressPoint {
                recorded_at: row.created_at,
                percentage_complete: row.percentage_complete,
            })
            .collect())
    }
}
