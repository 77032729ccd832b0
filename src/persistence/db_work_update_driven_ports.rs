use crate::domain;
use crate::domain::UserRef;
use crate::domain::work_update::{NewWorkUpdate, WorkUpdate};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

const WORK_UPDATE_SELECT: &str = "SELECT wu.id, wu.task_id, wu.author_id, au.name AS author_name, \
    wu.update_text, wu.percentage_complete, wu.intensity, wu.manager_remark, wu.is_acknowledged, \
    wu.created_at, wu.updated_at \
    FROM work_update wu \
    JOIN app_user au ON au.id = wu.author_id";

#[derive(sqlx::FromRow)]
struct WorkUpdateRow {
    id: i32,
    task_id: i32,
    author_id: i32,
    author_name: String,
    update_text: String,
    percentage_complete: i32,
    intensity: String,
    manager_remark: String,
    is_acknowledged: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkUpdateRow> for WorkUpdate {
    type Error = anyhow::Error;

    fn try_from(value: WorkUpdateRow) -> Result<Self, Self::Error> {
        Ok(WorkUpdate {
            id: value.id,
            task_id: value.task_id,
            author: UserRef {
                id: value.author_id,
                name: value.author_name,
            },
            update_text: value.update_text,
            percentage_complete: value.percentage_complete,
            intensity: value.intensity.parse()?,
            // Stored as '' when no remark has been made
            manager_remark: Some(value.manager_remark).filter(|remark| !remark.is_empty()),
            is_acknowledged: value.is_acknowledged,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub struct DbWorkUpdateReader;

impl domain::work_update::driven_ports::WorkUpdateReader for DbWorkUpdateReader {
    async fn updates_for_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<WorkUpdate>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query_as::<_, WorkUpdateRow>(&format!(
            "{WORK_UPDATE_SELECT} WHERE wu.task_id = $1 ORDER BY wu.created_at DESC, wu.id DESC"
        ))
        .bind(task_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch the work updates for a task")?
        .into_iter()
        .map(WorkUpdate::try_from)
        .collect()
    }

    async fn update_by_id(
        &self,
        update_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<WorkUpdate>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let update_row =
            query_as::<_, WorkUpdateRow>(&format!("{WORK_UPDATE_SELECT} WHERE wu.id = $1"))
                .bind(update_id)
                .fetch_optional(cxn.borrow_connection())
                .await
                .context("trying to fetch a work update by ID")?;

        update_row.map(WorkUpdate::try_from).transpose()
    }
}

pub struct DbWorkUpdateWriter;

impl domain::work_update::driven_ports::WorkUpdateWriter for DbWorkUpdateWriter {
    async fn create_update(
        &self,
        task_id: i32,
        author_id: i32,
        new_update: &NewWorkUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_id = query_as::<_, super::NewId>(
            "INSERT INTO work_update(task_id, author_id, update_text, percentage_complete, intensity) \
            VALUES ($1, $2, $3, $4, $5) RETURNING work_update.id",
        )
        .bind(task_id)
        .bind(author_id)
        .bind(&new_update.update_text)
        .bind(new_update.percentage_complete)
        .bind(new_update.intensity.as_str())
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a work update")?;

        Ok(new_id.id)
    }

    async fn set_remark(
        &self,
        update_id: i32,
        remark: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("UPDATE work_update SET manager_remark = $1, updated_at = now() WHERE id = $2")
            .bind(remark)
            .bind(update_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to save a manager remark")?;

        Ok(())
    }

    async fn mark_acknowledged(
        &self,
        update_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("UPDATE work_update SET is_acknowledged = TRUE, updated_at = now() WHERE id = $1")
            .bind(update_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to acknowledge a remark")?;

        Ok(())
    }
}
