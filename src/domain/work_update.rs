use crate::domain;
use crate::domain::UserRef;
use crate::domain::auth::Identity;
use crate::domain::task::TaskAccess;
use crate::domain::task::driven_ports::TaskReader;
use crate::domain::user::Role;
use crate::domain::work_update::driven_ports::{WorkUpdateReader, WorkUpdateWriter};
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::Validate;

/// How hard the employee had to push to make the reported progress
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for Intensity {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(anyhow!("unknown intensity: {other}")),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct WorkUpdate {
    pub id: i32,
    pub task_id: i32,
    pub author: UserRef,
    pub update_text: String,
    pub percentage_complete: i32,
    pub intensity: Intensity,
    pub manager_remark: Option<String>,
    pub is_acknowledged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Validate, Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct NewWorkUpdate {
    #[validate(length(min = 1, max = 5000))]
    pub update_text: String,
    #[validate(range(min = 0, max = 100))]
    pub percentage_complete: i32,
    pub intensity: Intensity,
}

/// Manager feedback on a work update. An empty remark means "no remark", so one must be non-empty to be set.
#[derive(Validate, Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Remark {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

pub mod driven_ports {
    use super::*;

    pub trait WorkUpdateReader {
        /// Lists a task's updates, newest first
        async fn updates_for_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<WorkUpdate>, anyhow::Error>;

        async fn update_by_id(
            &self,
            update_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<WorkUpdate>, anyhow::Error>;
    }

    pub trait WorkUpdateWriter {
        async fn create_update(
            &self,
            task_id: i32,
            author_id: i32,
            new_update: &NewWorkUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn set_remark(
            &self,
            update_id: i32,
            remark: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Flags the update as acknowledged. Writing the flag twice is harmless.
        async fn mark_acknowledged(
            &self,
            update_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait WorkUpdatePort {
        async fn list_updates(
            &self,
            identity: &Identity,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
            wu_read: &impl WorkUpdateReader,
        ) -> Result<Vec<WorkUpdate>, domain::Error>;

        async fn add_update(
            &self,
            identity: &Identity,
            task_id: i32,
            new_update: &NewWorkUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
            wu_read: &impl WorkUpdateReader,
            wu_write: &impl WorkUpdateWriter,
        ) -> Result<WorkUpdate, domain::Error>;

        async fn add_remark(
            &self,
            identity: &Identity,
            update_id: i32,
            remark: &Remark,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl TaskReader,
            wu_read: &impl WorkUpdateReader,
            wu_write: &impl WorkUpdateWriter,
        ) -> Result<WorkUpdate, domain::Error>;

        async fn acknowledge_remark(
            &self,
            identity: &Identity,
            update_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            wu_read: &impl WorkUpdateReader,
            wu_write: &impl WorkUpdateWriter,
        ) -> Result<WorkUpdate, domain::Error>;
    }
}

async fn existing_update(
    update_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    wu_read: &impl WorkUpdateReader,
) -> Result<WorkUpdate, domain::Error> {
    let update = wu_read
        .update_by_id(update_id, &mut *ext_cxn)
        .await
        .context("fetching a work update by id")?;

    update.ok_or(domain::Error::DoesNotExist("work update"))
}

pub struct WorkUpdateService {}

impl driving_ports::WorkUpdatePort for WorkUpdateService {
    async fn list_updates(
        &self,
        identity: &Identity,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        wu_read: &impl WorkUpdateReader,
    ) -> Result<Vec<WorkUpdate>, domain::Error> {
        domain::task::accessible_task(identity, task_id, &mut *ext_cxn, task_read).await?;

        let updates = wu_read
            .updates_for_task(task_id, &mut *ext_cxn)
            .await
            .context("listing work updates for a task")?;

        Ok(updates)
    }

    async fn add_update(
        &self,
        identity: &Identity,
        task_id: i32,
        new_update: &NewWorkUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        wu_read: &impl WorkUpdateReader,
        wu_write: &impl WorkUpdateWriter,
    ) -> Result<WorkUpdate, domain::Error> {
        let (_, access) =
            domain::task::accessible_task(identity, task_id, &mut *ext_cxn, task_read).await?;
        if access != TaskAccess::Assignee {
            return Err(domain::Error::forbidden(
                "only the assigned employee can post updates on this task",
            ));
        }
        new_update.validate()?;

        let update_id = wu_write
            .create_update(task_id, identity.id, new_update, &mut *ext_cxn)
            .await
            .context("creating a work update")?;
        info!(
            update_id,
            task_id,
            percentage_complete = new_update.percentage_complete,
            "Work update posted"
        );

        existing_update(update_id, &mut *ext_cxn, wu_read).await
    }

    async fn add_remark(
        &self,
        identity: &Identity,
        update_id: i32,
        remark: &Remark,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        wu_read: &impl WorkUpdateReader,
        wu_write: &impl WorkUpdateWriter,
    ) -> Result<WorkUpdate, domain::Error> {
        identity.authorize(&[Role::Manager])?;
        let update = existing_update(update_id, &mut *ext_cxn, wu_read).await?;

        let parent_task = task_read
            .task_by_id(update.task_id, &mut *ext_cxn)
            .await
            .context("fetching the parent task of a work update")?
            .ok_or(domain::Error::DoesNotExist("task"))?;
        if parent_task.manager.id != identity.id {
            return Err(domain::Error::forbidden(
                "only the task's manager can remark on its updates",
            ));
        }
        remark.validate()?;

        wu_write
            .set_remark(update_id, &remark.text, &mut *ext_cxn)
            .await
            .context("saving a manager remark")?;
        info!(update_id, manager_id = identity.id, "Remark added to work update");

        existing_update(update_id, &mut *ext_cxn, wu_read).await
    }

    async fn acknowledge_remark(
        &self,
        identity: &Identity,
        update_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        wu_read: &impl WorkUpdateReader,
        wu_write: &impl WorkUpdateWriter,
    ) -> Result<WorkUpdate, domain::Error> {
        identity.authorize(&[Role::Employee])?;
        let update = existing_update(update_id, &mut *ext_cxn, wu_read).await?;
        if update.author.id != identity.id {
            return Err(domain::Error::forbidden(
                "only the author of an update can acknowledge its remark",
            ));
        }

        wu_write
            .mark_acknowledged(update_id, &mut *ext_cxn)
            .await
            .context("acknowledging a remark")?;

        existing_update(update_id, &mut *ext_cxn, wu_read).await
    }
}
