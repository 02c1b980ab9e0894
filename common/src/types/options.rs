use serde::{Deserialize, Serialize};

use super::{
    ValidationError,
    project::{DeploymentId, DeploymentIds},
    time::{Millis, TimeRange},
};

/// The user's choice of what to download: a time range and the deployments
/// whose logs to include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOptions {
    pub range: TimeRange,
    pub deployment_ids: DeploymentIds,
}

impl DownloadOptions {
    pub fn new(range: TimeRange, deployment_ids: DeploymentIds) -> Self {
        Self {
            range,
            deployment_ids,
        }
    }

    /// Validates raw option fields before anything is dispatched.
    pub fn from_parts(
        start: Option<Millis>,
        end: Option<Millis>,
        deployment_ids: impl IntoIterator<Item = DeploymentId>,
    ) -> Result<Self, ValidationError> {
        let start = start.ok_or_else(|| ValidationError::from("Please input start time"))?;
        let end = end.ok_or_else(|| ValidationError::from("Please input end time"))?;
        let range = TimeRange::new(start, end)?;
        let deployment_ids = DeploymentIds::new(deployment_ids)
            .map_err(|_| ValidationError::from("Please fill deployments"))?;
        Ok(Self::new(range, deployment_ids))
    }

    /// Name every downloaded archive is saved under.
    pub fn default_filename(&self) -> String {
        format!("{}.tar", self.range.start())
    }
}
