//! Project connection strings.

use std::fmt;
use std::str::FromStr;

use crate::error::AgentLabError;

/// `<host>;<subscription_id>;<resource_group>;<project_name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub project_name: String,
}

impl ConnectionString {
    fn workspace_path(&self) -> String {
        format!(
            "subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            self.subscription_id, self.resource_group, self.project_name
        )
    }

    /// Base URL of the project's agents API.
    pub fn agents_endpoint(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let host = host
            .strip_prefix("https://")
            .unwrap_or(host);
        format!("https://{host}/agents/v1.0/{}", self.workspace_path())
    }

    /// Base URL of the project's connections API.
    pub fn connections_endpoint(&self) -> String {
        format!("https://management.azure.com/{}", self.workspace_path())
    }
}

impl FromStr for ConnectionString {
    type Err = AgentLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(';').map(str::trim).collect();
        match parts.as_slice() {
            [host, subscription_id, resource_group, project_name]
                if parts.iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self {
                    host: host.to_string(),
                    subscription_id: subscription_id.to_string(),
                    resource_group: resource_group.to_string(),
                    project_name: project_name.to_string(),
                })
            }
            _ => Err(AgentLabError::Configuration(format!(
                "invalid project connection string: expected 4 non-empty ';'-separated parts, got {}",
                parts.len()
            ))),
        }
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}
