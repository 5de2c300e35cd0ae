//! Startup configuration document served by the sync daemon

use serde::{Deserialize, Serialize};

/// `GET /rest/config` response; only the repository list is used
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteConfiguration {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepositoryConfiguration {
    #[serde(rename = "ID")]
    pub id: String,
    pub directory: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub rescan_interval_s: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_configuration() {
        let json = r#"{
            "Version": 2,
            "Repositories": [
                {"ID": "default", "Directory": "~/Sync", "ReadOnly": false, "RescanIntervalS": 60},
                {"ID": "photos", "Directory": "/srv/photos", "ReadOnly": true, "RescanIntervalS": 3600}
            ],
            "GUI": {"Enabled": true}
        }"#;
        let config: RemoteConfiguration = serde_json::from_str(json).unwrap();

        assert_eq!(config.version, 2);
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[0].id, "default");
        assert_eq!(config.repositories[0].directory, "~/Sync");
        assert!(config.repositories[1].read_only);
        assert_eq!(config.repositories[1].rescan_interval_s, 3600);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"Repositories": [{"ID": "docs", "Directory": "/srv/docs"}]}"#;
        let config: RemoteConfiguration = serde_json::from_str(json).unwrap();

        assert_eq!(config.version, 0);
        assert!(!config.repositories[0].read_only);
        assert_eq!(config.repositories[0].rescan_interval_s, 0);
    }

    #[test]
    fn test_missing_directory_rejected() {
        let json = r#"{"Repositories": [{"ID": "docs"}]}"#;
        assert!(serde_json::from_str::<RemoteConfiguration>(json).is_err());
    }
}
