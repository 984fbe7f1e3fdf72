use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "ModLaunch";

/// Filesystem roots a launch works against.
///
/// Layout under the data directory:
/// - `common/`    : libraries, assets, versions and the mod store
/// - `instances/` : one game directory per server id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchDirectories {
    #[serde(default = "default_common_dir")]
    pub common_dir: PathBuf,
    #[serde(default = "default_instances_dir")]
    pub instances_dir: PathBuf,
    /// Root under which per-launch native directories are allocated.
    #[serde(default = "std::env::temp_dir")]
    pub temp_root: PathBuf,
}

impl Default for LaunchDirectories {
    fn default() -> Self {
        Self {
            common_dir: default_common_dir(),
            instances_dir: default_instances_dir(),
            temp_root: std::env::temp_dir(),
        }
    }
}

impl LaunchDirectories {
    /// Working directory of the game for the given server.
    pub fn game_dir(&self, server_id: &str) -> PathBuf {
        self.instances_dir.join(server_id)
    }

    pub fn lib_path(&self) -> PathBuf {
        self.common_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.common_dir.join("assets")
    }

    pub fn modstore_dir(&self) -> PathBuf {
        self.common_dir.join("modstore")
    }

    /// `versions/<id>/<id>.jar` for a vanilla version id.
    pub fn version_jar(&self, version_id: &str) -> PathBuf {
        self.common_dir
            .join("versions")
            .join(version_id)
            .join(format!("{}.jar", version_id))
    }
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_common_dir() -> PathBuf {
    data_root().join("common")
}

fn default_instances_dir() -> PathBuf {
    data_root().join("instances")
}
