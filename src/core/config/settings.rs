use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::core::error::{LauncherError, LauncherResult};

pub const MIN_GAME_WIDTH: u32 = 800;
pub const MIN_GAME_HEIGHT: u32 = 600;

const GIB: u64 = 1024 * 1024 * 1024;

/// User-facing launch configuration, resolved for one server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchSettings {
    pub java_executable: Option<PathBuf>,
    pub min_ram: String,
    pub max_ram: String,
    pub jvm_options: Vec<String>,
    pub game_width: u32,
    pub game_height: u32,
    pub fullscreen: bool,
    pub auto_connect: bool,
    pub launch_detached: bool,
    pub sync_language: bool,
    /// UI language, e.g. `en_US`.
    pub language: String,
    /// Treat missing or corrupt native archives as fatal.
    pub strict_natives: bool,
    /// macOS dock icon passed with `-Xdock:icon`.
    pub dock_icon: Option<PathBuf>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        let ram = default_ram();
        Self {
            java_executable: None,
            min_ram: ram.clone(),
            max_ram: ram,
            jvm_options: vec!["-Xmn128M".into()],
            game_width: 1280,
            game_height: 720,
            fullscreen: false,
            auto_connect: true,
            launch_detached: true,
            sync_language: false,
            language: "en_US".into(),
            strict_natives: false,
            dock_icon: None,
        }
    }
}

impl LaunchSettings {
    /// The configured Java executable; launching without one is a
    /// configuration error.
    pub fn java_executable(&self) -> LauncherResult<&Path> {
        match self.java_executable.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(LauncherError::Configuration(
                "no Java executable configured".into(),
            )),
        }
    }

    /// Window size, clamped to at least 800×600.
    pub fn resolution(&self) -> (u32, u32) {
        (
            self.game_width.max(MIN_GAME_WIDTH),
            self.game_height.max(MIN_GAME_HEIGHT),
        )
    }
}

/// Default heap size scaled to the machine's memory.
fn default_ram() -> String {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();

    if total >= 8 * GIB {
        "4G".into()
    } else if total >= 6 * GIB {
        "3G".into()
    } else {
        "2G".into()
    }
}
