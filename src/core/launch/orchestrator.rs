// ─── Launch Orchestrator ───
// Sequences one launch: mod resolution, mod list files, classpath and
// natives, arguments, then the spawn.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::auth::AuthAccount;
use crate::core::config::{LaunchDirectories, LaunchSettings};
use crate::core::distro::{ModConfiguration, Server};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{mc_version_at_least, RuleContext, VersionManifest};

use super::arguments::ArgumentProcessor;
use super::classpath::ClasspathResolver;
use super::modlist::ModListWriter;
use super::mods::{detect_liteloader, resolve_mod_configuration};
use super::natives::NativesDir;
use super::options::sync_language;
use super::process::{spawn_game, LaunchHandle, SpawnRequest};

/// Everything a launch needs, as handed over by the rest of the launcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub server: Option<Server>,
    pub vanilla_manifest: Option<VersionManifest>,
    /// Mod-loader manifest. Absent for vanilla servers.
    pub mod_manifest: Option<VersionManifest>,
    pub account: Option<AuthAccount>,
    #[serde(default)]
    pub settings: LaunchSettings,
    #[serde(default)]
    pub mod_configuration: ModConfiguration,
    #[serde(default)]
    pub directories: LaunchDirectories,
    #[serde(default = "default_launcher_version")]
    pub launcher_version: String,
}

fn default_launcher_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl LaunchRequest {
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LauncherError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Held while a launch is being built or its game is running.
struct LaunchGuard(Arc<AtomicBool>);

impl LaunchGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> LauncherResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LauncherError::LaunchInProgress)?;
        Ok(Self(flag.clone()))
    }
}

impl Drop for LaunchGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Validated launch inputs for one server. Allows a single launch at a time.
pub struct LaunchOrchestrator {
    server: Server,
    vanilla: VersionManifest,
    mod_manifest: Option<VersionManifest>,
    account: AuthAccount,
    settings: LaunchSettings,
    mod_configuration: ModConfiguration,
    directories: LaunchDirectories,
    launcher_version: String,
    java: PathBuf,
    rules: RuleContext,
    in_progress: Arc<AtomicBool>,
}

impl LaunchOrchestrator {
    /// Checks that every required input is present. Nothing touches the
    /// filesystem until [`launch`](Self::launch).
    pub fn from_request(request: LaunchRequest) -> LauncherResult<Self> {
        let server = request
            .server
            .ok_or_else(|| LauncherError::Configuration("no server selected".into()))?;
        let vanilla = request
            .vanilla_manifest
            .ok_or_else(|| LauncherError::Configuration("vanilla manifest missing".into()))?;
        let account = request
            .account
            .ok_or_else(|| LauncherError::Configuration("no account selected".into()))?;
        let java = request.settings.java_executable()?.to_path_buf();
        let rules = RuleContext::current(request.settings.fullscreen);

        Ok(Self {
            server,
            vanilla,
            mod_manifest: request.mod_manifest,
            account,
            settings: request.settings,
            mod_configuration: request.mod_configuration,
            directories: request.directories,
            launcher_version: request.launcher_version,
            java,
            rules,
            in_progress: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replaces the detected platform facts. The fullscreen flag always
    /// follows the launch settings.
    pub fn with_rule_context(mut self, rules: RuleContext) -> Self {
        self.rules = RuleContext {
            fullscreen: self.settings.fullscreen,
            ..rules
        };
        self
    }

    pub fn is_launching(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Builds the command line and starts the game. Fails fast with
    /// [`LauncherError::LaunchInProgress`] while a previous launch is still
    /// building or running.
    pub async fn launch(&self) -> LauncherResult<LaunchHandle> {
        let guard = LaunchGuard::acquire(&self.in_progress)?;

        let game_dir = self.directories.game_dir(&self.server.id);
        tokio::fs::create_dir_all(&game_dir)
            .await
            .map_err(|e| LauncherError::io(&game_dir, e))?;

        let natives = NativesDir::allocate(&self.directories.temp_root)?;
        let args = match self.prepare(&game_dir, natives.path()).await {
            Ok(args) => args,
            Err(err) => {
                if let Err(cleanup) = natives.remove().await {
                    warn!("Cannot remove natives directory: {}", cleanup);
                }
                return Err(err);
            }
        };

        spawn_game(
            SpawnRequest {
                label: self.server.id.clone(),
                java: self.java.clone(),
                args,
                working_dir: game_dir,
                detached: self.settings.launch_detached,
            },
            natives,
            guard,
        )
    }

    async fn prepare(&self, game_dir: &Path, natives_dir: &Path) -> LauncherResult<Vec<String>> {
        let modules = &self.server.modules;
        let liteloader = detect_liteloader(&self.mod_configuration, modules);
        let uses_fabric = self.server.uses_fabric();
        let mods = resolve_mod_configuration(&self.mod_configuration, modules);
        info!(
            "Resolved {} Forge/Fabric mod(s) and {} LiteLoader mod(s) for {}",
            mods.forge_mods.len(),
            mods.lite_mods.len(),
            self.server.id
        );

        let modern = mc_version_at_least("1.13", &self.server.minecraft_version);
        let modstore = self.directories.modstore_dir();
        let writer = self.mod_manifest.as_ref().map(|manifest| ModListWriter {
            game_dir,
            modstore_dir: &modstore,
            loader_id: &manifest.id,
            uses_fabric,
        });

        let legacy_mod_lists = match (&writer, modern) {
            (Some(writer), false) => Some(writer.write_legacy(&mods, liteloader.active).await?),
            _ => None,
        };

        let classpath = ClasspathResolver {
            server: &self.server,
            vanilla: &self.vanilla,
            directories: &self.directories,
            rules: &self.rules,
            uses_fabric,
            liteloader: &liteloader,
            strict_natives: self.settings.strict_natives,
        }
        .resolve(&mods, natives_dir)
        .await?;
        debug!("Classpath has {} entries", classpath.entries().len());

        if modern && self.settings.sync_language {
            if let Err(e) = sync_language(game_dir, &self.settings.language).await {
                warn!("Language sync failed: {}", e);
            }
        }

        let mut args = ArgumentProcessor {
            server: &self.server,
            vanilla: &self.vanilla,
            mod_manifest: self.mod_manifest.as_ref(),
            account: &self.account,
            settings: &self.settings,
            directories: &self.directories,
            rules: &self.rules,
            game_dir,
            natives_dir,
            classpath: &classpath,
            launcher_version: &self.launcher_version,
            liteloader_active: liteloader.active,
            legacy_mod_lists: legacy_mod_lists.as_ref(),
        }
        .build()?;

        if modern {
            if let Some(writer) = &writer {
                args.extend(writer.write_modern(&mods).await?);
            }
        }

        Ok(args)
    }
}
