// ─── Argument Processor ───
// Builds the JVM command line for both launch-argument dialects: the legacy
// `minecraftArguments` template (pre-1.13) and the modern rule-based lists.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, error, warn};

use crate::core::auth::AuthAccount;
use crate::core::config::{LaunchDirectories, LaunchSettings};
use crate::core::distro::Server;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::compare::{compare_versions, loader_build_segment};
use crate::core::version::rules::gates_custom_resolution;
use crate::core::version::{mc_version_at_least, Argument, RuleContext, VersionManifest};

use super::classpath::{get_classpath_separator, Classpath};
use super::modlist::LegacyModLists;

pub const LAUNCHER_NAME: &str = "ModLaunch";
pub const LITELOADER_TWEAKER: &str = "com.mumfrey.liteloader.launch.LiteLoaderTweaker";

/// First Forge 1.15.2 build whose autoconnect does not overflow the GL stack.
const FIRST_WORKING_AUTOCONNECT: &str = "31.2.15";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Forge 31.x builds before 31.2.15 crash when started with `--server`.
pub fn is_autoconnect_broken(loader_build: &str) -> bool {
    let major = loader_build.split('.').next().and_then(|m| m.parse::<u32>().ok());
    major == Some(31) && compare_versions(loader_build, FIRST_WORKING_AUTOCONNECT) == Ordering::Less
}

/// Everything the command line is assembled from.
pub struct ArgumentProcessor<'a> {
    pub server: &'a Server,
    pub vanilla: &'a VersionManifest,
    pub mod_manifest: Option<&'a VersionManifest>,
    pub account: &'a AuthAccount,
    pub settings: &'a LaunchSettings,
    pub directories: &'a LaunchDirectories,
    pub rules: &'a RuleContext,
    pub game_dir: &'a Path,
    pub natives_dir: &'a Path,
    pub classpath: &'a Classpath,
    pub launcher_version: &'a str,
    pub liteloader_active: bool,
    /// Present for legacy launches that wrote mod list files.
    pub legacy_mod_lists: Option<&'a LegacyModLists>,
}

impl<'a> ArgumentProcessor<'a> {
    /// Full argument list passed to the Java executable.
    pub fn build(&self) -> LauncherResult<Vec<String>> {
        if mc_version_at_least("1.13", &self.server.minecraft_version) {
            self.build_modern()
        } else {
            self.build_legacy()
        }
    }

    fn main_class(&self) -> LauncherResult<&'a str> {
        self.mod_manifest
            .and_then(|manifest| manifest.main_class.as_deref())
            .or(self.vanilla.main_class.as_deref())
            .ok_or_else(|| LauncherError::Manifest("no main class declared".into()))
    }

    // ─── Legacy (< 1.13) ───

    fn build_legacy(&self) -> LauncherResult<Vec<String>> {
        let template = self
            .mod_manifest
            .and_then(|manifest| manifest.minecraft_arguments.as_deref())
            .or(self.vanilla.minecraft_arguments.as_deref())
            .ok_or_else(|| LauncherError::Manifest("legacy version without minecraftArguments".into()))?;

        let mut args = vec!["-cp".to_string(), self.classpath.joined()];
        args.extend(self.dock_args());
        args.extend(self.memory_args());
        args.push(format!("-Djava.library.path={}", self.natives_dir.to_string_lossy()));
        args.push(self.main_class()?.to_string());

        let mut game: Vec<String> = template
            .split(' ')
            .filter(|token| !token.is_empty())
            .filter_map(|token| self.substitute(token))
            .collect();
        game.extend(self.autoconnect_args());
        let resolution = self.resolution_args(&game);
        game.extend(resolution);

        if let Some(lists) = self.legacy_mod_lists {
            game.extend(lists.game_arguments());
        }
        if self.liteloader_active {
            game.insert(0, LITELOADER_TWEAKER.to_string());
            game.insert(0, "--tweakClass".to_string());
        }

        args.extend(game);
        Ok(args)
    }

    // ─── Modern (1.13+) ───

    fn build_modern(&self) -> LauncherResult<Vec<String>> {
        let vanilla_args = self
            .vanilla
            .arguments
            .as_ref()
            .ok_or_else(|| LauncherError::Manifest(format!("{} has no arguments block", self.vanilla.id)))?;
        let mod_args = self.mod_manifest.and_then(|manifest| {
            manifest.arguments.as_ref().map(|arguments| (manifest.id.as_str(), arguments))
        });

        let mut jvm = self.process_arguments(&vanilla_args.jvm);
        if let Some((mod_id, arguments)) = mod_args {
            let lib_path = self.directories.lib_path();
            let lib_path = lib_path.to_string_lossy();
            let pre_substituted: Vec<Argument> = arguments
                .jvm
                .iter()
                .map(|argument| match argument {
                    Argument::Plain(token) => Argument::Plain(
                        token
                            .replace("${library_directory}", &lib_path)
                            .replace("${classpath_separator}", get_classpath_separator())
                            .replace("${version_name}", mod_id),
                    ),
                    other => other.clone(),
                })
                .collect();
            jvm.extend(self.process_arguments(&pre_substituted));
        }
        jvm.extend(self.dock_args());
        jvm.extend(self.memory_args());
        jvm.push(self.main_class()?.to_string());

        let mut game = self.process_arguments(&vanilla_args.game);
        if self.modern_autoconnect_broken() {
            error!(
                "Server autoconnect disabled on Forge builds earlier than {} (OpenGL stack overflow)",
                FIRST_WORKING_AUTOCONNECT
            );
        } else {
            game.extend(self.autoconnect_args());
        }
        if let Some((_, arguments)) = mod_args {
            game.extend(self.process_arguments(&arguments.game));
        }
        let resolution = self.resolution_args(&game);
        game.extend(resolution);

        jvm.extend(game);
        Ok(jvm)
    }

    fn modern_autoconnect_broken(&self) -> bool {
        if self.server.uses_fabric() {
            return false;
        }
        self.mod_manifest
            .and_then(|manifest| loader_build_segment(&manifest.id))
            .is_some_and(is_autoconnect_broken)
    }

    /// Evaluates rules and substitutes placeholders. Arguments whose rules
    /// fail, or that reference an unknown placeholder, are left out.
    fn process_arguments(&self, arguments: &[Argument]) -> Vec<String> {
        let mut tokens = Vec::new();
        for argument in arguments {
            match argument {
                Argument::Plain(token) => tokens.push(token.clone()),
                Argument::Conditional(conditional) => {
                    if !self.rules.argument_included(&conditional.rules) {
                        continue;
                    }
                    if gates_custom_resolution(&conditional.rules) {
                        tokens.extend(["--fullscreen".to_string(), "true".to_string()]);
                    } else {
                        tokens.extend(conditional.value.clone().into_tokens());
                    }
                }
            }
        }

        tokens.iter().filter_map(|token| self.substitute(token)).collect()
    }

    // ─── Shared pieces ───

    /// Resolves every `${...}` in `token`. `None` means the token must be
    /// dropped because it references an unknown placeholder.
    pub fn substitute(&self, token: &str) -> Option<String> {
        let mut unknown: Option<String> = None;
        let resolved = PLACEHOLDER.replace_all(token, |caps: &Captures| {
            match self.placeholder_value(&caps[1]) {
                Some(value) => value,
                None => {
                    unknown.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });

        if let Some(name) = unknown {
            warn!("Dropping argument {:?}: unknown placeholder ${{{}}}", token, name);
            return None;
        }
        Some(resolved.into_owned())
    }

    fn placeholder_value(&self, name: &str) -> Option<String> {
        let (width, height) = self.settings.resolution();
        let value = match name {
            "auth_player_name" => self.account.player_name().to_string(),
            "version_name" => self.server.id.clone(),
            "game_directory" => self.game_dir.to_string_lossy().into_owned(),
            "assets_root" => self.directories.assets_dir().to_string_lossy().into_owned(),
            "assets_index_name" => self.vanilla.assets.clone().unwrap_or_else(|| "legacy".into()),
            "auth_uuid" => self.account.trimmed_uuid().to_string(),
            "auth_access_token" => self.account.access_token.clone(),
            "user_type" => self.account.user_type().to_string(),
            "user_properties" => "{}".to_string(),
            "version_type" => self.vanilla.version_type.clone().unwrap_or_else(|| "release".into()),
            "resolution_width" => width.to_string(),
            "resolution_height" => height.to_string(),
            "natives_directory" => self.natives_dir.to_string_lossy().into_owned(),
            "launcher_name" => LAUNCHER_NAME.to_string(),
            "launcher_version" => self.launcher_version.to_string(),
            "classpath" => self.classpath.joined(),
            "library_directory" => self.directories.lib_path().to_string_lossy().into_owned(),
            "classpath_separator" => get_classpath_separator().to_string(),
            "clientid" | "auth_xuid" => String::new(),
            _ => return None,
        };
        Some(value)
    }

    fn memory_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-Xmx{}", self.settings.max_ram),
            format!("-Xms{}", self.settings.min_ram),
        ];
        args.extend(self.settings.jvm_options.iter().cloned());
        args
    }

    fn dock_args(&self) -> Vec<String> {
        if self.rules.os_name != "osx" {
            return Vec::new();
        }
        let mut args = vec![format!("-Xdock:name={}", LAUNCHER_NAME)];
        if let Some(icon) = &self.settings.dock_icon {
            args.push(format!("-Xdock:icon={}", icon.to_string_lossy()));
        }
        args
    }

    fn autoconnect_args(&self) -> Vec<String> {
        if !(self.settings.auto_connect && self.server.autoconnect) {
            return Vec::new();
        }

        debug!("Autoconnecting to {}:{}", self.server.hostname, self.server.port);
        if mc_version_at_least("1.20", &self.server.minecraft_version) {
            vec![
                "--quickPlayMultiplayer".into(),
                format!("{}:{}", self.server.hostname, self.server.port),
            ]
        } else {
            vec![
                "--server".into(),
                self.server.hostname.clone(),
                "--port".into(),
                self.server.port.to_string(),
            ]
        }
    }

    fn resolution_args(&self, existing: &[String]) -> Vec<String> {
        if self.settings.fullscreen {
            if existing.iter().any(|arg| arg == "--fullscreen") {
                return Vec::new();
            }
            return vec!["--fullscreen".into(), "true".into()];
        }

        let (width, height) = self.settings.resolution();
        vec![
            "--width".into(),
            width.to_string(),
            "--height".into(),
            height.to_string(),
        ]
    }
}
