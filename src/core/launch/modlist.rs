// ─── Mod List Files ───
// Side files that tell the mod loader which mods to load, and the game
// arguments that point at them.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::distro::Module;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::compare::{loader_build_segment, manifest_minor_version, parse_build_number};

use super::mods::ResolvedMods;

pub const FORGE_LEGACY_LIST: &str = "forgeModList.json";
pub const LITELOADER_LIST: &str = "liteloaderModList.json";
pub const MODERN_LIST: &str = "forgeMods.list";

/// First Forge 1.12.2 build that expects an `absolute:` repository root.
const ABSOLUTE_ROOT_THRESHOLD: [u32; 4] = [14, 23, 3, 2655];

/// Whether the legacy Forge mod list needs an `absolute:` repository root.
///
/// Loaders for Minecraft 1.9 and older never do. Otherwise the loader build
/// in the manifest id is compared against 14.23.3.2655; ids that cannot be
/// parsed are assumed to be newer.
pub fn requires_absolute(mod_manifest_id: &str) -> bool {
    if lte_minor_version(mod_manifest_id, 9) {
        return false;
    }

    let Some(build) = loader_build_segment(mod_manifest_id).and_then(parse_build_number::<4>) else {
        return true;
    };
    build > ABSOLUTE_ROOT_THRESHOLD
}

/// `true` when the Minecraft version prefixing the manifest id has a minor
/// version of at most `max`.
pub fn lte_minor_version(mod_manifest_id: &str, max: u32) -> bool {
    manifest_minor_version(mod_manifest_id).is_some_and(|minor| minor <= max)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LegacyModList {
    repository_root: String,
    mod_ref: Vec<String>,
}

/// Legacy mod list files written for one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyModLists {
    pub forge_list: PathBuf,
    pub liteloader_list: Option<PathBuf>,
    /// Loaders for 1.9 and older resolve the list relative to the game dir.
    pub relative_reference: bool,
}

impl LegacyModLists {
    /// `--modListFile <ref>`, followed by `--modRepo <path>` with LiteLoader.
    pub fn game_arguments(&self) -> Vec<String> {
        let reference = if self.relative_reference {
            FORGE_LEGACY_LIST.to_string()
        } else {
            format!("absolute:{}", self.forge_list.to_string_lossy())
        };

        let mut args = vec!["--modListFile".to_string(), reference];
        if let Some(liteloader_list) = &self.liteloader_list {
            args.push("--modRepo".into());
            args.push(liteloader_list.to_string_lossy().into_owned());
        }
        args
    }
}

pub struct ModListWriter<'a> {
    pub game_dir: &'a Path,
    pub modstore_dir: &'a Path,
    /// Id of the mod-loader manifest, e.g. `1.12.2-forge-14.23.5.2854`.
    pub loader_id: &'a str,
    pub uses_fabric: bool,
}

impl<'a> ModListWriter<'a> {
    /// Writes `forgeModList.json`, plus `liteloaderModList.json` when
    /// LiteLoader is active.
    pub async fn write_legacy(
        &self,
        mods: &ResolvedMods<'_>,
        liteloader_active: bool,
    ) -> LauncherResult<LegacyModLists> {
        let forge_root = if requires_absolute(self.loader_id) {
            format!("absolute:{}", self.modstore_dir.to_string_lossy())
        } else {
            self.modstore_dir.to_string_lossy().into_owned()
        };
        let forge_list = self.game_dir.join(FORGE_LEGACY_LIST);
        let forge_refs = mods
            .forge_mods
            .iter()
            .map(|module| module.extensionless_maven_identifier())
            .collect();
        write_json_list(&forge_list, forge_root, forge_refs).await?;

        let liteloader_list = if liteloader_active {
            let path = self.game_dir.join(LITELOADER_LIST);
            let lite_refs = mods
                .lite_mods
                .iter()
                .map(|module| module.maven_identifier().to_string())
                .collect();
            write_json_list(&path, self.modstore_dir.to_string_lossy().into_owned(), lite_refs).await?;
            Some(path)
        } else {
            None
        };

        Ok(LegacyModLists {
            forge_list,
            liteloader_list,
            relative_reference: lte_minor_version(self.loader_id, 9),
        })
    }

    /// Writes the Forge/Fabric mods to `forgeMods.list` and returns the
    /// loader flags that reference it. LiteLoader mods are left out. Nothing
    /// is written when no such mods are enabled.
    pub async fn write_modern(&self, mods: &ResolvedMods<'_>) -> LauncherResult<Vec<String>> {
        let lines: Vec<String> = mods
            .forge_mods
            .iter()
            .map(|module| self.modern_entry(module))
            .collect();
        if lines.is_empty() {
            debug!("No enabled mods, skipping {}", MODERN_LIST);
            return Ok(Vec::new());
        }

        let list = self.game_dir.join(MODERN_LIST);
        tokio::fs::write(&list, lines.join("\n"))
            .await
            .map_err(|e| LauncherError::io(&list, e))?;
        info!("Wrote {} mod(s) to {:?}", lines.len(), list);

        let list = list.to_string_lossy().into_owned();
        if self.uses_fabric {
            Ok(vec!["--fabric.addMods".into(), format!("@{}", list)])
        } else {
            Ok(vec![
                "--fml.mavenRoots".into(),
                self.modstore_dir.to_string_lossy().into_owned(),
                "--fml.modLists".into(),
                list,
            ])
        }
    }

    /// Fabric loads files by path, Forge resolves coordinates against the
    /// mod store.
    fn modern_entry(&self, module: &Module) -> String {
        if self.uses_fabric {
            module.path().to_string_lossy().into_owned()
        } else {
            module.extensionless_maven_identifier()
        }
    }
}

async fn write_json_list(path: &Path, repository_root: String, mod_ref: Vec<String>) -> LauncherResult<()> {
    let list = LegacyModList {
        repository_root,
        mod_ref,
    };

    let mut payload = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut payload, formatter);
    list.serialize(&mut serializer)?;

    tokio::fs::write(path, payload)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    info!("Wrote {} mod(s) to {:?}", list.mod_ref.len(), path);
    Ok(())
}
