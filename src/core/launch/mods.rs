// ─── Mod Resolution ───
// Partitions the distribution's module tree into the enabled Forge/Fabric and
// LiteLoader mod sets, and detects an active LiteLoader.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::distro::{ModConfiguration, Module, ModuleType};

/// Enabled mods, in the order they should be listed.
#[derive(Debug, Default)]
pub struct ResolvedMods<'a> {
    /// Forge and Fabric mods.
    pub forge_mods: Vec<&'a Module>,
    pub lite_mods: Vec<&'a Module>,
}

impl<'a> ResolvedMods<'a> {
    fn absorb(&mut self, other: ResolvedMods<'a>) {
        self.forge_mods.extend(other.forge_mods);
        self.lite_mods.extend(other.lite_mods);
    }

    /// Forge/Fabric mods followed by LiteLoader mods.
    pub fn all(&self) -> impl Iterator<Item = &'a Module> + '_ {
        self.forge_mods.iter().chain(self.lite_mods.iter()).copied()
    }
}

/// Walks `modules` and collects every mod that is mandatory or enabled.
///
/// Submodule results are merged before the parent itself is appended. A
/// LiteLoader module is never listed but its children are still visited.
pub fn resolve_mod_configuration<'a>(
    config: &ModConfiguration,
    modules: &'a [Module],
) -> ResolvedMods<'a> {
    let empty = ModConfiguration::default();
    let mut resolved = ResolvedMods::default();

    for module in modules {
        if !module.module_type.is_configurable_mod() {
            continue;
        }

        if module.is_optional() && !config.is_enabled(module) {
            debug!("Mod disabled by configuration: {}", module.id);
            continue;
        }

        if !module.sub_modules.is_empty() {
            let nested = config.nested_for(module).unwrap_or(&empty);
            resolved.absorb(resolve_mod_configuration(nested, &module.sub_modules));
        }

        match module.module_type {
            ModuleType::ForgeMod | ModuleType::FabricMod => resolved.forge_mods.push(module),
            ModuleType::LiteMod => resolved.lite_mods.push(module),
            _ => {}
        }
    }

    resolved
}

/// Outcome of LiteLoader detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiteLoaderState {
    pub active: bool,
    pub path: Option<PathBuf>,
}

/// Scans the top-level modules for a LiteLoader whose file exists and which
/// is either mandatory or enabled.
pub fn detect_liteloader(config: &ModConfiguration, modules: &[Module]) -> LiteLoaderState {
    let mut state = LiteLoaderState::default();

    for module in modules
        .iter()
        .filter(|module| module.module_type == ModuleType::LiteLoader)
    {
        let wanted = !module.is_optional() || config.is_enabled(module);
        if wanted && module.path().exists() {
            info!("LiteLoader active: {:?}", module.path());
            state = LiteLoaderState {
                active: true,
                path: Some(module.local_path.clone()),
            };
        }
    }

    state
}
