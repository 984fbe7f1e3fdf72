// ─── Classpath Builder ───
// Constructs the classpath for launching Minecraft and collects the native
// archives that have to be unpacked alongside it.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::config::LaunchDirectories;
use crate::core::distro::{Module, ModuleType, Server};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{mc_version_at_least, RuleContext, VersionManifest};

use super::mods::{LiteLoaderState, ResolvedMods};
use super::natives::{extract_natives, NativeJob};

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Final, ordered classpath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<String>,
}

impl Classpath {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entries joined with the platform separator, as passed to `-cp`.
    pub fn joined(&self) -> String {
        self.entries.join(get_classpath_separator())
    }
}

/// Classpath entries plus the native archives discovered while building them.
#[derive(Debug, Default)]
pub struct ClasspathPlan {
    pub classpath: Classpath,
    pub native_jobs: Vec<NativeJob>,
}

/// Library entries keyed by version-independent id. Re-inserting a key
/// replaces the path but keeps the original position.
#[derive(Debug, Default)]
struct LibraryMap(IndexMap<String, PathBuf>);

impl LibraryMap {
    fn register(&mut self, key: String, path: PathBuf) {
        if let Some(previous) = self.0.insert(key.clone(), path) {
            debug!("Classpath override for {} (was {:?})", key, previous);
        }
    }

    fn into_paths(self) -> impl Iterator<Item = PathBuf> {
        self.0.into_values()
    }
}

pub struct ClasspathResolver<'a> {
    pub server: &'a Server,
    pub vanilla: &'a VersionManifest,
    pub directories: &'a LaunchDirectories,
    pub rules: &'a RuleContext,
    pub uses_fabric: bool,
    pub liteloader: &'a LiteLoaderState,
    /// Fail instead of skipping when a native archive cannot be located.
    pub strict_natives: bool,
}

impl<'a> ClasspathResolver<'a> {
    /// Builds the classpath and unpacks natives into `natives_dir`. All
    /// extraction finishes before this returns.
    pub async fn resolve(&self, mods: &ResolvedMods<'_>, natives_dir: &Path) -> LauncherResult<Classpath> {
        let plan = self.plan(mods)?;
        extract_natives(plan.native_jobs, natives_dir, self.strict_natives).await?;
        Ok(plan.classpath)
    }

    /// Computes the classpath without touching the filesystem.
    pub fn plan(&self, mods: &ResolvedMods<'_>) -> LauncherResult<ClasspathPlan> {
        let mut entries: Vec<PathBuf> = Vec::new();

        // The version jar must stay off the classpath for Forge 1.17+.
        if !mc_version_at_least("1.17", &self.server.minecraft_version) || self.uses_fabric {
            entries.push(self.directories.version_jar(&self.vanilla.id));
        }

        if self.liteloader.active {
            if let Some(path) = &self.liteloader.path {
                entries.push(path.clone());
            }
        }

        let mut libraries = LibraryMap::default();
        let native_jobs = self.resolve_mojang_libraries(&mut libraries)?;
        self.resolve_server_libraries(&mut libraries, mods);
        entries.extend(libraries.into_paths());

        let entries = entries
            .iter()
            .map(|path| truncate_after_jar(&path.to_string_lossy()).to_string())
            .collect();

        Ok(ClasspathPlan {
            classpath: Classpath { entries },
            native_jobs,
        })
    }

    fn resolve_mojang_libraries(&self, libraries: &mut LibraryMap) -> LauncherResult<Vec<NativeJob>> {
        let lib_path = self.directories.lib_path();
        let mut jobs = Vec::new();

        for lib in &self.vanilla.libraries {
            if !self.rules.library_allowed(lib) {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }

            // Pre-1.19 layout: natives live in an OS classifier.
            if lib.natives.is_some() {
                let Some(classifier) = self.rules.legacy_native_classifier(lib) else {
                    continue;
                };
                match lib.classifier_path(&lib_path, &classifier) {
                    Ok(archive) => jobs.push(NativeJob {
                        library: lib.name.clone(),
                        archive,
                        excludes: lib.extract_excludes().to_vec(),
                    }),
                    Err(err) if self.strict_natives => {
                        return Err(LauncherError::NativeExtraction {
                            library: lib.name.clone(),
                            reason: err.to_string(),
                        });
                    }
                    Err(err) => warn!("Skipping natives for {}: {}", lib.name, err),
                }
                continue;
            }

            // 1.19+ layout: natives are their own coordinates.
            if let Some(matches_arch) = self.rules.modern_native_matches(&lib.name) {
                if matches_arch {
                    jobs.push(NativeJob {
                        library: lib.name.clone(),
                        archive: lib.artifact_path(&lib_path)?,
                        excludes: lib.extract_excludes().to_vec(),
                    });
                }
                continue;
            }

            libraries.register(
                lib.version_independent_id().to_string(),
                lib.artifact_path(&lib_path)?,
            );
        }

        Ok(jobs)
    }

    /// Server-declared loaders and libraries override Mojang's entries with
    /// the same key, e.g. 1.7.10 Forge replacing Mojang's guava.
    fn resolve_server_libraries(&self, libraries: &mut LibraryMap, mods: &ResolvedMods<'_>) {
        for module in &self.server.modules {
            if !module.module_type.is_classpath_library() {
                continue;
            }
            libraries.register(module.versionless_maven_identifier(), module.local_path.clone());
            register_library_submodules(libraries, module);
        }

        for module in mods.all() {
            register_library_submodules(libraries, module);
        }
    }
}

fn register_library_submodules(libraries: &mut LibraryMap, module: &Module) {
    for sub in &module.sub_modules {
        if sub.module_type == ModuleType::Library && sub.on_classpath() {
            libraries.register(sub.versionless_maven_identifier(), sub.local_path.clone());
        }
        register_library_submodules(libraries, sub);
    }
}

/// Cuts anything after the first `.jar`.
fn truncate_after_jar(entry: &str) -> &str {
    match entry.find(".jar") {
        Some(idx) => &entry[..idx + ".jar".len()],
        None => entry,
    }
}
