use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::maven::MavenArtifact;

/// Module kinds found in a distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModuleType {
    ForgeMod,
    FabricMod,
    LiteMod,
    LiteLoader,
    ForgeHosted,
    Fabric,
    Library,
    #[serde(other)]
    Other,
}

impl ModuleType {
    /// Types that take part in mod configuration.
    pub fn is_configurable_mod(self) -> bool {
        matches!(
            self,
            ModuleType::ForgeMod | ModuleType::FabricMod | ModuleType::LiteMod | ModuleType::LiteLoader
        )
    }

    /// Types whose files go on the classpath.
    pub fn is_classpath_library(self) -> bool {
        matches!(
            self,
            ModuleType::ForgeHosted | ModuleType::Fabric | ModuleType::Library
        )
    }
}

/// Whether a module is mandatory, and its default enablement if not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Required {
    #[serde(default = "default_true")]
    pub value: bool,
    #[serde(default = "default_true")]
    pub def: bool,
}

impl Default for Required {
    fn default() -> Self {
        Self {
            value: true,
            def: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A node of the distribution's module tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Maven identifier, e.g. `net.minecraftforge:forge:1.12.2-14.23.5.2854:universal@jar`.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub required: Required,
    /// Library-only: `false` keeps the file off the classpath.
    #[serde(default)]
    pub classpath: Option<bool>,
    pub local_path: PathBuf,
    #[serde(default)]
    pub sub_modules: Vec<Module>,
}

impl Module {
    pub fn maven_identifier(&self) -> &str {
        &self.id
    }

    /// `group:artifact`. Non-Maven ids are returned unchanged.
    pub fn versionless_maven_identifier(&self) -> String {
        MavenArtifact::parse(&self.id)
            .map(|artifact| artifact.versionless_id())
            .unwrap_or_else(|_| self.id.clone())
    }

    /// `group:artifact:version[:classifier]`. Non-Maven ids are returned unchanged.
    pub fn extensionless_maven_identifier(&self) -> String {
        MavenArtifact::parse(&self.id)
            .map(|artifact| artifact.extensionless_id())
            .unwrap_or_else(|_| self.id.clone())
    }

    pub fn path(&self) -> &Path {
        &self.local_path
    }

    pub fn is_optional(&self) -> bool {
        !self.required.value
    }

    pub fn on_classpath(&self) -> bool {
        self.classpath != Some(false)
    }
}

/// The server entry a launch targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub autoconnect: bool,
    pub minecraft_version: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

fn default_port() -> u16 {
    25565
}

impl Server {
    /// Any top-level Fabric loader module.
    pub fn uses_fabric(&self) -> bool {
        self.modules
            .iter()
            .any(|module| module.module_type == ModuleType::Fabric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_module_tree_with_defaults() {
        let server: Server = serde_json::from_value(serde_json::json!({
            "id": "Example-1.12.2",
            "hostname": "play.example.com",
            "minecraftVersion": "1.12.2",
            "modules": [
                {
                    "id": "net.minecraftforge:forge:1.12.2-14.23.5.2854:universal",
                    "type": "ForgeHosted",
                    "localPath": "/common/libraries/forge.jar",
                    "subModules": [
                        {
                            "id": "org.scala-lang:scala-library:2.11.1",
                            "type": "Library",
                            "classpath": false,
                            "localPath": "/common/libraries/scala.jar"
                        }
                    ]
                },
                {
                    "id": "com.example:thing:1.0",
                    "type": "File",
                    "localPath": "/instances/thing.cfg"
                }
            ]
        }))
        .unwrap();

        assert_eq!(server.port, 25565);
        assert!(!server.autoconnect);
        let forge = &server.modules[0];
        assert_eq!(forge.module_type, ModuleType::ForgeHosted);
        assert!(!forge.is_optional());
        assert!(forge.required.def);
        assert!(!forge.sub_modules[0].on_classpath());
        assert_eq!(server.modules[1].module_type, ModuleType::Other);
        assert!(!server.uses_fabric());
    }

    #[test]
    fn identifiers_are_derived_from_the_maven_id() {
        let module: Module = serde_json::from_value(serde_json::json!({
            "id": "com.mumfrey:liteloader:1.12.2-SNAPSHOT@jar",
            "type": "LiteLoader",
            "localPath": "/common/libraries/liteloader.jar"
        }))
        .unwrap();

        assert_eq!(module.maven_identifier(), "com.mumfrey:liteloader:1.12.2-SNAPSHOT@jar");
        assert_eq!(module.versionless_maven_identifier(), "com.mumfrey:liteloader");
        assert_eq!(
            module.extensionless_maven_identifier(),
            "com.mumfrey:liteloader:1.12.2-SNAPSHOT"
        );
    }
}
