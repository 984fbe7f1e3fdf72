// ─── Version Manifest ───
// Vanilla and mod-loader version JSON, as consumed by the launch core.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;

/// A parsed version JSON. The vanilla manifest and the mod-loader manifest
/// share this shape; the loader one usually only carries the fields it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub id: String,
    #[serde(default)]
    pub main_class: Option<String>,
    /// Modern (1.13+) argument lists.
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy space-delimited argument template (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    /// Asset index id.
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// One entry of a modern argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional(RuleBasedArgument),
}

/// An argument that is only emitted when every one of its rules passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedArgument {
    #[serde(default)]
    pub rules: Vec<Rule>,
    pub value: ArgumentValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl ArgumentValue {
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            ArgumentValue::Single(value) => vec![value],
            ArgumentValue::Many(values) => values,
        }
    }
}

// ─── Rules ───

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    #[serde(default)]
    pub features: Option<HashMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    /// Regular expression matched against the OS release string.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

// ─── Libraries ───

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// Legacy OS name → classifier key map (pre-1.19).
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, LibraryArtifact>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArtifact {
    pub path: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl LibraryEntry {
    /// The library name with its last `:` segment removed. Entries sharing
    /// this key replace each other on the classpath.
    pub fn version_independent_id(&self) -> &str {
        match self.name.rfind(':') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// Absolute path of the main artifact under `lib_path`. Falls back to
    /// the Maven layout of `name` when the entry declares no artifact.
    pub fn artifact_path(&self, lib_path: &Path) -> LauncherResult<PathBuf> {
        if let Some(artifact) = self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            return Ok(lib_path.join(&artifact.path));
        }
        let artifact = MavenArtifact::parse(&self.name)?;
        Ok(lib_path.join(artifact.local_path()))
    }

    /// Absolute path of the legacy native archive for `classifier_key`.
    pub fn classifier_path(&self, lib_path: &Path, classifier_key: &str) -> LauncherResult<PathBuf> {
        self.downloads
            .as_ref()
            .and_then(|d| d.classifiers.as_ref())
            .and_then(|classifiers| classifiers.get(classifier_key))
            .map(|artifact| lib_path.join(&artifact.path))
            .ok_or_else(|| {
                LauncherError::Manifest(format!(
                    "library {} declares no classifier '{}'",
                    self.name, classifier_key
                ))
            })
    }

    /// The library's own extraction denylist.
    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|extract| extract.exclude.as_slice())
            .unwrap_or_default()
    }
}
