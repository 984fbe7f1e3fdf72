use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::{Module, Required};

/// Per-server user overrides for optional modules, keyed by module id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModConfiguration(pub HashMap<String, ModSetting>);

/// Either a plain toggle or a toggle with overrides for submodules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModSetting {
    Toggle(bool),
    Nested {
        #[serde(default)]
        value: Option<bool>,
        #[serde(default)]
        mods: ModConfiguration,
    },
}

impl ModSetting {
    /// A nested setting without an explicit value counts as enabled.
    pub fn enabled(&self) -> bool {
        match self {
            ModSetting::Toggle(value) => *value,
            ModSetting::Nested { value, .. } => value.unwrap_or(true),
        }
    }

    pub fn sub_configuration(&self) -> Option<&ModConfiguration> {
        match self {
            ModSetting::Toggle(_) => None,
            ModSetting::Nested { mods, .. } => Some(mods),
        }
    }
}

impl ModConfiguration {
    pub fn insert(&mut self, id: impl Into<String>, setting: ModSetting) {
        self.0.insert(id.into(), setting);
    }

    /// Looks the module up by its full id first, then by its versionless id.
    pub fn lookup(&self, module: &Module) -> Option<&ModSetting> {
        self.0
            .get(module.maven_identifier())
            .or_else(|| self.0.get(&module.versionless_maven_identifier()))
    }

    /// Whether `module` is enabled: an override wins, otherwise the
    /// module's declared default.
    pub fn is_enabled(&self, module: &Module) -> bool {
        resolve_enabled(self.lookup(module), &module.required)
    }

    /// Overrides for the module's submodules, if the user configured any.
    pub fn nested_for(&self, module: &Module) -> Option<&ModConfiguration> {
        self.lookup(module).and_then(ModSetting::sub_configuration)
    }
}

fn resolve_enabled(setting: Option<&ModSetting>, required: &Required) -> bool {
    match setting {
        Some(setting) => setting.enabled(),
        None => required.def,
    }
}
