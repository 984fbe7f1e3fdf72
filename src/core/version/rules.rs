// ─── Rule Evaluation ───
// Decides library compatibility and conditional argument inclusion for the
// platform the launcher runs on.

use regex::Regex;
use sysinfo::System;
use tracing::warn;

use super::manifest::{LibraryEntry, Rule, RuleAction};

/// The only feature flag the argument rules understand.
pub const CUSTOM_RESOLUTION_FEATURE: &str = "has_custom_resolution";

/// Platform facts that rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    /// Mojang OS name: `windows`, `osx` or `linux`.
    pub os_name: String,
    /// OS release string matched by `os.version` patterns.
    pub os_release: String,
    /// Architecture name used by modern native coordinates (`x64`, `arm64`, `x86`).
    pub arch: String,
    pub fullscreen: bool,
}

impl RuleContext {
    /// Facts about the running machine.
    pub fn current(fullscreen: bool) -> Self {
        Self {
            os_name: current_os_name().to_string(),
            os_release: System::kernel_version().unwrap_or_default(),
            arch: current_arch_name().to_string(),
            fullscreen,
        }
    }

    /// Library compatibility. Rules apply top to bottom when they carry no
    /// `os` constraint or the constraint names this OS; the last applicable
    /// rule wins. A legacy natives library without an entry for this OS is
    /// incompatible.
    pub fn library_allowed(&self, library: &LibraryEntry) -> bool {
        if let Some(natives) = &library.natives {
            if !natives.contains_key(&self.os_name) {
                return false;
            }
        }

        let Some(rules) = &library.rules else {
            return true;
        };

        let mut allowed = false;
        for rule in rules {
            let applies = match &rule.os {
                None => true,
                Some(_) => self.os_matches(rule),
            };
            if applies {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    /// Every rule must pass for the argument to be emitted.
    pub fn argument_included(&self, rules: &[Rule]) -> bool {
        let passing = rules.iter().filter(|rule| self.rule_passes(rule)).count();
        passing == rules.len()
    }

    fn rule_passes(&self, rule: &Rule) -> bool {
        if rule.os.is_some() {
            return self.os_matches(rule) != (rule.action == RuleAction::Disallow);
        }

        if let Some(features) = &rule.features {
            // Other feature flags are deliberately left unevaluated.
            return features.get(CUSTOM_RESOLUTION_FEATURE) == Some(&true) && self.fullscreen;
        }

        rule.action == RuleAction::Allow
    }

    fn os_matches(&self, rule: &Rule) -> bool {
        let Some(os) = &rule.os else {
            return false;
        };

        if os.name.as_deref() != Some(self.os_name.as_str()) {
            return false;
        }
        if let Some(arch) = os.arch.as_deref() {
            if manifest_arch_name(arch) != self.arch {
                return false;
            }
        }

        match os.version.as_deref() {
            None => true,
            Some(pattern) => match Regex::new(pattern) {
                Ok(re) => re.is_match(&self.os_release),
                Err(err) => {
                    warn!("Ignoring invalid OS version pattern {:?}: {}", pattern, err);
                    false
                }
            },
        }
    }

    /// Classifier key of a legacy natives library for this OS, with the
    /// `${arch}` placeholder resolved.
    pub fn legacy_native_classifier(&self, library: &LibraryEntry) -> Option<String> {
        let template = library.natives.as_ref()?.get(&self.os_name)?;
        Some(template.replace("${arch}", legacy_arch_bits()))
    }

    /// For modern native coordinates (`...:natives-<os>[-<arch>]`), whether
    /// the coordinate targets this architecture. `None` for regular libraries.
    pub fn modern_native_matches(&self, library_name: &str) -> Option<bool> {
        let classifier = library_name.rsplit(':').next()?;
        let rest = classifier.strip_prefix("natives-")?;
        let arch = match rest.split_once('-') {
            Some((_os, arch)) => arch,
            None => "x64",
        };
        Some(arch == self.arch)
    }
}

/// `true` when any rule gates on the custom resolution feature.
pub fn gates_custom_resolution(rules: &[Rule]) -> bool {
    rules.iter().any(|rule| {
        rule.features
            .as_ref()
            .is_some_and(|features| features.get(CUSTOM_RESOLUTION_FEATURE) == Some(&true))
    })
}

/// Get the Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

fn current_arch_name() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "x86",
        other => other,
    }
}

/// Manifest `os.arch` values use Java's `os.arch` names.
fn manifest_arch_name(arch: &str) -> &str {
    match arch {
        "amd64" | "x86_64" => "x64",
        "aarch64" => "arm64",
        "i386" | "i686" => "x86",
        other => other,
    }
}

fn legacy_arch_bits() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "64"
    } else {
        "32"
    }
}
