pub mod compare;
pub mod manifest;
pub mod rules;

pub use compare::{compare_versions, mc_version_at_least};
pub use manifest::{
    Argument, ArgumentValue, Arguments, ExtractRules, LibraryArtifact, LibraryDownloads,
    LibraryEntry, OsRule, Rule, RuleAction, RuleBasedArgument, VersionManifest,
};
pub use rules::RuleContext;
