// ─── ModLaunch Core ───
// Launch core of a modded Minecraft launcher.
//
// Architecture:
//   core/
//     auth/      Account data consumed by the launch
//     config/    Launch settings + directory layout
//     distro/    Server, module tree, per-user mod configuration
//     maven/     Artifact coordinate parser
//     version/   Version manifests, OS rules, version comparison
//     launch/    Mod resolution, classpath, natives, arguments, process

pub mod auth;
pub mod config;
pub mod distro;
pub mod error;
pub mod launch;
pub mod maven;
pub mod version;
