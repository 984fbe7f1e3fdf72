pub mod arguments;
pub mod classpath;
pub mod modlist;
pub mod mods;
pub mod natives;
pub mod options;
pub mod orchestrator;
pub mod process;

pub use arguments::ArgumentProcessor;
pub use classpath::{Classpath, ClasspathResolver};
pub use modlist::{requires_absolute, ModListWriter};
pub use mods::{detect_liteloader, resolve_mod_configuration, LiteLoaderState, ResolvedMods};
pub use natives::{extract_natives, NativesDir};
pub use orchestrator::{LaunchOrchestrator, LaunchRequest};
pub use process::{LaunchEvent, LaunchHandle};
