pub mod model;
pub mod mod_config;

pub use mod_config::{ModConfiguration, ModSetting};
pub use model::{Module, ModuleType, Required, Server};
