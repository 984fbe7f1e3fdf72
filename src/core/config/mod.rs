pub mod paths;
pub mod settings;

pub use paths::LaunchDirectories;
pub use settings::LaunchSettings;
