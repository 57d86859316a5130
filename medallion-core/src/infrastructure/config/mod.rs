pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use project::{CONFIG_CANDIDATES, load_project_config, load_project_config_with_env};
