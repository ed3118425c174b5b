//! Settings: schema and loading.

mod loader;
mod schema;

pub use loader::{get_with_env_fallback, load, load_from_path, settings_path};
pub use schema::{
    FilterSettings, GenerationSettings, GithubSettings, RelnotesSettings, ServerSettings,
};
