use crate::application::debounce::DebouncePolicy;
use crate::application::editor::EditorStore;
use crate::application::query_cache::QueryCache;
use crate::application::workspace::Workspace;
use crate::infrastructure::http_data_client::HttpDataClient;
use crate::infrastructure::http_repository::HttpDashboardRepository;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub editor: EditorSettings,
    pub cache: CacheSettings,
    pub data: DataSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
    pub seed_demo: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EditorSettings {
    pub debounce_wait_ms: u64,
    pub debounce_max_wait_ms: u64,
    pub undo_depth: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CacheSettings {
    pub stale_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DataSettings {
    pub base_url: String,
}

impl EditorSettings {
    pub fn debounce_policy(&self) -> DebouncePolicy {
        DebouncePolicy::new(
            Duration::from_millis(self.debounce_wait_ms),
            Duration::from_millis(self.debounce_max_wait_ms),
        )
    }
}

impl CacheSettings {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }
}

impl AppConfig {
    /// Client-side stores talking to the configured REST API.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(
            Arc::new(HttpDashboardRepository::new(self.api.base_url.clone())),
            QueryCache::new(self.cache.stale_time()),
            EditorStore::with_undo_depth(self.editor.undo_depth),
            self.editor.debounce_policy(),
        )
    }

    pub fn data_client(&self) -> HttpDataClient {
        HttpDataClient::new(self.data.base_url.clone())
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("server.seed_demo", true)?
        .set_default("api.base_url", "http://127.0.0.1:8080/api/v1")?
        .set_default("editor.debounce_wait_ms", 500)?
        .set_default("editor.debounce_max_wait_ms", 2000)?
        .set_default("editor.undo_depth", 50)?
        .set_default("cache.stale_secs", 300)?
        .set_default("data.base_url", "https://api.fabric.microsoft.com/v1")?)
}

/// Defaults, then `config/dashboard.toml` if present, then
/// `DASHBOARD__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::GridLayout;

    #[test]
    fn test_defaults() {
        let config: AppConfig = builder().unwrap().build().unwrap().try_deserialize().unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.server.seed_demo);
        assert_eq!(config.editor.undo_depth, 50);
        assert_eq!(config.editor.debounce_policy(), DebouncePolicy::default());
        assert_eq!(config.cache.stale_time(), Duration::from_secs(300));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            [editor]
            debounce_wait_ms = 250
            debounce_max_wait_ms = 100

            [server]
            seed_demo = false
        "#;
        let config: AppConfig = builder()
            .unwrap()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(!config.server.seed_demo);
        let policy = config.editor.debounce_policy();
        assert_eq!(policy.wait, Duration::from_millis(250));
        // max_wait never drops below wait.
        assert_eq!(policy.max_wait, Duration::from_millis(250));
        assert_eq!(config.data.base_url, "https://api.fabric.microsoft.com/v1");
    }

    #[test]
    fn test_workspace_honours_undo_depth() {
        let toml = "[editor]\nundo_depth = 2\n";
        let config: AppConfig = builder()
            .unwrap()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let workspace = config.workspace();
        for _ in 0..3 {
            workspace.editor().push_undo_state(GridLayout::blank());
        }
        assert_eq!(workspace.editor().undo_depth(), 2);
    }
}
