use std::path::PathBuf;

use layout::LayoutConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for `<dataset>.json` record files. `None` keeps
    /// the store purely in-memory.
    pub data_dir: Option<PathBuf>,
    /// Quiet interval before a drag position is committed to the cache.
    pub drag_debounce_ms: u64,
    /// Enable page-level co-mention edges in addition to explicit facts.
    pub include_page_co_mentions: bool,
    pub layout: LayoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            drag_debounce_ms: 400,
            include_page_co_mentions: false,
            layout: LayoutConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_roundtrips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.drag_debounce_ms, 400);
        assert_eq!(back.layout.iterations, config.layout.iterations);
        assert!(back.data_dir.is_none());
    }

    #[test]
    fn data_dir_survives_serialization() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/var/lib/records")),
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data_dir.as_deref(), Some(Path::new("/var/lib/records")));
    }
}
