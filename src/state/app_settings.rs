use birdscore_api::client::{DEFAULT_BASE_URL, DEFAULT_TOURNAMENT_ID};
use std::path::PathBuf;

pub const DEFAULT_TOURNAMENT_NAME: &str = "第79回 全日本総合バドミントン選手権大会";
pub const DEFAULT_SOURCE_URL: &str = "https://www.birdscore.live/web/79alljapan/";

pub const ENV_BASE_URL: &str = "BIRDSCORE_BASE_URL";
pub const ENV_TOURNAMENT_ID: &str = "BIRDSCORE_TOURNAMENT_ID";
pub const ENV_CACHE_FILE: &str = "BIRDSCORE_CACHE_FILE";
pub const ENV_ALIASES: &str = "BIRDSCORE_ALIASES";
pub const ENV_TOURNAMENT_NAME: &str = "BIRDSCORE_TOURNAMENT_NAME";
pub const ENV_SOURCE_URL: &str = "BIRDSCORE_SOURCE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub base_url: String,
    pub tournament_id: String,
    /// Header title; the tournament id when unknown.
    pub tournament_name: String,
    /// Public BIRDSCORE page for the tournament, shown in the header.
    pub source_url: String,
    /// Where tournament and team payloads are cached between runs.
    pub cache_file: PathBuf,
    /// Overrides the bundled alias table.
    pub aliases_file: Option<PathBuf>,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let base_url = var(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let tournament_id = var(ENV_TOURNAMENT_ID).unwrap_or_else(|| DEFAULT_TOURNAMENT_ID.to_owned());
        // The bundled name and page only describe the default tournament.
        let is_default = tournament_id == DEFAULT_TOURNAMENT_ID;
        let tournament_name = var(ENV_TOURNAMENT_NAME).unwrap_or_else(|| {
            if is_default { DEFAULT_TOURNAMENT_NAME.to_owned() } else { tournament_id.clone() }
        });
        let source_url = var(ENV_SOURCE_URL).unwrap_or_else(|| {
            if is_default { DEFAULT_SOURCE_URL.to_owned() } else { base_url.clone() }
        });

        Self {
            base_url,
            tournament_id,
            tournament_name,
            source_url,
            cache_file: var(ENV_CACHE_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_file),
            aliases_file: var(ENV_ALIASES).map(PathBuf::from),
        }
    }
}

fn default_cache_file() -> PathBuf {
    std::env::temp_dir().join("birdscore").join("cache.json")
}
