use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "tiersuggest";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<locale>.json` base dictionaries. `None` uses the
    /// built-in English word list.
    pub asset_dir: Option<PathBuf>,
    /// Learned dictionary file. `None` uses the user data directory.
    pub learned_store_path: Option<PathBuf>,
    pub default_locale: String,
    pub max_candidates: usize,
    pub max_suggestions: usize,
    pub learned_base_frequency: u8,
    pub accept_boost: u8,
    pub reaccept_boost: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: None,
            learned_store_path: None,
            default_locale: "en_US".to_string(),
            max_candidates: 3,
            max_suggestions: 3,
            learned_base_frequency: 128,
            accept_boost: 35,
            reaccept_boost: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, confy::ConfyError> {
        match confy::load(APP_NAME, Some("config")) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, Some("config"), self)
    }

    /// Where the learned dictionary lives.
    ///
    /// Falls back to `<data dir>/tiersuggest/learned.json`, or
    /// `learned.json` in the working directory if no data dir is known.
    pub fn learned_store_path(&self) -> PathBuf {
        if let Some(path) = &self.learned_store_path {
            return path.clone();
        }
        match dirs::data_dir() {
            Some(mut path) => {
                path.push(APP_NAME);
                path.push("learned.json");
                path
            }
            None => PathBuf::from("learned.json"),
        }
    }
}
