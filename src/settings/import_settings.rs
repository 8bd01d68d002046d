/// Settings for the local historic importer (spec §4.7).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportSettings {
    /// Directory holding `<STATION>.csv` deltas and `daily-summaries-latest.tar.gz`.
    pub historic_dir: Option<String>,

    /// Path to the key/value state file mapping a logical key to last-seen
    /// mtime in milliseconds.
    #[serde(default = "ImportSettings::default_state_file")]
    pub state_file: String,
}

impl ImportSettings {
    pub fn default_state_file() -> String {
        "./import-state.json".to_string()
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self { historic_dir: None, state_file: Self::default_state_file() }
    }
}
