use crate::effects::Effect;
use crate::geom::SelectionShape;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct EffectToolConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    /// Optional selection; when set, only the selected pixels (cropped to the
    /// shape's bounding rectangle) are processed and saved.
    #[serde(default)]
    pub selection: Option<SelectionShape>,
    /// Effects applied in order.
    #[serde(default)]
    pub effects: Vec<Effect>,
    pub output: EffectOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct EffectOutputConfig {
    pub image: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

pub fn parse_config(data: &str) -> Result<EffectToolConfig, String> {
    serde_json::from_str(data).map_err(|e| format!("Failed to parse config: {e}"))
}

pub fn load_config(path: &Path) -> Result<EffectToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("{e} ({})", path.display()))
}
