use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Tunables shared by the pipeline implementations. Loaded from disk when
/// present; anything missing or malformed falls back to defaults with a
/// warning rather than failing startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "PipelineSettings::default_clear_color")]
    pub clear_color: [f32; 4],
    #[serde(default = "PipelineSettings::default_ui_index_capacity")]
    pub ui_index_capacity: u32,
    #[serde(default = "PipelineSettings::default_ui_vertex_capacity")]
    pub ui_vertex_capacity: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            clear_color: Self::default_clear_color(),
            ui_index_capacity: Self::default_ui_index_capacity(),
            ui_vertex_capacity: Self::default_ui_vertex_capacity(),
        }
    }
}

impl PipelineSettings {
    fn default_clear_color() -> [f32; 4] {
        [0.231, 0.269, 0.338, 1.0]
    }

    fn default_ui_index_capacity() -> u32 {
        1024 * 8
    }

    fn default_ui_vertex_capacity() -> u32 {
        1024 * 4
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<PipelineSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded pipeline settings from {:?}", path);
                    settings
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default pipeline settings.",
                        path, err
                    );
                    PipelineSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {:?}, using defaults", path);
                PipelineSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default pipeline settings.",
                    path, err
                );
                PipelineSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = PipelineSettings::load_from_path("definitely/not/here.json");
        assert_eq!(
            settings.ui_index_capacity,
            PipelineSettings::default().ui_index_capacity
        );
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: PipelineSettings =
            serde_json::from_str(r#"{"ui_index_capacity": 16}"#).unwrap();
        assert_eq!(settings.ui_index_capacity, 16);
        assert_eq!(
            settings.clear_color,
            PipelineSettings::default_clear_color()
        );
    }
}
