use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub consumption: CsvFormat,
    pub weather: CsvFormat,
    pub grid: GridConfig,
    pub features: FeatureConfig,
}

/// Column layout of one delimited input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub timestamp_column: String,
    pub value_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid tick spacing in minutes.
    pub step_minutes: i64,
    /// Longest run of consecutive missing ticks that interpolation may fill.
    pub max_interpolation_gap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// 24 hours in grid steps.
    pub day_lag_steps: usize,
    /// 7 days in grid steps.
    pub week_lag_steps: usize,
    /// Trailing window of the temperature rolling mean, in grid steps.
    pub rolling_window_steps: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            consumption: CsvFormat {
                delimiter: b';',
                timestamp_column: String::from("Date - Heure"),
                value_column: String::from("Consommation (MW)"),
            },
            weather: CsvFormat {
                delimiter: b',',
                timestamp_column: String::from("dt"),
                value_column: String::from("temp"),
            },
            grid: GridConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            step_minutes: 30,
            max_interpolation_gap: 4,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            day_lag_steps: 48,
            week_lag_steps: 336,
            rolling_window_steps: 336,
        }
    }
}
