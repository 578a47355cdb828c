use crate::transform::*;

use serde::{Deserialize, Serialize};

pub const DEFAULT_RAW_DATA_DIRECTORY: &str = "data/raw/ca_secretary_of_state";
pub const DEFAULT_TRANSFORMED_DATA_DIRECTORY: &str = "data/transformed/ca_secretary_of_state";
pub const DEFAULT_CORRECTIONS_PATH: &str = "corrections/ca_secretary_of_state.csv";

/// The settings, as written in a configuration file or passed on the command line.
///
/// All the fields are optional. Missing fields take their default value.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformSettings {
    #[serde(rename = "rawDataDirectory")]
    pub raw_data_directory: Option<String>,
    #[serde(rename = "transformedDataDirectory")]
    pub transformed_data_directory: Option<String>,
    #[serde(rename = "correctionsPath")]
    pub corrections_path: Option<String>,
    #[serde(rename = "correctionsWorksheet")]
    pub corrections_worksheet: Option<String>,
}

impl TransformSettings {
    /// Takes the fields of these settings, and the ones of the fallback when they are missing.
    pub fn or(self, fallback: TransformSettings) -> TransformSettings {
        TransformSettings {
            raw_data_directory: self.raw_data_directory.or(fallback.raw_data_directory),
            transformed_data_directory: self
                .transformed_data_directory
                .or(fallback.transformed_data_directory),
            corrections_path: self.corrections_path.or(fallback.corrections_path),
            corrections_worksheet: self.corrections_worksheet.or(fallback.corrections_worksheet),
        }
    }
}

/// The resolved locations used by one run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransformConfig {
    pub raw_data_directory: PathBuf,
    pub transformed_data_directory: PathBuf,
    pub corrections_path: PathBuf,
    pub corrections_worksheet: Option<String>,
}

impl TransformConfig {
    pub fn from_settings(settings: &TransformSettings) -> TransformConfig {
        let path_or = |x: &Option<String>, default: &str| {
            PathBuf::from(x.clone().unwrap_or_else(|| default.to_string()))
        };
        TransformConfig {
            raw_data_directory: path_or(&settings.raw_data_directory, DEFAULT_RAW_DATA_DIRECTORY),
            transformed_data_directory: path_or(
                &settings.transformed_data_directory,
                DEFAULT_TRANSFORMED_DATA_DIRECTORY,
            ),
            corrections_path: path_or(&settings.corrections_path, DEFAULT_CORRECTIONS_PATH),
            corrections_worksheet: settings.corrections_worksheet.clone(),
        }
    }
}

/// Reads a configuration file.
///
/// The relative paths are resolved against the directory of the file.
pub fn read_settings(path: &str) -> TResult<TransformSettings> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let settings: TransformSettings =
        serde_json::from_str(&contents).context(ParsingConfigSnafu { path })?;
    debug!("read_settings: {:?}", settings);

    let root = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    let resolve = |x: Option<String>| {
        x.map(|p| {
            if Path::new(&p).is_absolute() {
                p
            } else {
                root.join(p).display().to_string()
            }
        })
    };
    Ok(TransformSettings {
        raw_data_directory: resolve(settings.raw_data_directory),
        transformed_data_directory: resolve(settings.transformed_data_directory),
        corrections_path: resolve(settings.corrections_path),
        corrections_worksheet: settings.corrections_worksheet,
    })
}
