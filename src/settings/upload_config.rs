use crate::utils::get_config_dir;
use color_eyre::{eyre, Report};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

pub const BYTES_PER_MB: u64 = 1024 * 1024;
const DEFAULT_ENDPOINT: &str = "http://localhost:3000";
const DEFAULT_MAX_SIZE_MB: u64 = 2;
const CONFIG_FILE: &str = "config.toml";

/// One entry of the allow-list: a media type and the extensions it is known by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub media_type: String,
    pub extensions: Vec<String>,
}

impl MediaFormat {
    pub fn new(media_type: &str, extensions: &[&str]) -> MediaFormat {
        MediaFormat {
            media_type: media_type.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Parses `image/png=.png,.apng` as accepted on the command line
impl FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (media_type, extensions) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <media-type>=<.ext>[,<.ext>], got '{}'", s))?;
        let media_type = media_type.trim();
        if media_type.is_empty() || !media_type.contains('/') {
            return Err(format!("invalid media type '{}'", media_type));
        }
        let extensions: Vec<String> = extensions
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| {
                if e.starts_with('.') {
                    e.to_lowercase()
                } else {
                    format!(".{}", e.to_lowercase())
                }
            })
            .collect();
        if extensions.is_empty() {
            return Err(format!("no extensions given for '{}'", media_type));
        }
        Ok(MediaFormat {
            media_type: media_type.to_lowercase(),
            extensions,
        })
    }
}

/// Ordered allow-list of media types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedFormats(pub Vec<MediaFormat>);

impl AcceptedFormats {
    pub fn allows(&self, media_type: &str) -> bool {
        self.0.iter().any(|f| f.media_type == media_type)
    }

    /// All extensions, flattened in allow-list order
    pub fn extensions(&self) -> Vec<String> {
        self.0.iter().flat_map(|f| f.extensions.clone()).collect()
    }
}

impl Default for AcceptedFormats {
    fn default() -> Self {
        AcceptedFormats(vec![
            MediaFormat::new("image/png", &[".png"]),
            MediaFormat::new("image/jpeg", &[".jpg"]),
        ])
    }
}

/// Caller supplied uploader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Base url; `/upload` is appended for both upload and delete
    pub endpoint: String,
    pub max_size_mb: u64,
    pub formats: AcceptedFormats,
    /// Allow more than one file per drop
    pub multiple: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            formats: AcceptedFormats::default(),
            multiple: false,
        }
    }
}

impl UploadConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Full url of the upload resource
    pub fn upload_url(&self) -> eyre::Result<Url> {
        let base = Url::parse(&format!("{}/", self.endpoint.trim_end_matches('/')))
            .map_err(|e| Report::msg(format!("invalid endpoint '{}': {}", self.endpoint, e)))?;
        Ok(base.join("upload")?)
    }

    fn merge(self, file: FileSettings) -> UploadConfig {
        UploadConfig {
            endpoint: file.endpoint.unwrap_or(self.endpoint),
            max_size_mb: file.max_size_mb.unwrap_or(self.max_size_mb),
            formats: file.formats.map(AcceptedFormats).unwrap_or(self.formats),
            multiple: file.multiple.unwrap_or(self.multiple),
        }
    }

    /// Command line values win over the file and the defaults
    pub fn with_overrides(self, overrides: ConfigOverrides) -> UploadConfig {
        UploadConfig {
            endpoint: overrides.endpoint.unwrap_or(self.endpoint),
            max_size_mb: overrides.max_size_mb.unwrap_or(self.max_size_mb),
            formats: if overrides.accept.is_empty() {
                self.formats
            } else {
                AcceptedFormats(overrides.accept)
            },
            multiple: overrides.multiple || self.multiple,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub max_size_mb: Option<u64>,
    pub accept: Vec<MediaFormat>,
    pub multiple: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    max_size_mb: Option<u64>,
    formats: Option<Vec<MediaFormat>>,
    multiple: Option<bool>,
}

/// Loads the configuration from `config_file` or, when absent, from
/// `config.toml` in the config directory. A missing default file is not an error.
pub fn load_config(config_file: Option<PathBuf>) -> eyre::Result<UploadConfig> {
    match config_file {
        Some(path) => load_config_from_file(path.as_path(), true),
        None => load_config_from_file(get_config_dir().join(CONFIG_FILE).as_path(), false),
    }
}

fn load_config_from_file(path: &Path, required: bool) -> eyre::Result<UploadConfig> {
    let settings: FileSettings = config::Config::builder()
        .add_source(config::File::from(path).required(required))
        .build()?
        .try_deserialize()?;
    if settings.formats.as_ref().is_some_and(|f| f.is_empty()) {
        return Err(Report::msg(format!(
            "configuration param [formats] in {:?} must not be empty",
            path
        )));
    }
    Ok(UploadConfig::default().merge(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_the_stock_widget() {
        let config = UploadConfig::default();
        assert_eq!(config.max_size_bytes(), 2 * 1_048_576);
        assert!(config.formats.allows("image/png"));
        assert!(config.formats.allows("image/jpeg"));
        assert!(!config.formats.allows("image/gif"));
        assert_eq!(config.formats.extensions(), vec![".png", ".jpg"]);
        assert!(!config.multiple);
    }

    #[test]
    fn test_upload_url() {
        let config = UploadConfig::default();
        assert_eq!(
            config.upload_url().unwrap().as_str(),
            "http://localhost:3000/upload"
        );

        let config = UploadConfig {
            endpoint: "http://example.com/api/".into(),
            ..UploadConfig::default()
        };
        assert_eq!(
            config.upload_url().unwrap().as_str(),
            "http://example.com/api/upload"
        );

        let config = UploadConfig {
            endpoint: "not a url".into(),
            ..UploadConfig::default()
        };
        assert!(config.upload_url().is_err());
    }

    #[test]
    fn test_parse_media_format() {
        let format: MediaFormat = "image/png=.png, APNG".parse().unwrap();
        assert_eq!(format.media_type, "image/png");
        assert_eq!(format.extensions, vec![".png", ".apng"]);

        assert!("image/png".parse::<MediaFormat>().is_err());
        assert!("png=.png".parse::<MediaFormat>().is_err());
        assert!("image/png=".parse::<MediaFormat>().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
endpoint = "http://uploads.local:8080"
max_size_mb = 5

[[formats]]
media_type = "image/gif"
extensions = [".gif"]
"#,
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.endpoint, "http://uploads.local:8080");
        assert_eq!(config.max_size_mb, 5);
        assert_eq!(config.formats, AcceptedFormats(vec![MediaFormat::new("image/gif", &[".gif"])]));
        assert!(!config.multiple);
    }

    #[test]
    fn test_missing_default_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from_file(&dir.path().join("config.toml"), false).unwrap();
        assert_eq!(config, UploadConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = UploadConfig::default().with_overrides(ConfigOverrides {
            endpoint: Some("http://example.com".into()),
            max_size_mb: Some(10),
            accept: vec![MediaFormat::new("application/pdf", &[".pdf"])],
            multiple: true,
        });
        assert_eq!(config.endpoint, "http://example.com");
        assert_eq!(config.max_size_mb, 10);
        assert!(config.formats.allows("application/pdf"));
        assert!(!config.formats.allows("image/png"));
        assert!(config.multiple);

        let untouched = UploadConfig::default().with_overrides(ConfigOverrides::default());
        assert_eq!(untouched, UploadConfig::default());
    }
}
