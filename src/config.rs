use std::{collections::HashMap, env, path::Path, path::PathBuf};

use rusoto_core::{region::ParseRegionError, Region};
use thiserror::Error;

use crate::template_sync::{
    content::TemplateFiles,
    template_store::{AwsCredentials, SesSettings},
};

pub const TEMPLATE_NAME: &str = "templateName";
pub const SUBJECT_FILE_PATH: &str = "subjectFilePath";
pub const HTML_BODY_FILE_PATH: &str = "htmlBodyFilePath";
pub const RAW_BODY_FILE_PATH: &str = "rawBodyFilePath";
pub const SES_REGION: &str = "sesRegion";
pub const AWS_ACCESS_KEY: &str = "awsAccessKey";
pub const AWS_SECRET_KEY: &str = "awsSecretKey";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {0}: did you forget to set it in your action config?")]
    Missing(&'static str),
    #[error("Invalid {key}: {source}")]
    InvalidRegion {
        key: &'static str,
        source: ParseRegionError,
    },
    #[error("unable to read inputs file {path}: {source}", path = .path.display())]
    InputsFileIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse inputs file {path}: {source}", path = .path.display())]
    InputsFileJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where the action inputs come from.
pub trait InputSource {
    fn input(&self, key: &str) -> Option<String>;

    /// Whether AWS keys may be left out in favour of the default credential chain.
    fn allows_ambient_credentials(&self) -> bool {
        false
    }
}

/// Inputs handed to the action by the GitHub Actions runner as `INPUT_*` env vars.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionInputs;

impl ActionInputs {
    pub fn env_key(key: &str) -> String {
        format!("INPUT_{}", key.replace(' ', "_").to_uppercase())
    }
}

impl InputSource for ActionInputs {
    fn input(&self, key: &str) -> Option<String> {
        env::var(Self::env_key(key)).ok()
    }
}

/// Fixed inputs, used for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticInputs {
    values: HashMap<String, String>,
    ambient_credentials: bool,
}

impl StaticInputs {
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ambient_credentials: false,
        }
    }

    pub fn with_ambient_credentials(mut self) -> Self {
        self.ambient_credentials = true;
        self
    }

    /// Reads a flat JSON object of input names to values. AWS keys may be
    /// omitted, in which case the local AWS profile or environment is used.
    pub fn from_json_file<T: AsRef<Path>>(path: T) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::InputsFileIo {
            path: path.to_path_buf(),
            source,
        })?;
        let values: HashMap<String, String> =
            serde_json::from_str(&json).map_err(|source| ConfigError::InputsFileJson {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(values).with_ambient_credentials())
    }
}

impl InputSource for StaticInputs {
    fn input(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn allows_ambient_credentials(&self) -> bool {
        self.ambient_credentials
    }
}

/// Everything a run needs, validated before any file or remote access.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub template_name: String,
    pub files: TemplateFiles,
    pub ses: SesSettings,
}

impl SyncConfig {
    pub fn load<I>(inputs: &I) -> Result<Self, ConfigError>
    where
        I: InputSource + ?Sized,
    {
        let template_name = required(inputs, TEMPLATE_NAME)?;
        let files = TemplateFiles {
            subject: required(inputs, SUBJECT_FILE_PATH)?.into(),
            html_body: required(inputs, HTML_BODY_FILE_PATH)?.into(),
            raw_body: required(inputs, RAW_BODY_FILE_PATH)?.into(),
        };
        let region = parse_region(&required(inputs, SES_REGION)?)?;
        let credentials = load_credentials(inputs)?;

        Ok(Self {
            template_name,
            files,
            ses: SesSettings {
                region,
                credentials,
            },
        })
    }
}

/// Known regions map to their rusoto variant. Well-formed names rusoto does
/// not know yet get a custom region pointing at the SES endpoint.
fn parse_region(name: &str) -> Result<Region, ConfigError> {
    match name.parse::<Region>() {
        Ok(region) => Ok(region),
        Err(_) if is_region_name(name) => Ok(Region::Custom {
            name: name.to_string(),
            endpoint: format!("https://email.{}.amazonaws.com", name),
        }),
        Err(source) => Err(ConfigError::InvalidRegion {
            key: SES_REGION,
            source,
        }),
    }
}

// `<2-letter area>-<location...>-<number>`, e.g. `il-central-1`.
fn is_region_name(name: &str) -> bool {
    let parts = name.split('-').collect::<Vec<_>>();
    let well_formed = |part: &&str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    };
    match (parts.first(), parts.last()) {
        (Some(area), Some(number)) => {
            parts.len() >= 3
                && parts.iter().all(well_formed)
                && area.len() == 2
                && area.chars().all(|c| c.is_ascii_lowercase())
                && number.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn load_credentials<I>(inputs: &I) -> Result<Option<AwsCredentials>, ConfigError>
where
    I: InputSource + ?Sized,
{
    if inputs.allows_ambient_credentials()
        && optional(inputs, AWS_ACCESS_KEY).is_none()
        && optional(inputs, AWS_SECRET_KEY).is_none()
    {
        tracing::debug!(message = "no AWS keys given, using the default credential chain");
        return Ok(None);
    }

    Ok(Some(AwsCredentials {
        access_key: required(inputs, AWS_ACCESS_KEY)?,
        secret_key: required(inputs, AWS_SECRET_KEY)?,
    }))
}

fn optional<I>(inputs: &I, key: &str) -> Option<String>
where
    I: InputSource + ?Sized,
{
    inputs
        .input(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<I>(inputs: &I, key: &'static str) -> Result<String, ConfigError>
where
    I: InputSource + ?Sized,
{
    optional(inputs, key).ok_or(ConfigError::Missing(key))
}
