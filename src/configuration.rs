use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::portal::{CouncilProfile, FieldLabels, PortalFamily};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub browser: BrowserSettings,
    #[serde(default)]
    pub scan: ScanSettings,
    pub councils: Vec<CouncilSettings>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub days_back: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_limit: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub week_limit: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub concurrency: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub navigation_timeout_secs: u64,
    pub keywords: Vec<String>,
    pub field_labels: FieldLabels,
    pub contact_tabs: Vec<String>,
    pub placeholder: String,
    pub politeness_delay_ms: DelayRange,
    pub diagnostics_dir: Option<String>,
}

impl ScanSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            days_back: 30,
            page_limit: 3,
            week_limit: 2,
            concurrency: 3,
            navigation_timeout_secs: 45,
            keywords: [
                "retail",
                "shop",
                "commercial",
                "office",
                "mixed use",
                "restaurant",
                "class e",
                "change of use",
                "prior approval",
                "class ma",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            field_labels: FieldLabels::default(),
            contact_tabs: vec!["Contacts".to_string(), "Further Information".to_string()],
            placeholder: "view link for details".to_string(),
            politeness_delay_ms: DelayRange { min: 0, max: 0 },
            diagnostics_dir: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct CouncilSettings {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub family: PortalFamily,
}

impl CouncilSettings {
    pub fn profile(&self) -> Result<CouncilProfile, url::ParseError> {
        CouncilProfile::new(&self.id, &self.name, &self.base_url, self.family)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No working directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
