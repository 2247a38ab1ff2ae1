use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::domain::error::ScanError;

/// Proof that the browser provider answered its readiness check. The scanner
/// cannot be built without one.
#[derive(Debug, Clone, Copy)]
pub struct ProviderReady {
    _checked: (),
}

#[cfg(test)]
impl ProviderReady {
    pub(crate) fn assume() -> Self {
        ProviderReady { _checked: () }
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    value: StatusValue,
}

#[derive(Deserialize)]
struct StatusValue {
    ready: bool,
    #[serde(default)]
    message: String,
}

pub struct ProviderProbe {
    client: Client,
    url: String,
}

impl ProviderProbe {
    pub fn new(webdriver_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        ProviderProbe {
            client,
            url: format!("{}/status", webdriver_url.trim_end_matches('/')),
        }
    }

    pub async fn check(&self) -> Result<ProviderReady, ScanError> {
        let res = self.client.get(&self.url).send().await.map_err(|e| {
            log::error!("WebDriver status endpoint unreachable: {:?}", e);
            ScanError::FatalProviderFailure(format!("{} unreachable: {}", self.url, e))
        })?;

        let status = res.json::<StatusResponse>().await.map_err(|e| {
            log::error!("Error when deserializing WebDriver status: {:?}", e);
            ScanError::FatalProviderFailure(format!("unexpected status payload: {}", e))
        })?;

        match status.value.ready {
            true => {
                log::info!("WebDriver ready: {}", status.value.message);
                Ok(ProviderReady { _checked: () })
            }
            false => Err(ScanError::FatalProviderFailure(format!(
                "WebDriver not ready: {}",
                status.value.message
            ))),
        }
    }
}
