use std::time::Duration;

use thirtyfour::{components::SelectElement, prelude::*, Cookie};

use crate::{
    configuration::BrowserSettings,
    domain::error::BrowserError,
    services::browser::{Browser, Page},
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Hands out one Chrome WebDriver session per page.
pub struct DroidBay {
    webdriver_url: String,
    headless: bool,
    user_agent: String,
}

impl DroidBay {
    pub fn new(settings: &BrowserSettings) -> Self {
        let user_agent = settings
            .user_agent
            .clone()
            .unwrap_or_else(|| fake_user_agent::get_chrome_rua().to_string());

        DroidBay {
            webdriver_url: settings.webdriver_url.clone(),
            headless: settings.headless,
            user_agent,
        }
    }

    fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--window-size=1920,1080".to_string(),
            // Listing and detail pages are read for text only
            "--blink-settings=imagesEnabled=false".to_string(),
            format!("--user-agent={}", self.user_agent),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }
}

impl Browser for DroidBay {
    type Page = Droid;

    async fn open_page(&self) -> Result<Droid, BrowserError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in self.chrome_args() {
            caps.add_arg(&arg)
                .map_err(|e| BrowserError::Launch(e.to_string()))?;
        }

        let driver = WebDriver::new(self.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Droid { driver })
    }
}

pub struct Droid {
    pub driver: WebDriver,
}

fn driver_error(e: WebDriverError) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

impl Droid {
    async fn find(&self, selector: &str) -> Result<WebElement, BrowserError> {
        self.driver
            .find(By::Css(selector.to_string()))
            .await
            .map_err(|_| BrowserError::NoSuchElement(selector.to_string()))
    }
}

impl Page for Droid {
    type Cookie = Cookie;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.driver.goto(url).await.map_err(driver_error)
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let url = self.driver.current_url().await.map_err(driver_error)?;
        Ok(url.to_string())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let input = self.find(selector).await?;
        input.clear().await.map_err(driver_error)?;
        input.send_keys(value).await.map_err(driver_error)
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        let select = SelectElement::new(&element).await.map_err(driver_error)?;
        select.select_by_value(value).await.map_err(driver_error)
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.find(selector)
            .await?
            .click()
            .await
            .map_err(driver_error)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.driver
            .query(By::Css(selector.to_string()))
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
            .map(|_| ())
            .map_err(|_| BrowserError::Timeout(selector.to_string()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.driver.source().await.map_err(driver_error)
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, BrowserError> {
        self.driver.get_all_cookies().await.map_err(driver_error)
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), BrowserError> {
        for cookie in cookies {
            self.driver
                .add_cookie(cookie.clone())
                .await
                .map_err(driver_error)?;
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.driver.screenshot_as_png().await.map_err(driver_error)
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.driver.quit().await.map_err(driver_error)
    }
}
