use std::{future::Future, time::Duration};

use crate::{
    domain::{
        error::{BrowserError, ScanError},
        portal::CouncilProfile,
    },
    services::browser::{Browser, Page},
};

/// Runs one provider call under the per-operation timeout.
pub(crate) async fn within<T>(
    timeout: Duration,
    what: &str,
    call: impl Future<Output = Result<T, BrowserError>>,
) -> Result<T, ScanError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(ScanError::from),
        Err(_) => Err(ScanError::NavigationTimeout(what.to_string())),
    }
}

/// A council scan's browser session. Owned by exactly one scan and closed by
/// it on every exit path.
pub struct SearchSession<'a, P: Page> {
    page: P,
    council: &'a CouncilProfile,
    timeout: Duration,
    accepted: bool,
    cookies: Vec<P::Cookie>,
    current_url: Option<String>,
}

impl<'a, P: Page> SearchSession<'a, P> {
    pub async fn open<B>(
        browser: &B,
        council: &'a CouncilProfile,
        timeout: Duration,
    ) -> Result<SearchSession<'a, P>, ScanError>
    where
        B: Browser<Page = P>,
    {
        let page = browser.open_page().await?;

        Ok(SearchSession {
            page,
            council,
            timeout,
            accepted: false,
            cookies: vec![],
            current_url: None,
        })
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn council(&self) -> &'a CouncilProfile {
        self.council
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn cookies(&self) -> &[P::Cookie] {
        &self.cookies
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), ScanError> {
        within(self.timeout, url, self.page.goto(url)).await?;
        self.current_url = Some(url.to_string());
        Ok(())
    }

    pub async fn wait_for(&self, selector: &str) -> Result<(), ScanError> {
        within(
            self.timeout,
            selector,
            self.page.wait_for(selector, self.timeout),
        )
        .await
    }

    pub async fn disclaimer_showing(&self) -> Result<bool, ScanError> {
        let accept = self.council.portal.selectors.accept;
        Ok(within(self.timeout, accept, self.page.count(accept)).await? > 0)
    }

    /// Opens the portal at `entry_url` and accepts its terms when asked to.
    /// Safe to repeat: an absent accept control is simply skipped.
    pub async fn handshake(&mut self, entry_url: &str) -> Result<(), ScanError> {
        let result = match self.navigate(entry_url).await {
            Ok(()) => self.accept_if_present().await.map(|_| ()),
            Err(e) => Err(e),
        };

        result.map_err(|e| match e {
            ScanError::FatalProviderFailure(_) => e,
            other => ScanError::HandshakeFailure {
                council: self.council.name.clone(),
                reason: other.to_string(),
            },
        })
    }

    /// Accepts the disclaimer on the current page if it is showing. Returns
    /// whether an accept control was activated.
    pub async fn accept_if_present(&mut self) -> Result<bool, ScanError> {
        let council = self.council;
        let selectors = &council.portal.selectors;

        let clicked = match self.disclaimer_showing().await? {
            true => {
                log::info!("Accepting terms on {}", council.name);
                within(self.timeout, selectors.accept, self.page.click(selectors.accept)).await?;
                self.wait_for(selectors.search_form_ready).await?;
                if let Ok(url) = self.page.current_url().await {
                    self.current_url = Some(url);
                }
                true
            }
            false => false,
        };

        self.accepted = true;
        self.snapshot_cookies().await;
        Ok(clicked)
    }

    async fn snapshot_cookies(&mut self) {
        match self.page.cookies().await {
            Ok(cookies) => self.cookies = cookies,
            Err(e) => log::warn!(
                "Could not read cookies for {}, keeping {} previous: {:?}",
                self.council.name,
                self.cookies.len(),
                e
            ),
        }
    }

    pub async fn close(self) {
        if let Err(e) = within(self.timeout, "close", self.page.close()).await {
            log::warn!("Error closing session for {}: {:?}", self.council.name, e);
        }
    }
}
