//! In-memory stand-in for a browser provider. Serves canned HTML by URL and
//! records how it was driven.
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crate::{
    domain::{
        error::{BrowserError, ScanUnit},
        html_tag::select_nodes,
        lead::CouncilId,
        portal::{CouncilProfile, PortalFamily},
    },
    services::{
        browser::{Browser, Page},
        diagnostics::{DiagnosticHook, PageCapture},
    },
};

pub const BASE: &str = "https://pa.example.gov.uk";
pub const ACCEPT: &str = "input[value='Accept']";
pub const SEARCH: &str = "input[type='submit'][value='Search']";

pub fn council() -> CouncilProfile {
    council_at("example", BASE)
}

pub fn council_at(id: &str, base: &str) -> CouncilProfile {
    CouncilProfile::new(id, id, base, PortalFamily::Idox).unwrap()
}

struct ClickRule {
    selector: String,
    target: Option<String>,
}

#[derive(Default)]
pub struct FixtureSite {
    pages: HashMap<String, String>,
    interstitials: Mutex<HashMap<String, (String, usize)>>,
    clicks: Vec<ClickRule>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    launch_fails: bool,
    launches_left: Option<usize>,
    delay: Duration,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub seeded: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    visits: Mutex<Vec<String>>,
    clicked: Mutex<Vec<String>>,
}

impl FixtureSite {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Serves `html` instead of the real page for the next `times` visits.
    pub fn interstitial(self, url: &str, html: &str, times: usize) -> Self {
        self.interstitials
            .lock()
            .unwrap()
            .insert(url.to_string(), (html.to_string(), times));
        self
    }

    /// Clicking `selector` navigates to `target`, with `{selected}` and
    /// `{filled}` replaced by the page's form state. `None` makes it inert.
    pub fn click(mut self, selector: &str, target: Option<&str>) -> Self {
        self.clicks.push(ClickRule {
            selector: selector.to_string(),
            target: target.map(str::to_string),
        });
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Navigating to `url` never completes, and the page stops answering
    /// reads afterwards, like a wedged WebDriver session.
    pub fn hanging(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub fn launch_failure(mut self) -> Self {
        self.launch_fails = true;
        self
    }

    /// The provider starts `pages` pages, then refuses to launch any more.
    pub fn launches_only(mut self, pages: usize) -> Self {
        self.launches_left = Some(pages);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn browser(self) -> FixtureBrowser {
        FixtureBrowser {
            site: Arc::new(self),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn visits_to(&self, url: &str) -> usize {
        self.visits().iter().filter(|v| v.as_str() == url).count()
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.clicked
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == selector)
            .count()
    }

    fn serve(&self, url: &str) -> Result<String, BrowserError> {
        self.visits.lock().unwrap().push(url.to_string());

        if self.failing.contains(url) {
            return Err(BrowserError::Timeout(url.to_string()));
        }
        if let Some((html, remaining)) = self.interstitials.lock().unwrap().get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(html.clone());
            }
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::Driver(format!("no fixture for {}", url)))
    }

    fn click_target(&self, selector: &str) -> Option<String> {
        self.clicks
            .iter()
            .find(|r| r.selector == selector)
            .and_then(|r| r.target.clone())
    }
}

#[derive(Clone)]
pub struct FixtureBrowser {
    pub site: Arc<FixtureSite>,
}

impl Browser for FixtureBrowser {
    type Page = FixturePage;

    async fn open_page(&self) -> Result<FixturePage, BrowserError> {
        if self.site.launch_fails {
            return Err(BrowserError::Launch("fixture provider is down".to_string()));
        }
        if let Some(pages) = self.site.launches_left {
            if self.site.opened.load(Ordering::SeqCst) >= pages {
                return Err(BrowserError::Launch("fixture provider died".to_string()));
            }
        }
        let n = self.site.opened.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(FixturePage {
            site: self.site.clone(),
            state: Mutex::new(PageState {
                cookies: vec![("JSESSIONID".to_string(), format!("fixture-{}", n))],
                ..PageState::default()
            }),
        })
    }
}

#[derive(Default)]
struct PageState {
    url: String,
    html: String,
    filled: String,
    selected: String,
    cookies: Vec<(String, String)>,
    wedged: bool,
}

pub struct FixturePage {
    site: Arc<FixtureSite>,
    state: Mutex<PageState>,
}

impl FixturePage {
    fn html(&self) -> String {
        self.state.lock().unwrap().html.clone()
    }

    async fn stall_if_wedged(&self) {
        let wedged = self.state.lock().unwrap().wedged;
        if wedged {
            std::future::pending::<()>().await;
        }
    }

    fn present(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(!select_nodes(&self.html(), selector)?.is_empty())
    }

    fn require(&self, selector: &str) -> Result<(), BrowserError> {
        match self.present(selector)? {
            true => Ok(()),
            false => Err(BrowserError::NoSuchElement(selector.to_string())),
        }
    }
}

impl Page for FixturePage {
    type Cookie = (String, String);

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        if self.site.hanging.contains(url) {
            self.site.visits.lock().unwrap().push(url.to_string());
            self.state.lock().unwrap().wedged = true;
        }
        self.stall_if_wedged().await;

        let now = self.site.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.site.peak.fetch_max(now, Ordering::SeqCst);
        if !self.site.delay.is_zero() {
            tokio::time::sleep(self.site.delay).await;
        }
        self.site.in_flight.fetch_sub(1, Ordering::SeqCst);

        let html = self.site.serve(url)?;
        let mut state = self.state.lock().unwrap();
        state.url = url.to_string();
        state.html = html;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.require(selector)?;
        self.state.lock().unwrap().filled = value.to_string();
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.require(selector)?;
        self.state.lock().unwrap().selected = value.to_string();
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.require(selector)?;
        self.site.clicked.lock().unwrap().push(selector.to_string());

        let target = {
            let state = self.state.lock().unwrap();
            self.site.click_target(selector).map(|target| {
                target
                    .replace("{selected}", &state.selected)
                    .replace("{filled}", &state.filled)
            })
        };
        match target {
            Some(target) => self.goto(&target).await,
            None => Ok(()),
        }
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        match self.present(selector)? {
            true => Ok(()),
            false => Err(BrowserError::Timeout(selector.to_string())),
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.stall_if_wedged().await;
        Ok(self.html())
    }

    async fn cookies(&self) -> Result<Vec<(String, String)>, BrowserError> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[(String, String)]) -> Result<(), BrowserError> {
        self.site.seeded.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().cookies.extend_from_slice(cookies);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.stall_if_wedged().await;
        Ok(self.html().into_bytes())
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.site.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingHook {
    pub captured: Arc<Mutex<Vec<(CouncilId, ScanUnit)>>>,
}

impl RecordingHook {
    pub fn units(&self) -> Vec<ScanUnit> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .map(|(_, unit)| unit.clone())
            .collect()
    }
}

impl DiagnosticHook for RecordingHook {
    fn capture(&self, council: &CouncilId, unit: &ScanUnit, _page: &PageCapture) {
        self.captured
            .lock()
            .unwrap()
            .push((council.clone(), unit.clone()));
    }
}

pub fn disclaimer() -> String {
    r#"<html><body>
        <h1>Disclaimer</h1>
        <p>You must accept the terms before searching.</p>
        <form method="post"><input type="submit" value="Accept"></form>
    </body></html>"#
        .to_string()
}

pub fn search_form() -> String {
    r#"<html><body>
        <form id="advancedSearchForm">
          <input type="text" id="applicationValidatedStart" name="date(applicationValidatedStart)">
          <input type="submit" value="Search">
        </form>
    </body></html>"#
        .to_string()
}

pub fn weekly_form(weeks: &[(&str, &str)]) -> String {
    let options: String = weeks
        .iter()
        .map(|(value, label)| format!(r#"<option value="{}">{}</option>"#, value, label))
        .collect();

    format!(
        r#"<html><body>
        <form id="weeklyListForm">
          <input type="radio" id="dateValidated" name="dateType" value="DC_Validated">
          <input type="radio" id="dateDecided" name="dateType" value="DC_Decided">
          <select id="week" name="week">{}</select>
          <input type="submit" value="Search">
        </form>
    </body></html>"#,
        options
    )
}

pub fn detail_href(key: &str) -> String {
    format!(
        "/online-applications/applicationDetails.do?keyVal={}&activeTab=summary",
        key
    )
}

pub fn detail_url(key: &str) -> String {
    format!("{}{}", BASE, detail_href(key))
}

pub fn contacts_url(key: &str) -> String {
    format!(
        "{}/online-applications/applicationDetails.do?keyVal={}&activeTab=contacts",
        BASE, key
    )
}

/// A results listing. Entries are `(key, summary)`.
pub fn results(entries: &[(&str, &str)], next: Option<&str>) -> String {
    let items: String = entries
        .iter()
        .map(|(key, summary)| {
            format!(
                r#"<li class="searchresult"><a href="{}">{}</a><p class="metaInfo">Ref. No: {}</p></li>"#,
                detail_href(key),
                summary,
                key
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<p class="pager"><a class="next" href="{}">Next</a></p>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body><form id="searchCriteriaForm"></form><ul id="searchresults">{}</ul>{}</body></html>"#,
        items, next
    )
}

pub fn details(key: &str, status: &str, proposal: &str, address: &str) -> String {
    format!(
        r#"<html><body>
        <a href="applicationDetails.do?keyVal={key}&activeTab=summary">Summary</a>
        <a href="applicationDetails.do?keyVal={key}&activeTab=contacts">Contacts</a>
        <table id="simpleDetailsTable">
          <tr><th>Reference</th><td>{key}</td></tr>
          <tr><th>Site Address</th><td>{address}</td></tr>
          <tr><th>Proposal</th><td>{proposal}</td></tr>
          <tr><th>Status</th><td>{status}</td></tr>
        </table>
    </body></html>"#
    )
}

pub fn contacts(applicant: &str, agent: &str, agent_address: &str) -> String {
    format!(
        r#"<html><body>
        <table class="agents">
          <tr><th>Applicant Name</th><td>{applicant}</td></tr>
          <tr><th>Agent Name</th><td>{agent}</td></tr>
          <tr><th>Agent Address</th><td>{agent_address}</td></tr>
        </table>
    </body></html>"#
    )
}
