use std::{path::PathBuf, time::Duration};

use chrono::Utc;

use crate::{
    domain::{error::ScanUnit, lead::CouncilId},
    services::{browser::Page, session::within},
};

/// What a page looked like when a unit failed on it.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    pub source: String,
    pub screenshot: Option<Vec<u8>>,
}

impl PageCapture {
    /// Best effort: each read gets `timeout`, and a page that cannot be read
    /// in time yields an empty capture.
    pub async fn of<P: Page>(page: &P, timeout: Duration) -> Self {
        let source = match within(timeout, "page source", page.content()).await {
            Ok(source) => source,
            Err(e) => {
                log::debug!("No page source for capture: {}", e);
                String::new()
            }
        };
        let screenshot = match within(timeout, "screenshot", page.screenshot()).await {
            Ok(png) if !png.is_empty() => Some(png),
            Ok(_) => None,
            Err(e) => {
                log::debug!("No screenshot for capture: {}", e);
                None
            }
        };

        PageCapture { source, screenshot }
    }
}

/// Called with the page state whenever a unit of a scan fails.
pub trait DiagnosticHook: Send + Sync {
    /// Whether the page should be read at all before `capture`.
    fn wants_capture(&self) -> bool {
        true
    }

    fn capture(&self, council: &CouncilId, unit: &ScanUnit, page: &PageCapture);
}

pub struct NoDiagnostics;

impl DiagnosticHook for NoDiagnostics {
    fn wants_capture(&self) -> bool {
        false
    }

    fn capture(&self, _council: &CouncilId, _unit: &ScanUnit, _page: &PageCapture) {}
}

/// Writes the failing page to `<dir>/<council>-<unit>-<time>.html`, plus a
/// `.png` next to it when a screenshot was taken.
pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotDir { dir: dir.into() }
    }

    fn file_stem(council: &CouncilId, unit: &ScanUnit) -> String {
        let slug: String = unit
            .to_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(60)
            .collect();

        format!(
            "{}-{}-{}",
            council,
            slug,
            Utc::now().format("%Y%m%dT%H%M%S%3f")
        )
    }

    fn save(dir: PathBuf, stem: String, page: PageCapture) {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::error!("Cannot create snapshot dir {:?}: {:?}", dir, e);
            return;
        }

        let stem = dir.join(stem);
        let html = stem.with_extension("html");
        match std::fs::write(&html, &page.source) {
            Ok(()) => log::info!("Saved page snapshot to {:?}", html),
            Err(e) => log::error!("Error writing snapshot {:?}: {:?}", html, e),
        }

        if let Some(png) = &page.screenshot {
            let path = stem.with_extension("png");
            if let Err(e) = std::fs::write(&path, png) {
                log::error!("Error writing screenshot {:?}: {:?}", path, e);
            }
        }
    }
}

impl DiagnosticHook for SnapshotDir {
    /// Files are written on the blocking pool so a slow disk never holds up
    /// the scan.
    fn capture(&self, council: &CouncilId, unit: &ScanUnit, page: &PageCapture) {
        let dir = self.dir.clone();
        let stem = Self::file_stem(council, unit);
        let page = page.clone();

        log::debug!("Queueing snapshot {} for {}", stem, unit);
        tokio::task::spawn_blocking(move || Self::save(dir, stem, page));
    }
}
