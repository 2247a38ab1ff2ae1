//! The capability set the scanner needs from a browser automation provider.
//!
//! Everything above this module only talks to [`Browser`] and [`Page`], so the
//! WebDriver-backed [`super::Droid`] and the fixture browser used in tests are
//! interchangeable.
#![allow(async_fn_in_trait)]

use std::time::Duration;

use crate::domain::{
    error::BrowserError,
    html_tag::{select_nodes, Node},
};

pub trait Page {
    type Cookie: Clone;

    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    /// Picks the `<option>` with the given value inside a `<select>`.
    async fn select_option(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn content(&self) -> Result<String, BrowserError>;

    async fn cookies(&self) -> Result<Vec<Self::Cookie>, BrowserError>;

    async fn set_cookies(&self, cookies: &[Self::Cookie]) -> Result<(), BrowserError>;

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;

    async fn close(self) -> Result<(), BrowserError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Node>, BrowserError> {
        let html = self.content().await?;
        select_nodes(&html, selector)
    }

    async fn count(&self, selector: &str) -> Result<usize, BrowserError> {
        Ok(self.query_all(selector).await?.len())
    }
}

pub trait Browser {
    type Page: Page;

    async fn open_page(&self) -> Result<Self::Page, BrowserError>;
}
