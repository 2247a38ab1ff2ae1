use crate::{
    configuration::ScanSettings,
    domain::{
        error::{ScanError, ScanUnit, UnitFailure},
        html_tag::{find_tab_link, lookup_field},
        lead::{DetailFields, Enrichment, Lead},
        portal::CouncilProfile,
    },
    services::{
        browser::{Browser, Page},
        diagnostics::{DiagnosticHook, PageCapture},
        governor::Governor,
        harvester::polite_pause,
        session::within,
    },
};

fn present(value: String) -> Option<String> {
    match value.trim().is_empty() {
        true => None,
        false => Some(value),
    }
}

/// Visits detail pages for harvested leads, each on its own page, with the
/// governor bounding how many are open at once.
pub struct DetailEnricher<'a, B: Browser> {
    pub browser: &'a B,
    pub council: &'a CouncilProfile,
    pub settings: &'a ScanSettings,
    pub governor: &'a Governor,
    pub hook: &'a dyn DiagnosticHook,
}

impl<'a, B: Browser> DetailEnricher<'a, B> {
    /// Enriches every lead in place. A lead whose detail page cannot be read
    /// keeps its harvested data and gets placeholder fields instead. A browser
    /// provider that stops launching pages fails the whole call.
    pub async fn enrich_all(
        &self,
        leads: &mut [Lead],
        cookies: &[<B::Page as Page>::Cookie],
    ) -> Result<Vec<UnitFailure>, ScanError> {
        log::info!(
            "Enriching {} leads for {} ({} at a time)",
            leads.len(),
            self.council.name,
            self.governor.limit()
        );

        let urls: Vec<String> = leads.iter().map(|l| l.source_url.clone()).collect();
        let outcomes = self
            .governor
            .run_all(urls, move |url| self.fetch_details(url, cookies))
            .await;

        if let Some(reason) = outcomes.iter().find_map(|outcome| match outcome {
            Err(ScanError::FatalProviderFailure(reason)) => Some(reason.clone()),
            _ => None,
        }) {
            log::error!("Browser provider lost while enriching {}: {}", self.council.name, reason);
            return Err(ScanError::FatalProviderFailure(reason));
        }

        let mut failures = vec![];
        for (lead, outcome) in leads.iter_mut().zip(outcomes) {
            match outcome {
                Ok(fields) => lead.apply_details(fields, Enrichment::Enriched),
                Err(e) => {
                    log::warn!("Detail page {} failed: {}", lead.source_url, e);
                    failures.push(UnitFailure::new(
                        ScanUnit::Detail(lead.source_url.clone()),
                        &e,
                    ));
                    lead.apply_details(
                        DetailFields::placeholder(&self.settings.placeholder),
                        Enrichment::Failed,
                    );
                }
            }
        }

        Ok(failures)
    }

    async fn fetch_details(
        &self,
        url: String,
        cookies: &[<B::Page as Page>::Cookie],
    ) -> Result<DetailFields, ScanError> {
        tokio::time::sleep(polite_pause(&self.settings.politeness_delay_ms)).await;

        let page = self.browser.open_page().await?;
        let result = self.read_details(&page, &url, cookies).await;

        if result.is_err() && self.hook.wants_capture() {
            let capture = PageCapture::of(&page, self.settings.navigation_timeout()).await;
            self.hook
                .capture(&self.council.id, &ScanUnit::Detail(url.clone()), &capture);
        }
        if let Err(e) = within(self.settings.navigation_timeout(), &url, page.close()).await {
            log::warn!("Error closing detail page {}: {:?}", url, e);
        }

        result
    }

    /// Detail pages share the search session's cookies. If the portal still
    /// shows its disclaimer the cookies are seeded and, failing that, the
    /// terms are accepted on this page.
    async fn open_detail(
        &self,
        page: &B::Page,
        url: &str,
        cookies: &[<B::Page as Page>::Cookie],
    ) -> Result<(), ScanError> {
        let timeout = self.settings.navigation_timeout();
        let accept = self.council.portal.selectors.accept;

        within(timeout, url, page.goto(url)).await?;
        if within(timeout, accept, page.count(accept)).await? == 0 {
            return Ok(());
        }

        if !cookies.is_empty() {
            within(timeout, url, page.set_cookies(cookies)).await?;
            within(timeout, url, page.goto(url)).await?;
        }
        if within(timeout, accept, page.count(accept)).await? > 0 {
            within(timeout, accept, page.click(accept)).await?;
            within(timeout, url, page.goto(url)).await?;
        }
        Ok(())
    }

    async fn read_details(
        &self,
        page: &B::Page,
        url: &str,
        cookies: &[<B::Page as Page>::Cookie],
    ) -> Result<DetailFields, ScanError> {
        let timeout = self.settings.navigation_timeout();
        let detail_ready = self.council.portal.selectors.detail_ready;
        let labels = &self.settings.field_labels;

        self.open_detail(page, url, cookies).await?;
        within(timeout, detail_ready, page.wait_for(detail_ready, timeout)).await?;
        let summary = within(timeout, url, page.content()).await?;

        let status = lookup_field(&summary, &labels.status);
        let proposal = lookup_field(&summary, &labels.proposal);
        let address = lookup_field(&summary, &labels.address);

        let contacts = match find_tab_link(&summary, &self.settings.contact_tabs)
            .and_then(|href| self.council.absolute_from(url, &href))
        {
            Some(tab_url) => {
                within(timeout, &tab_url, page.goto(&tab_url)).await?;
                within(timeout, detail_ready, page.wait_for(detail_ready, timeout)).await?;
                within(timeout, &tab_url, page.content()).await?
            }
            None => summary,
        };

        Ok(DetailFields {
            status: present(status),
            proposal_description: present(proposal),
            address: present(address),
            applicant_name: present(lookup_field(&contacts, &labels.applicant_name)),
            agent_name: present(lookup_field(&contacts, &labels.agent_name)),
            agent_address: present(lookup_field(&contacts, &labels.agent_address)),
        })
    }
}
