use std::time::Duration;

use rand::Rng;

use crate::{
    configuration::DelayRange,
    domain::{
        classifier::{KeywordSet, KeywordVerdict},
        error::{ScanUnit, UnitFailure},
        html_tag::Node,
        lead::Lead,
        portal::CouncilProfile,
    },
    services::{browser::Page, session::within, session::SearchSession},
};

#[derive(Debug, Default)]
pub struct Harvest {
    pub leads: Vec<Lead>,
    pub failures: Vec<UnitFailure>,
    pub pages_read: u32,
    pub entries_seen: usize,
    /// Entries dropped because they carried no usable detail link.
    pub malformed: usize,
}

pub struct HarvestOptions<'a> {
    pub keywords: &'a KeywordSet,
    pub page_limit: u32,
    pub no_filter: bool,
    pub delay: &'a DelayRange,
}

pub fn polite_pause(delay: &DelayRange) -> Duration {
    if delay.max == 0 {
        return Duration::ZERO;
    }
    let low = delay.min.min(delay.max);
    Duration::from_millis(rand::thread_rng().gen_range(low..=delay.max))
}

/// Turns listing entries into leads. Each entry stands alone: one without a
/// link is counted as malformed and skipped.
pub fn leads_from_entries(
    council: &CouncilProfile,
    entries: &[Node],
    keywords: &KeywordSet,
    no_filter: bool,
) -> (Vec<Lead>, usize) {
    let mut malformed = 0;
    let mut leads = vec![];

    for entry in entries {
        let (matched, unfiltered) = match keywords.verdict(&entry.text, no_filter) {
            KeywordVerdict::Matched(matched) => (matched, false),
            KeywordVerdict::Unfiltered => (vec![], true),
            KeywordVerdict::Rejected => continue,
        };

        let Some(source_url) = entry.first_link().and_then(|href| council.absolute(&href)) else {
            log::warn!(
                "Skipping result without a detail link on {}: {:.60}",
                council.name,
                entry.text
            );
            malformed += 1;
            continue;
        };

        leads.push(Lead::harvested(
            council.id.clone(),
            source_url,
            entry.text.clone(),
            matched,
            unfiltered,
        ));
    }

    (leads, malformed)
}

async fn next_page_url<P: Page>(session: &SearchSession<'_, P>) -> Option<String> {
    let council = session.council();
    let next = council.portal.selectors.next_link;

    match within(session.timeout(), next, session.page().query_all(next)).await {
        Ok(nodes) => nodes
            .first()
            .and_then(Node::first_link)
            .and_then(|href| council.absolute(&href)),
        Err(e) => {
            log::warn!("Could not look for a next page on {}: {:?}", council.name, e);
            None
        }
    }
}

/// Reads the results page the session is on, then follows "next" links until
/// there are none or `page_limit` pages have been read.
pub async fn harvest<P: Page>(
    session: &mut SearchSession<'_, P>,
    options: &HarvestOptions<'_>,
) -> Harvest {
    let council = session.council();
    let selectors = &council.portal.selectors;
    let page_limit = options.page_limit.max(1);
    let mut harvest = Harvest::default();
    let mut page_number = 1;

    loop {
        let entries = match within(
            session.timeout(),
            selectors.result_item,
            session.page().query_all(selectors.result_item),
        )
        .await
        {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed reading page {} on {}: {}", page_number, council.name, e);
                harvest.failures.push(UnitFailure::new(ScanUnit::Page(page_number), &e));
                break;
            }
        };

        let (mut leads, malformed) =
            leads_from_entries(council, &entries, options.keywords, options.no_filter);
        log::info!(
            "{} page {}: {} entries, {} leads",
            council.name,
            page_number,
            entries.len(),
            leads.len()
        );
        harvest.entries_seen += entries.len();
        harvest.malformed += malformed;
        harvest.pages_read += 1;
        harvest.leads.append(&mut leads);

        if page_number >= page_limit {
            break;
        }
        let Some(next_url) = next_page_url(session).await else {
            break;
        };

        tokio::time::sleep(polite_pause(options.delay)).await;
        page_number += 1;

        let moved = match session.navigate(&next_url).await {
            Ok(()) => session.wait_for(selectors.results_ready).await,
            Err(e) => Err(e),
        };
        if let Err(e) = moved {
            log::warn!("Failed loading page {} on {}: {}", page_number, council.name, e);
            harvest.failures.push(UnitFailure::new(ScanUnit::Page(page_number), &e));
            break;
        }
    }

    log::info!(
        "{}: harvested {} leads from {} pages ({} entries, {} without a link)",
        council.name,
        harvest.leads.len(),
        harvest.pages_read,
        harvest.entries_seen,
        harvest.malformed
    );
    harvest
}
