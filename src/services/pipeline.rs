use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{
    configuration::ScanSettings,
    domain::{
        classifier::KeywordSet,
        error::{ScanError, ScanUnit, UnitFailure},
        lead::{CouncilId, Lead},
        portal::CouncilProfile,
        report::{CouncilReport, RunReport},
        search_query::{start_date, ScanMode, SearchQuery, WeekOption},
    },
    services::{
        browser::Browser,
        configurator,
        diagnostics::{DiagnosticHook, NoDiagnostics, PageCapture},
        enricher::DetailEnricher,
        governor::Governor,
        harvester::{self, HarvestOptions},
        provider_probe::ProviderReady,
        session::SearchSession,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub councils: Vec<CouncilId>,
    pub query: SearchQuery,
    pub page_limit: u32,
    pub no_filter: bool,
    pub enrich: bool,
}

impl ScanRequest {
    /// Date-range scan over `councils` using the configured defaults.
    pub fn from_settings(settings: &ScanSettings, councils: Vec<CouncilId>) -> Self {
        ScanRequest {
            councils,
            query: SearchQuery::DateRange {
                days_back: settings.days_back,
            },
            page_limit: settings.page_limit,
            no_filter: false,
            enrich: true,
        }
    }
}

enum SearchStep<'q> {
    DateRange(&'q str),
    Week(ScanMode, &'q WeekOption),
}

struct CouncilScan {
    leads: Vec<Lead>,
    failures: Vec<UnitFailure>,
}

pub struct LeadScanner<B: Browser> {
    browser: B,
    settings: ScanSettings,
    councils: Vec<CouncilProfile>,
    keywords: KeywordSet,
    governor: Governor,
    hook: Box<dyn DiagnosticHook>,
    _ready: ProviderReady,
}

impl<B: Browser> LeadScanner<B> {
    pub fn new(
        browser: B,
        settings: ScanSettings,
        councils: Vec<CouncilProfile>,
        ready: ProviderReady,
    ) -> Self {
        let keywords = KeywordSet::new(&settings.keywords);
        let governor = Governor::new(settings.concurrency);

        LeadScanner {
            browser,
            settings,
            councils,
            keywords,
            governor,
            hook: Box::new(NoDiagnostics),
            _ready: ready,
        }
    }

    pub fn with_diagnostics(mut self, hook: Box<dyn DiagnosticHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn councils(&self) -> &[CouncilProfile] {
        &self.councils
    }

    pub fn council(&self, id: &CouncilId) -> Option<&CouncilProfile> {
        self.councils.iter().find(|c| &c.id == id)
    }

    pub async fn scan(&self, request: &ScanRequest) -> Result<RunReport, ScanError> {
        self.scan_at(request, Utc::now()).await
    }

    /// Scans the requested councils one after another. Only a provider that
    /// cannot start aborts the run; everything else is reported per council.
    pub async fn scan_at(
        &self,
        request: &ScanRequest,
        now: DateTime<Utc>,
    ) -> Result<RunReport, ScanError> {
        let mut report = RunReport::new(request.query.describe(), now);
        log::info!("Run {} started: {}", report.run_id, report.query);

        for id in &request.councils {
            let Some(council) = self.council(id) else {
                log::error!("Unknown council requested: {}", id);
                report.absorb(
                    CouncilReport {
                        council: id.clone(),
                        leads_found: 0,
                        failures: vec![],
                        error: Some(format!("unknown council {}", id)),
                    },
                    vec![],
                );
                continue;
            };

            log::info!("Scanning {}...", council.name);
            match self.scan_council(council, request, &now).await {
                Ok(scan) => {
                    log::info!(
                        "{}: {} leads, {} skipped units",
                        council.name,
                        scan.leads.len(),
                        scan.failures.len()
                    );
                    report.absorb(
                        CouncilReport {
                            council: council.id.clone(),
                            leads_found: scan.leads.len(),
                            failures: scan.failures,
                            error: None,
                        },
                        scan.leads,
                    );
                }
                Err(e) if e.is_fatal() => {
                    log::error!("Aborting run {}: {}", report.run_id, e);
                    return Err(e);
                }
                Err(e) => {
                    log::error!("Error on {}: {}", council.name, e);
                    report.absorb(
                        CouncilReport {
                            council: council.id.clone(),
                            leads_found: 0,
                            failures: vec![],
                            error: Some(e.to_string()),
                        },
                        vec![],
                    );
                }
            }
        }

        log::info!(
            "Run {} finished with {} leads, {} skipped units",
            report.run_id,
            report.leads.len(),
            report.skipped_units
        );
        Ok(report)
    }

    async fn scan_council(
        &self,
        council: &CouncilProfile,
        request: &ScanRequest,
        now: &DateTime<Utc>,
    ) -> Result<CouncilScan, ScanError> {
        let mut session =
            SearchSession::open(&self.browser, council, self.settings.navigation_timeout())
                .await?;

        let result = self.run_session(&mut session, request, now).await;
        if let Err(e) = &result {
            self.capture(&session, &ScanUnit::Handshake, e).await;
        }
        session.close().await;

        result
    }

    async fn run_session(
        &self,
        session: &mut SearchSession<'_, B::Page>,
        request: &ScanRequest,
        now: &DateTime<Utc>,
    ) -> Result<CouncilScan, ScanError> {
        let council = session.council();
        let mut failures = vec![];
        let options = HarvestOptions {
            keywords: &self.keywords,
            page_limit: request.page_limit,
            no_filter: request.no_filter,
            delay: &self.settings.politeness_delay_ms,
        };

        let leads = match &request.query {
            SearchQuery::DateRange { days_back } => {
                let date = start_date(now, *days_back).ok_or_else(|| {
                    ScanError::InvalidQuery(format!("{} days back is out of range", days_back))
                })?;
                session.handshake(&council.advanced_search_url()).await?;

                match self.search(session, &SearchStep::DateRange(&date)).await {
                    Ok(()) => {
                        let mut harvest = harvester::harvest(session, &options).await;
                        failures.append(&mut harvest.failures);
                        harvest.leads
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        self.capture(session, &ScanUnit::Page(1), &e).await;
                        failures.push(UnitFailure::new(ScanUnit::Page(1), &e));
                        vec![]
                    }
                }
            }
            SearchQuery::WeeklyList { mode, weeks } => {
                let weekly_url = council.weekly_list_url().ok_or_else(|| {
                    ScanError::SelectorNotFound(format!("{} has no weekly list", council.name))
                })?;
                session.handshake(&weekly_url).await?;

                let options_for_weeks = self.list_weeks(session, *mode).await?;
                log::info!(
                    "{} offers {} weeks, scanning {}",
                    council.name,
                    options_for_weeks.len(),
                    (*weeks).min(options_for_weeks.len())
                );

                let mut leads = vec![];
                for week in options_for_weeks.iter().take(*weeks) {
                    match self.search(session, &SearchStep::Week(*mode, week)).await {
                        Ok(()) => {
                            let mut harvest = harvester::harvest(session, &options).await;
                            failures.append(&mut harvest.failures);
                            leads.append(&mut harvest.leads);
                        }
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            let unit = ScanUnit::Week(week.label.clone());
                            log::warn!("Skipping {} on {}: {}", unit, council.name, e);
                            self.capture(session, &unit, &e).await;
                            failures.push(UnitFailure::new(unit, &e));
                        }
                    }
                }
                leads
            }
        };

        let mut leads: Vec<Lead> = leads
            .into_iter()
            .unique_by(|lead| lead.source_url.clone())
            .collect();

        if request.enrich && !leads.is_empty() {
            let enricher = DetailEnricher {
                browser: &self.browser,
                council,
                settings: &self.settings,
                governor: &self.governor,
                hook: self.hook.as_ref(),
            };
            let mut detail_failures = enricher.enrich_all(&mut leads, session.cookies()).await?;
            failures.append(&mut detail_failures);
        }

        Ok(CouncilScan { leads, failures })
    }

    async fn run_step(
        &self,
        session: &mut SearchSession<'_, B::Page>,
        step: &SearchStep<'_>,
    ) -> Result<(), ScanError> {
        match step {
            SearchStep::DateRange(date) => configurator::submit_date_range(session, date).await,
            SearchStep::Week(mode, week) => configurator::submit_week(session, *mode, week).await,
        }
    }

    /// Runs a search step. A portal that silently bounced back to its
    /// disclaimer is accepted again and the step retried exactly once.
    async fn search(
        &self,
        session: &mut SearchSession<'_, B::Page>,
        step: &SearchStep<'_>,
    ) -> Result<(), ScanError> {
        match self.run_step(session, step).await {
            Err(ScanError::DisclaimerRedirect) => {
                let council = session.council();
                log::warn!("{} sent us back to its disclaimer, accepting again", council.name);
                session.accept_if_present().await?;
                if let SearchStep::DateRange(_) = step {
                    session.navigate(&council.advanced_search_url()).await?;
                }
                self.run_step(session, step).await
            }
            other => other,
        }
    }

    async fn list_weeks(
        &self,
        session: &mut SearchSession<'_, B::Page>,
        mode: ScanMode,
    ) -> Result<Vec<WeekOption>, ScanError> {
        match configurator::list_weeks(session, mode).await {
            Err(ScanError::DisclaimerRedirect) => {
                session.accept_if_present().await?;
                configurator::list_weeks(session, mode).await
            }
            other => other,
        }
    }

    async fn capture(
        &self,
        session: &SearchSession<'_, B::Page>,
        unit: &ScanUnit,
        error: &ScanError,
    ) {
        if !self.hook.wants_capture() {
            return;
        }
        log::debug!("Capturing page state for {}: {}", unit, error);
        let capture = PageCapture::of(session.page(), session.timeout()).await;
        self.hook.capture(&session.council().id, unit, &capture);
    }
}
