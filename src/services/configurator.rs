use crate::{
    domain::{
        error::ScanError,
        search_query::{ScanMode, WeekOption},
    },
    services::{browser::Page, session::within, session::SearchSession},
};

/// Lands on a results page or a no-results message. A disclaimer showing up
/// instead is reported as a redirect so the caller can re-accept.
async fn await_results<P: Page>(session: &SearchSession<'_, P>) -> Result<(), ScanError> {
    let selectors = &session.council().portal.selectors;
    let landing = format!("{}, {}", selectors.results_ready, selectors.accept);

    session.wait_for(&landing).await?;
    match session.disclaimer_showing().await? {
        true => Err(ScanError::DisclaimerRedirect),
        false => Ok(()),
    }
}

/// Date-range search starting at `start_date` (`DD/MM/YYYY`). Query-string
/// portals are addressed directly; form portals get the start date typed into
/// the search form currently open in the session.
pub async fn submit_date_range<P: Page>(
    session: &mut SearchSession<'_, P>,
    start_date: &str,
) -> Result<(), ScanError> {
    let council = session.council();
    let selectors = &council.portal.selectors;

    match council.date_query_url(start_date) {
        Some(url) => session.navigate(&url).await?,
        None => {
            let page = session.page();
            let timeout = session.timeout();
            within(timeout, selectors.date_input, page.fill(selectors.date_input, start_date))
                .await?;
            within(timeout, selectors.search_submit, page.click(selectors.search_submit)).await?;
        }
    }

    log::info!("Searching {} from {}", council.name, start_date);
    await_results(session).await
}

async fn open_weekly_entry<P: Page>(
    session: &mut SearchSession<'_, P>,
    mode: ScanMode,
) -> Result<(), ScanError> {
    let council = session.council();
    let weekly_url = council
        .weekly_list_url()
        .ok_or_else(|| ScanError::SelectorNotFound(format!("{} has no weekly list", council.name)))?;

    session.navigate(&weekly_url).await?;
    if session.disclaimer_showing().await? {
        return Err(ScanError::DisclaimerRedirect);
    }

    let selectors = &council.portal.selectors;
    let radio = match mode {
        ScanMode::Validated => selectors.validated_radio,
        ScanMode::Decided => selectors.decided_radio,
    };
    within(session.timeout(), radio, session.page().click(radio)).await
}

/// Opens the weekly list in `mode` and reads the week buckets the portal
/// currently offers, in the portal's own order.
pub async fn list_weeks<P: Page>(
    session: &mut SearchSession<'_, P>,
    mode: ScanMode,
) -> Result<Vec<WeekOption>, ScanError> {
    open_weekly_entry(session, mode).await?;

    let option_selector = session.council().portal.selectors.week_option;
    let options = within(
        session.timeout(),
        option_selector,
        session.page().query_all(option_selector),
    )
    .await?;

    let weeks: Vec<WeekOption> = options
        .into_iter()
        .filter_map(|node| {
            let token = node.attr("value").unwrap_or(node.text.as_str()).trim().to_string();
            match token.is_empty() {
                true => None,
                false => Some(WeekOption {
                    token,
                    label: node.text.clone(),
                }),
            }
        })
        .collect();

    match weeks.is_empty() {
        true => Err(ScanError::SelectorNotFound(option_selector.to_string())),
        false => Ok(weeks),
    }
}

/// Runs the search for one week. Always starts from the weekly list entry
/// point so no form state carries over from the previous week.
pub async fn submit_week<P: Page>(
    session: &mut SearchSession<'_, P>,
    mode: ScanMode,
    week: &WeekOption,
) -> Result<(), ScanError> {
    open_weekly_entry(session, mode).await?;

    let selectors = &session.council().portal.selectors;
    let page = session.page();
    let timeout = session.timeout();
    within(
        timeout,
        selectors.week_select,
        page.select_option(selectors.week_select, &week.token),
    )
    .await?;
    within(timeout, selectors.search_submit, page.click(selectors.search_submit)).await?;

    log::info!("Searching {} week {}", session.council().name, week.label);
    await_results(session).await
}
