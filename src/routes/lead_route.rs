use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::{
    configuration::ScanSettings,
    domain::{
        lead::CouncilId,
        portal::CouncilProfile,
        search_query::{ScanMode, SearchQuery, MAX_LOOKBACK_DAYS},
    },
    services::{DroidBay, LeadScanner, ScanRequest},
};

#[derive(Deserialize, Debug, Default)]
pub struct LeadsQuery {
    /// Comma separated council ids. Every configured council when absent.
    councils: Option<String>,
    days: Option<u32>,
    weeks: Option<usize>,
    mode: Option<ScanMode>,
    pages: Option<u32>,
    no_filter: Option<bool>,
    enrich: Option<bool>,
}

fn scan_request(
    query: &LeadsQuery,
    settings: &ScanSettings,
    known: &[CouncilProfile],
) -> Result<ScanRequest, String> {
    let councils: Vec<CouncilId> = match &query.councils {
        Some(ids) => ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(CouncilId::from)
            .collect(),
        None => known.iter().map(|c| c.id.clone()).collect(),
    };

    if councils.is_empty() {
        return Err("no councils requested".to_string());
    }
    if let Some(unknown) = councils.iter().find(|id| !known.iter().any(|c| &c.id == *id)) {
        return Err(format!("unknown council: {}", unknown));
    }

    let search = match (query.mode, query.weeks) {
        (None, None) => {
            let days_back = query.days.unwrap_or(settings.days_back);
            if days_back > MAX_LOOKBACK_DAYS {
                return Err(format!("days must be at most {}", MAX_LOOKBACK_DAYS));
            }
            SearchQuery::DateRange { days_back }
        }
        (mode, weeks) => SearchQuery::WeeklyList {
            mode: mode.unwrap_or(ScanMode::Validated),
            weeks: weeks.unwrap_or(settings.week_limit),
        },
    };

    Ok(ScanRequest {
        councils,
        query: search,
        page_limit: query.pages.unwrap_or(settings.page_limit),
        no_filter: query.no_filter.unwrap_or(false),
        enrich: query.enrich.unwrap_or(true),
    })
}

#[get("")]
async fn get_leads(
    scanner: web::Data<LeadScanner<DroidBay>>,
    query: web::Query<LeadsQuery>,
) -> HttpResponse {
    let request = match scan_request(&query, scanner.settings(), scanner.councils()) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Rejected lead request {:?}: {}", query, e);
            return HttpResponse::BadRequest().body(e);
        }
    };

    match scanner.scan(&request).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) if e.is_fatal() => HttpResponse::ServiceUnavailable().body(e.to_string()),
        Err(e) => {
            log::error!("Scan failed: {:?}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}
