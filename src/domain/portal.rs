use serde::Deserialize;
use url::Url;

use super::lead::CouncilId;

/// Known portal software families. Each one bakes in its own markup quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalFamily {
    /// The common council planning template served under `/online-applications`.
    Idox,
    /// Bespoke portal whose searches are addressable by query string.
    QueryString,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortalSelectors {
    pub accept: &'static str,
    pub search_form_ready: &'static str,
    pub date_input: &'static str,
    pub search_submit: &'static str,
    pub validated_radio: &'static str,
    pub decided_radio: &'static str,
    pub week_select: &'static str,
    pub week_option: &'static str,
    pub results_ready: &'static str,
    pub result_item: &'static str,
    pub next_link: &'static str,
    pub detail_ready: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortalProfile {
    pub family: PortalFamily,
    pub advanced_search_path: &'static str,
    pub weekly_list_path: Option<&'static str>,
    /// `{date}` is replaced with the `DD/MM/YYYY` start date.
    pub date_query_template: Option<&'static str>,
    pub selectors: PortalSelectors,
}

impl PortalProfile {
    pub fn for_family(family: PortalFamily) -> Self {
        match family {
            PortalFamily::Idox => PortalProfile {
                family,
                advanced_search_path: "/online-applications/search.do?action=advanced",
                weekly_list_path: Some("/online-applications/search.do?action=weeklyList"),
                date_query_template: None,
                selectors: PortalSelectors {
                    accept: "input[value='Accept']",
                    search_form_ready: "#advancedSearchForm, #weeklyListForm, #searchresults",
                    date_input: "#applicationValidatedStart",
                    search_submit: "input[type='submit'][value='Search']",
                    validated_radio: "#dateValidated",
                    decided_radio: "#dateDecided",
                    week_select: "#week",
                    week_option: "#week option",
                    results_ready: "#searchresults, .messagebox",
                    result_item: ".searchresult",
                    next_link: "a.next",
                    detail_ready: "table",
                },
            },
            PortalFamily::QueryString => PortalProfile {
                family,
                advanced_search_path: "/planning/search",
                weekly_list_path: None,
                date_query_template: Some("/planning/search-results?validatedFrom={date}"),
                selectors: PortalSelectors {
                    accept: "button#accept-terms, input[value='Accept']",
                    search_form_ready: "form#planningSearch, .results, .no-results",
                    date_input: "input[name='validatedFrom']",
                    search_submit: "button[type='submit']",
                    validated_radio: "input[value='validated']",
                    decided_radio: "input[value='decided']",
                    week_select: "select[name='week']",
                    week_option: "select[name='week'] option",
                    results_ready: ".results, .no-results",
                    result_item: ".result-item, .searchresult",
                    next_link: "a[rel='next'], a.next",
                    detail_ready: "table, dl",
                },
            },
        }
    }
}

/// Ordered label fallback chains, one per logical detail field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub status: Vec<String>,
    pub proposal: Vec<String>,
    pub address: Vec<String>,
    pub applicant_name: Vec<String>,
    pub agent_name: Vec<String>,
    pub agent_address: Vec<String>,
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldLabels {
    fn default() -> Self {
        FieldLabels {
            status: labels(&["Status", "Decision"]),
            proposal: labels(&["Proposal", "Description"]),
            address: labels(&["Address", "Site Address"]),
            applicant_name: labels(&["Applicant Name", "Organization"]),
            agent_name: labels(&["Agent Name", "Agent Company"]),
            agent_address: labels(&["Agent Address", "Applicant Address", "Address"]),
        }
    }
}

/// A configured council bound to the portal profile it runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct CouncilProfile {
    pub id: CouncilId,
    pub name: String,
    pub base_url: Url,
    pub portal: PortalProfile,
}

impl CouncilProfile {
    pub fn new(id: &str, name: &str, base_url: &str, family: PortalFamily) -> Result<Self, url::ParseError> {
        Ok(CouncilProfile {
            id: CouncilId::from(id),
            name: name.to_string(),
            base_url: Url::parse(base_url)?,
            portal: PortalProfile::for_family(family),
        })
    }

    pub fn advanced_search_url(&self) -> String {
        self.resolve(self.portal.advanced_search_path)
    }

    pub fn weekly_list_url(&self) -> Option<String> {
        self.portal.weekly_list_path.map(|path| self.resolve(path))
    }

    pub fn date_query_url(&self, date: &str) -> Option<String> {
        self.portal
            .date_query_template
            .map(|template| self.resolve(&template.replace("{date}", date)))
    }

    /// Resolves a portal-relative link. Absolute links are returned as-is.
    pub fn absolute(&self, href: &str) -> Option<String> {
        Self::join(&self.base_url, href)
    }

    /// Like [`CouncilProfile::absolute`] but relative to the page the link
    /// was found on.
    pub fn absolute_from(&self, page_url: &str, href: &str) -> Option<String> {
        match Url::parse(page_url) {
            Ok(page) => Self::join(&page, href),
            Err(_) => self.absolute(href),
        }
    }

    fn join(base: &Url, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        base.join(href).ok().map(|url| url.to_string())
    }

    fn resolve(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}{}", base, path)
    }
}
