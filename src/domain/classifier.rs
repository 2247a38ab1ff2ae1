use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    LiveLead,
    Appeal,
    Priority,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessCategory {
    Hospitality,
    Commercial,
}

/// Lowercased keyword list matched by substring against listing text.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

/// Outcome of running a listing entry through the keyword filter.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordVerdict {
    Matched(Vec<String>),
    Unfiltered,
    Rejected,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        KeywordSet { keywords }
    }

    pub fn matches(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .cloned()
            .collect()
    }

    pub fn verdict(&self, text: &str, no_filter: bool) -> KeywordVerdict {
        let matched = self.matches(text);
        match (matched.is_empty(), no_filter) {
            (false, _) => KeywordVerdict::Matched(matched),
            (true, true) => KeywordVerdict::Unfiltered,
            (true, false) => KeywordVerdict::Rejected,
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Total over its inputs: refusals are appeal material, prior approvals are
/// prioritised, and anything else is live once its detail page was read.
pub fn classify(status: Option<&str>, summary: &str, enriched: bool) -> Classification {
    let status = status.unwrap_or_default().to_lowercase();
    if status.contains("refuse") {
        return Classification::Appeal;
    }

    if summary.to_lowercase().contains("prior approval") {
        return Classification::Priority;
    }

    match enriched {
        true => Classification::LiveLead,
        false => Classification::Standard,
    }
}

pub fn business_category(proposal: &str) -> BusinessCategory {
    match proposal.to_lowercase().contains("food") {
        true => BusinessCategory::Hospitality,
        false => BusinessCategory::Commercial,
    }
}
