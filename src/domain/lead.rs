use std::fmt;

use serde::{Deserialize, Serialize};

use super::classifier::{business_category, classify, BusinessCategory, Classification};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouncilId(pub String);

impl fmt::Display for CouncilId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CouncilId {
    fn from(value: &str) -> Self {
        CouncilId(value.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Enrichment {
    NotRequested,
    Enriched,
    Failed,
}

/// Fields read off an application's detail page. Empty lookups are kept as
/// `None` so a missing label never reads as data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub status: Option<String>,
    pub proposal_description: Option<String>,
    pub address: Option<String>,
    pub applicant_name: Option<String>,
    pub agent_name: Option<String>,
    pub agent_address: Option<String>,
}

impl DetailFields {
    pub fn placeholder(text: &str) -> Self {
        let value = Some(text.to_string());
        DetailFields {
            status: value.clone(),
            proposal_description: value.clone(),
            address: value.clone(),
            applicant_name: value.clone(),
            agent_name: value.clone(),
            agent_address: value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub council: CouncilId,
    pub source_url: String,
    pub summary_text: String,
    pub matched_keywords: Vec<String>,
    pub unfiltered: bool,
    pub classification: Classification,
    pub business: BusinessCategory,
    pub enrichment: Enrichment,
    pub status: Option<String>,
    pub proposal_description: Option<String>,
    pub address: Option<String>,
    pub applicant_name: Option<String>,
    pub agent_name: Option<String>,
    pub agent_address: Option<String>,
}

impl Lead {
    pub fn harvested(
        council: CouncilId,
        source_url: String,
        summary_text: String,
        matched_keywords: Vec<String>,
        unfiltered: bool,
    ) -> Self {
        let mut lead = Lead {
            council,
            source_url,
            summary_text,
            matched_keywords,
            unfiltered,
            classification: Classification::Standard,
            business: BusinessCategory::Commercial,
            enrichment: Enrichment::NotRequested,
            status: None,
            proposal_description: None,
            address: None,
            applicant_name: None,
            agent_name: None,
            agent_address: None,
        };
        lead.reclassify();
        lead
    }

    pub fn apply_details(&mut self, fields: DetailFields, enrichment: Enrichment) {
        self.status = fields.status;
        self.proposal_description = fields.proposal_description;
        self.address = fields.address;
        self.applicant_name = fields.applicant_name;
        self.agent_name = fields.agent_name;
        self.agent_address = fields.agent_address;
        self.enrichment = enrichment;
        self.reclassify();
    }

    fn reclassify(&mut self) {
        self.classification = classify(
            self.status.as_deref(),
            &self.summary_text,
            self.enrichment == Enrichment::Enriched,
        );
        self.business = business_category(
            self.proposal_description
                .as_deref()
                .unwrap_or(&self.summary_text),
        );
    }
}
