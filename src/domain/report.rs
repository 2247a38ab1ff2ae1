use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{error::UnitFailure, lead::CouncilId, lead::Lead};

#[derive(Debug, Clone, Serialize)]
pub struct CouncilReport {
    pub council: CouncilId,
    pub leads_found: usize,
    pub failures: Vec<UnitFailure>,
    /// Set when the whole council scan was abandoned, e.g. a failed handshake.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub query: String,
    pub leads: Vec<Lead>,
    pub councils: Vec<CouncilReport>,
    pub skipped_units: usize,
}

impl RunReport {
    pub fn new(query: String, started_at: DateTime<Utc>) -> Self {
        RunReport {
            run_id: Uuid::new_v4(),
            started_at,
            query,
            leads: vec![],
            councils: vec![],
            skipped_units: 0,
        }
    }

    pub fn absorb(&mut self, council: CouncilReport, mut leads: Vec<Lead>) {
        self.skipped_units += council.failures.len();
        if council.error.is_some() {
            self.skipped_units += 1;
        }
        self.leads.append(&mut leads);
        self.councils.push(council);
    }
}
