use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Directory record for the employee a request concerns. Fetched from the
/// backend at submit time (subject resolution) and at decide/reconcile time
/// (history name denormalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hire_date: NaiveDate,
    pub status: String,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
