use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

use crate::model::RequestKind;

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,

    /// Directory holding the per-kind durable history files.
    pub history_dir: PathBuf,

    // Poll intervals (seconds). The shipped screens refresh timesheet
    // adjustments faster than the others, hence per-kind knobs.
    pub poll_leave_secs: u64,
    pub poll_timesheet_secs: u64,
    pub poll_reimbursement_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            backend_url: env::var("BACKEND_URL").expect("BACKEND_URL must be set"),
            history_dir: env::var("HISTORY_DIR")
                .unwrap_or_else(|_| "./history".to_string())
                .into(),
            poll_leave_secs: env::var("POLL_LEAVE_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            poll_timesheet_secs: env::var("POLL_TIMESHEET_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap(),
            poll_reimbursement_secs: env::var("POLL_REIMBURSEMENT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
        }
    }

    pub fn poll_interval(&self, kind: RequestKind) -> Duration {
        let secs = match kind {
            RequestKind::LeaveRequest => self.poll_leave_secs,
            RequestKind::TimesheetAdjustment => self.poll_timesheet_secs,
            RequestKind::Reimbursement => self.poll_reimbursement_secs,
        };
        Duration::from_secs(secs)
    }
}
