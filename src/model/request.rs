use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Category of a self-service request. Determines which payload fields are
/// meaningful and which history export schema applies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    LeaveRequest,
    TimesheetAdjustment,
    Reimbursement,
}

impl RequestKind {
    /// Short path/namespace segment, matching the backend route scheme.
    pub fn slug(&self) -> &'static str {
        match self {
            RequestKind::LeaveRequest => "leave",
            RequestKind::TimesheetAdjustment => "timesheet",
            RequestKind::Reimbursement => "reimbursement",
        }
    }
}

/// Workflow status shared by all three request kinds.
///
/// `Pending` is the only non-terminal state; every edge out of it is final.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Kind-specific fields of a request.
///
/// Timesheet times stay as `HH:MM` strings because that is the wire format;
/// they are validated strictly before submission, never coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestPayload {
    Leave {
        leave_type: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    },
    Timesheet {
        date: NaiveDate,
        new_time_in: String,
        new_time_out: String,
        reason: String,
    },
    Reimbursement {
        expense_type: String,
        amount: f64,
        date: NaiveDate,
        description: String,
        receipt_path: Option<String>,
    },
}

impl RequestPayload {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestPayload::Leave { .. } => RequestKind::LeaveRequest,
            RequestPayload::Timesheet { .. } => RequestKind::TimesheetAdjustment,
            RequestPayload::Reimbursement { .. } => RequestKind::Reimbursement,
        }
    }
}

/// One submitted ask (leave, timesheet adjustment, or reimbursement),
/// tracked through the Pending -> terminal lifecycle.
///
/// `id` is backend-assigned; `status` changes only through the
/// `LifecycleController`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub subject_id: u64,
    #[serde(flatten)]
    pub payload: RequestPayload,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    /// Actor id of the approver who decided this request, if decided.
    pub approved_by: Option<u64>,
    pub submitted_at: DateTime<Utc>,
    /// Set exactly once, at the terminal transition.
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        self.payload.kind()
    }
}
