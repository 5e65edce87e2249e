use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{Request, RequestKind, RequestPayload, RequestStatus};

/// Immutable snapshot of a request at the moment it reached a terminal state,
/// plus a denormalized subject name so history rows render without re-joining
/// employee data.
///
/// Created exactly once per request; never mutated. Lives in the
/// `HistoryCache` independently of the originating store entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub request: Request,
    pub subject_name: String,
}

impl HistoryEntry {
    pub fn kind(&self) -> RequestKind {
        self.request.kind()
    }

    /// Fixed export column headers for one kind. Order is part of the
    /// contract consumed by the download screens.
    pub fn columns(kind: RequestKind) -> &'static [&'static str] {
        match kind {
            RequestKind::LeaveRequest => &[
                "id",
                "employee_id",
                "type",
                "start",
                "end",
                "reason",
                "status",
                "admin_notes",
                "approved_by",
                "approved_at",
                "created_at",
                "updated_at",
            ],
            RequestKind::TimesheetAdjustment => &[
                "id",
                "employee_id",
                "date",
                "new_time_in",
                "new_time_out",
                "reason",
                "status",
                "admin_notes",
                "approved_by",
                "approved_at",
                "submitted_at",
                "created_at",
                "updated_at",
            ],
            RequestKind::Reimbursement => &[
                "id",
                "employee_id",
                "type",
                "amount",
                "date",
                "description",
                "receipt_path",
                "status",
                "admin_notes",
                "approved_by",
                "approved_at",
                "submitted_at",
                "created_at",
                "updated_at",
            ],
        }
    }

    /// Flattens this entry into one export row matching `columns(kind)`.
    pub fn to_row(&self) -> Vec<String> {
        let r = &self.request;
        let mut row = vec![r.id.to_string(), r.subject_id.to_string()];

        match &r.payload {
            RequestPayload::Leave {
                leave_type,
                start_date,
                end_date,
                reason,
            } => {
                row.push(leave_type.clone());
                row.push(start_date.to_string());
                row.push(end_date.to_string());
                row.push(reason.clone());
                row.push(r.status.to_string());
                row.push(opt_str(&r.admin_notes));
                row.push(opt_u64(r.approved_by));
                row.push(opt_ts(r.decided_at));
                row.push(ts(r.created_at));
                row.push(opt_ts(r.updated_at));
            }
            RequestPayload::Timesheet {
                date,
                new_time_in,
                new_time_out,
                reason,
            } => {
                row.push(date.to_string());
                row.push(new_time_in.clone());
                row.push(new_time_out.clone());
                row.push(reason.clone());
                row.push(r.status.to_string());
                row.push(opt_str(&r.admin_notes));
                row.push(opt_u64(r.approved_by));
                row.push(opt_ts(r.decided_at));
                row.push(ts(r.submitted_at));
                row.push(ts(r.created_at));
                row.push(opt_ts(r.updated_at));
            }
            RequestPayload::Reimbursement {
                expense_type,
                amount,
                date,
                description,
                receipt_path,
            } => {
                row.push(expense_type.clone());
                row.push(format!("{amount:.2}"));
                row.push(date.to_string());
                row.push(description.clone());
                row.push(opt_str(receipt_path));
                row.push(r.status.to_string());
                row.push(opt_str(&r.admin_notes));
                row.push(opt_u64(r.approved_by));
                row.push(opt_ts(r.decided_at));
                row.push(ts(r.submitted_at));
                row.push(ts(r.created_at));
                row.push(opt_ts(r.updated_at));
            }
        }
        row
    }
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

fn opt_ts(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339()).unwrap_or_default()
}

fn opt_str(s: &Option<String>) -> String {
    s.clone().unwrap_or_default()
}

fn opt_u64(v: Option<u64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}
