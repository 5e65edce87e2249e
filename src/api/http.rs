use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::backend::{DecisionUpdate, RequestBackend};
use super::ApiError;
use crate::config::Config;
use crate::model::{Employee, Request, RequestKind, RequestPayload, RequestStatus};

/// reqwest-backed implementation of `RequestBackend` against the HRM REST
/// API. Every response goes through one strict typed decoding step; a shape
/// we do not recognize fails loudly instead of defaulting to an empty list.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        HttpBackend {
            client: Client::new(),
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Err(ApiError::Conflict);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn list(&self, kind: RequestKind, query: &[(&str, String)]) -> Result<Vec<Request>, ApiError> {
        let resp = self
            .client
            .get(self.url(kind.slug()))
            .query(query)
            .send()
            .await?;
        let envelope: ListEnvelope = Self::decode(resp).await?;
        envelope
            .data
            .into_iter()
            .map(|row| row.into_request(kind))
            .collect()
    }
}

#[async_trait::async_trait]
impl RequestBackend for HttpBackend {
    async fn create(
        &self,
        subject_id: u64,
        payload: RequestPayload,
    ) -> Result<Request, ApiError> {
        let kind = payload.kind();
        let mut body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        body["employee_id"] = json!(subject_id);
        let resp = self
            .client
            .post(self.url(kind.slug()))
            .json(&body)
            .send()
            .await?;
        let row: WireRequest = Self::decode(resp).await?;
        row.into_request(kind)
    }

    async fn delete(&self, kind: RequestKind, id: u64) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url(&format!("{}/{}", kind.slug(), id)))
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Err(ApiError::Conflict);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn update_status(
        &self,
        kind: RequestKind,
        id: u64,
        update: DecisionUpdate,
    ) -> Result<Request, ApiError> {
        let resp = self
            .client
            .put(self.url(&format!("{}/{}/status", kind.slug(), id)))
            .json(&json!({
                "status": update.status,
                "admin_notes": update.admin_notes,
                "decided_by": update.decided_by,
            }))
            .send()
            .await?;
        let row: WireRequest = Self::decode(resp).await?;
        row.into_request(kind)
    }

    async fn list_all(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError> {
        self.list(kind, &[]).await
    }

    async fn list_by_subject(
        &self,
        kind: RequestKind,
        subject_id: u64,
    ) -> Result<Vec<Request>, ApiError> {
        self.list(kind, &[("employee_id", subject_id.to_string())])
            .await
    }

    async fn list_approved(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError> {
        self.list(kind, &[("status", "approved".to_string())]).await
    }

    async fn list_rejected(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError> {
        self.list(kind, &[("status", "rejected".to_string())]).await
    }

    async fn get_employee(&self, id: u64) -> Result<Option<Employee>, ApiError> {
        let resp = self
            .client
            .get(self.url(&format!("employee/{}", id)))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::decode(resp).await?))
    }
}

#[derive(Deserialize)]
struct ListEnvelope {
    data: Vec<WireRequest>,
}

/// Row shape shared by all three kind endpoints. Kind-specific columns are
/// optional here and required by `into_request`, so a row missing its kind's
/// fields is a decode error rather than a silently empty payload.
#[derive(Serialize, Deserialize)]
struct WireRequest {
    id: u64,
    employee_id: u64,
    status: String,
    #[serde(default)]
    admin_notes: Option<String>,
    #[serde(default)]
    approved_by: Option<u64>,
    #[serde(default)]
    approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,

    // leave
    #[serde(default)]
    leave_type: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    // leave + timesheet
    #[serde(default)]
    reason: Option<String>,
    // timesheet + reimbursement
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    new_time_in: Option<String>,
    #[serde(default)]
    new_time_out: Option<String>,
    // reimbursement
    #[serde(default)]
    expense_type: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    receipt_path: Option<String>,
}

impl WireRequest {
    fn into_request(self, kind: RequestKind) -> Result<Request, ApiError> {
        fn need<T>(v: Option<T>, field: &str) -> Result<T, ApiError> {
            v.ok_or_else(|| ApiError::Decode(format!("missing field `{field}`")))
        }

        let payload = match kind {
            RequestKind::LeaveRequest => RequestPayload::Leave {
                leave_type: need(self.leave_type, "leave_type")?,
                start_date: need(self.start_date, "start_date")?,
                end_date: need(self.end_date, "end_date")?,
                reason: need(self.reason, "reason")?,
            },
            RequestKind::TimesheetAdjustment => RequestPayload::Timesheet {
                date: need(self.date, "date")?,
                new_time_in: need(self.new_time_in, "new_time_in")?,
                new_time_out: need(self.new_time_out, "new_time_out")?,
                reason: need(self.reason, "reason")?,
            },
            RequestKind::Reimbursement => RequestPayload::Reimbursement {
                expense_type: need(self.expense_type, "expense_type")?,
                amount: need(self.amount, "amount")?,
                date: need(self.date, "date")?,
                description: need(self.description, "description")?,
                receipt_path: self.receipt_path,
            },
        };

        let status: RequestStatus = self
            .status
            .parse()
            .map_err(|_| ApiError::Decode(format!("unknown status `{}`", self.status)))?;

        Ok(Request {
            id: self.id,
            subject_id: self.employee_id,
            payload,
            status,
            admin_notes: self.admin_notes,
            approved_by: self.approved_by,
            submitted_at: self.submitted_at.unwrap_or(self.created_at),
            decided_at: self.approved_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_missing_kind_fields_is_a_decode_error() {
        let row: WireRequest = serde_json::from_value(json!({
            "id": 1,
            "employee_id": 7,
            "status": "pending",
            "created_at": "2025-01-05T09:00:00Z",
            "leave_type": "annual",
            "start_date": "2025-01-10",
            "end_date": "2025-01-12",
            "reason": "trip"
        }))
        .unwrap();
        // A leave row decoded against the reimbursement endpoint must fail,
        // not turn into a defaulted payload.
        let err = row.into_request(RequestKind::Reimbursement).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn unknown_status_fails_loudly() {
        let row: WireRequest = serde_json::from_value(json!({
            "id": 1,
            "employee_id": 7,
            "status": "waitlisted",
            "created_at": "2025-01-05T09:00:00Z",
            "leave_type": "annual",
            "start_date": "2025-01-10",
            "end_date": "2025-01-12",
            "reason": "trip"
        }))
        .unwrap();
        assert!(matches!(
            row.into_request(RequestKind::LeaveRequest),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn submitted_at_falls_back_to_created_at() {
        let row: WireRequest = serde_json::from_value(json!({
            "id": 9,
            "employee_id": 7,
            "status": "pending",
            "created_at": "2025-01-05T09:00:00Z",
            "leave_type": "annual",
            "start_date": "2025-01-10",
            "end_date": "2025-01-12",
            "reason": "trip"
        }))
        .unwrap();
        let req = row.into_request(RequestKind::LeaveRequest).unwrap();
        assert_eq!(req.submitted_at, req.created_at);
    }
}
