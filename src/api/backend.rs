use async_trait::async_trait;

use super::ApiError;
use crate::model::{Employee, Request, RequestKind, RequestPayload, RequestStatus};

/// Everything sent to the server for a decision transition.
#[derive(Debug, Clone)]
pub struct DecisionUpdate {
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub decided_by: u64,
}

/// The REST operations the lifecycle screens consume. Exact paths are
/// backend-owned; this trait is the seam the controller and tests share.
#[async_trait]
pub trait RequestBackend: Send + Sync {
    /// Creates a request for `subject_id`; the server assigns the id and
    /// returns the stored row with `status = pending`.
    async fn create(
        &self,
        subject_id: u64,
        payload: RequestPayload,
    ) -> Result<Request, ApiError>;

    /// Deletes a pending request (submitter cancellation).
    async fn delete(&self, kind: RequestKind, id: u64) -> Result<(), ApiError>;

    /// Applies an approve/reject decision. Must fail with
    /// `ApiError::Conflict` when the request is no longer pending.
    async fn update_status(
        &self,
        kind: RequestKind,
        id: u64,
        update: DecisionUpdate,
    ) -> Result<Request, ApiError>;

    /// All requests of one kind, any subject (approver view).
    async fn list_all(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError>;

    /// Requests belonging to one subject (submitter view).
    async fn list_by_subject(
        &self,
        kind: RequestKind,
        subject_id: u64,
    ) -> Result<Vec<Request>, ApiError>;

    async fn list_approved(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError>;

    async fn list_rejected(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError>;

    /// Directory lookup; `None` when the id does not resolve to an employee.
    async fn get_employee(&self, id: u64) -> Result<Option<Employee>, ApiError>;
}
