use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, DecisionUpdate, RequestBackend};
use crate::core::history::HistoryCache;
use crate::core::store::RequestStore;
use crate::error::FlowError;
use crate::model::{Actor, HistoryEntry, Request, RequestPayload, RequestStatus};

/// Owns every status transition for one request kind.
///
/// State machine: Pending -> Approved | Rejected (approver) and
/// Pending -> Cancelled (owner). Terminal states absorb; a transition on a
/// terminal request is a `Transition` error, never a silent overwrite.
pub struct LifecycleController {
    backend: Arc<dyn RequestBackend>,
    store: Arc<RequestStore>,
    history: Arc<HistoryCache>,
    /// Ids with a cancel/decide currently on the wire. A second transition
    /// on the same id is refused instead of racing the first.
    in_flight: Mutex<HashSet<u64>>,
}

impl LifecycleController {
    pub fn new(
        backend: Arc<dyn RequestBackend>,
        store: Arc<RequestStore>,
        history: Arc<HistoryCache>,
    ) -> Self {
        debug_assert_eq!(store.kind(), history.kind());
        LifecycleController {
            backend,
            store,
            history,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    /// Validates and submits a new request. No network call is made until
    /// the payload passed every client-side check.
    pub async fn submit(
        &self,
        actor: &Actor,
        subject_id: u64,
        payload: RequestPayload,
    ) -> Result<Request, FlowError> {
        if payload.kind() != self.store.kind() {
            return Err(FlowError::validation(
                "kind",
                format!("expected {}", self.store.kind()),
            ));
        }
        validate_payload(&payload)?;

        // Employees submit for themselves; HR/Admin may file on behalf.
        if !actor.role.is_approver() && actor.employee_id != Some(subject_id) {
            return Err(FlowError::Authorization(
                "cannot submit a request for another employee".into(),
            ));
        }

        let employee = self.backend.get_employee(subject_id).await?;
        if employee.is_none() {
            return Err(FlowError::validation("subject_id", "unknown employee"));
        }

        let request = self.backend.create(subject_id, payload).await?;
        tracing::info!(
            request_id = request.id,
            subject_id,
            kind = %request.kind(),
            "Request submitted"
        );
        self.store.upsert(request.clone());
        Ok(request)
    }

    /// Submitter-initiated cancellation. Only the owner may cancel, and only
    /// while the request is still pending. Cancellation removes the request
    /// outright; it does not produce a history entry.
    pub async fn cancel(&self, request_id: u64, acting_subject_id: u64) -> Result<(), FlowError> {
        let _guard = self.begin_transition(request_id)?;

        let current = self.store.get(request_id).ok_or_else(|| {
            FlowError::Transition("request is no longer in the working set".into())
        })?;
        if current.status.is_terminal() {
            return Err(FlowError::Transition(format!(
                "request {} is already {}",
                request_id, current.status
            )));
        }
        if current.subject_id != acting_subject_id {
            return Err(FlowError::Authorization(
                "only the requesting employee may cancel".into(),
            ));
        }

        match self.backend.delete(current.kind(), request_id).await {
            Ok(()) => {}
            Err(ApiError::Conflict) => {
                return Err(FlowError::Transition(format!(
                    "request {request_id} was already decided"
                )))
            }
            Err(e) => return Err(FlowError::Fetch(e)),
        }

        tracing::info!(request_id, subject_id = acting_subject_id, "Request cancelled");
        self.store.remove(request_id);
        Ok(())
    }

    /// Approver decision. On success the request leaves the pending view and
    /// exactly one history entry is appended; on any failure nothing moves.
    pub async fn decide(
        &self,
        actor: &Actor,
        request_id: u64,
        decision: RequestStatus,
        admin_notes: Option<String>,
    ) -> Result<HistoryEntry, FlowError> {
        if !matches!(decision, RequestStatus::Approved | RequestStatus::Rejected) {
            return Err(FlowError::validation(
                "decision",
                "must be approved or rejected",
            ));
        }
        if !actor.role.is_approver() {
            return Err(FlowError::Authorization("HR/Admin only".into()));
        }

        let _guard = self.begin_transition(request_id)?;

        let current = self.store.get(request_id).ok_or_else(|| {
            FlowError::Transition("request is no longer pending, reload the list".into())
        })?;
        if current.status.is_terminal() {
            return Err(FlowError::Transition(format!(
                "request {} is already {}",
                request_id, current.status
            )));
        }

        let decided = match self
            .backend
            .update_status(
                current.kind(),
                request_id,
                DecisionUpdate {
                    status: decision,
                    admin_notes: admin_notes.clone(),
                    decided_by: actor.user_id,
                },
            )
            .await
        {
            Ok(decided) => decided,
            Err(ApiError::Conflict) => {
                return Err(FlowError::Transition(format!(
                    "request {request_id} was already decided"
                )))
            }
            Err(e) => return Err(FlowError::Fetch(e)),
        };

        let entry = HistoryEntry {
            subject_name: self.subject_name(decided.subject_id).await,
            request: decided,
        };
        tracing::info!(
            request_id,
            decision = %decision,
            decided_by = actor.user_id,
            "Request decided"
        );
        self.store.remove(request_id);
        self.history.append(entry.clone());
        Ok(entry)
    }

    /// Re-fetches the working set for the viewer. The approver view holds
    /// pending requests of every subject; the submitter view holds all of
    /// their own, terminal included. A failed fetch leaves the last-known
    /// list untouched.
    ///
    /// The store revision is captured before the fetch: if a local
    /// transition lands while the response is in flight, the response is
    /// stale and gets dropped, so the transition stays visible immediately
    /// instead of flickering back until the next poll.
    pub async fn refresh(&self, actor: &Actor) -> Result<(), FlowError> {
        let kind = self.store.kind();
        let since = self.store.revision();
        let requests = if actor.role.is_approver() {
            let mut all = self.backend.list_all(kind).await?;
            all.retain(|r| r.status == RequestStatus::Pending);
            all
        } else {
            let subject_id = actor.employee_id.ok_or_else(|| {
                FlowError::Authorization("no employee profile".into())
            })?;
            self.backend.list_by_subject(kind, subject_id).await?
        };
        if !self.store.replace_all_if_unchanged(since, requests) {
            tracing::debug!(kind = %kind, "Dropping refresh result, store changed during fetch");
        }
        Ok(())
    }

    /// Replaces the history cache with the server's approved + rejected
    /// union. Approver screens call this on mount; the local cache only
    /// bridges the gap until the server is reachable again.
    pub async fn reconcile_history(&self, actor: &Actor) -> Result<(), FlowError> {
        if !actor.role.is_approver() {
            return Err(FlowError::Authorization("HR/Admin only".into()));
        }
        let kind = self.store.kind();
        let approved = self.backend.list_approved(kind).await?;
        let rejected = self.backend.list_rejected(kind).await?;

        let mut approved_entries = Vec::with_capacity(approved.len());
        for request in approved {
            approved_entries.push(HistoryEntry {
                subject_name: self.subject_name(request.subject_id).await,
                request,
            });
        }
        let mut rejected_entries = Vec::with_capacity(rejected.len());
        for request in rejected {
            rejected_entries.push(HistoryEntry {
                subject_name: self.subject_name(request.subject_id).await,
                request,
            });
        }

        self.history.reconcile(approved_entries, rejected_entries);
        Ok(())
    }

    /// Denormalized display name for history rows. A directory miss falls
    /// back to a stable placeholder so local and reconciled entries stay
    /// field-equal.
    async fn subject_name(&self, subject_id: u64) -> String {
        match self.backend.get_employee(subject_id).await {
            Ok(Some(employee)) => employee.display_name(),
            Ok(None) => format!("Employee #{subject_id}"),
            Err(e) => {
                tracing::warn!(error = %e, subject_id, "Employee lookup failed");
                format!("Employee #{subject_id}")
            }
        }
    }

    fn begin_transition(&self, request_id: u64) -> Result<InFlightGuard<'_>, FlowError> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(request_id) {
            return Err(FlowError::Transition(format!(
                "a transition for request {request_id} is already in flight"
            )));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            request_id,
        })
    }
}

struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<u64>>,
    request_id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.request_id);
    }
}

/// Client-side payload checks, run before any network call. The error names
/// the first invalid field in declaration order.
fn validate_payload(payload: &RequestPayload) -> Result<(), FlowError> {
    match payload {
        RequestPayload::Leave {
            leave_type,
            start_date,
            end_date,
            reason,
        } => {
            if leave_type.trim().is_empty() {
                return Err(FlowError::validation("leave_type", "required"));
            }
            if start_date > end_date {
                return Err(FlowError::validation(
                    "start_date",
                    "cannot be after end_date",
                ));
            }
            if reason.trim().is_empty() {
                return Err(FlowError::validation("reason", "required"));
            }
        }
        RequestPayload::Timesheet {
            new_time_in,
            new_time_out,
            reason,
            ..
        } => {
            let time_in = parse_hhmm(new_time_in)
                .ok_or_else(|| FlowError::validation("new_time_in", "must be HH:MM (24-hour)"))?;
            let time_out = parse_hhmm(new_time_out)
                .ok_or_else(|| FlowError::validation("new_time_out", "must be HH:MM (24-hour)"))?;
            // Overnight spans are not supported; the end must be strictly later.
            if time_in >= time_out {
                return Err(FlowError::validation(
                    "new_time_out",
                    "must be after new_time_in",
                ));
            }
            if reason.trim().is_empty() {
                return Err(FlowError::validation("reason", "required"));
            }
        }
        RequestPayload::Reimbursement {
            expense_type,
            amount,
            description,
            ..
        } => {
            if expense_type.trim().is_empty() {
                return Err(FlowError::validation("expense_type", "required"));
            }
            if !amount.is_finite() || *amount <= 0.0 {
                return Err(FlowError::validation(
                    "amount",
                    "must be a positive number",
                ));
            }
            if description.trim().is_empty() {
                return Err(FlowError::validation("description", "required"));
            }
        }
    }
    Ok(())
}

/// Strict `HH:MM` 24-hour parse; returns minutes since midnight. Rejects
/// anything chrono would tolerate loosely ("7:30", trailing seconds).
fn parse_hhmm(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let digit = |b: u8| (b as char).to_digit(10);
    let hour = digit(bytes[0])? * 10 + digit(bytes[1])?;
    let minute = digit(bytes[3])? * 10 + digit(bytes[4])?;
    if hour >= 24 || minute >= 60 {
        return None;
    }
    Some(hour * 60 + minute)
}
