use crate::core::history::HistoryCache;
use crate::core::store::RequestStore;
use crate::model::{Actor, HistoryEntry, Request, RequestStatus};

/// Controls a row may render for the current viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Approve,
    Reject,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct ActionableRequest {
    pub request: Request,
    pub actions: Vec<RequestAction>,
}

/// What one screen renders for one viewer. Pure data, no side effects.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub actionable: Vec<ActionableRequest>,
    /// Approver only. Submitters see their own resolved requests as
    /// action-less rows in `actionable` (they stay in the store), not here.
    pub history: Vec<HistoryEntry>,
}

/// Projects the store and cache into the role's view.
///
/// Approvers see every pending request with approve/reject controls plus the
/// decided history. Submitters see their own requests, with a cancel control
/// only while pending; resolved ones render read-only.
pub fn project(actor: &Actor, store: &RequestStore, history: &HistoryCache) -> ViewModel {
    if actor.role.is_approver() {
        let actionable = store
            .pending()
            .into_iter()
            .map(|request| ActionableRequest {
                request,
                actions: vec![RequestAction::Approve, RequestAction::Reject],
            })
            .collect();
        return ViewModel {
            actionable,
            history: history.entries(),
        };
    }

    let own = actor.employee_id;
    let actionable = store
        .all()
        .into_iter()
        .filter(|r| Some(r.subject_id) == own)
        .map(|request| {
            let actions = if request.status == RequestStatus::Pending {
                vec![RequestAction::Cancel]
            } else {
                Vec::new()
            };
            ActionableRequest { request, actions }
        })
        .collect();

    ViewModel {
        actionable,
        history: Vec::new(),
    }
}
