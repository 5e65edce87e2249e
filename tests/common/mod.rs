use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use ess_flow::api::{ApiError, DecisionUpdate, RequestBackend};
use ess_flow::model::{Employee, Request, RequestKind, RequestPayload, RequestStatus};

/// Routes tracing output through the test harness so it shows up with
/// `--nocapture`. Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// In-memory stand-in for the HRM REST backend. Applies the same rules the
/// real server does (id assignment, pending-only updates answered with a
/// conflict otherwise) and counts calls so tests can assert that validation
/// failures never reach the network.
pub struct MockBackend {
    state: Mutex<State>,
    calls: AtomicUsize,
    fail_lists: AtomicBool,
}

struct State {
    next_id: u64,
    seq: i64,
    requests: HashMap<u64, Request>,
    employees: HashMap<u64, Employee>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            state: Mutex::new(State {
                next_id: 1,
                seq: 0,
                requests: HashMap::new(),
                employees: HashMap::new(),
            }),
            calls: AtomicUsize::new(0),
            fail_lists: AtomicBool::new(false),
        }
    }

    pub fn with_employee(self, id: u64, first_name: &str, last_name: &str) -> Self {
        self.state.lock().unwrap().employees.insert(
            id,
            Employee {
                id,
                employee_code: format!("EMP-{id:03}"),
                first_name: first_name.into(),
                last_name: last_name.into(),
                email: format!("{}.{}@company.com", first_name, last_name).to_lowercase(),
                hire_date: "2024-01-01".parse().unwrap(),
                status: "active".into(),
            },
        );
        self
    }

    /// Total backend calls of any sort so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every list endpoint fail until cleared.
    pub fn set_list_failure(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn request(&self, id: u64) -> Option<Request> {
        self.state.lock().unwrap().requests.get(&id).cloned()
    }

    fn tick(state: &mut State) -> DateTime<Utc> {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(state.seq);
        state.seq += 1;
        at
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn lists(&self, kind: RequestKind, f: impl Fn(&Request) -> bool) -> Result<Vec<Request>, ApiError> {
        self.count();
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "backend down".into(),
            });
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .filter(|r| r.kind() == kind && f(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RequestBackend for MockBackend {
    async fn create(
        &self,
        subject_id: u64,
        payload: RequestPayload,
    ) -> Result<Request, ApiError> {
        self.count();
        let mut state = self.state.lock().unwrap();
        let now = Self::tick(&mut state);
        let id = state.next_id;
        state.next_id += 1;
        let request = Request {
            id,
            subject_id,
            payload,
            status: RequestStatus::Pending,
            admin_notes: None,
            approved_by: None,
            submitted_at: now,
            decided_at: None,
            created_at: now,
            updated_at: None,
        };
        state.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn delete(&self, _kind: RequestKind, id: u64) -> Result<(), ApiError> {
        self.count();
        let mut state = self.state.lock().unwrap();
        match state.requests.get(&id) {
            None => Err(ApiError::Status {
                status: 404,
                message: "not found".into(),
            }),
            Some(r) if r.status != RequestStatus::Pending => Err(ApiError::Conflict),
            Some(_) => {
                state.requests.remove(&id);
                Ok(())
            }
        }
    }

    async fn update_status(
        &self,
        _kind: RequestKind,
        id: u64,
        update: DecisionUpdate,
    ) -> Result<Request, ApiError> {
        self.count();
        let mut state = self.state.lock().unwrap();
        let now = Self::tick(&mut state);
        let request = state.requests.get_mut(&id).ok_or(ApiError::Status {
            status: 404,
            message: "not found".into(),
        })?;
        if request.status != RequestStatus::Pending {
            return Err(ApiError::Conflict);
        }
        request.status = update.status;
        request.admin_notes = update.admin_notes;
        request.approved_by = Some(update.decided_by);
        request.decided_at = Some(now);
        request.updated_at = Some(now);
        Ok(request.clone())
    }

    async fn list_all(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError> {
        self.lists(kind, |_| true)
    }

    async fn list_by_subject(
        &self,
        kind: RequestKind,
        subject_id: u64,
    ) -> Result<Vec<Request>, ApiError> {
        self.lists(kind, |r| r.subject_id == subject_id)
    }

    async fn list_approved(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError> {
        self.lists(kind, |r| r.status == RequestStatus::Approved)
    }

    async fn list_rejected(&self, kind: RequestKind) -> Result<Vec<Request>, ApiError> {
        self.lists(kind, |r| r.status == RequestStatus::Rejected)
    }

    async fn get_employee(&self, id: u64) -> Result<Option<Employee>, ApiError> {
        self.count();
        Ok(self.state.lock().unwrap().employees.get(&id).cloned())
    }
}

pub fn leave_payload() -> RequestPayload {
    RequestPayload::Leave {
        leave_type: "Vacation".into(),
        start_date: "2025-01-10".parse().unwrap(),
        end_date: "2025-01-12".parse().unwrap(),
        reason: "trip".into(),
    }
}
