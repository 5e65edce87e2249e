pub mod employee;
pub mod history;
pub mod request;
pub mod role;

pub use employee::Employee;
pub use history::HistoryEntry;
pub use request::{Request, RequestKind, RequestPayload, RequestStatus};
pub use role::{Actor, Role};
