pub mod history;
pub mod lifecycle;
pub mod role_view;
pub mod scheduler;
pub mod store;

pub use history::HistoryCache;
pub use lifecycle::LifecycleController;
pub use role_view::{project, ActionableRequest, RequestAction, ViewModel};
pub use scheduler::PollScheduler;
pub use store::RequestStore;
