pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod images;
pub mod janitor;
pub mod metrics_server;
pub mod observability;
pub mod store;
pub mod validation;
pub mod vision;

pub use error::{ReadingError, ReadingResult};
pub use handlers::{build_router, AppState};
