pub mod api;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod state;

pub use api::{create_app, start_server};
pub use errors::ApiError;
pub use state::AppState;
