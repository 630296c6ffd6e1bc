pub mod error;
pub mod items;
pub mod lost_found;
pub mod messages;
pub mod routes;

pub use error::ApiError;
pub use routes::{create_router, AppState};
