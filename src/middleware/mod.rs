//! HTTP middleware shared by every route.
//!
//! Authentication lives in [`crate::auth::middleware`]; this module only
//! carries request logging.

pub mod logging;

pub use logging::request_logging;
