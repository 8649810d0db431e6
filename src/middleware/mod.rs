pub mod bearer;
pub mod body_logging;
pub mod identity;

pub use bearer::require_bearer;
pub use body_logging::log_request_body;
pub use identity::{deserialize_user, CurrentUser, ACCESS_TOKEN_HEADER};
