pub mod auth;
pub mod response;

pub use auth::{require_token, resolve_token, TOKEN_HEADER};
pub use response::{ApiResponse, ApiResult};
