pub mod access_status;
pub mod approval_service;
pub use approval_service::ApprovalService;
pub mod auth;
pub use auth::AuthService;
pub mod compensation;
pub mod grant_service;
pub use grant_service::GrantService;
pub mod user_service;
pub use user_service::UserService;
