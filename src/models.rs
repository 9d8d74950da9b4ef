pub mod auth;
pub mod org;
pub mod rbac;
