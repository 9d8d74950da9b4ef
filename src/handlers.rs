pub mod grants;
pub mod rbac;
pub mod users;
