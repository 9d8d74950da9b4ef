pub mod ports;
pub use ports::{GrantStore, OrgUnitDirectory, RoleCatalog, UserStore};
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RoleRepository;
pub mod grant_repo;
pub use grant_repo::GrantRepository;
pub mod org_repo;
pub use org_repo::OrgUnitRepository;

#[cfg(test)]
pub mod memory;
