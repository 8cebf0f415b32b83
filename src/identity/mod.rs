//! Identity, sessions, and privilege resolution.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod privilege;
mod provider;
mod resolver;
mod session;
pub mod demo;

pub use demo::DemoDirectory;
pub use principal::{AuthContext, AuthUser};
pub use privilege::{Privilege, UnknownPrivilege};
pub use provider::{IdentityStore, RoleStore};
pub use resolver::{PrivilegeResolver, ResolveError, DEFAULT_LOOKUP_TIMEOUT};
pub use session::{Session, SessionManager, SessionToken};
