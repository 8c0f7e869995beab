//! Identity and session state for the admin console.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod store;

pub use principal::{Identity, RoleDescriptor, UserPayload};
pub use store::SessionStore;
