//! One module per API area. Each operation has a pure `build_*` method and
//! a typed async method that executes it and dispatches the response.
//!
//! Delete and grant endpoints decode into `serde_json::Value`: their bodies
//! carry nothing callers need beyond the status.

mod agent_tools;
mod assignments;
mod grants;
mod policies;
mod roles;
mod teams;
mod tools;
mod users;

pub(crate) const OK: &[u16] = &[200];
pub(crate) const CREATED: &[u16] = &[200, 201];
pub(crate) const DELETED: &[u16] = &[200, 204];
