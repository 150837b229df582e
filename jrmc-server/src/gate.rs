//! Capability gate
//!
//! Only members registered as exposed can be called remotely. A missing
//! member and a private one produce the same `No such method: <name>!`, so a
//! caller cannot probe for private names.

use crate::method::Method;
use crate::tree::ResourceNode;
use jrmc_core::DispatchError;

/// Look up `name` on `node` and return it only if it is exposed
pub fn gate<'a>(node: &'a dyn ResourceNode, name: &str) -> Result<&'a dyn Method, DispatchError> {
    match node.member(name) {
        Some(member) if member.is_exposed() => Ok(member.method()),
        found => {
            tracing::debug!(method = %name, private = found.is_some(), "Method rejected by gate");
            Err(DispatchError::not_exposed(name))
        }
    }
}
