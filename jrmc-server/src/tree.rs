//! Resource tree
//!
//! Requests address methods by path: `/math/triple` is the member `triple` of
//! the node reached by looking up `math` from the root. Every node offers the
//! same two lookups through [`ResourceNode`]:
//!
//! - `lookup(key)`: a child node, or `None`
//! - `member(name)`: a registered method together with its exposed flag
//!
//! [`Resource`] is the stock node. It can hold children (a namespace),
//! methods (a service), or both.
//!
//! # Sub-applications
//!
//! `lookup` only hands out nodes the tree already owns. Paths whose targets
//! are not known up front (rows of a table, say) are served by mounting an
//! [`Application`] with [`Resource::mount_app`]. Resolution stops at the
//! mount point and the application receives the remaining segments, the
//! method name and the params, answering the whole call itself. An
//! [`ApplicationNode`] can also be used as the root, in which case it
//! answers every request.
//!
//! # Exposure
//!
//! Whether a method may be called remotely is decided when it is registered
//! (`expose` vs `register_private`), never from its name at call time.
//!
//! # Examples
//!
//! ```rust
//! use jrmc_server::{from_typed_fn, Resource, ResourceNode};
//!
//! let math = Resource::new()
//!     .with_method("triple", from_typed_fn(|(x,): (i64,)| Ok::<_, String>(3 * x)))
//!     .with_private("secret", from_typed_fn(|(x,): (i64,)| Ok::<_, String>(x)));
//!
//! let root = Resource::new().with_child("math", math);
//!
//! let math = root.lookup("math").unwrap();
//! assert!(math.member("triple").unwrap().is_exposed());
//! assert!(!math.member("secret").unwrap().is_exposed());
//! ```

use crate::method::{Application, Method};
use std::collections::HashMap;
use std::fmt;

/// A node of the resource tree
///
/// Implementations must be `Send + Sync`: one tree is shared, read-only, by
/// every concurrent dispatch.
pub trait ResourceNode: Send + Sync {
    /// Child node registered under `key`
    fn lookup(&self, key: &str) -> Option<&dyn ResourceNode>;

    /// Method registered under `name`, exposed or not
    fn member(&self, name: &str) -> Option<&Member>;

    /// Whether the node itself may be traversed under
    /// [`ResolvePolicy::ExposedSegments`](crate::ResolvePolicy::ExposedSegments)
    fn is_exposed(&self) -> bool {
        true
    }

    /// Application answering every call at or below this node
    ///
    /// When this returns `Some`, resolution stops here and neither `lookup`
    /// nor `member` is consulted.
    fn application(&self) -> Option<&dyn Application> {
        None
    }
}

/// A registered method and its exposed flag
pub struct Member {
    exposed: bool,
    method: Box<dyn Method>,
}

impl Member {
    /// A member callable by remote clients
    pub fn exposed(method: Box<dyn Method>) -> Self {
        Self {
            exposed: true,
            method,
        }
    }

    /// A member only reachable from local code
    pub fn private(method: Box<dyn Method>) -> Self {
        Self {
            exposed: false,
            method,
        }
    }

    pub fn is_exposed(&self) -> bool {
        self.exposed
    }

    pub fn method(&self) -> &dyn Method {
        self.method.as_ref()
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("exposed", &self.exposed)
            .finish_non_exhaustive()
    }
}

/// Node delegating everything below it to an [`Application`]
///
/// ```rust
/// use jrmc_server::{dispatch, from_app_fn, ApplicationNode};
/// use serde_json::json;
///
/// let root = ApplicationNode::new(from_app_fn(|path, method, params| {
///     Ok(json!([path.join("/"), method, params.len()]))
/// }));
///
/// let response = dispatch(&root, json!({"id": 1, "resource": "/a/b", "method": "m", "params": [0]}));
/// assert_eq!(response.into_value(), json!({"id": 1, "result": ["a/b", "m", 1]}));
/// ```
pub struct ApplicationNode {
    app: Box<dyn Application>,
}

impl ApplicationNode {
    pub fn new(app: Box<dyn Application>) -> Self {
        Self { app }
    }
}

impl ResourceNode for ApplicationNode {
    fn lookup(&self, _key: &str) -> Option<&dyn ResourceNode> {
        None
    }

    fn member(&self, _name: &str) -> Option<&Member> {
        None
    }

    fn application(&self) -> Option<&dyn Application> {
        Some(self.app.as_ref())
    }
}

impl fmt::Debug for ApplicationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationNode").finish_non_exhaustive()
    }
}

/// Stock resource node: named children plus a method table
pub struct Resource {
    children: HashMap<String, Box<dyn ResourceNode>>,
    members: HashMap<String, Member>,
    exposed: bool,
}

impl Resource {
    /// Empty, traversable node
    pub fn new() -> Self {
        Self {
            children: HashMap::new(),
            members: HashMap::new(),
            exposed: true,
        }
    }

    /// Empty node that `ResolvePolicy::ExposedSegments` refuses to traverse
    pub fn hidden() -> Self {
        Self {
            exposed: false,
            ..Self::new()
        }
    }

    /// Attach `child` under `key`, replacing any previous child
    pub fn mount(&mut self, key: impl Into<String>, child: impl ResourceNode + 'static) -> &mut Self {
        self.children.insert(key.into(), Box::new(child));
        self
    }

    /// Mount `app` under `key`; it answers every call addressed below `key`
    pub fn mount_app(&mut self, key: impl Into<String>, app: Box<dyn Application>) -> &mut Self {
        self.mount(key, ApplicationNode::new(app))
    }

    /// Register a remotely callable method
    pub fn expose(&mut self, name: impl Into<String>, method: Box<dyn Method>) -> &mut Self {
        self.members.insert(name.into(), Member::exposed(method));
        self
    }

    /// Register a method that remote callers cannot reach
    pub fn register_private(&mut self, name: impl Into<String>, method: Box<dyn Method>) -> &mut Self {
        self.members.insert(name.into(), Member::private(method));
        self
    }

    /// Builder form of [`mount`](Self::mount)
    pub fn with_child(mut self, key: impl Into<String>, child: impl ResourceNode + 'static) -> Self {
        self.mount(key, child);
        self
    }

    /// Builder form of [`mount_app`](Self::mount_app)
    pub fn with_app(mut self, key: impl Into<String>, app: Box<dyn Application>) -> Self {
        self.mount_app(key, app);
        self
    }

    /// Builder form of [`expose`](Self::expose)
    pub fn with_method(mut self, name: impl Into<String>, method: Box<dyn Method>) -> Self {
        self.expose(name, method);
        self
    }

    /// Builder form of [`register_private`](Self::register_private)
    pub fn with_private(mut self, name: impl Into<String>, method: Box<dyn Method>) -> Self {
        self.register_private(name, method);
        self
    }

    /// Names of the child nodes, unordered
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Names of the exposed methods, unordered
    pub fn exposed_methods(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .filter(|(_, member)| member.is_exposed())
            .map(|(name, _)| name.as_str())
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceNode for Resource {
    fn lookup(&self, key: &str) -> Option<&dyn ResourceNode> {
        self.children.get(key).map(|child| child.as_ref())
    }

    fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    fn is_exposed(&self) -> bool {
        self.exposed
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut children: Vec<_> = self.children.keys().collect();
        children.sort();
        let mut members: Vec<_> = self.members.keys().collect();
        members.sort();
        f.debug_struct("Resource")
            .field("children", &children)
            .field("members", &members)
            .field("exposed", &self.exposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{from_app_fn, from_fn};
    use serde_json::json;

    fn constant(value: i64) -> Box<dyn Method> {
        from_fn(move |_| Ok(json!(value)))
    }

    #[test]
    fn test_namespace_and_service_in_one_node() {
        let root = Resource::new()
            .with_child("a", Resource::new())
            .with_method("ping", constant(1));

        assert!(root.lookup("a").is_some());
        assert!(root.member("ping").is_some());
        assert!(root.lookup("ping").is_none());
        assert!(root.member("a").is_none());
    }

    #[test]
    fn test_mount_replaces_child() {
        let mut root = Resource::new();
        root.mount("x", Resource::new().with_method("one", constant(1)));
        root.mount("x", Resource::new().with_method("two", constant(2)));

        let x = root.lookup("x").unwrap();
        assert!(x.member("one").is_none());
        assert!(x.member("two").is_some());
    }

    #[test]
    fn test_exposed_flag_is_set_at_registration() {
        let mut node = Resource::new();
        node.expose("public", constant(1))
            .register_private("_internal", constant(2));

        assert!(node.member("public").unwrap().is_exposed());
        assert!(!node.member("_internal").unwrap().is_exposed());

        let mut names: Vec<_> = node.exposed_methods().collect();
        names.sort();
        assert_eq!(names, vec!["public"]);
    }

    #[test]
    fn test_private_member_still_callable_locally() {
        let node = Resource::new().with_private("secret", constant(42));
        let member = node.member("secret").unwrap();
        assert_eq!(member.method().call(&[]).unwrap(), json!(42));
    }

    #[test]
    fn test_hidden_node() {
        assert!(Resource::new().is_exposed());
        assert!(!Resource::hidden().is_exposed());
    }

    #[test]
    fn test_debug_lists_names() {
        let node = Resource::new()
            .with_child("b", Resource::new())
            .with_method("m", constant(0));
        let debug = format!("{:?}", node);
        assert!(debug.contains("\"b\""));
        assert!(debug.contains("\"m\""));
    }

    #[test]
    fn test_mounted_app_is_an_opaque_child() {
        let root = Resource::new().with_app("rows", from_app_fn(|_, _, _| Ok(json!(null))));

        let rows = root.lookup("rows").unwrap();
        assert!(rows.application().is_some());
        assert!(rows.lookup("1").is_none());
        assert!(rows.member("get").is_none());
        assert!(root.application().is_none());
    }
}
