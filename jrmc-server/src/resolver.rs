//! Resource path resolution
//!
//! A path is split on `/` with empty segments dropped, so `//a//b/` and `a/b`
//! name the same node and `/` or `""` name the root. Each segment is looked
//! up in turn; the first miss ends resolution with
//! `Resource not found: <path as given>`.
//!
//! Walking stops early at a node carrying an application: everything after
//! the mount point belongs to the application, not to the tree.

use crate::method::Application;
use crate::tree::ResourceNode;
use jrmc_core::DispatchError;
use std::fmt;

/// How strictly intermediate nodes are checked during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolvePolicy {
    /// Only the target method's exposed flag matters
    #[default]
    LeafOnly,
    /// Every node reached through a segment must also report
    /// [`ResourceNode::is_exposed`]; a hidden node is treated as missing
    ExposedSegments,
}

/// Where a resource path leads
pub enum Target<'a, 'p> {
    /// A tree node; its members still go through the gate
    Node(&'a dyn ResourceNode),
    /// A mounted application, with the segments up to its mount point and
    /// the ones left for it to interpret
    Application {
        app: &'a dyn Application,
        mount: Vec<&'p str>,
        rest: Vec<&'p str>,
    },
}

impl<'a, 'p> Target<'a, 'p> {
    /// The node, unless the path ended in an application
    pub fn node(&self) -> Option<&'a dyn ResourceNode> {
        match self {
            Target::Node(node) => Some(*node),
            Target::Application { .. } => None,
        }
    }
}

impl fmt::Debug for Target<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Node(_) => f.write_str("Node"),
            Target::Application { mount, rest, .. } => f
                .debug_struct("Application")
                .field("mount", mount)
                .field("rest", rest)
                .finish(),
        }
    }
}

/// Non-empty segments of a resource path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Walk `path` from `root`
///
/// # Examples
///
/// ```rust
/// use jrmc_server::resolver::{resolve, ResolvePolicy};
/// use jrmc_server::Resource;
///
/// let root = Resource::new().with_child("a", Resource::new().with_child("b", Resource::new()));
///
/// assert!(resolve(&root, "//a//b/", ResolvePolicy::LeafOnly).is_ok());
///
/// let err = resolve(&root, "/a/x", ResolvePolicy::LeafOnly).err().unwrap();
/// assert_eq!(err.to_string(), "Resource not found: /a/x");
/// ```
pub fn resolve<'a, 'p>(
    root: &'a dyn ResourceNode,
    path: &'p str,
    policy: ResolvePolicy,
) -> Result<Target<'a, 'p>, DispatchError> {
    let all: Vec<&str> = segments(path).collect();

    let mut node = root;
    for (depth, segment) in all.iter().enumerate() {
        if let Some(app) = node.application() {
            return Ok(Target::Application {
                app,
                mount: all[..depth].to_vec(),
                rest: all[depth..].to_vec(),
            });
        }

        node = match node.lookup(segment) {
            Some(child) if policy == ResolvePolicy::LeafOnly || child.is_exposed() => child,
            _ => {
                tracing::debug!(path = %path, segment = %segment, "Resource lookup missed");
                return Err(DispatchError::resource_not_found(path));
            }
        };
    }

    match node.application() {
        Some(app) => Ok(Target::Application {
            app,
            mount: all,
            rest: Vec::new(),
        }),
        None => Ok(Target::Node(node)),
    }
}
