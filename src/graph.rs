//! The cross-client transient relationship graph.
//!
//! The graph records which surface is the transient child of which exported surface. Both
//! directions are kept so either side resolves in O(1), under a partial bijection invariant:
//! at most one outgoing edge per child and at most one incoming edge per parent identity.
//!
//! Three independent destruction channels can tear an edge down: the child surface dying,
//! the parent-identity surface dying, and an import proxy representing the parent identity
//! dying. Each edge carries an explicit set of armed triggers, and firing any of them
//! consumes the edge. A channel firing after the edge is already gone, as happens when two
//! participants die in the same dispatch turn, is absorbed as a no-op instead of producing
//! a second notification.

use std::hash::Hash;

use rustc_hash::FxHashMap;

bitflags::bitflags! {
    /// Destruction channels still armed for an edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Triggers: u8 {
        /// The child surface was destroyed.
        const CHILD = 1 << 0;
        /// The parent-identity surface was destroyed.
        const PARENT = 1 << 1;
        /// An import proxy representing the parent identity was destroyed.
        const IMPORT = 1 << 2;
    }
}

/// An error from mutating a [`TransientGraph`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum Error {
    /// A surface cannot become its own transient parent.
    #[error("surface cannot be its own transient parent")]
    SelfReference,
}

/// A change to the transient relationship of a pair of surfaces.
///
/// A side is `None` when the entity on that side is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransientChanged<S> {
    pub child: Option<S>,
    pub parent: Option<S>,
}

#[derive(Debug)]
struct Edge<S> {
    child: S,
    armed: Triggers,
}

/// Directed child → parent-identity edges.
///
/// The graph owns no surface or proxy; it holds identities and tolerates any participant
/// vanishing, learning about it only through the destruction channels below.
#[derive(Debug)]
pub(crate) struct TransientGraph<S> {
    /// Child surface to parent identity.
    parents: FxHashMap<S, S>,
    /// Parent identity to its edge.
    edges: FxHashMap<S, Edge<S>>,
}

impl<S> TransientGraph<S>
where
    S: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            parents: FxHashMap::default(),
            edges: FxHashMap::default(),
        }
    }

    /// Establishes `parent` as the transient parent of `child`.
    ///
    /// Existing edges touching either side are detached first: the previous child of
    /// `parent` and the previous parent of `child` both lose their edge, without a separate
    /// removal notification. The replace is signalled once, as the returned added event.
    pub fn set_parent(&mut self, child: S, parent: S) -> Result<TransientChanged<S>, Error> {
        if child == parent {
            return Err(Error::SelfReference);
        }

        // Detach the previous child of this parent.
        if let Some(edge) = self.edges.remove(&parent) {
            self.parents.remove(&edge.child);
        }

        // Detach the previous parent of this child.
        if let Some(old_parent) = self.parents.remove(&child) {
            self.edges.remove(&old_parent);
        }

        self.parents.insert(child.clone(), parent.clone());
        self.edges.insert(
            parent.clone(),
            Edge {
                child: child.clone(),
                armed: Triggers::all(),
            },
        );

        Ok(TransientChanged {
            child: Some(child),
            parent: Some(parent),
        })
    }

    /// The current transient parent of `surface`, if any.
    pub fn transient_for(&self, surface: &S) -> Option<&S> {
        self.parents.get(surface)
    }

    /// The child currently claimed under parent identity `surface`, if any.
    pub fn child_of(&self, surface: &S) -> Option<&S> {
        self.edges.get(surface).map(|edge| &edge.child)
    }

    /// Fires the child-destroyed channel for `surface`.
    pub fn child_destroyed(&mut self, surface: &S) -> Option<TransientChanged<S>> {
        let parent = self.parents.get(surface)?.clone();

        self.consume(&parent, Triggers::CHILD).map(|_| TransientChanged {
            child: None,
            parent: Some(parent),
        })
    }

    /// Fires the parent-destroyed channel for `surface`.
    pub fn parent_destroyed(&mut self, surface: &S) -> Option<TransientChanged<S>> {
        self.consume(surface, Triggers::PARENT).map(|child| TransientChanged {
            child: Some(child),
            parent: None,
        })
    }

    /// Fires the import-destroyed channel for the parent identity an import represented.
    ///
    /// Distinct from [`parent_destroyed`]: the identity surface may still be alive, only one
    /// client's view of it is gone.
    ///
    /// [`parent_destroyed`]: TransientGraph::parent_destroyed
    pub fn import_destroyed(&mut self, parent: &S) -> Option<TransientChanged<S>> {
        self.consume(parent, Triggers::IMPORT).map(|child| TransientChanged {
            child: Some(child),
            parent: None,
        })
    }

    /// Fires both surface-keyed channels for `surface`.
    ///
    /// A surface can be the child of one edge and the parent identity of another at the
    /// same time, so its destruction can tear down up to two edges.
    pub fn surface_destroyed(&mut self, surface: &S) -> Vec<TransientChanged<S>> {
        [self.child_destroyed(surface), self.parent_destroyed(surface)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Consumes `trigger` on the edge keyed by `parent`, removing the edge.
    ///
    /// Returns the detached child. Late firings find the edge gone, or the trigger no longer
    /// armed, and are absorbed.
    fn consume(&mut self, parent: &S, trigger: Triggers) -> Option<S> {
        if !self.edges.get(parent)?.armed.contains(trigger) {
            return None;
        }

        let edge = self.edges.remove(parent).unwrap();
        self.parents.remove(&edge.child);
        Some(edge.child)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, TransientChanged, TransientGraph};

    fn added(child: &'static str, parent: &'static str) -> TransientChanged<&'static str> {
        TransientChanged {
            child: Some(child),
            parent: Some(parent),
        }
    }

    #[test]
    fn set_parent_resolves_both_directions() {
        let mut graph = TransientGraph::new();

        let event = graph.set_parent("child", "parent").unwrap();
        assert_eq!(event, added("child", "parent"));
        assert_eq!(graph.transient_for(&"child"), Some(&"parent"));
        assert_eq!(graph.child_of(&"parent"), Some(&"child"));
        assert_eq!(graph.transient_for(&"parent"), None);
    }

    /// A child claimed by a second parent keeps only the newest edge, with no residual
    /// reference left under the first parent.
    #[test]
    fn single_parent_per_child() {
        let mut graph = TransientGraph::new();

        graph.set_parent("child", "parent-a").unwrap();
        graph.set_parent("child", "parent-b").unwrap();

        assert_eq!(graph.transient_for(&"child"), Some(&"parent-b"));
        assert_eq!(graph.child_of(&"parent-a"), None);
        assert_eq!(graph.child_of(&"parent-b"), Some(&"child"));

        // The detached edge must not resurrect through its destruction channels.
        assert_eq!(graph.parent_destroyed(&"parent-a"), None);
    }

    /// A parent claimed for a second child keeps only the newest edge.
    #[test]
    fn single_child_per_parent() {
        let mut graph = TransientGraph::new();

        graph.set_parent("child-a", "parent").unwrap();
        graph.set_parent("child-b", "parent").unwrap();

        assert_eq!(graph.child_of(&"parent"), Some(&"child-b"));
        assert_eq!(graph.transient_for(&"child-a"), None);
        assert_eq!(graph.transient_for(&"child-b"), Some(&"parent"));

        assert_eq!(graph.child_destroyed(&"child-a"), None);
    }

    /// Re-setting the same pair replaces the edge and signals again.
    #[test]
    fn reset_same_pair() {
        let mut graph = TransientGraph::new();

        assert_eq!(graph.set_parent("child", "parent").unwrap(), added("child", "parent"));
        assert_eq!(graph.set_parent("child", "parent").unwrap(), added("child", "parent"));
        assert_eq!(graph.transient_for(&"child"), Some(&"parent"));
    }

    #[test]
    fn self_reference_is_rejected() {
        let mut graph = TransientGraph::new();

        assert_eq!(graph.set_parent("surface", "surface"), Err(Error::SelfReference));
        assert!(graph.is_empty());
    }

    #[test]
    fn child_death_detaches_and_names_the_parent() {
        let mut graph = TransientGraph::new();
        graph.set_parent("child", "parent").unwrap();

        let event = graph.child_destroyed(&"child").unwrap();
        assert_eq!(
            event,
            TransientChanged {
                child: None,
                parent: Some("parent"),
            }
        );
        assert!(graph.is_empty());

        // Firing again is a no-op, not a second notification.
        assert_eq!(graph.child_destroyed(&"child"), None);
    }

    #[test]
    fn parent_death_detaches_and_names_the_child() {
        let mut graph = TransientGraph::new();
        graph.set_parent("child", "parent").unwrap();

        let event = graph.parent_destroyed(&"parent").unwrap();
        assert_eq!(
            event,
            TransientChanged {
                child: Some("child"),
                parent: None,
            }
        );
        assert_eq!(graph.transient_for(&"child"), None);
    }

    /// Losing the import proxy detaches the edge even though the parent surface is alive.
    #[test]
    fn import_death_detaches_the_edge() {
        let mut graph = TransientGraph::new();
        graph.set_parent("child", "parent").unwrap();

        let event = graph.import_destroyed(&"parent").unwrap();
        assert_eq!(
            event,
            TransientChanged {
                child: Some("child"),
                parent: None,
            }
        );
        assert_eq!(graph.transient_for(&"child"), None);
        assert_eq!(graph.import_destroyed(&"parent"), None);
    }

    /// Child and parent dying in the same dispatch turn nets exactly one cleanup.
    #[test]
    fn double_destruction_is_idempotent() {
        let mut graph = TransientGraph::new();
        graph.set_parent("child", "parent").unwrap();

        assert!(graph.child_destroyed(&"child").is_some());
        assert_eq!(graph.parent_destroyed(&"parent"), None);
        assert_eq!(graph.import_destroyed(&"parent"), None);
        assert!(graph.is_empty());
    }

    /// A surface that is the child of one edge and the parent of another tears down both.
    #[test]
    fn surface_in_both_roles() {
        let mut graph = TransientGraph::new();
        graph.set_parent("middle", "top").unwrap();
        graph.set_parent("bottom", "middle").unwrap();

        let events = graph.surface_destroyed(&"middle");
        assert_eq!(
            events,
            vec![
                TransientChanged {
                    child: None,
                    parent: Some("top"),
                },
                TransientChanged {
                    child: Some("bottom"),
                    parent: None,
                },
            ]
        );
        assert!(graph.is_empty());
    }

    /// Destroying a surface with no edges yields nothing.
    #[test]
    fn unrelated_surface_death_is_silent() {
        let mut graph = TransientGraph::<&str>::new();
        graph.set_parent("child", "parent").unwrap();

        assert!(graph.surface_destroyed(&"bystander").is_empty());
        assert_eq!(graph.transient_for(&"child"), Some(&"parent"));
    }
}
