//! Class/method dependency graph and reachability traversal.
//!
//! The compiler driver adds every compiled class with
//! [`DependencyGraph::add`] and, once done, asks for the set of reachable
//! classes and methods under the graph's [`TreeShakerMode`]. Whatever is not
//! reachable from the root set is left out of the final binary.
//!
//! Edges carry a strong/weak classification. Strong edges are followed
//! unconditionally; weak edges only when the policy admits the target (see
//! [`TreeShakerMode`]). Two edge placements are deliberately asymmetric:
//!
//! - every method gets a **strong back-edge to its declaring class**, so a
//!   live method always keeps its class;
//! - a method-level super-method dependency is inserted **reversed** (super
//!   method → override, strong), so reaching the super method keeps the
//!   override live and virtual dispatch stays intact after pruning.
//!
//! Nodes are stored in an append-only table and referenced by [`NodeId`]
//! index; traversal is an explicit worklist, safe for graphs tens of
//! thousands of nodes deep.

use std::collections::BTreeSet;

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::class_info::{ClassInfo, Dependency, MethodInfo};
use crate::TreeShakerMode;


/// Index of a node in the graph's node table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Link attributes accumulated on a method node.
    ///
    /// Monotone: re-adding a method ORs new attributes in, never clears.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    struct LinkFlags: u8 {
        /// Eligible for dropping when only weakly referenced.
        const WEAKLY_LINKED = 1 << 0;
        /// Kept whenever referenced, even under the aggressive policy.
        const STRONGLY_LINKED = 1 << 1;
    }
}

impl LinkFlags {
    fn from_method(mi: &MethodInfo) -> Self {
        let mut flags = Self::empty();
        if mi.is_weakly_linked {
            flags |= Self::WEAKLY_LINKED;
        }
        if mi.is_strongly_linked {
            flags |= Self::STRONGLY_LINKED;
        }
        flags
    }
}

/// What a node stands for.
#[derive(Debug)]
enum NodeKind {
    Class {
        /// Class internal name (`java/lang/String`).
        name: String,
    },
    Method {
        owner: String,
        name: String,
        desc: String,
        flags: LinkFlags,
    },
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    /// Targets kept whenever this node is kept.
    strong: FxHashSet<NodeId>,
    /// Targets kept only when the policy admits them.
    weak: FxHashSet<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            strong: FxHashSet::default(),
            weak: FxHashSet::default(),
        }
    }

    fn merge_link_flags(&mut self, new: LinkFlags) {
        if let NodeKind::Method { flags, .. } = &mut self.kind {
            flags.insert(new);
        }
    }
}

/// Incremental dependency graph over compiled classes and their methods.
///
/// The graph grows monotonically: nodes are created lazily on first
/// reference (as dependency source or target) and never removed. The
/// reachable-set cache filled by the query methods is the only state that
/// shrinks — every [`add`](Self::add) clears it, so a query after any add
/// retraverses from scratch.
///
/// Not internally synchronized; a host ingesting classes from several
/// workers must serialize calls.
pub struct DependencyGraph {
    mode: TreeShakerMode,
    /// Append-only node table; [`NodeId`]s index into it.
    nodes: Vec<Node>,
    /// Class internal name → node.
    class_ids: FxHashMap<String, NodeId>,
    /// (owner, name, descriptor) → node.
    method_ids: FxHashMap<(String, String, String), NodeId>,
    /// Class nodes the traversal starts from.
    roots: FxHashSet<NodeId>,
    /// Nodes found reachable by the last traversal; empty means stale.
    reachable: FxHashSet<NodeId>,
}

impl DependencyGraph {
    /// Create an empty graph pinned to `mode`.
    pub fn new(mode: TreeShakerMode) -> Self {
        Self {
            mode,
            nodes: Vec::new(),
            class_ids: FxHashMap::default(),
            method_ids: FxHashMap::default(),
            roots: FxHashSet::default(),
            reachable: FxHashSet::default(),
        }
    }

    /// The policy this graph was created with.
    pub fn mode(&self) -> TreeShakerMode {
        self.mode
    }

    /// Ingest one compiled class.
    ///
    /// When `root` is true the class joins the root set: it and its methods
    /// are always reachable. Re-adding a class is permitted and accumulates
    /// edges and link flags; it also invalidates the reachable-set cache.
    pub fn add(&mut self, internal_name: &str, info: &ClassInfo, root: bool) {
        self.reachable.clear();

        let class_id = self.class_node(internal_name);
        if root {
            self.roots.insert(class_id);
        }

        for dep in &info.dependencies {
            let (target, weak) = self.dependency_target(dep);
            self.add_edge(class_id, target, weak);
        }

        for mi in &info.methods {
            // Retention pin for the class→method edge. Pinned methods
            // survive whenever their class does, under every policy.
            let pinned = root
                || mi.is_callback
                || is_class_initializer(mi)
                || (info.is_enum && is_enum_values(mi, internal_name))
                || (info.is_struct && is_struct_size_of(mi));

            let method_id = self.method_node(internal_name, mi);
            self.add_edge(class_id, method_id, !pinned);
            // A live method always keeps its declaring class.
            self.add_edge(method_id, class_id, false);

            for dep in &mi.dependencies {
                if let Dependency::Super { owner, name, desc, .. } = dep {
                    // Reversed: reaching the super method must keep the
                    // override live, or virtual dispatch breaks after
                    // pruning.
                    let super_id = self.method_target(owner, name, desc);
                    self.add_edge(super_id, method_id, false);
                } else {
                    let (target, weak) = self.dependency_target(dep);
                    self.add_edge(method_id, target, weak);
                }
            }
        }

        trace!(class = internal_name, root, "class added to dependency graph");
    }

    /// Class internal names reachable from the root set.
    ///
    /// Runs the traversal if the cache is stale; a back-to-back call to
    /// either query method reuses the cached result.
    pub fn find_reachable_classes(&mut self) -> FxHashSet<String> {
        self.ensure_reachable();
        let mut classes = FxHashSet::default();
        for &id in &self.reachable {
            if let NodeKind::Class { name } = &self.nodes[id.index()].kind {
                classes.insert(name.clone());
            }
        }
        classes
    }

    /// Reachable methods as (owner, name, descriptor) triples.
    ///
    /// Cache behavior as in [`find_reachable_classes`](Self::find_reachable_classes).
    pub fn find_reachable_methods(&mut self) -> FxHashSet<(String, String, String)> {
        self.ensure_reachable();
        let mut methods = FxHashSet::default();
        for &id in &self.reachable {
            if let NodeKind::Method {
                owner, name, desc, ..
            } = &self.nodes[id.index()].kind
            {
                methods.insert((owner.clone(), name.clone(), desc.clone()));
            }
        }
        methods
    }

    /// Every class name ever added or referenced, in lexicographic order.
    pub fn all_classes(&self) -> BTreeSet<String> {
        self.class_ids.keys().cloned().collect()
    }

    /// Resolve or create the class node for `name`.
    fn class_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.class_ids.get(name) {
            return id;
        }
        let id = self.push_node(NodeKind::Class {
            name: name.to_string(),
        });
        self.class_ids.insert(name.to_string(), id);
        id
    }

    /// Resolve or create the method node for a dependency target. Targets
    /// carry no link attributes of their own; flags stay whatever the
    /// owning class's ingestion set them to.
    fn method_target(&mut self, owner: &str, name: &str, desc: &str) -> NodeId {
        let key = (owner.to_string(), name.to_string(), desc.to_string());
        if let Some(&id) = self.method_ids.get(&key) {
            return id;
        }
        // Every class name ever seen gets a class node, owners of method
        // targets included; all_classes() reports them all. No edge is
        // involved, so reachability is unaffected.
        self.class_node(owner);
        let id = self.push_node(NodeKind::Method {
            owner: key.0.clone(),
            name: key.1.clone(),
            desc: key.2.clone(),
            flags: LinkFlags::empty(),
        });
        self.method_ids.insert(key, id);
        id
    }

    /// Resolve or create the node for a declared method, ORing the link
    /// flags from the descriptor into the node.
    fn method_node(&mut self, owner: &str, mi: &MethodInfo) -> NodeId {
        let id = self.method_target(owner, &mi.name, &mi.desc);
        self.nodes[id.index()].merge_link_flags(LinkFlags::from_method(mi));
        id
    }

    /// Target node and weakness for a non-reversed dependency.
    fn dependency_target(&mut self, dep: &Dependency) -> (NodeId, bool) {
        match dep {
            Dependency::Class { name, weak } => (self.class_node(name), *weak),
            Dependency::Invoke {
                owner,
                name,
                desc,
                weak,
            }
            | Dependency::Super {
                owner,
                name,
                desc,
                weak,
            } => (self.method_target(owner, name, desc), *weak),
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "node counts fit in u32"
        )]
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, weak: bool) {
        let node = &mut self.nodes[from.index()];
        if weak {
            node.weak.insert(to);
        } else {
            node.strong.insert(to);
        }
    }

    /// Fill the reachable-set cache if it is stale.
    ///
    /// Worklist DFS from every root. The cache set doubles as the visited
    /// set, so cycles terminate and a node pushed through both a strong and
    /// a weak edge is recorded once. Strong children are pushed
    /// unconditionally, which is what makes the strong classification
    /// dominate for edges present in both sets.
    fn ensure_reachable(&mut self) {
        if !self.reachable.is_empty() {
            return;
        }

        let mut visited = std::mem::take(&mut self.reachable);
        let mut stack: Vec<NodeId> = self.roots.iter().copied().collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = &self.nodes[id.index()];
            for &child in &node.strong {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
            for &child in &node.weak {
                if !visited.contains(&child) && self.weak_edge_admitted(child) {
                    stack.push(child);
                }
            }
        }

        debug!(
            mode = %self.mode,
            roots = self.roots.len(),
            reachable = visited.len(),
            total = self.nodes.len(),
            "computed reachable set"
        );
        self.reachable = visited;
    }

    /// Weak-edge admission rule for the configured policy.
    ///
    /// Under [`TreeShakerMode::Aggressive`] weak edges to class nodes are
    /// never admitted: method liveness is the primary signal, and classes
    /// become reachable through the strong back-edges of their live methods.
    fn weak_edge_admitted(&self, target: NodeId) -> bool {
        match self.mode {
            TreeShakerMode::None => true,
            TreeShakerMode::Conservative => match &self.nodes[target.index()].kind {
                NodeKind::Method { flags, .. } => !flags.contains(LinkFlags::WEAKLY_LINKED),
                NodeKind::Class { .. } => true,
            },
            TreeShakerMode::Aggressive => match &self.nodes[target.index()].kind {
                NodeKind::Method { name, flags, .. } => {
                    flags.contains(LinkFlags::STRONGLY_LINKED)
                        || (!flags.contains(LinkFlags::WEAKLY_LINKED) && name == "<init>")
                }
                NodeKind::Class { .. } => false,
            },
        }
    }
}

/// The static `<clinit>()V` class initializer.
fn is_class_initializer(mi: &MethodInfo) -> bool {
    mi.is_static && mi.name == "<clinit>" && mi.desc == "()V"
}

/// The compiler-synthesized static `values()` of an enum class.
fn is_enum_values(mi: &MethodInfo, owner: &str) -> bool {
    mi.is_static && mi.name == "values" && mi.desc == format!("()[L{owner};")
}

/// The compiler-synthesized static `sizeOf()` of a native-interop struct.
fn is_struct_size_of(mi: &MethodInfo) -> bool {
    mi.is_static && mi.name == "sizeOf" && mi.desc == "()I"
}
