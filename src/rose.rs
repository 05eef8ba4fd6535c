//! The generation/shrink tree.
//!
//! Large values are built from small ones: every `pick` a generator makes
//! lands in its own child node, so a complex value can often be shrunk by
//! shrinking its parts one at a time. Nodes live in an arena owned by [`Rose`]
//! and refer to each other by [`NodeId`]. A node keeps its position among its
//! siblings for the whole life of the tree.
//!
//! Each node remembers up to three generators: the one its caller last passed
//! in, the accepted baseline after a successful shrink, and the candidate
//! proposed in the current shrink round. The proposed one wins over the
//! accepted one, which wins over the last one.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::context::{Context, Depths};
use crate::error::{violated, ContractViolation};
use crate::gen::{Constant, Generator};
use crate::random::{Atom, RandomEngine, RandomSource};
use crate::shrink::Shrink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type SharedGenerator<T> = Rc<dyn Generator<Output = T>>;

struct NodeState<T: Clone + fmt::Debug + 'static> {
    last: SharedGenerator<T>,
    accepted: Option<SharedGenerator<T>>,
    proposed: Option<SharedGenerator<T>>,
    shrinks: Option<Box<dyn Shrink<T>>>,
}

impl<T: Clone + fmt::Debug + 'static> NodeState<T> {
    fn new(last: SharedGenerator<T>) -> Self {
        Self {
            last,
            accepted: None,
            proposed: None,
            shrinks: None,
        }
    }

    fn active(&self) -> SharedGenerator<T> {
        let active = self
            .proposed
            .as_ref()
            .or_else(|| self.accepted.as_ref())
            .unwrap_or(&self.last);
        Rc::clone(active)
    }
}

/// Operations on a node's generators that do not depend on the value type.
trait ErasedState {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn generator_name(&self) -> String;
    fn is_proposing(&self) -> bool;
    fn has_accepted(&self) -> bool;
    fn accept_shrink(&mut self) -> bool;
    fn withdraw_shrink(&mut self) -> bool;
    fn renderer(&self) -> Box<dyn FnOnce(&mut Rose) -> String>;
}

impl<T: Clone + fmt::Debug + 'static> ErasedState for NodeState<T> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn generator_name(&self) -> String {
        self.active().name()
    }

    fn is_proposing(&self) -> bool {
        self.proposed.is_some()
    }

    fn has_accepted(&self) -> bool {
        self.accepted.is_some()
    }

    fn accept_shrink(&mut self) -> bool {
        match self.proposed.take() {
            Some(proposed) => {
                self.accepted = Some(proposed);
                self.shrinks = None;
                true
            }
            None => false,
        }
    }

    fn withdraw_shrink(&mut self) -> bool {
        self.proposed.take().is_some()
    }

    fn renderer(&self) -> Box<dyn FnOnce(&mut Rose) -> String> {
        let generator = self.active();
        Box::new(move |rose: &mut Rose| format!("{:?}", generator.produce(rose)))
    }
}

pub struct RoseNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    atom: Option<Atom>,
    state: Option<Box<dyn ErasedState>>,
}

impl RoseNode {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            atom: None,
            state: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The cached atom, if the node has asked for one.
    pub fn atom(&self) -> Option<Atom> {
        self.atom
    }

    /// Whether a generator has been recorded for this node.
    pub fn is_generated(&self) -> bool {
        self.state.is_some()
    }

    /// Whether a shrink candidate is pinned in this node right now.
    pub fn is_proposing(&self) -> bool {
        self.state.as_ref().map_or(false, |state| state.is_proposing())
    }

    /// Whether this node has an accepted baseline.
    pub fn has_accepted(&self) -> bool {
        self.state.as_ref().map_or(false, |state| state.has_accepted())
    }
}

impl fmt::Debug for RoseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoseNode")
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("atom", &self.atom)
            .field("generator", &self.state.as_ref().map(|s| s.generator_name()))
            .finish()
    }
}

/// A tree of generation nodes together with the context its generators run in.
///
/// One `Rose` covers one case: it is built while the value is first generated,
/// reused for every shrink pass, and dropped when the case is done.
pub struct Rose {
    nodes: Vec<RoseNode>,
    pub(crate) context: Context,
}

impl Rose {
    /// Creates a tree holding only the root, drawing atoms from `source`.
    pub fn new<S: RandomSource + 'static>(source: S) -> Self {
        let mut context = Context::new();
        context.random.push(Box::new(source));
        Self {
            nodes: vec![RoseNode::new(None)],
            context,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(RandomEngine::new(seed))
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &RoseNode {
        &self.nodes[id.0]
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Generates a value at the root.
    pub fn generate<G>(&mut self, generator: &G) -> G::Output
    where
        G: Generator + Clone + 'static,
    {
        let root = self.root();
        self.generate_at(root, generator)
    }

    /// Generates a value in the next child of the node currently generating.
    ///
    /// Children are matched to calls by order: the n-th `pick` made while a
    /// node generates always lands in that node's n-th child. Generators must
    /// therefore make the same sequence of picks every time they run.
    pub fn pick<G>(&mut self, generator: &G) -> G::Output
    where
        G: Generator + Clone + 'static,
    {
        let parent = match self.context.current_node() {
            Some(parent) => parent,
            None => violated(ContractViolation::OutsideGenerate { operation: "pick" }),
        };
        let index = *self.context.next_child.read();
        let child = match self.nodes[parent.0].children.get(index) {
            Some(&child) => child,
            None => {
                let child = NodeId::new(self.nodes.len());
                self.nodes.push(RoseNode::new(Some(parent)));
                self.nodes[parent.0].children.push(child);
                trace!("node {} grew child {} at index {}", parent, child, index);
                child
            }
        };
        self.context.next_child.write(index + 1);
        self.generate_at(child, generator)
    }

    /// The atom of the node currently generating. Drawn from the random source
    /// the first time, then reused for the lifetime of the tree.
    pub fn atom(&mut self) -> Atom {
        let id = match self.context.current_node() {
            Some(id) => id,
            None => violated(ContractViolation::OutsideGenerate { operation: "atom" }),
        };
        if let Some(atom) = self.nodes[id.0].atom {
            return atom;
        }
        let atom = self.context.random.read_mut().next_atom();
        self.nodes[id.0].atom = Some(atom);
        atom
    }

    /// Runs `body` with atoms drawn from `source` instead of the tree's own
    /// source. Atoms already cached are unaffected.
    pub fn with_source<S, R>(&mut self, source: S, body: impl FnOnce(&mut Rose) -> R) -> R
    where
        S: RandomSource + 'static,
    {
        let mut guard = self.enter();
        guard.rose.context.random.push(Box::new(source));
        body(&mut *guard.rose)
    }

    /// Records the context depths so they are restored when the returned guard
    /// drops, including while a panic unwinds.
    pub(crate) fn enter(&mut self) -> Restore<'_> {
        let depths = self.context.depths();
        Restore { rose: self, depths }
    }

    pub(crate) fn generate_at<G>(&mut self, id: NodeId, generator: &G) -> G::Output
    where
        G: Generator + Clone + 'static,
    {
        let last: SharedGenerator<G::Output> = Rc::new(generator.clone());
        self.record_generator(id, last);

        if self.context.shrink_open() {
            if self.state::<G::Output>(id).shrinks.is_none() {
                let value = self.regenerate::<G::Output>(id);
                // A descendant took this round.
                if self.context.shrink_claimed() {
                    return value;
                }

                let shrinks = generator.shrink(value.clone());
                let state = self.state::<G::Output>(id);
                state.shrinks = Some(shrinks);
                if state.accepted.is_none() {
                    state.accepted = Some(Rc::new(Constant::new(value)));
                }
            }

            let state = self.state::<G::Output>(id);
            let candidate = match state.shrinks.as_mut() {
                Some(shrinks) if shrinks.has_next() => Some(shrinks.next()),
                _ => None,
            };
            match candidate {
                Some(candidate) => {
                    trace!("node {} proposes {:?}", id, candidate);
                    state.proposed = Some(Rc::new(Constant::new(candidate)));
                    self.context.shrunk_node.write(Some(id));
                }
                None => state.proposed = None,
            }
        }

        self.regenerate::<G::Output>(id)
    }

    pub(crate) fn accept_shrink(&mut self, id: NodeId) -> bool {
        match self.nodes[id.0].state.as_mut() {
            Some(state) => state.accept_shrink(),
            None => false,
        }
    }

    /// Unpins the candidate proposed at `id`; the node falls back to its
    /// accepted baseline.
    pub(crate) fn withdraw_shrink(&mut self, id: NodeId) -> bool {
        match self.nodes[id.0].state.as_mut() {
            Some(state) => state.withdraw_shrink(),
            None => false,
        }
    }

    fn record_generator<T>(&mut self, id: NodeId, last: SharedGenerator<T>)
    where
        T: Clone + fmt::Debug + 'static,
    {
        let node = &mut self.nodes[id.0];
        if node.state.is_none() {
            node.state = Some(Box::new(NodeState::new(last)));
        } else {
            self.state::<T>(id).last = last;
        }
    }

    fn state<T>(&mut self, id: NodeId) -> &mut NodeState<T>
    where
        T: Clone + fmt::Debug + 'static,
    {
        let state = match self.nodes[id.0].state.as_mut() {
            Some(state) => state,
            None => violated(ContractViolation::MissingGenerator { node: id.0 }),
        };
        match state.as_any_mut().downcast_mut::<NodeState<T>>() {
            Some(state) => state,
            None => violated(ContractViolation::GeneratorMismatch {
                node: id.0,
                expected: std::any::type_name::<T>(),
            }),
        }
    }

    fn regenerate<T>(&mut self, id: NodeId) -> T
    where
        T: Clone + fmt::Debug + 'static,
    {
        let generator = self.state::<T>(id).active();
        self.within(id, |rose| generator.produce(rose))
    }

    /// Runs `body` as node `id`, with its child cursor starting at zero.
    fn within<R>(&mut self, id: NodeId, body: impl FnOnce(&mut Rose) -> R) -> R {
        let mut guard = self.enter();
        guard.rose.context.current_node.push(id);
        guard.rose.context.next_child.push(0);
        let result = body(&mut *guard.rose);
        let visited = *guard.rose.context.next_child.read();
        let owned = guard.rose.nodes[id.0].children.len();
        drop(guard);

        if visited < owned {
            trace!("node {} visited {} of its {} children", id, visited, owned);
        }
        result
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Position of `id` among its siblings, or `None` for the root.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.0].parent?;
        self.nodes[parent.0]
            .children
            .iter()
            .position(|&sibling| sibling == id)
    }

    /// Name of the active generator at `id`, empty if none was recorded.
    pub fn generator_name(&self, id: NodeId) -> String {
        self.nodes[id.0]
            .state
            .as_ref()
            .map(|state| state.generator_name())
            .unwrap_or_default()
    }

    /// Path from the root to `id`, as generator names.
    pub fn path(&self, id: NodeId) -> String {
        match self.nodes[id.0].parent {
            None => format!("/ {}", self.generator_name(id)),
            Some(parent) => format!("{} / {}", self.path(parent), self.generator_name(id)),
        }
    }

    /// Renders the value the active generator at `id` produces, or an empty
    /// string if nothing has been generated there yet.
    pub fn string_value(&mut self, id: NodeId) -> String {
        let render = match self.nodes[id.0].state.as_ref() {
            Some(state) => state.renderer(),
            None => return String::new(),
        };
        self.within(id, render)
    }

    /// Rendered values of the root's immediate children.
    pub fn example(&mut self) -> Vec<String> {
        let root = self.root();
        self.example_of(root)
    }

    pub fn example_of(&mut self, id: NodeId) -> Vec<String> {
        let children = self.nodes[id.0].children.clone();
        children
            .into_iter()
            .map(|child| self.string_value(child))
            .collect()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        for _ in 0..self.depth(id) {
            write!(f, "  ")?;
        }
        writeln!(f, "- {}", self.generator_name(id))?;
        for &child in &self.nodes[id.0].children {
            self.write_node(f, child)?;
        }
        Ok(())
    }
}

impl fmt::Display for Rose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root())
    }
}

/// Borrow of a tree that puts its context back on drop. A shrink round
/// opened inside the guard and still bound at drop also loses its pinned
/// candidate, so later passes see the node's baseline.
pub(crate) struct Restore<'a> {
    pub(crate) rose: &'a mut Rose,
    depths: Depths,
}

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        if self.rose.context.shrunk_node.depth() > self.depths.shrunk_node {
            self.rose.context.restore(Depths {
                shrunk_node: self.depths.shrunk_node + 1,
                ..self.depths
            });
            if let Some(node) = self.rose.context.shrink_claim() {
                trace!("node {} withdraws its candidate", node);
                self.rose.withdraw_shrink(node);
            }
        }
        self.rose.context.restore(self.depths);
    }
}

impl fmt::Debug for Rose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rose")
            .field("nodes", &self.nodes)
            .field("context", &self.context)
            .finish()
    }
}
