//! Execution context for nested generation.
//!
//! Generators call generators, and each of them needs to know which node it is
//! running in, which child the next `pick` maps to and whether a shrink round
//! is in progress. Rather than threading those through every signature, the
//! tree owns a set of named binding stacks. Entering a scope pushes a value,
//! leaving it pops the value and restores whatever was visible before.

use std::fmt;

use crate::error::{violated, ContractViolation};
use crate::random::RandomSource;
use crate::rose::NodeId;

/// A named stack of dynamically scoped bindings.
///
/// "Not bound" is distinct from "bound to an empty value": a
/// `Scope<Option<NodeId>>` holding `None` is bound.
pub struct Scope<T> {
    name: &'static str,
    stack: Vec<T>,
}

impl<T> Scope<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stack: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether any enclosing scope has bound this slot.
    pub fn is_bound(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Number of nested bindings currently active.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn get(&self) -> Option<&T> {
        self.stack.last()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.stack.last_mut()
    }

    /// Innermost binding. Panics if the slot is unbound.
    #[track_caller]
    pub fn read(&self) -> &T {
        match self.stack.last() {
            Some(value) => value,
            None => violated(ContractViolation::Unbound { slot: self.name }),
        }
    }

    #[track_caller]
    pub fn read_mut(&mut self) -> &mut T {
        let name = self.name;
        match self.stack.last_mut() {
            Some(value) => value,
            None => violated(ContractViolation::Unbound { slot: name }),
        }
    }

    /// Replaces the innermost binding. Panics if the slot is unbound.
    #[track_caller]
    pub fn write(&mut self, value: T) {
        *self.read_mut() = value;
    }

    pub fn push(&mut self, value: T) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.stack.pop()
    }

    /// Drops every binding above `depth`.
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    /// Runs `body` with `value` bound, then restores the previous binding,
    /// also when `body` unwinds.
    pub fn bind<R>(&mut self, value: T, body: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.depth();
        self.push(value);
        let mut binding = Binding { scope: self, depth };
        body(&mut *binding.scope)
    }
}

struct Binding<'a, T> {
    scope: &'a mut Scope<T>,
    depth: usize,
}

impl<T> Drop for Binding<'_, T> {
    fn drop(&mut self) {
        self.scope.truncate(self.depth);
    }
}

impl<T: fmt::Debug> fmt::Debug for Scope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("stack", &self.stack)
            .finish()
    }
}

/// Stack depths of every slot, taken when a scope is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Depths {
    pub(crate) current_node: usize,
    pub(crate) next_child: usize,
    pub(crate) shrunk_node: usize,
    pub(crate) random: usize,
}

/// The four slots consulted while a tree is generating.
pub struct Context {
    pub(crate) current_node: Scope<NodeId>,
    pub(crate) next_child: Scope<usize>,
    pub(crate) shrunk_node: Scope<Option<NodeId>>,
    pub(crate) random: Scope<Box<dyn RandomSource>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            current_node: Scope::new("current node"),
            next_child: Scope::new("next child index"),
            shrunk_node: Scope::new("shrunk node"),
            random: Scope::new("random source"),
        }
    }

    /// Node whose generator is currently running, if any.
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node.get().copied()
    }

    /// Index the next `pick` in the current node will use.
    pub fn next_child_index(&self) -> Option<usize> {
        self.next_child.get().copied()
    }

    /// Whether a shrink round is in progress.
    pub fn is_shrinking(&self) -> bool {
        self.shrunk_node.is_bound()
    }

    /// The node holding this round's claim, if one has claimed it.
    pub fn shrink_claim(&self) -> Option<NodeId> {
        self.shrunk_node.get().copied().flatten()
    }

    pub fn has_random_source(&self) -> bool {
        self.random.is_bound()
    }

    pub(crate) fn depths(&self) -> Depths {
        Depths {
            current_node: self.current_node.depth(),
            next_child: self.next_child.depth(),
            shrunk_node: self.shrunk_node.depth(),
            random: self.random.depth(),
        }
    }

    /// Unwinds every slot back to `depths`.
    pub(crate) fn restore(&mut self, depths: Depths) {
        self.current_node.truncate(depths.current_node);
        self.next_child.truncate(depths.next_child);
        self.shrunk_node.truncate(depths.shrunk_node);
        self.random.truncate(depths.random);
    }

    pub(crate) fn shrink_open(&self) -> bool {
        matches!(self.shrunk_node.get(), Some(None))
    }

    pub(crate) fn shrink_claimed(&self) -> bool {
        matches!(self.shrunk_node.get(), Some(Some(_)))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("current_node", &self.current_node)
            .field("next_child", &self.next_child)
            .field("shrunk_node", &self.shrunk_node)
            .field("random", &self.random.depth())
            .finish()
    }
}
