//! DFS traversal driver over any [`crate::tree::BreakpointTree`].
//! Reference-only advancement is a tail call that replaces the top
//! stack frame in place; only descents into an alt branch grow the stack,
//! which is what keeps long reference runs from blowing up traversal depth
//! ahead of `merge` collapsing them.

use crate::tree::BreakpointTree;

/// Where a stack frame's node is in its own exploration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Neither child has been explored yet.
    Initial,
    /// The alt child (if any) has already been pushed and popped.
    ExpandedAlt,
}

/// Receives `on_push`/`on_pop` notifications exactly once per transition,
/// in attachment order — the hook stateful matchers use to capture state
/// before an alt descent and restore it on return.
pub trait Observer<N> {
    fn on_push(&mut self, node: &N);
    fn on_pop(&mut self, node: &N);
}

pub struct Traversal<T: BreakpointTree> {
    tree: T,
    stack: Vec<(T::Node, Phase)>,
}

impl<T: BreakpointTree> Traversal<T> {
    pub fn new(tree: T) -> Self {
        let root = tree.root();
        Self {
            tree,
            stack: vec![(root, Phase::Initial)],
        }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Advance the driver by one yielded node, running `observers` along
    /// the way. Returns `None` once the stack empties (traversal done).
    pub fn step(&mut self, observers: &mut [&mut dyn Observer<T::Node>]) -> Option<T::Node> {
        loop {
            let Some((node, phase)) = self.stack.last().cloned() else {
                return None;
            };

            match phase {
                Phase::Initial => {
                    if let Some(alt) = self.tree.next_alt(&node) {
                        self.stack.last_mut().unwrap().1 = Phase::ExpandedAlt;
                        for obs in observers.iter_mut() {
                            obs.on_push(&alt);
                        }
                        self.stack.push((alt.clone(), Phase::Initial));
                        return Some(alt);
                    }
                    if let Some(next) = self.tree.next_ref(&node) {
                        *self.stack.last_mut().unwrap() = (next.clone(), Phase::Initial);
                        return Some(next);
                    }
                    self.pop_and_notify(observers);
                }
                Phase::ExpandedAlt => {
                    if let Some(next) = self.tree.next_ref(&node) {
                        *self.stack.last_mut().unwrap() = (next.clone(), Phase::Initial);
                        return Some(next);
                    }
                    self.pop_and_notify(observers);
                }
            }
        }
    }

    fn pop_and_notify(&mut self, observers: &mut [&mut dyn Observer<T::Node>]) {
        if let Some((popped, _)) = self.stack.pop() {
            for obs in observers.iter_mut() {
                obs.on_pop(&popped);
            }
        }
    }
}
