//! A small, grammar-agnostic finite-state machine.
//!
//! States are opaque labels. An edge `(from, to)` is taken when the machine
//! sits in `from` and receives `to` as its input symbol, so input symbols and
//! target states share one alphabet. Each state may carry one entry hook,
//! which receives the caller's build context explicitly.
//!
//! ```text
//! MachineBuilder --paths/hooks/accept--> start(initial) --> Machine
//! Machine::transition(input, ctx)   // move + run entry hook
//! Machine::finish()                 // accepting state check
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// Entry hook run after a transition into its state has been accepted.
pub type Hook<C, E> = fn(&mut C) -> Result<(), E>;

#[derive(Debug, Error, PartialEq)]
pub enum MachineError<S: fmt::Debug, E> {
    #[error("unknown state {0:?}")]
    UnknownState(S),
    #[error("unexpected input {input:?} in state {state:?}")]
    UnexpectedInput { state: S, input: S },
    #[error("input ended in non-accepting state {state:?}")]
    NotAccepting { state: S },
    #[error("entry hook failed: {0}")]
    Hook(E),
}

/// Collects edges, hooks and accepting states before compiling a [`Machine`].
pub struct MachineBuilder<S, C, E> {
    edges: HashMap<S, HashSet<S>>,
    hooks: HashMap<S, Hook<C, E>>,
    accepting: HashSet<S>,
}

impl<S, C, E> Default for MachineBuilder<S, C, E> {
    fn default() -> Self {
        MachineBuilder {
            edges: HashMap::new(),
            hooks: HashMap::new(),
            accepting: HashSet::new(),
        }
    }
}

impl<S, C, E> MachineBuilder<S, C, E>
where
    S: Copy + Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&mut self, from: S, to: S) -> &mut Self {
        self.edges.entry(from).or_default().insert(to);
        // Make sure pure targets are known states too.
        self.edges.entry(to).or_default();
        self
    }

    /// Adds an edge from every state in `from` to every state in `to`.
    pub fn paths(&mut self, from: &[S], to: &[S]) -> &mut Self {
        for &source in from {
            for &target in to {
                self.path(source, target);
            }
        }
        self
    }

    /// Registers the entry hook for `state`, replacing any previous one.
    pub fn when_entering(&mut self, state: S, hook: Hook<C, E>) -> &mut Self {
        self.hooks.insert(state, hook);
        self
    }

    pub fn accept(&mut self, state: S) -> &mut Self {
        self.accepting.insert(state);
        self
    }

    /// Compiles the declarations into a machine sitting in `initial`.
    pub fn start(&self, initial: S) -> Result<Machine<S, C, E>, MachineError<S, E>> {
        if !self.edges.contains_key(&initial) {
            return Err(MachineError::UnknownState(initial));
        }

        Ok(Machine {
            edges: self.edges.clone(),
            hooks: self.hooks.clone(),
            accepting: self.accepting.clone(),
            current: initial,
        })
    }
}

/// A compiled automaton. Only the current state changes after construction.
pub struct Machine<S, C, E> {
    edges: HashMap<S, HashSet<S>>,
    hooks: HashMap<S, Hook<C, E>>,
    accepting: HashSet<S>,
    current: S,
}

impl<S, C, E> Machine<S, C, E>
where
    S: Copy + Eq + Hash + fmt::Debug,
{
    pub fn state(&self) -> S {
        self.current
    }

    /// Follows the edge labelled `input` and runs the target's entry hook.
    ///
    /// On any failure the machine stays in the state it was in before the
    /// call.
    pub fn transition(&mut self, input: S, context: &mut C) -> Result<(), MachineError<S, E>> {
        let allowed = self
            .edges
            .get(&self.current)
            .is_some_and(|targets| targets.contains(&input));

        if !allowed {
            return Err(MachineError::UnexpectedInput {
                state: self.current,
                input,
            });
        }

        if let Some(hook) = self.hooks.get(&input) {
            hook(context).map_err(MachineError::Hook)?;
        }

        self.current = input;
        Ok(())
    }

    /// Succeeds only if the machine is in an accepting state.
    pub fn finish(&self) -> Result<(), MachineError<S, E>> {
        if self.accepting.contains(&self.current) {
            Ok(())
        } else {
            Err(MachineError::NotAccepting {
                state: self.current,
            })
        }
    }
}
