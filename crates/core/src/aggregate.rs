//! Identity, versioning and command/event execution for domain models.

use crate::error::{DomainError, DomainResult};

/// Identity and version surface shared by stateful domain models; the
/// version is what optimistic concurrency checks compare against.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Current state version: one increment per applied event, equal to the
    /// stream length for a rehydrated aggregate.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an event stream or inventory key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip the check.
    Any,
    /// Require an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Command/event execution: `handle` decides, `apply` evolves.
///
/// Both are pure and deterministic. `handle` never mutates state and never
/// performs IO; everything the command caused is in the returned events,
/// and only `apply` moves the state forward.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event, bumping `version()` by one.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit given the current state and a command.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
