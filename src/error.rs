// Contract violations raised by the engine.
// These are wiring mistakes in generators or in the search driver, never
// conditions a caller can recover from, so they are reported by panicking.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// `next` was called on a shrink sequence with no remaining candidates
    ExhaustedShrink,
    /// A context slot was read or written while nothing had bound it
    Unbound { slot: &'static str },
    /// A node operation was used while no node was generating
    OutsideGenerate { operation: &'static str },
    /// The generator bound at a node produces a different type than requested
    GeneratorMismatch { node: usize, expected: &'static str },
    /// A node was asked to regenerate before any generator was recorded
    MissingGenerator { node: usize },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::ExhaustedShrink => {
                write!(f, "next() called on an exhausted shrink sequence")
            }
            ContractViolation::Unbound { slot } => write!(f, "no binding for slot '{}'", slot),
            ContractViolation::OutsideGenerate { operation } => {
                write!(f, "{}() called outside of node generation", operation)
            }
            ContractViolation::GeneratorMismatch { node, expected } => write!(
                f,
                "generator at node #{} does not produce values of type {}",
                node, expected
            ),
            ContractViolation::MissingGenerator { node } => {
                write!(f, "node #{} has no generator", node)
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

#[cold]
#[track_caller]
pub(crate) fn violated(violation: ContractViolation) -> ! {
    panic!("contract violation: {}", violation)
}
