//! # rosecheck
//!
//! Generation and shrinking engine for property-based testing.
//!
//! A value is produced by running a [`Generator`] at the root of a [`Rose`]
//! tree. Every sub-value the generator asks for through [`Rose::pick`] gets its
//! own child node, and every node caches the single random atom it draws.
//! When the property fails, [`Rose::shrink`] re-runs the same generators with
//! one node per pass swapping in a smaller candidate, keeping candidates that
//! still fail, until no node has anything smaller to offer.

pub mod context;
pub mod error;
pub mod gen;
pub mod random;
pub mod rose;
pub mod search;
pub mod shrink;

pub use context::{Context, Scope};
pub use error::ContractViolation;
pub use gen::{
    arbitrary, constant, from_fn, in_range, pair, vec_of, Arbitrary, Constant, FromFn, Generator,
    InRange, Map, Pair, VecOf,
};
pub use random::{Atom, RandomEngine, RandomSource, ScriptedSource};
pub use rose::{NodeId, Rose, RoseNode};
pub use search::{Outcome, SearchConfig, ShrinkResult, StopReason};
pub use shrink::{Halve, Shrink};
