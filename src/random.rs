//! Random source boundary.
//!
//! The engine only ever asks for fixed-width random words ("atoms"), at most
//! once per node. How those words are produced is up to the source.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A single random draw cached by a tree node.
pub type Atom = u64;

/// Supplier of atoms.
pub trait RandomSource {
    fn next_atom(&mut self) -> Atom;
}

/// Seeded ChaCha8 source.
#[derive(Debug, Clone)]
pub struct RandomEngine {
    rng: ChaCha8Rng,
}

impl RandomEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed from the operating system. Cases built this way cannot be replayed
    /// across runs.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl RandomSource for RandomEngine {
    fn next_atom(&mut self) -> Atom {
        self.rng.gen()
    }
}

/// Replays a fixed list of atoms in order, starting over when it runs out.
/// An empty script always yields 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    atoms: Vec<Atom>,
    position: usize,
}

impl ScriptedSource {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms, position: 0 }
    }

    /// Number of atoms handed out so far.
    pub fn drawn(&self) -> usize {
        self.position
    }
}

impl RandomSource for ScriptedSource {
    fn next_atom(&mut self) -> Atom {
        let atom = if self.atoms.is_empty() {
            0
        } else {
            self.atoms[self.position % self.atoms.len()]
        };
        self.position += 1;
        atom
    }
}

impl RandomSource for Box<dyn RandomSource> {
    fn next_atom(&mut self) -> Atom {
        (**self).next_atom()
    }
}
