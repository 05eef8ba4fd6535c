//! Shrink sequences.
//!
//! A shrink sequence is a finite, forward-only cursor over candidate values
//! that are "smaller" than some produced value. `has_next` never changes
//! state; `next` advances and must only be called when `has_next` is true.

use std::marker::PhantomData;

use crate::error::{violated, ContractViolation};

pub trait Shrink<T> {
    fn has_next(&self) -> bool;

    fn next(&mut self) -> T;

    /// Drains the remaining candidates as an iterator.
    fn candidates(self) -> Candidates<Self, T>
    where
        Self: Sized,
    {
        Candidates {
            inner: self,
            marker: PhantomData,
        }
    }
}

impl<T, S: Shrink<T> + ?Sized> Shrink<T> for Box<S> {
    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn next(&mut self) -> T {
        (**self).next()
    }
}

pub struct Candidates<S, T> {
    inner: S,
    marker: PhantomData<fn() -> T>,
}

impl<S: Shrink<T>, T> Iterator for Candidates<S, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.inner.has_next() {
            Some(Shrink::next(&mut self.inner))
        } else {
            None
        }
    }
}

/// No candidates at all.
#[derive(Debug)]
pub struct Empty<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> Shrink<T> for Empty<T> {
    fn has_next(&self) -> bool {
        false
    }

    fn next(&mut self) -> T {
        violated(ContractViolation::ExhaustedShrink)
    }
}

pub fn empty<T: 'static>() -> Box<dyn Shrink<T>> {
    Box::new(Empty {
        marker: PhantomData,
    })
}

/// Integral types that can be halved toward zero.
pub trait Halve: Copy {
    fn halve(self) -> Self;
    fn is_zero(self) -> bool;
}

macro_rules! halve_impl {
    ($($t:ty),*) => {
        $(
            impl Halve for $t {
                fn halve(self) -> Self {
                    self / 2
                }

                fn is_zero(self) -> bool {
                    self == 0
                }
            }
        )*
    };
}

halve_impl!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Repeatedly halves a value: 7 yields 3, 1, 0.
#[derive(Debug, Clone)]
pub struct Halving<T> {
    current: T,
}

pub fn halving<T: Halve>(value: T) -> Halving<T> {
    Halving { current: value }
}

impl<T: Halve> Shrink<T> for Halving<T> {
    fn has_next(&self) -> bool {
        !self.current.is_zero()
    }

    fn next(&mut self) -> T {
        if !self.has_next() {
            violated(ContractViolation::ExhaustedShrink);
        }
        self.current = self.current.halve();
        self.current
    }
}

/// Yields the collection with each element left out in turn, left to right.
#[derive(Debug, Clone)]
pub struct RemoveElement<T> {
    collection: Vec<T>,
    skip: usize,
}

pub fn remove_element<T: Clone>(collection: Vec<T>) -> RemoveElement<T> {
    RemoveElement {
        collection,
        skip: 0,
    }
}

impl<T: Clone> Shrink<Vec<T>> for RemoveElement<T> {
    fn has_next(&self) -> bool {
        self.skip < self.collection.len()
    }

    fn next(&mut self) -> Vec<T> {
        if !self.has_next() {
            violated(ContractViolation::ExhaustedShrink);
        }
        let shrunk = self
            .collection
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != self.skip)
            .map(|(_, element)| element.clone())
            .collect();
        self.skip += 1;
        shrunk
    }
}

/// Builds a sequence from a cursor: while `predicate(cursor)` holds, `step`
/// maps the cursor to the next value and the following cursor.
#[derive(Debug, Clone)]
pub struct Unfold<I, P, F> {
    cursor: I,
    predicate: P,
    step: F,
}

pub fn unfold<T, I, P, F>(initial: I, predicate: P, step: F) -> Unfold<I, P, F>
where
    P: Fn(&I) -> bool,
    F: Fn(&I) -> (T, I),
{
    Unfold {
        cursor: initial,
        predicate,
        step,
    }
}

impl<T, I, P, F> Shrink<T> for Unfold<I, P, F>
where
    P: Fn(&I) -> bool,
    F: Fn(&I) -> (T, I),
{
    fn has_next(&self) -> bool {
        (self.predicate)(&self.cursor)
    }

    fn next(&mut self) -> T {
        if !self.has_next() {
            violated(ContractViolation::ExhaustedShrink);
        }
        let (value, cursor) = (self.step)(&self.cursor);
        self.cursor = cursor;
        value
    }
}
