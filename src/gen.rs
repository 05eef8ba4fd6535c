//! Value generators.
//!
//! A generator produces a value while running inside a node of a [`Rose`] and,
//! given a value it produced, offers a shrink sequence of smaller candidates.
//! Composite generators obtain their parts through [`Rose::pick`], which gives
//! every part its own child node.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::rose::Rose;
use crate::shrink::{self, Shrink};

pub trait Generator {
    type Output: Clone + fmt::Debug + 'static;

    fn produce(&self, rose: &mut Rose) -> Self::Output;

    fn shrink(&self, _value: Self::Output) -> Box<dyn Shrink<Self::Output>> {
        shrink::empty()
    }

    /// Name shown when printing a tree.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U,
    {
        Map {
            inner: self,
            f: Rc::new(f),
        }
    }
}

/// Always produces the same value. Used to pin a node to a shrink candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant<T> {
    value: T,
}

impl<T> Constant<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

pub fn constant<T: Clone + fmt::Debug + 'static>(value: T) -> Constant<T> {
    Constant::new(value)
}

impl<T: Clone + fmt::Debug + 'static> Generator for Constant<T> {
    type Output = T;

    fn produce(&self, _rose: &mut Rose) -> T {
        self.value.clone()
    }

    fn name(&self) -> String {
        format!("Constant<{}>", std::any::type_name::<T>())
    }
}

type ShrinkFn<T> = Rc<dyn Fn(T) -> Box<dyn Shrink<T>>>;

/// Generator backed by a closure.
pub struct FromFn<T> {
    produce: Rc<dyn Fn(&mut Rose) -> T>,
    shrink: Option<ShrinkFn<T>>,
    name: Option<String>,
}

pub fn from_fn<T, F>(f: F) -> FromFn<T>
where
    F: Fn(&mut Rose) -> T + 'static,
{
    FromFn {
        produce: Rc::new(f),
        shrink: None,
        name: None,
    }
}

impl<T> FromFn<T> {
    pub fn with_shrink<S>(mut self, shrink: S) -> Self
    where
        T: 'static,
        S: Fn(T) -> Box<dyn Shrink<T>> + 'static,
    {
        self.shrink = Some(Rc::new(shrink));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T> Clone for FromFn<T> {
    fn clone(&self) -> Self {
        Self {
            produce: Rc::clone(&self.produce),
            shrink: self.shrink.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> Generator for FromFn<T> {
    type Output = T;

    fn produce(&self, rose: &mut Rose) -> T {
        (self.produce)(rose)
    }

    fn shrink(&self, value: T) -> Box<dyn Shrink<T>> {
        match &self.shrink {
            Some(shrink) => shrink(value),
            None => shrink::empty(),
        }
    }

    fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("FromFn<{}>", std::any::type_name::<T>()),
        }
    }
}

/// Whole-range values of a primitive type, built from the node's atom.
#[derive(Debug)]
pub struct Arbitrary<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Arbitrary<T> {
    fn clone(&self) -> Self {
        arbitrary()
    }
}

pub fn arbitrary<T>() -> Arbitrary<T> {
    Arbitrary {
        marker: PhantomData,
    }
}

macro_rules! arbitrary_int {
    ($($t:ty),*) => {
        $(
            impl Generator for Arbitrary<$t> {
                type Output = $t;

                fn produce(&self, rose: &mut Rose) -> $t {
                    rose.atom() as $t
                }

                fn shrink(&self, value: $t) -> Box<dyn Shrink<$t>> {
                    Box::new(shrink::halving(value))
                }

                fn name(&self) -> String {
                    format!("Arbitrary<{}>", stringify!($t))
                }
            }
        )*
    };
}

arbitrary_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Generator for Arbitrary<bool> {
    type Output = bool;

    fn produce(&self, rose: &mut Rose) -> bool {
        rose.atom() & 1 == 1
    }

    fn shrink(&self, value: bool) -> Box<dyn Shrink<bool>> {
        Box::new(shrink::unfold(value, |more| *more, |_| (false, false)))
    }

    fn name(&self) -> String {
        "Arbitrary<bool>".to_string()
    }
}

/// Integers in `min..=max`, shrinking toward `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InRange<T> {
    min: T,
    max: T,
}

pub fn in_range<T: PartialOrd + fmt::Debug>(min: T, max: T) -> InRange<T> {
    assert!(min <= max, "empty range {:?}..={:?}", min, max);
    InRange { min, max }
}

macro_rules! in_range_int {
    ($($t:ty),*) => {
        $(
            impl Generator for InRange<$t> {
                type Output = $t;

                fn produce(&self, rose: &mut Rose) -> $t {
                    let span = (self.max as i128 - self.min as i128) as u128 + 1;
                    let offset = (rose.atom() as u128 % span) as i128;
                    (self.min as i128 + offset) as $t
                }

                fn shrink(&self, value: $t) -> Box<dyn Shrink<$t>> {
                    let min = self.min as i128;
                    let distance = value as i128 - min;
                    Box::new(shrink::unfold(
                        distance,
                        |d| *d != 0,
                        move |d| {
                            let closer = d / 2;
                            ((min + closer) as $t, closer)
                        },
                    ))
                }

                fn name(&self) -> String {
                    format!("InRange<{}>({}..={})", stringify!($t), self.min, self.max)
                }
            }
        )*
    };
}

in_range_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Two independently picked values.
#[derive(Debug, Clone)]
pub struct Pair<A, B> {
    first: A,
    second: B,
}

pub fn pair<A, B>(first: A, second: B) -> Pair<A, B> {
    Pair { first, second }
}

impl<A, B> Generator for Pair<A, B>
where
    A: Generator + Clone + 'static,
    B: Generator + Clone + 'static,
{
    type Output = (A::Output, B::Output);

    fn produce(&self, rose: &mut Rose) -> Self::Output {
        let first = rose.pick(&self.first);
        let second = rose.pick(&self.second);
        (first, second)
    }

    fn name(&self) -> String {
        format!("Pair<{}, {}>", self.first.name(), self.second.name())
    }
}

/// A vector whose length is picked first, then one pick per element.
#[derive(Debug, Clone)]
pub struct VecOf<G> {
    element: G,
    min_len: usize,
    max_len: usize,
}

pub fn vec_of<G>(element: G, min_len: usize, max_len: usize) -> VecOf<G> {
    assert!(min_len <= max_len, "empty length range {}..={}", min_len, max_len);
    VecOf {
        element,
        min_len,
        max_len,
    }
}

impl<G> Generator for VecOf<G>
where
    G: Generator + Clone + 'static,
{
    type Output = Vec<G::Output>;

    fn produce(&self, rose: &mut Rose) -> Self::Output {
        let len = rose.pick(&in_range(self.min_len, self.max_len));
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(rose.pick(&self.element));
        }
        values
    }

    fn shrink(&self, value: Self::Output) -> Box<dyn Shrink<Self::Output>> {
        if value.len() <= self.min_len {
            shrink::empty()
        } else {
            Box::new(shrink::remove_element(value))
        }
    }

    fn name(&self) -> String {
        format!("VecOf<{}>", self.element.name())
    }
}

/// Applies a function to the values of another generator, in the same node.
pub struct Map<G, F> {
    inner: G,
    f: Rc<F>,
}

impl<G: Clone, F> Clone for Map<G, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<G, F, U> Generator for Map<G, F>
where
    G: Generator,
    F: Fn(G::Output) -> U,
    U: Clone + fmt::Debug + 'static,
{
    type Output = U;

    fn produce(&self, rose: &mut Rose) -> U {
        (self.f)(self.inner.produce(rose))
    }

    fn name(&self) -> String {
        format!("Map<{}>", self.inner.name())
    }
}
