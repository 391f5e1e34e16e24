//! Set enumeration
//!
//! Three cards form a set when each of the four attributes is either the
//! same on all three cards or different on all three.

use crate::attributes::AttributeLabel;

/// Anything that carries a resolved label
pub trait Labeled {
    fn label(&self) -> &AttributeLabel;
}

impl Labeled for AttributeLabel {
    fn label(&self) -> &AttributeLabel {
        self
    }
}

impl<T: Labeled> Labeled for &T {
    fn label(&self) -> &AttributeLabel {
        (*self).label()
    }
}

/// Three cards that form a set
///
/// `indices` are positions in the slice passed to `find_sets`, ascending.
#[derive(Debug)]
pub struct SetTriple<'a, T> {
    pub indices: [usize; 3],
    pub cards: [&'a T; 3],
}

impl<T> Clone for SetTriple<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SetTriple<'_, T> {}

impl<T: Labeled> SetTriple<'_, T> {
    pub fn labels(&self) -> [&AttributeLabel; 3] {
        self.cards.map(|card| card.label())
    }
}

/// True when every attribute is all-same or all-different across the three labels
pub fn is_valid_set(a: &AttributeLabel, b: &AttributeLabel, c: &AttributeLabel) -> bool {
    let (a, b, c) = (a.ordinals(), b.ordinals(), c.ordinals());
    (0..4).all(|field| {
        let all_same = a[field] == b[field] && b[field] == c[field];
        let all_different = a[field] != b[field] && b[field] != c[field] && a[field] != c[field];
        all_same || all_different
    })
}

/// Every set among `cards`, in lexicographic `i < j < k` order
pub fn find_sets<T: Labeled>(cards: &[T]) -> Vec<SetTriple<'_, T>> {
    combinations(cards.len())
        .filter(|[i, j, k]| is_valid_set(cards[*i].label(), cards[*j].label(), cards[*k].label()))
        .map(|indices| SetTriple {
            indices,
            cards: indices.map(|i| &cards[i]),
        })
        .collect()
}

/// Index triples `i < j < k < n` in lexicographic order
pub fn combinations(n: usize) -> impl Iterator<Item = [usize; 3]> {
    (0..n).flat_map(move |i| {
        (i + 1..n).flat_map(move |j| (j + 1..n).map(move |k| [i, j, k]))
    })
}
