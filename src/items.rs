//! Read-only, index-preserving views over span storage.

use std::ops::Range;

use crate::span::{Span, TimeRange};
use crate::trace::Timestamp;

/// A window into a slice that remembers where it sits in the full sequence.
///
/// Narrowing a view never copies: it re-slices the borrowed storage and
/// shifts the offset, so `original_index` keeps pointing at the same item
/// of the track no matter how many times the view was narrowed.
#[derive(Debug)]
pub struct ItemsView<'a, T> {
    items: &'a [T],
    offset: usize,
}

impl<T> Clone for ItemsView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ItemsView<'_, T> {}

impl<T: PartialEq> PartialEq for ItemsView<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.items == other.items
    }
}

impl<'a, T> ItemsView<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { items, offset: 0 }
    }

    pub fn empty() -> Self {
        Self {
            items: &[],
            offset: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at `idx`, by value.
    ///
    /// Panics if `idx` is out of range, like slice indexing.
    pub fn at(&self, idx: usize) -> T
    where
        T: Copy,
    {
        self.items[idx]
    }

    /// A reference into the underlying storage.
    ///
    /// Panics if `idx` is out of range.
    pub fn at_ptr(&self, idx: usize) -> &'a T {
        &self.items[idx]
    }

    pub fn get(&self, idx: usize) -> Option<&'a T> {
        self.items.get(idx)
    }

    pub fn first(&self) -> Option<&'a T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&'a T> {
        self.items.last()
    }

    /// Narrows the view to `range`, relative to this view.
    ///
    /// Out-of-range bounds are clamped to the view.
    pub fn subslice(&self, range: Range<usize>) -> ItemsView<'a, T> {
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        ItemsView {
            items: &self.items[start..end],
            offset: self.offset + start,
        }
    }

    /// Maps an index of this view to the index in the full sequence.
    pub fn original_index(&self, idx: usize) -> usize {
        self.offset + idx
    }

    /// The range of the full sequence this view covers.
    pub fn original_range(&self) -> Range<usize> {
        self.offset..self.offset + self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.items
    }
}

impl<'a, T> IntoIterator for ItemsView<'a, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl ItemsView<'_, Span> {
    /// First start to last end. `None` for an empty view.
    pub fn bounds(&self) -> Option<TimeRange> {
        let first = self.items.first()?;
        let last = self.items.last()?;
        Some(TimeRange::new(first.start, last.end))
    }

    /// Sum of the span durations, gaps excluded.
    pub fn total_duration(&self) -> i64 {
        self.items.iter().map(Span::duration).sum()
    }
}

/// Groups a view into clusters that are each at least `min_width` wide on
/// screen, or a single span.
///
/// A span at least `min_width` long always stands alone. A shorter span
/// absorbs its successors until the cluster reaches `min_width`. A gap or a
/// next span of at least `min_width` ends the cluster early, so only the
/// cluster before such a break can stay narrower.
pub fn coalesce<'a>(view: ItemsView<'a, Span>, min_width: Timestamp) -> Vec<ItemsView<'a, Span>> {
    let spans = view.as_slice();
    let mut out = Vec::new();
    let mut i = 0;
    while i < spans.len() {
        let first = &spans[i];
        let mut j = i + 1;
        while j < spans.len() && spans[j - 1].end - first.start < min_width {
            let next = &spans[j];
            if next.start - spans[j - 1].end >= min_width || next.duration() >= min_width {
                break;
            }
            j += 1;
        }
        out.push(view.subslice(i..j));
        i = j;
    }
    out
}
