//! # Weighted Selection
//!
//! Cumulative-distribution tables for picking catalog entries.
//!
//! ## Selection Rule
//!
//! A draw `r` in `[0, total)` selects the smallest index `i` with
//! `r <= cumulative[i]`. The bound is inclusive and the first match wins,
//! so a zero-weight entry can only ever win a draw that lands exactly on
//! the boundary it shares with its predecessor. Reproducibility tests
//! depend on this exact tie-break.

use crate::error::{GenerationError, GenerationResult};
use crate::random::RandomSource;

/// Ascending cumulative sums over an ordered weight sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightTable {
    /// `cumulative[i]` is the sum of weights `0..=i`.
    cumulative: Vec<f64>,
    /// Cached total weight (last cumulative value, or 0).
    total: f64,
}

impl WeightTable {
    /// Builds a table from weights.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if any weight is negative
    /// or not finite. A table whose weights are all zero builds fine; it is
    /// rejected only once a draw is attempted.
    pub fn new<I>(weights: I) -> GenerationResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut total = 0.0;
        let mut cumulative = Vec::new();

        for (index, weight) in weights.into_iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GenerationError::InvalidConfig(format!(
                    "weight {weight} at position {index} must be finite and non-negative"
                )));
            }
            total += weight;
            cumulative.push(total);
        }

        Ok(Self { cumulative, total })
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// Returns true if the table has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Total weight.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// The cumulative sums.
    #[inline]
    #[must_use]
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Checks that a draw can be taken from this table.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidWeights`] when the total is not positive.
    pub fn ensure_drawable(&self) -> GenerationResult<()> {
        if self.total > 0.0 {
            Ok(())
        } else {
            Err(GenerationError::InvalidWeights { total: self.total })
        }
    }

    /// Applies the selection rule without validating `r`.
    ///
    /// Returns `None` when no cumulative value reaches `r`.
    #[inline]
    #[must_use]
    pub fn index_for(&self, r: f64) -> Option<usize> {
        // Cumulative sums never decrease, so the first `c >= r` is a partition point.
        let index = self.cumulative.partition_point(|&c| c < r);
        (index < self.cumulative.len()).then_some(index)
    }

    /// Selects the index for a draw `r` in `[0, total]`.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::InvalidWeights`] if the total is not positive
    /// - [`GenerationError::DrawOutOfRange`] if `r` is outside `[0, total]`
    pub fn select(&self, r: f64) -> GenerationResult<usize> {
        self.ensure_drawable()?;

        let out_of_range = || GenerationError::DrawOutOfRange {
            draw: r,
            total: self.total,
        };
        if !(0.0..=self.total).contains(&r) {
            return Err(out_of_range());
        }

        self.index_for(r).ok_or_else(out_of_range)
    }

    /// Draws an index with `r` uniform in `[0, total)`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidWeights`] if the total is not positive.
    pub fn draw(&self, rng: &mut dyn RandomSource) -> GenerationResult<usize> {
        self.ensure_drawable()?;
        self.select(rng.range(0.0, self.total))
    }
}

/// An item paired with its selection weight.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightEntry<T> {
    /// The selectable item.
    pub item: T,
    /// Non-negative selection weight.
    pub weight: f64,
}

impl<T> WeightEntry<T> {
    /// Creates a new entry.
    #[must_use]
    pub const fn new(item: T, weight: f64) -> Self {
        Self { item, weight }
    }
}

/// Items plus the weight table that picks among them.
#[derive(Clone, Debug)]
pub struct WeightedSelector<T> {
    items: Vec<T>,
    table: WeightTable,
}

impl<T> WeightedSelector<T> {
    /// Builds a selector from ordered entries.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] for a negative or non-finite weight.
    pub fn new<I>(entries: I) -> GenerationResult<Self>
    where
        I: IntoIterator<Item = WeightEntry<T>>,
    {
        let (items, weights): (Vec<T>, Vec<f64>) = entries
            .into_iter()
            .map(|entry| (entry.item, entry.weight))
            .unzip();
        let table = WeightTable::new(weights)?;

        Ok(Self { items, table })
    }

    /// The items in selection order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The underlying table.
    #[must_use]
    pub const fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Draws one item, returning its index alongside it.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidWeights`] if the total is not positive.
    pub fn choose(&self, rng: &mut dyn RandomSource) -> GenerationResult<(usize, &T)> {
        let index = self.table.draw(rng)?;
        Ok((index, &self.items[index]))
    }
}
