use std::collections::BTreeSet;
use std::collections::btree_set;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Milliseconds from the start of the video.
pub type Timestamp = i64;

/// Ordered set of breakpoint timestamps.
///
/// Iteration is always ascending. Every mutation returns `true` only when the
/// set was actually modified, so repeated UI actions stay side-effect free.
///
/// # Example
/// ```
/// use engine::BreakpointSet;
///
/// let mut breakpoints = BreakpointSet::new();
/// assert!(breakpoints.add(2_000));
/// assert!(!breakpoints.add(2_000));
/// assert_eq!(breakpoints.first_after(1_000), Some(2_000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointSet {
    points: BTreeSet<Timestamp>,
}

impl BreakpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `at` if absent.
    pub fn add(&mut self, at: Timestamp) -> bool {
        self.points.insert(at)
    }

    /// Erases `at` if present.
    pub fn remove(&mut self, at: Timestamp) -> bool {
        self.points.remove(&at)
    }

    /// Moves a breakpoint from `old` to `new`.
    ///
    /// Any request with `old != new` counts as a change, even when `old` was
    /// absent or `new` already existed.
    pub fn replace(&mut self, old: Timestamp, new: Timestamp) -> bool {
        if old == new {
            return false;
        }
        self.points.remove(&old);
        self.points.insert(new);
        true
    }

    /// Adds several breakpoints as one logical operation.
    pub fn add_all<I>(&mut self, points: I) -> bool
    where
        I: IntoIterator<Item = Timestamp>,
    {
        points
            .into_iter()
            .fold(false, |changed, at| self.points.insert(at) || changed)
    }

    /// Removes several breakpoints as one logical operation.
    pub fn remove_all<I>(&mut self, points: I) -> bool
    where
        I: IntoIterator<Item = Timestamp>,
    {
        points
            .into_iter()
            .fold(false, |changed, at| self.points.remove(&at) || changed)
    }

    /// Adds `from, from + every, ...` up to and including `to`.
    pub fn add_regularly_spaced(
        &mut self,
        from: Timestamp,
        to: Timestamp,
        every: Timestamp,
    ) -> Result<bool> {
        let points = regularly_spaced(from, to, every)?;
        Ok(self.add_all(points))
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.points.contains(&at)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Timestamp> {
        self.points.iter()
    }

    /// Returns the first breakpoint strictly after `position`.
    pub fn first_after(&self, position: Timestamp) -> Option<Timestamp> {
        self.points
            .range((Bound::Excluded(position), Bound::Unbounded))
            .next()
            .copied()
    }

    /// Returns the breakpoint displayed at `index` in ascending order.
    pub fn get(&self, index: usize) -> Option<Timestamp> {
        self.points.iter().nth(index).copied()
    }

    pub fn to_vec(&self) -> Vec<Timestamp> {
        self.points.iter().copied().collect()
    }
}

impl FromIterator<Timestamp> for BreakpointSet {
    fn from_iter<I: IntoIterator<Item = Timestamp>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BreakpointSet {
    type Item = &'a Timestamp;
    type IntoIter = btree_set::Iter<'a, Timestamp>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Upper bound on the breakpoints generated by one regular-spacing request.
pub const MAX_REGULARLY_SPACED: i64 = 100_000;

/// Expands an inclusive `from..=to` range stepped by `every`.
///
/// Returns an empty list when `from > to`. Fails when `every <= 0` or when the
/// range would yield more than [`MAX_REGULARLY_SPACED`] points.
pub fn regularly_spaced(from: Timestamp, to: Timestamp, every: Timestamp) -> Result<Vec<Timestamp>> {
    let invalid = || EngineError::InvalidRange { from, to, every };
    if every <= 0 {
        return Err(invalid());
    }
    if from > to {
        return Ok(Vec::new());
    }

    let count = (i128::from(to) - i128::from(from)) / i128::from(every) + 1;
    if count > i128::from(MAX_REGULARLY_SPACED) {
        return Err(invalid());
    }

    let mut points = Vec::with_capacity(count as usize);
    let mut at = from;
    while at <= to {
        points.push(at);
        let Some(next) = at.checked_add(every) else {
            break;
        };
        at = next;
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::{BreakpointSet, MAX_REGULARLY_SPACED, regularly_spaced};
    use crate::error::EngineError;

    #[test]
    fn add_existing_breakpoint_is_a_no_op() {
        let mut breakpoints = BreakpointSet::from_iter([1_000, 3_000]);

        assert!(breakpoints.add(2_000));
        let before = breakpoints.clone();
        assert!(!breakpoints.add(2_000));
        assert_eq!(breakpoints, before);
    }

    #[test]
    fn add_then_remove_restores_original_set() {
        let original = BreakpointSet::from_iter([500, 4_000]);
        let mut breakpoints = original.clone();

        assert!(breakpoints.add(1_500));
        assert!(breakpoints.remove(1_500));
        assert_eq!(breakpoints, original);
        assert!(!breakpoints.remove(1_500));
    }

    #[test]
    fn replace_with_same_value_reports_no_change() {
        let mut breakpoints = BreakpointSet::from_iter([3_000]);

        assert!(!breakpoints.replace(3_000, 3_000));
        assert_eq!(breakpoints.to_vec(), vec![3_000]);
    }

    #[test]
    fn replace_with_different_value_is_always_a_change() {
        let mut breakpoints = BreakpointSet::from_iter([1_000, 2_000]);

        assert!(breakpoints.replace(1_000, 2_000));
        assert_eq!(breakpoints.to_vec(), vec![2_000]);

        assert!(breakpoints.replace(9_000, 2_000));
        assert_eq!(breakpoints.to_vec(), vec![2_000]);
    }

    #[test]
    fn regularly_spaced_includes_upper_bound() {
        let mut breakpoints = BreakpointSet::new();

        let changed = breakpoints
            .add_regularly_spaced(1_000, 5_000, 1_000)
            .expect("positive spacing");

        assert!(changed);
        assert_eq!(
            breakpoints.to_vec(),
            vec![1_000, 2_000, 3_000, 4_000, 5_000]
        );
    }

    #[test]
    fn regularly_spaced_with_reversed_bounds_is_empty() {
        let mut breakpoints = BreakpointSet::new();

        let changed = breakpoints
            .add_regularly_spaced(5_000, 1_000, 1_000)
            .expect("positive spacing");

        assert!(!changed);
        assert!(breakpoints.is_empty());
    }

    #[test]
    fn regularly_spaced_rejects_non_positive_step() {
        assert!(matches!(
            regularly_spaced(0, 1_000, 0),
            Err(EngineError::InvalidRange { every: 0, .. })
        ));
        assert!(matches!(
            regularly_spaced(0, 1_000, -5),
            Err(EngineError::InvalidRange { every: -5, .. })
        ));
    }

    #[test]
    fn regularly_spaced_rejects_oversized_ranges() {
        let error = regularly_spaced(0, i64::MAX, 1).expect_err("range is far too large");

        assert!(matches!(
            error,
            EngineError::InvalidRange {
                from: 0,
                to: i64::MAX,
                every: 1
            }
        ));
        assert!(error.to_string().starts_with("too many breakpoints"));

        let points = regularly_spaced(0, MAX_REGULARLY_SPACED - 1, 1).expect("exactly at the cap");
        assert_eq!(points.len(), MAX_REGULARLY_SPACED as usize);
        assert!(regularly_spaced(0, MAX_REGULARLY_SPACED, 1).is_err());
    }

    #[test]
    fn oversized_range_leaves_set_untouched() {
        let mut breakpoints = BreakpointSet::from_iter([1_000]);

        assert!(breakpoints.add_regularly_spaced(i64::MIN, i64::MAX, 2).is_err());
        assert_eq!(breakpoints.to_vec(), vec![1_000]);
    }

    #[test]
    fn regularly_spaced_stops_before_overflow() {
        let points = regularly_spaced(i64::MAX - 1, i64::MAX, 10).expect("positive spacing");
        assert_eq!(points, vec![i64::MAX - 1]);
    }

    #[test]
    fn first_after_is_strictly_greater() {
        let breakpoints = BreakpointSet::from_iter([2_000, 5_000]);

        assert_eq!(breakpoints.first_after(0), Some(2_000));
        assert_eq!(breakpoints.first_after(2_000), Some(5_000));
        assert_eq!(breakpoints.first_after(5_000), None);
    }

    #[test]
    fn deserialization_normalizes_unsorted_duplicates() {
        let breakpoints: BreakpointSet =
            serde_json::from_str("[3000, 1000, 3000, 2000]").expect("valid json");

        assert_eq!(breakpoints.to_vec(), vec![1_000, 2_000, 3_000]);
        assert_eq!(breakpoints.get(1), Some(2_000));
    }
}
