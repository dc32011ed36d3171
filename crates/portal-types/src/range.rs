use std::cmp::{max, min};

/// A half-open-in-spirit, inclusive-in-representation block range.
///
/// Both endpoints are inclusive. `to == None` means "unbounded", i.e. the
/// range extends to the finalized head (or beyond, for a streaming query).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Range {
    /// The first block number included in the range.
    pub from: u64,
    /// The last block number included in the range, or `None` if unbounded.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<u64>,
}

/// An error constructing or combining [`Range`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// `from` was greater than `to`.
    #[error("range `from` ({from}) is greater than `to` ({to})")]
    FromAfterTo {
        /// The offending lower bound.
        from: u64,
        /// The offending upper bound.
        to: u64,
    },
}

impl Range {
    /// Create a new unbounded range starting at `from`.
    pub const fn from(from: u64) -> Self {
        Self { from, to: None }
    }

    /// Create a new range, validating that `from <= to` when `to` is given.
    pub fn new(from: u64, to: Option<u64>) -> Result<Self, RangeError> {
        if let Some(to) = to {
            if from > to {
                return Err(RangeError::FromAfterTo { from, to });
            }
        }
        Ok(Self { from, to })
    }

    /// Create a new bounded range `[from, to]`.
    pub fn bounded(from: u64, to: u64) -> Result<Self, RangeError> {
        Self::new(from, Some(to))
    }

    /// True if this range has no upper bound.
    pub const fn is_unbounded(&self) -> bool {
        self.to.is_none()
    }

    /// True if `n` falls within this range.
    pub const fn contains(&self, n: u64) -> bool {
        match self.to {
            Some(to) => n >= self.from && n <= to,
            None => n >= self.from,
        }
    }

    /// The intersection of two ranges, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let from = max(self.from, other.from);
        let to = match (self.to, other.to) {
            (None, None) => None,
            (Some(a), None) | (None, Some(a)) => Some(a),
            (Some(a), Some(b)) => Some(min(a, b)),
        };
        if let Some(to) = to {
            if to < from {
                return None;
            }
        }
        Some(Self { from, to })
    }

    /// True if the two ranges share at least one block.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.intersect(other).is_some()
    }

    /// The breakpoint one past this range's upper bound, if bounded.
    const fn exclusive_end(&self) -> Option<u64> {
        match self.to {
            Some(to) => to.checked_add(1),
            None => None,
        }
    }
}

/// Clip an ordered list of `(range, payload)` entries by an outer bound.
///
/// Entries that do not overlap `outer` are dropped; entries that partially
/// overlap have their range intersected with `outer`. Input order is
/// preserved.
pub fn clip<T: Clone>(entries: &[(Range, T)], outer: Range) -> Vec<(Range, T)> {
    entries
        .iter()
        .filter_map(|(range, payload)| range.intersect(&outer).map(|clipped| (clipped, payload.clone())))
        .collect()
}

/// Merge an unordered list of `(range, payload)` entries into an ordered,
/// disjoint list of segments covering the union of the inputs.
///
/// `fold` combines the payload of a segment-in-progress (`acc`) with that of
/// another entry covering the same segment; it is applied left-to-right in
/// input order, so it need not be commutative. Adjacent segments whose
/// payloads compare equal are coalesced.
pub fn merge<T, F>(entries: Vec<(Range, T)>, fold: F) -> Vec<(Range, T)>
where
    T: Clone + PartialEq,
    F: Fn(T, &T) -> T,
{
    if entries.is_empty() {
        return Vec::new();
    }

    // Sweep-line over start/end breakpoints. `None` end means "never removed".
    let mut starts: Vec<u64> = entries.iter().map(|(r, _)| r.from).collect();
    let mut ends: Vec<u64> = entries.iter().filter_map(|(r, _)| r.exclusive_end()).collect();

    let mut breakpoints = Vec::with_capacity(starts.len() + ends.len());
    breakpoints.append(&mut starts);
    breakpoints.append(&mut ends);
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let mut segments: Vec<(Range, T)> = Vec::new();

    for window in 0..breakpoints.len() {
        let point = breakpoints[window];
        let next_point = breakpoints.get(window + 1).copied();

        // Entries active across [point, next_point - 1] (or unbounded).
        let mut active = entries
            .iter()
            .filter(|(r, _)| r.from <= point && r.to.map_or(true, |to| to >= point));
        let Some((_, first_payload)) = active.next() else { continue };

        let merged = active.fold(first_payload.clone(), |acc, (_, payload)| fold(acc, payload));
        let segment_to = next_point.map(|p| p - 1);
        let range = Range { from: point, to: segment_to };

        match segments.last_mut() {
            Some((last_range, last_payload)) if *last_payload == merged && last_range.to.map(|t| t + 1) == Some(point) => {
                last_range.to = segment_to;
            }
            _ => segments.push((range, merged)),
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(from: u64, to: Option<u64>) -> Range {
        Range { from, to }
    }

    #[test]
    fn intersect_basic() {
        assert_eq!(r(10, Some(20)).intersect(&r(15, Some(25))), Some(r(15, Some(20))));
        assert_eq!(r(10, Some(20)).intersect(&r(21, Some(25))), None);
        assert_eq!(r(10, None).intersect(&r(5, Some(8))), None);
        assert_eq!(r(10, None).intersect(&r(5, Some(15))), Some(r(10, Some(15))));
        assert_eq!(r(10, None).intersect(&r(15, None)), Some(r(15, None)));
    }

    #[test]
    fn clip_drops_non_overlapping_and_preserves_order() {
        let entries = vec![(r(0, Some(9)), "a"), (r(5, Some(15)), "b"), (r(100, Some(200)), "c")];
        let clipped = clip(&entries, r(5, Some(15)));
        assert_eq!(clipped, vec![(r(5, Some(9)), "a"), (r(5, Some(15)), "b")]);
    }

    #[test]
    fn clip_twice_equals_clip_by_intersection() {
        let entries = vec![(r(0, Some(100)), "a"), (r(40, Some(60)), "b")];
        let a = r(10, Some(70));
        let b = r(30, Some(200));
        let double = clip(&clip(&entries, a), b);
        let single = clip(&entries, a.intersect(&b).unwrap());
        assert_eq!(double, single);
    }

    #[test]
    fn merge_disjoint_inputs_are_untouched() {
        let entries = vec![(r(0, Some(9)), vec![1]), (r(10, Some(19)), vec![2])];
        let merged = merge(entries, |mut acc, next| {
            acc.extend(next.iter().copied());
            acc
        });
        assert_eq!(merged, vec![(r(0, Some(9)), vec![1]), (r(10, Some(19)), vec![2])]);
    }

    #[test]
    fn merge_overlapping_inputs_segment_and_fold() {
        let entries = vec![(r(0, Some(9)), vec![1]), (r(5, Some(14)), vec![2])];
        let merged = merge(entries, |mut acc, next| {
            acc.extend(next.iter().copied());
            acc
        });
        assert_eq!(
            merged,
            vec![(r(0, Some(4)), vec![1]), (r(5, Some(9)), vec![1, 2]), (r(10, Some(14)), vec![2])]
        );
    }

    #[test]
    fn merge_unbounded_tail_stays_unbounded() {
        let entries = vec![(r(0, Some(9)), vec![1]), (r(5, None), vec![2])];
        let merged = merge(entries, |mut acc, next| {
            acc.extend(next.iter().copied());
            acc
        });
        assert_eq!(
            merged,
            vec![(r(0, Some(4)), vec![1]), (r(5, Some(9)), vec![1, 2]), (r(10, None), vec![2])]
        );
    }

    #[test]
    fn merge_coalesces_adjacent_equal_payloads() {
        let entries = vec![(r(0, Some(9)), vec![1]), (r(10, Some(19)), vec![1])];
        let merged = merge(entries, |mut acc, next| {
            acc.extend(next.iter().copied());
            acc
        });
        assert_eq!(merged, vec![(r(0, Some(19)), vec![1])]);
    }
}
