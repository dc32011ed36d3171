use crate::{clip, merge, LogFilter, Range, StateDiffFilter, TraceFilter, TransactionFilter};

/// The filters contributed by one `add_*` call (or the fold of several,
/// after merging), attached to a single range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPayload {
    /// Accumulated log filters.
    pub logs: Option<Vec<LogFilter>>,
    /// Accumulated transaction filters.
    pub transactions: Option<Vec<TransactionFilter>>,
    /// Accumulated trace filters.
    pub traces: Option<Vec<TraceFilter>>,
    /// Accumulated state-diff filters.
    pub state_diffs: Option<Vec<StateDiffFilter>>,
    /// Whether every block in the range must be returned regardless of match.
    pub include_all_blocks: bool,
}

fn concat_opt<T>(a: Option<Vec<T>>, b: Option<Vec<T>>) -> Option<Vec<T>> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(mut a), Some(b)) => {
            a.extend(b);
            Some(a)
        }
    }
}

impl RequestPayload {
    /// Concatenate the per-kind filter lists of `self` and `other`, in that
    /// order, and OR `include_all_blocks`.
    pub fn concat(self, other: &Self) -> Self {
        Self {
            logs: concat_opt(self.logs, other.logs.clone()),
            transactions: concat_opt(self.transactions, other.transactions.clone()),
            traces: concat_opt(self.traces, other.traces.clone()),
            state_diffs: concat_opt(self.state_diffs, other.state_diffs.clone()),
            include_all_blocks: self.include_all_blocks || other.include_all_blocks,
        }
    }
}

/// One disjoint range and the filters that apply to it.
pub type PerRangeRequest = (Range, RequestPayload);

/// A fully built query: an outer range plus the disjoint, sorted per-range
/// filter segments that cover it.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The outer range the query was clipped to.
    pub range: Range,
    /// Disjoint, ascending-sorted per-range requests.
    pub per_range_requests: Vec<PerRangeRequest>,
}

/// Stateful accumulator that merges per-range user filters into a [`Query`].
///
/// Each `add_*` call normalizes its filter's hex arrays to lowercase (see
/// [`crate::filters`]) immediately, so that later merges compare equal
/// strings as equal regardless of the input's original casing.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    range: Range,
    entries: Vec<PerRangeRequest>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Create a new builder with an unbounded outer range starting at 0.
    pub fn new() -> Self {
        Self { range: Range::from(0), entries: Vec::new() }
    }

    /// Set the outer range the final query is clipped to.
    pub fn set_range(&mut self, range: Range) -> &mut Self {
        self.range = range;
        self
    }

    /// Add a log filter scoped to `range`.
    pub fn add_log(&mut self, filter: LogFilter, range: Range) -> &mut Self {
        self.entries.push((
            range,
            RequestPayload { logs: Some(vec![filter.normalized()]), ..Default::default() },
        ));
        self
    }

    /// Add a transaction filter scoped to `range`.
    pub fn add_transaction(&mut self, filter: TransactionFilter, range: Range) -> &mut Self {
        self.entries.push((
            range,
            RequestPayload {
                transactions: Some(vec![filter.normalized()]),
                ..Default::default()
            },
        ));
        self
    }

    /// Add a trace filter scoped to `range`.
    pub fn add_trace(&mut self, filter: TraceFilter, range: Range) -> &mut Self {
        self.entries.push((
            range,
            RequestPayload { traces: Some(vec![filter.normalized()]), ..Default::default() },
        ));
        self
    }

    /// Add a state-diff filter scoped to `range`.
    pub fn add_state_diff(&mut self, filter: StateDiffFilter, range: Range) -> &mut Self {
        self.entries.push((
            range,
            RequestPayload {
                state_diffs: Some(vec![filter.normalized()]),
                ..Default::default()
            },
        ));
        self
    }

    /// Merge all accumulated entries and clip the result by the outer range.
    pub fn build(&self) -> Query {
        let merged = merge(self.entries.clone(), RequestPayload::concat);
        let per_range_requests = clip(&merged, self.range);
        Query { range: self.range, per_range_requests }
    }
}
