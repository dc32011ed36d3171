use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ALWAYS_BLOCK: &[&str] = &["number", "hash", "parentHash"];
const ALWAYS_TRANSACTION: &[&str] = &["transactionIndex"];
const ALWAYS_LOG: &[&str] = &["logIndex", "transactionIndex"];
const ALWAYS_TRACE: &[&str] = &["transactionIndex", "traceAddress", "type"];
const ALWAYS_STATE_DIFF: &[&str] = &["transactionIndex", "address", "key", "kind"];

/// A per-record-kind map of field name -> whether it is selected.
///
/// This is the *runtime* shape of a static, compile-time field projection:
/// instead of a generated type narrowing which fields exist, the selection
/// is plain data that the streaming client sends to the server and that a
/// consumer can inspect to know what it asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelection {
    /// Selected block-header fields.
    #[serde(default)]
    pub block: BTreeMap<String, bool>,
    /// Selected transaction fields.
    #[serde(default)]
    pub transaction: BTreeMap<String, bool>,
    /// Selected log fields.
    #[serde(default)]
    pub log: BTreeMap<String, bool>,
    /// Selected trace fields.
    #[serde(default)]
    pub trace: BTreeMap<String, bool>,
    /// Selected state-diff fields.
    #[serde(default, rename = "stateDiff")]
    pub state_diff: BTreeMap<String, bool>,
}

fn force(map: &mut BTreeMap<String, bool>, names: &[&str]) {
    for name in names {
        map.insert((*name).to_owned(), true);
    }
}

fn union_map(mut a: BTreeMap<String, bool>, b: BTreeMap<String, bool>) -> BTreeMap<String, bool> {
    for (k, v) in b {
        let entry = a.entry(k).or_insert(false);
        *entry = *entry || v;
    }
    a
}

impl FieldSelection {
    /// An empty selection (only always-selected fields after [`Self::with_always_selected`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a single field as selected for block headers.
    pub fn select_block(mut self, field: impl Into<String>) -> Self {
        self.block.insert(field.into(), true);
        self
    }

    /// Mark a single field as selected for transactions.
    pub fn select_transaction(mut self, field: impl Into<String>) -> Self {
        self.transaction.insert(field.into(), true);
        self
    }

    /// Mark a single field as selected for logs.
    pub fn select_log(mut self, field: impl Into<String>) -> Self {
        self.log.insert(field.into(), true);
        self
    }

    /// Mark a single field as selected for traces.
    pub fn select_trace(mut self, field: impl Into<String>) -> Self {
        self.trace.insert(field.into(), true);
        self
    }

    /// Mark a single field as selected for state diffs.
    pub fn select_state_diff(mut self, field: impl Into<String>) -> Self {
        self.state_diff.insert(field.into(), true);
        self
    }

    /// The union of `self` and `other`: a field is selected if either side
    /// selects it.
    pub fn union(self, other: Self) -> Self {
        Self {
            block: union_map(self.block, other.block),
            transaction: union_map(self.transaction, other.transaction),
            log: union_map(self.log, other.log),
            trace: union_map(self.trace, other.trace),
            state_diff: union_map(self.state_diff, other.state_diff),
        }
    }

    /// Force every always-selected field (see §3) to `true`, regardless of
    /// what the user asked for.
    pub fn with_always_selected(mut self) -> Self {
        force(&mut self.block, ALWAYS_BLOCK);
        force(&mut self.transaction, ALWAYS_TRANSACTION);
        force(&mut self.log, ALWAYS_LOG);
        force(&mut self.trace, ALWAYS_TRACE);
        force(&mut self.state_diff, ALWAYS_STATE_DIFF);
        self
    }
}
