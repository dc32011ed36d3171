use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded block header.
///
/// `number`, `hash` and `parent_hash` are always present (they are part of
/// the always-selected field set, see [`crate::FieldSelection`]); every
/// other selected header field lands in `extra`, keeping the "runtime shape
/// of projections" the core actually needs instead of a generated type per
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// The block number.
    pub number: u64,
    /// The block hash, as lowercase hex.
    pub hash: String,
    /// The parent block hash, as lowercase hex.
    pub parent_hash: String,
    /// Any other selected header fields, keyed by field name.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single decoded NDJSON block line.
///
/// Per-kind arrays are `None` (absent on the wire) when empty or unselected;
/// the individual records are kept as raw [`Value`]s, since the typed
/// block-entity object graph is out of scope for this crate (see spec §1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// Selected transactions, if any were requested and matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Value>>,
    /// Selected logs, if any were requested and matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<Value>>,
    /// Selected traces, if any were requested and matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces: Option<Vec<Value>>,
    /// Selected state diffs, if any were requested and matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_diffs: Option<Vec<Value>>,
}

impl Block {
    /// The block number, read off the header.
    pub const fn number(&self) -> u64 {
        self.header.number
    }
}

/// The portal's current finalized chain head, as stamped on every batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedHead {
    /// The finalized height.
    pub number: u64,
    /// The finalized block hash. Always `None` today — the portal does not
    /// yet return it; kept for source-compatibility (see SPEC_FULL §9).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl FinalizedHead {
    /// A finalized head at height 0, with no hash.
    pub const fn new(number: u64) -> Self {
        Self { number, hash: None }
    }
}

/// A batch of contiguous, strictly-increasing blocks delivered to the
/// consumer, stamped with the finalized head observed at delivery time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBatch {
    /// The finalized head observed when this batch was handed off.
    pub finalized_head: FinalizedHead,
    /// The blocks in this batch, in strictly increasing block-number order.
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_keeps_unselected_name_fields_in_extra() {
        let line = r#"{"number":10,"hash":"0xaa","parentHash":"0xbb","timestamp":"123"}"#;
        let header: Header = serde_json::from_str(line).unwrap();
        assert_eq!(header.number, 10);
        assert_eq!(header.extra.get("timestamp").unwrap(), "123");
    }

    #[test]
    fn block_omits_absent_arrays_on_reserialize() {
        let line = r#"{"header":{"number":1,"hash":"0x1","parentHash":"0x0"}}"#;
        let block: Block = serde_json::from_str(line).unwrap();
        assert!(block.transactions.is_none());
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("transactions").is_none());
    }
}
