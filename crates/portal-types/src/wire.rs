use crate::{FieldSelection, LogFilter, StateDiffFilter, TraceFilter, TransactionFilter};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// The `"type"` discriminant of a [`WireRequest`]. Always serializes to and
/// deserializes from the literal string `"evm"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvmKind;

impl Serialize for EvmKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("evm")
    }
}

impl<'de> Deserialize<'de> for EvmKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "evm" {
            Ok(Self)
        } else {
            Err(D::Error::custom(format!("expected request type \"evm\", got {s:?}")))
        }
    }
}

/// The JSON body POSTed to `finalized-stream`, one per contiguous range
/// segment produced by the query builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    /// Always `"evm"`.
    #[serde(rename = "type")]
    pub kind: EvmKind,
    /// The first block number to include.
    pub from_block: u64,
    /// The last block number to include, or `None` to stream to the head.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<u64>,
    /// Which fields the server must include per record kind.
    pub fields: FieldSelection,
    /// Log filters; omitted entirely (not an empty array) when none apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogFilter>>,
    /// Transaction filters; omitted entirely when none apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionFilter>>,
    /// Trace filters; omitted entirely when none apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traces: Option<Vec<TraceFilter>>,
    /// State-diff filters; omitted entirely when none apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_diffs: Option<Vec<StateDiffFilter>>,
    /// Whether every block in the range must be returned, even if it
    /// matches no filter.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_all_blocks: bool,
}
