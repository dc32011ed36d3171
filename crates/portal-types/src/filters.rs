use serde::{Deserialize, Serialize};

fn lowercase_all(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values.map(|v| v.into_iter().map(|s| s.to_ascii_lowercase()).collect())
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

/// A filter matching logs by address and indexed topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Lowercase hex contract addresses to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<String>>,
    /// Lowercase hex values for topic position 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic0: Option<Vec<String>>,
    /// Lowercase hex values for topic position 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic1: Option<Vec<String>>,
    /// Lowercase hex values for topic position 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic2: Option<Vec<String>>,
    /// Lowercase hex values for topic position 3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic3: Option<Vec<String>>,
    /// Also return the transaction that emitted matching logs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction: bool,
    /// Also return traces of the transaction that emitted matching logs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction_traces: bool,
    /// Also return all logs of the transaction that emitted matching logs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction_logs: bool,
    /// Also return state diffs of the transaction that emitted matching logs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction_state_diffs: bool,
}

impl LogFilter {
    /// Normalize hex arrays to lowercase. Called once, at `add_*` time.
    pub fn normalized(mut self) -> Self {
        self.address = lowercase_all(self.address);
        self.topic0 = lowercase_all(self.topic0);
        self.topic1 = lowercase_all(self.topic1);
        self.topic2 = lowercase_all(self.topic2);
        self.topic3 = lowercase_all(self.topic3);
        self
    }

    /// Concatenate `self` with `other`, in that order.
    pub fn concat(self, other: Self) -> Self {
        Self {
            address: concat_opt(self.address, other.address),
            topic0: concat_opt(self.topic0, other.topic0),
            topic1: concat_opt(self.topic1, other.topic1),
            topic2: concat_opt(self.topic2, other.topic2),
            topic3: concat_opt(self.topic3, other.topic3),
            transaction: self.transaction || other.transaction,
            transaction_traces: self.transaction_traces || other.transaction_traces,
            transaction_logs: self.transaction_logs || other.transaction_logs,
            transaction_state_diffs: self.transaction_state_diffs || other.transaction_state_diffs,
        }
    }
}

/// A filter matching transactions by sender, recipient, or selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Lowercase hex recipient addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    /// Lowercase hex sender addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Vec<String>>,
    /// Lowercase hex 4-byte function selectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sighash: Option<Vec<String>>,
    /// EIP-2718 transaction type numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<Vec<u8>>,
    /// Also return logs emitted by matching transactions.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub logs: bool,
    /// Also return traces of matching transactions.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub traces: bool,
    /// Also return state diffs of matching transactions.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub state_diffs: bool,
}

impl TransactionFilter {
    /// Normalize hex arrays to lowercase. Called once, at `add_*` time.
    pub fn normalized(mut self) -> Self {
        self.to = lowercase_all(self.to);
        self.from = lowercase_all(self.from);
        self.sighash = lowercase_all(self.sighash);
        self
    }

    /// Concatenate `self` with `other`, in that order.
    pub fn concat(self, other: Self) -> Self {
        Self {
            to: concat_opt(self.to, other.to),
            from: concat_opt(self.from, other.from),
            sighash: concat_opt(self.sighash, other.sighash),
            r#type: concat_opt(self.r#type, other.r#type),
            logs: self.logs || other.logs,
            traces: self.traces || other.traces,
            state_diffs: self.state_diffs || other.state_diffs,
        }
    }
}

/// A filter matching call/create/suicide/reward traces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFilter {
    /// Trace type names to match (`"call"`, `"create"`, `"suicide"`, `"reward"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<Vec<String>>,
    /// Lowercase hex addresses that created a matching contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_from: Option<Vec<String>>,
    /// Lowercase hex call targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to: Option<Vec<String>>,
    /// Lowercase hex call senders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_from: Option<Vec<String>>,
    /// Lowercase hex 4-byte function selectors on call traces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_sighash: Option<Vec<String>>,
    /// Lowercase hex addresses refunded on a suicide/selfdestruct trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suicide_refund_address: Option<Vec<String>>,
    /// Lowercase hex block-reward beneficiary addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_author: Option<Vec<String>>,
    /// Also return the transaction containing the matching trace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction: bool,
    /// Also return all logs of the transaction containing the matching trace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction_logs: bool,
    /// Also return subtraces of the matching trace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub subtraces: bool,
    /// Also return ancestor traces of the matching trace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub parents: bool,
}

impl TraceFilter {
    /// Normalize hex arrays to lowercase. Called once, at `add_*` time.
    pub fn normalized(mut self) -> Self {
        self.create_from = lowercase_all(self.create_from);
        self.call_to = lowercase_all(self.call_to);
        self.call_from = lowercase_all(self.call_from);
        self.call_sighash = lowercase_all(self.call_sighash);
        self.suicide_refund_address = lowercase_all(self.suicide_refund_address);
        self.reward_author = lowercase_all(self.reward_author);
        self
    }

    /// Concatenate `self` with `other`, in that order.
    pub fn concat(self, other: Self) -> Self {
        Self {
            r#type: concat_opt(self.r#type, other.r#type),
            create_from: concat_opt(self.create_from, other.create_from),
            call_to: concat_opt(self.call_to, other.call_to),
            call_from: concat_opt(self.call_from, other.call_from),
            call_sighash: concat_opt(self.call_sighash, other.call_sighash),
            suicide_refund_address: concat_opt(
                self.suicide_refund_address,
                other.suicide_refund_address,
            ),
            reward_author: concat_opt(self.reward_author, other.reward_author),
            transaction: self.transaction || other.transaction,
            transaction_logs: self.transaction_logs || other.transaction_logs,
            subtraces: self.subtraces || other.subtraces,
            parents: self.parents || other.parents,
        }
    }
}

/// A filter matching state diffs by address, storage key, and kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDiffFilter {
    /// Lowercase hex account addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<String>>,
    /// Lowercase hex storage keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<String>>,
    /// Diff kind names (`"balance"`, `"nonce"`, `"code"`, `"storage"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Vec<String>>,
    /// Also return the transaction that produced the matching state diff.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transaction: bool,
}

impl StateDiffFilter {
    /// Normalize hex arrays to lowercase. Called once, at `add_*` time.
    pub fn normalized(mut self) -> Self {
        self.address = lowercase_all(self.address);
        self.key = lowercase_all(self.key);
        self
    }

    /// Concatenate `self` with `other`, in that order.
    pub fn concat(self, other: Self) -> Self {
        Self {
            address: concat_opt(self.address, other.address),
            key: concat_opt(self.key, other.key),
            kind: concat_opt(self.kind, other.kind),
            transaction: self.transaction || other.transaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_hex_at_add_time() {
        let f = LogFilter { address: Some(vec!["0xABCD".into()]), ..Default::default() }.normalized();
        assert_eq!(f.address, Some(vec!["0xabcd".into()]));
    }

    #[test]
    fn concat_is_none_when_both_sides_empty() {
        let merged = LogFilter::default().concat(LogFilter::default());
        assert_eq!(merged.address, None);
    }

    #[test]
    fn concat_ors_booleans() {
        let a = LogFilter { transaction: true, ..Default::default() };
        let b = LogFilter { transaction_logs: true, ..Default::default() };
        let merged = a.concat(b);
        assert!(merged.transaction);
        assert!(merged.transaction_logs);
    }
}
