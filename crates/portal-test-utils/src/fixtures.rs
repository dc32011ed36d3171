//! Pre-built NDJSON bodies and response scripts for the scenarios described
//! in the streaming client's testable-properties list (spec §8).

use crate::{FakeTransport, ScriptedChunk, ScriptedResponse};
use serde_json::json;

/// One NDJSON line for a minimal block at `number`, with `extra_bytes` of
/// padding in an unused header field so tests can hit byte-size thresholds
/// deterministically.
pub fn block_line(number: u64, extra_bytes: usize) -> String {
    let padding = "x".repeat(extra_bytes);
    let value = json!({
        "header": {
            "number": number,
            "hash": format!("0x{number:064x}"),
            "parentHash": format!("0x{:064x}", number.saturating_sub(1)),
            "padding": padding,
        }
    });
    serde_json::to_string(&value).expect("fixture block always serializes")
}

/// A scripted `200` body containing `count` contiguous blocks starting at
/// `from`, each line padded to `bytes_per_block` in total, delivered as one
/// chunk per block.
pub fn contiguous_blocks(from: u64, count: u64, bytes_per_block: usize) -> ScriptedResponse {
    let chunks = (from..from + count)
        .map(|n| {
            let mut line = block_line(n, bytes_per_block);
            line.push('\n');
            ScriptedChunk::Data(line.into_bytes())
        })
        .collect();
    ScriptedResponse::Ok(chunks)
}

/// Like [`contiguous_blocks`], but splits every line's bytes across two
/// chunks at an arbitrary midpoint, exercising the line splitter's
/// chunk-boundary handling (spec §4.1, §8 S1).
pub fn contiguous_blocks_split_mid_line(from: u64, count: u64) -> ScriptedResponse {
    let mut chunks = Vec::new();
    for n in from..from + count {
        let mut line = block_line(n, 0);
        line.push('\n');
        let bytes = line.into_bytes();
        let mid = bytes.len() / 2;
        let (a, b) = bytes.split_at(mid);
        chunks.push(ScriptedChunk::Data(a.to_vec()));
        chunks.push(ScriptedChunk::Data(b.to_vec()));
    }
    ScriptedResponse::Ok(chunks)
}

/// A body that delivers `before_cut` blocks, then ends with a transient
/// error partway through, simulating a dropped connection mid-stream (spec
/// §8 S3, "Truncated response & resumption").
pub fn truncated_after(from: u64, before_cut: u64) -> ScriptedResponse {
    let mut chunks: Vec<ScriptedChunk> = (from..from + before_cut)
        .map(|n| {
            let mut line = block_line(n, 0);
            line.push('\n');
            ScriptedChunk::Data(line.into_bytes())
        })
        .collect();
    chunks.push(ScriptedChunk::TransientError);
    ScriptedResponse::Ok(chunks)
}

/// A body whose first chunk never crosses `min_bytes` and is followed by a
/// long pause, exercising the idle timer (spec §4.4 trigger 2, §8 S5).
pub fn single_small_block_then_stall(number: u64, pause: std::time::Duration) -> ScriptedResponse {
    let mut line = block_line(number, 0);
    line.push('\n');
    ScriptedResponse::Ok(vec![ScriptedChunk::Data(line.into_bytes()), ScriptedChunk::Pause(pause)])
}

/// A transport that reports `204` (no content) `no_content_rounds` times
/// before returning `tail`, simulating a stream caught up to the chain head
/// polling for new blocks (spec §8 S2, "Head polling").
pub fn head_polling_then_data(height: u64, no_content_rounds: usize, tail: ScriptedResponse) -> FakeTransport {
    let mut script = vec![ScriptedResponse::NoContent; no_content_rounds];
    script.push(tail);
    FakeTransport::new(height, script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_line_round_trips_through_the_wire_type() {
        let line = block_line(42, 4);
        let block: evm_portal_types::Block = serde_json::from_str(&line).unwrap();
        assert_eq!(block.number(), 42);
    }
}
