use crate::{client::PortalClient, config::StreamOpts, error::PortalError, stream::BlockStream};
use evm_portal_types::{clip, BlockBatch, FieldSelection, PerRangeRequest, Query, Range};
use std::collections::VecDeque;

/// A query bound to a client: the façade callers reach for after building a
/// [`Query`] (spec §4.6).
///
/// A `Query` carries one or more disjoint range segments, each with its own
/// filters; [`PortalClient::get_finalized_stream`] only understands a single
/// segment, so `DataSource` is what walks the segments in order and
/// concatenates their streams into one logical stream of batches.
#[derive(Debug, Clone)]
pub struct DataSource {
    client: PortalClient,
    query: Query,
    fields: FieldSelection,
}

impl DataSource {
    /// Bind `query` (as produced by [`evm_portal_types::QueryBuilder::build`])
    /// and `fields` to `client`.
    pub fn new(client: PortalClient, query: Query, fields: FieldSelection) -> Self {
        Self { client, query, fields }
    }

    /// The portal's current finalized height. Alias of [`Self::get_finalized_height`]
    /// (spec §4.6 names both; this client only ever serves finalized blocks,
    /// so the two delegate to the same poll).
    pub async fn get_height(&self) -> Result<u64, PortalError> {
        self.get_finalized_height().await
    }

    /// The portal's current finalized height.
    pub async fn get_finalized_height(&self) -> Result<u64, PortalError> {
        self.client.get_finalized_height().await
    }

    /// Stream every segment of the bound query in order, optionally clipped
    /// further to `outer_range`.
    ///
    /// `opts.stop_on_head` governs every segment, not just the last: when
    /// `false`, only the final segment actually polls at the head (earlier
    /// segments are bounded ranges that end naturally).
    pub fn get_block_stream(&self, outer_range: Option<Range>, opts: StreamOpts) -> BlockStreamIter {
        let segments: Vec<PerRangeRequest> = match outer_range {
            Some(outer) => clip(&self.query.per_range_requests, outer),
            None => self.query.per_range_requests.clone(),
        };
        BlockStreamIter {
            client: self.client.clone(),
            fields: self.fields.clone(),
            opts,
            remaining: segments.into(),
            current: None,
        }
    }
}

/// Sequential iterator over a query's disjoint segments, each driven by its
/// own [`BlockStream`] (spec §4.6).
#[derive(Debug)]
pub struct BlockStreamIter {
    client: PortalClient,
    fields: FieldSelection,
    opts: StreamOpts,
    remaining: VecDeque<PerRangeRequest>,
    current: Option<BlockStream>,
}

impl BlockStreamIter {
    /// Pull the next batch, advancing to the next segment's stream when the
    /// current one is exhausted. Returns `None` once every segment has been
    /// drained.
    pub async fn next(&mut self) -> Option<Result<BlockBatch, PortalError>> {
        loop {
            if self.current.is_none() {
                let (range, payload) = self.remaining.pop_front()?;
                self.current = Some(self.client.get_finalized_stream(
                    range,
                    payload,
                    self.fields.clone(),
                    self.opts.clone(),
                ));
            }
            let stream = self.current.as_mut().expect("just populated above");
            match stream.next().await {
                Some(result) => return Some(result),
                None => {
                    self.current = None;
                }
            }
        }
    }

    /// Cancel the segment currently streaming, if any. Does not prevent
    /// later segments from starting on a subsequent `next` call.
    pub fn cancel(&self) {
        if let Some(stream) = &self.current {
            stream.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use evm_portal_types::QueryBuilder;

    #[test]
    fn builds_over_an_empty_query_without_panicking() {
        let client = PortalClient::new(ClientConfig::new(url::Url::parse("https://portal.example").unwrap()));
        let query = QueryBuilder::new().build();
        let source = DataSource::new(client, query, FieldSelection::new());
        let iter = source.get_block_stream(None, StreamOpts::default());
        assert!(iter.remaining.is_empty());
    }
}
