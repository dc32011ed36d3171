//! Query, filter, and wire types for the EVM portal finalized-stream protocol.
//!
//! This crate is deliberately free of any I/O: it only describes the shapes
//! that flow across the wire and the pure algebra (range clipping, range
//! merging, query building) that the streaming client needs to assemble
//! them. See `evm-portal-client` for the transport and streaming machinery
//! built on top of these types.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod range;
pub use range::{clip, merge, Range, RangeError};

mod filters;
pub use filters::{LogFilter, StateDiffFilter, TraceFilter, TransactionFilter};

mod fields;
pub use fields::FieldSelection;

mod query;
pub use query::{PerRangeRequest, Query, QueryBuilder, RequestPayload};

mod wire;
pub use wire::WireRequest;

mod block;
pub use block::{Block, BlockBatch, FinalizedHead, Header};
