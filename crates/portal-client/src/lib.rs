//! Client for the EVM portal's finalized-block streaming API.
//!
//! [`PortalClient`] drives a newline-delimited-JSON HTTP stream of finalized
//! blocks into a bounded [`BlockStream`], handling head-polling, truncated
//! responses, and backpressure. [`source::DataSource`] sits on top of it to
//! walk the disjoint range segments of an `evm_portal_types::Query`.

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
#![cfg_attr(docsrs, feature(doc_cfg))]

mod lines;
pub use lines::{LineSplitter, LineSplitterError};

mod buffer;

mod error;
pub use error::{PortalError, TransportError};

mod config;
pub use config::{ClientConfig, RequestDefaults, RetryConfig, StreamOpts};

mod transport;
pub use transport::{ReqwestTransport, StreamResponse, Transport};

mod head;

mod stream;
pub use stream::BlockStream;

mod client;
pub use client::PortalClient;

pub mod source;
pub use source::DataSource;
