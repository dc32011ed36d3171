//! Stream finalized blocks from a portal to stdout.
//!
//! ```text
//! cargo run -p evm-portal-client --example stream_blocks -- \
//!     --url https://portal.example --from-block 21000000
//! ```

use clap::Parser;
use evm_portal_client::{ClientConfig, PortalClient, StreamOpts};
use evm_portal_types::{FieldSelection, QueryBuilder, Range, RequestPayload};

#[derive(Debug, Parser)]
struct Args {
    /// Base URL of the portal service.
    #[arg(long)]
    url: url::Url,
    /// First block number to stream.
    #[arg(long, default_value_t = 0)]
    from_block: u64,
    /// Last block number to stream, inclusive; omit to stream to the head.
    #[arg(long)]
    to_block: Option<u64>,
    /// Stop once the stream catches up to the finalized head instead of polling.
    #[arg(long)]
    stop_on_head: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let client = PortalClient::new(ClientConfig::new(args.url));
    let height = client.get_finalized_height().await?;
    println!("portal finalized height: {height}");

    let mut builder = QueryBuilder::new();
    let range = Range::new(args.from_block, args.to_block)?;
    builder.set_range(range);
    let query = builder.build();
    let fields = FieldSelection::new();

    let Some((range, _)) = query.per_range_requests.into_iter().next() else {
        println!("empty range, nothing to stream");
        return Ok(());
    };

    let opts = StreamOpts { stop_on_head: args.stop_on_head, ..Default::default() };
    let mut stream = client.get_finalized_stream(range, RequestPayload::default(), fields, opts);

    while let Some(batch) = stream.next().await {
        let batch = batch?;
        for block in &batch.blocks {
            println!(
                "block {} hash={} (finalized_head={})",
                block.header.number, block.header.hash, batch.finalized_head.number
            );
        }
    }

    Ok(())
}
