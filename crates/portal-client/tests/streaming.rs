use evm_portal_client::{ClientConfig, PortalClient, StreamOpts};
use evm_portal_types::{FieldSelection, Range, RequestPayload};
use evm_portal_test_utils::{fixtures, FakeTransport};
use std::{sync::Arc, time::Duration};

fn client_with(transport: FakeTransport, max_bytes: u64) -> PortalClient {
    let mut config = ClientConfig::new(url::Url::parse("https://portal.example").unwrap());
    config.min_bytes = 1;
    config.max_bytes = max_bytes.max(config.min_bytes);
    PortalClient::with_transport(config, Arc::new(transport))
}

#[tokio::test]
async fn s1_happy_path_delivers_all_blocks_in_order() {
    let transport = FakeTransport::new(102, vec![fixtures::contiguous_blocks(100, 3, 10)]);
    let mut config = ClientConfig::new(url::Url::parse("https://portal.example").unwrap());
    config.min_bytes = 20;
    config.max_bytes = 1_000;
    let client = PortalClient::with_transport(config, Arc::new(transport));

    let blocks = client
        .get_finalized_batch(Range::bounded(100, 102).unwrap(), RequestPayload::default(), FieldSelection::new())
        .await
        .unwrap();

    let numbers: Vec<u64> = blocks.iter().map(evm_portal_types::Block::number).collect();
    assert_eq!(numbers, vec![100, 101, 102]);
}

#[tokio::test]
async fn s2_polling_waits_through_no_content_then_delivers() {
    let transport =
        fixtures::head_polling_then_data(101, 2, fixtures::contiguous_blocks(101, 1, 0));
    let mut config = ClientConfig::new(url::Url::parse("https://portal.example").unwrap());
    config.min_bytes = 1;
    config.head_poll_interval = Duration::from_millis(50);
    let client = PortalClient::with_transport(config, Arc::new(transport));

    let mut stream = client.get_finalized_stream(
        Range::from(101),
        RequestPayload::default(),
        FieldSelection::new(),
        StreamOpts { stop_on_head: false, ..Default::default() },
    );

    let started = tokio::time::Instant::now();
    let batch = stream.next().await.unwrap().unwrap();
    assert!(started.elapsed() >= Duration::from_millis(90), "should have waited through two 204 polls");
    assert_eq!(batch.blocks.len(), 1);
    assert_eq!(batch.blocks[0].number(), 101);
}

#[tokio::test]
async fn s3_truncation_resumes_from_the_next_block() {
    let transport = FakeTransport::new(
        119,
        vec![fixtures::truncated_after(100, 10), fixtures::contiguous_blocks(110, 10, 0)],
    );
    let client = client_with(transport, 10_000);

    let blocks = client
        .get_finalized_batch(Range::bounded(100, 119).unwrap(), RequestPayload::default(), FieldSelection::new())
        .await
        .unwrap();

    let numbers: Vec<u64> = blocks.iter().map(evm_portal_types::Block::number).collect();
    assert_eq!(numbers, (100..=119).collect::<Vec<_>>());
}

#[tokio::test]
async fn s4_backpressure_suspends_and_resumes_after_a_pull() {
    let transport = FakeTransport::new(110, vec![fixtures::contiguous_blocks(100, 10, 10)]);
    let mut config = ClientConfig::new(url::Url::parse("https://portal.example").unwrap());
    config.min_bytes = 1;
    config.max_bytes = 50;
    let client = PortalClient::with_transport(config, Arc::new(transport));

    let mut stream = client.get_finalized_stream(
        Range::bounded(100, 109).unwrap(),
        RequestPayload::default(),
        FieldSelection::new(),
        StreamOpts { stop_on_head: true, ..Default::default() },
    );

    let mut total = 0;
    while let Some(batch) = stream.next().await {
        total += batch.unwrap().blocks.len();
    }
    assert_eq!(total, 10, "backpressure must not drop or duplicate blocks");
}

#[tokio::test]
async fn s5_idle_timer_flushes_short_of_min_bytes() {
    let transport = FakeTransport::new(
        102,
        vec![fixtures::single_small_block_then_stall(100, Duration::from_secs(60))],
    );
    let mut config = ClientConfig::new(url::Url::parse("https://portal.example").unwrap());
    config.min_bytes = 1_000_000;
    config.max_idle_time = Duration::from_millis(100);
    let client = PortalClient::with_transport(config, Arc::new(transport));

    let mut stream = client.get_finalized_stream(
        Range::from(100),
        RequestPayload::default(),
        FieldSelection::new(),
        StreamOpts { stop_on_head: false, ..Default::default() },
    );

    let started = tokio::time::Instant::now();
    let batch = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("idle timer should have flushed the buffer")
        .unwrap()
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(90));
    assert_eq!(batch.blocks.len(), 1);
}

#[tokio::test]
async fn s6_cancel_ends_the_stream_without_surfacing_an_error() {
    let transport = FakeTransport::new(200, vec![fixtures::contiguous_blocks(100, 2, 0)]);
    let mut config = ClientConfig::new(url::Url::parse("https://portal.example").unwrap());
    config.min_bytes = 1;
    let client = PortalClient::with_transport(config, Arc::new(transport));

    let mut stream = client.get_finalized_stream(
        Range::from(100),
        RequestPayload::default(),
        FieldSelection::new(),
        StreamOpts { stop_on_head: false, ..Default::default() },
    );

    stream.cancel();
    // Cancellation is cooperative: at most one already-prepared batch is
    // still delivered, after which the stream ends cleanly.
    while let Some(result) = stream.next().await {
        result.unwrap();
    }
}
