//! Integration Tests - Aggregator and Validator Component Testing
//!
//! Tests the interaction between usecases, ports, and mock adapters.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use alloy::sol_types::SolEvent;
use mockall::mock;

use nft_order_aggregator::adapters::cache::MemoryCache;
use nft_order_aggregator::adapters::persistence::MemoryActivityStore;
use nft_order_aggregator::domain::order::{
    AssetClass, Exchange, ExternalOrderResult, Order, OrderAsset, OrderRequest,
    OrderSide,
};
use nft_order_aggregator::error::FetchError;
use nft_order_aggregator::ports::cache::CacheStore;
use nft_order_aggregator::ports::chain::{ChainClient, ChainTransaction, ReceiptLog};
use nft_order_aggregator::ports::exchange::ExchangeAdapter;
use nft_order_aggregator::usecases::validator::CancelKind;
use nft_order_aggregator::usecases::{
    ActivityLedger, OrderAggregator, TransactionValidator,
};

// Same event shape the validator scans receipts for.
alloy::sol! {
    event Cancel(bytes32 structHash, address maker);
}

// ---- Mock Definitions ----

mock! {
    pub Marketplace {}

    #[async_trait::async_trait]
    impl ExchangeAdapter for Marketplace {
        fn exchange(&self) -> Exchange;
        fn order_ttl(&self) -> Duration;
        fn supports_chain(&self, chain_id: &str) -> bool;
        async fn fetch_orders(
            &self,
            request: &OrderRequest,
            side: OrderSide,
        ) -> Result<Vec<Order>, FetchError>;
    }
}

mock! {
    pub Chain {}

    #[async_trait::async_trait]
    impl ChainClient for Chain {
        async fn transaction(&self, hash: B256) -> anyhow::Result<Option<ChainTransaction>>;
        async fn wait_for_receipt(&self, hash: B256) -> anyhow::Result<Vec<ReceiptLog>>;
        async fn is_healthy(&self) -> bool;
    }
}

// ---- Helpers ----

const CONTRACT: &str = "0x32D74aeab8C07ca66ebE1D441aAd01C688B952cB";

fn request() -> OrderRequest {
    OrderRequest {
        contract: CONTRACT.into(),
        token_id: "1".into(),
        chain_id: "5".into(),
    }
}

fn listing(exchange: Exchange, hash: &str, price: &str) -> Order {
    Order {
        exchange,
        order_hash: hash.into(),
        maker_address: Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into()),
        taker_address: None,
        assets: vec![OrderAsset {
            contract_address: CONTRACT.into(),
            token_id: "0x1".into(),
            quantity: 1,
            asset_class: AssetClass::Erc721,
        }],
        price: price.into(),
        currency: "0x0000000000000000000000000000000000000000".into(),
        start: 0,
        end: i64::MAX,
        nonce: None,
        salt: None,
        protocol_signature: None,
        side: OrderSide::Listing,
    }
}

fn adapter_returning(
    exchange: Exchange,
    orders: Vec<Order>,
) -> Arc<dyn ExchangeAdapter> {
    let mut mock = MockMarketplace::new();
    mock.expect_exchange().return_const(exchange);
    mock.expect_order_ttl().return_const(Duration::from_secs(600));
    mock.expect_supports_chain().return_const(true);
    mock
        .expect_fetch_orders()
        .returning(move |_, side| match side {
            OrderSide::Listing => Ok(orders.clone()),
            OrderSide::Offer => Ok(vec![]),
        });
    Arc::new(mock)
}

fn failing_adapter(exchange: Exchange) -> Arc<dyn ExchangeAdapter> {
    let mut mock = MockMarketplace::new();
    mock.expect_exchange().return_const(exchange);
    mock.expect_order_ttl().return_const(Duration::from_secs(600));
    mock.expect_supports_chain().return_const(true);
    mock
        .expect_fetch_orders()
        .returning(|_, _| Err(FetchError::Transient("connection refused".into())));
    Arc::new(mock)
}

async fn open_cache() -> Arc<MemoryCache> {
    let cache = Arc::new(MemoryCache::new());
    cache.open().await.unwrap();
    cache
}

/// Adapter that counts upstream fetches and stays in flight long
/// enough for concurrent callers to pile up on the same cache key.
struct SlowCountingAdapter {
    fetches: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ExchangeAdapter for SlowCountingAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::OpenSea
    }

    fn order_ttl(&self) -> Duration {
        Duration::from_secs(600)
    }

    async fn fetch_orders(
        &self,
        _request: &OrderRequest,
        side: OrderSide,
    ) -> Result<Vec<Order>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        match side {
            OrderSide::Listing => Ok(vec![listing(Exchange::OpenSea, "0x1", "100")]),
            OrderSide::Offer => Ok(vec![]),
        }
    }
}

// ---- Aggregator Tests ----

#[tokio::test]
async fn reachable_marketplaces_with_no_orders_yield_an_empty_result() {
    let aggregator = OrderAggregator::new(
        vec![
            adapter_returning(Exchange::OpenSea, vec![]),
            adapter_returning(Exchange::LooksRare, vec![]),
        ],
        open_cache().await,
        50,
    );

    let result = aggregator
        .retrieve_multiple_orders(&[request()], false)
        .await;
    assert_eq!(result, Some(ExternalOrderResult::default()));
}

#[tokio::test]
async fn all_units_failing_is_indeterminate_not_empty() {
    let aggregator = OrderAggregator::new(
        vec![
            failing_adapter(Exchange::OpenSea),
            failing_adapter(Exchange::X2Y2),
        ],
        open_cache().await,
        50,
    );

    let result = aggregator
        .retrieve_multiple_orders(&[request()], false)
        .await;
    assert_eq!(result, None);
}

#[tokio::test]
async fn one_failing_marketplace_degrades_to_partial_results() {
    let aggregator = OrderAggregator::new(
        vec![
            adapter_returning(
                Exchange::OpenSea,
                vec![listing(Exchange::OpenSea, "0x1", "100")],
            ),
            failing_adapter(Exchange::X2Y2),
        ],
        open_cache().await,
        50,
    );

    let result = aggregator
        .retrieve_multiple_orders(&[request()], false)
        .await
        .unwrap();
    assert_eq!(result.listings.len(), 1);
}

#[tokio::test]
async fn repeated_queries_hit_the_cache_not_the_marketplace() {
    let mut mock = MockMarketplace::new();
    mock.expect_exchange().return_const(Exchange::OpenSea);
    mock.expect_order_ttl().return_const(Duration::from_secs(600));
    mock.expect_supports_chain().return_const(true);
    // One listing fetch and one offer fetch, ever.
    mock
        .expect_fetch_orders()
        .times(2)
        .returning(|_, _| Ok(vec![listing(Exchange::OpenSea, "0x1", "100")]));

    let aggregator =
        OrderAggregator::new(vec![Arc::new(mock)], open_cache().await, 50);

    let first = aggregator
        .retrieve_multiple_orders(&[request()], false)
        .await
        .unwrap();
    let second = aggregator
        .retrieve_multiple_orders(&[request()], false)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_misses_for_one_key_coalesce_onto_one_fetch() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let aggregator = Arc::new(OrderAggregator::new(
        vec![Arc::new(SlowCountingAdapter {
            fetches: fetches.clone(),
        })],
        open_cache().await,
        50,
    ));

    let (a, b) = tokio::join!(
        {
            let aggregator = aggregator.clone();
            tokio::spawn(async move {
                aggregator.retrieve_multiple_orders(&[request()], false).await
            })
        },
        {
            let aggregator = aggregator.clone();
            tokio::spawn(async move {
                aggregator.retrieve_multiple_orders(&[request()], false).await
            })
        },
    );

    let a = a.unwrap().unwrap();
    let b = b.unwrap().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.listings.len(), 1);
    // One listing fetch and one offer fetch across both callers: the
    // second caller waits on the in-flight gate, then reads the cache.
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn merge_result_is_independent_of_adapter_registration_order() {
    let opensea = || {
        adapter_returning(
            Exchange::OpenSea,
            vec![listing(Exchange::OpenSea, "0x1", "300")],
        )
    };
    let x2y2 = || {
        adapter_returning(
            Exchange::X2Y2,
            vec![listing(Exchange::X2Y2, "0x2", "100")],
        )
    };

    let forward =
        OrderAggregator::new(vec![opensea(), x2y2()], open_cache().await, 50);
    let reversed =
        OrderAggregator::new(vec![x2y2(), opensea()], open_cache().await, 50);

    let a = forward
        .retrieve_multiple_orders(&[request()], false)
        .await
        .unwrap();
    let b = reversed
        .retrieve_multiple_orders(&[request()], false)
        .await
        .unwrap();
    assert_eq!(a, b);
    // Cheapest listing first regardless of which adapter served it.
    assert_eq!(a.listings[0].price, "100");
}

#[tokio::test]
async fn unsupported_chains_contribute_nothing_without_failing() {
    let mut mainnet_only = MockMarketplace::new();
    mainnet_only.expect_exchange().return_const(Exchange::LooksRare);
    mainnet_only
        .expect_order_ttl()
        .return_const(Duration::from_secs(600));
    mainnet_only.expect_supports_chain().returning(|c| c == "1");
    mainnet_only.expect_fetch_orders().times(0);

    let aggregator = OrderAggregator::new(
        vec![
            Arc::new(mainnet_only),
            adapter_returning(
                Exchange::OpenSea,
                vec![listing(Exchange::OpenSea, "0x1", "100")],
            ),
        ],
        open_cache().await,
        50,
    );

    // request() targets chain 5.
    let result = aggregator
        .retrieve_multiple_orders(&[request()], false)
        .await
        .unwrap();
    assert_eq!(result.listings.len(), 1);
}

#[tokio::test]
async fn refresh_queue_skips_recently_refreshed_nfts_unless_forced() {
    let cache = open_cache().await;
    let aggregator = OrderAggregator::new(vec![], cache.clone(), 50);

    let enqueued = aggregator
        .trigger_refresh_queue(&[request()], "5", false)
        .await;
    assert_eq!(enqueued, 1);

    // Mark the NFT as freshly refreshed; unforced enqueues skip it.
    let member = format!("{}:1", CONTRACT.to_lowercase());
    cache.zadd("refreshed_nft_orders_ext_5", 1.0, &member).await;
    let skipped = aggregator
        .trigger_refresh_queue(&[request()], "5", false)
        .await;
    assert_eq!(skipped, 0);

    let forced = aggregator
        .trigger_refresh_queue(&[request()], "5", true)
        .await;
    assert_eq!(forced, 1);
}

// ---- Validator Tests ----

const TX_HASH: &str =
    "0x71C7656EC7ab88b098defB751B7401B5f6d8976F71C7656EC7ab88b098defB75";

fn cancel_log(struct_hash: B256, maker: Address) -> ReceiptLog {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(struct_hash.as_slice());
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(maker.as_slice());
    ReceiptLog {
        address: Address::ZERO,
        topics: vec![Cancel::SIGNATURE_HASH],
        data: Bytes::from(data),
    }
}

#[tokio::test]
async fn unknown_transactions_fail_validation() {
    let mut chain = MockChain::new();
    chain.expect_transaction().returning(|_| Ok(None));

    let validator = TransactionValidator::new(
        Arc::new(chain),
        Arc::new(MemoryActivityStore::new()),
    );
    assert!(
        !validator
            .validate_tx_hash_for_cancel(TX_HASH, "1", "some-id", CancelKind::Listing)
            .await
    );
}

#[tokio::test]
async fn pending_transactions_fail_validation() {
    let mut chain = MockChain::new();
    chain.expect_transaction().returning(|hash| {
        Ok(Some(ChainTransaction {
            hash,
            block_number: None,
            confirmations: 0,
        }))
    });

    let validator = TransactionValidator::new(
        Arc::new(chain),
        Arc::new(MemoryActivityStore::new()),
    );
    assert!(
        !validator
            .validate_tx_hash_for_cancel(TX_HASH, "1", "some-id", CancelKind::Listing)
            .await
    );
}

#[tokio::test]
async fn malformed_hashes_fail_validation_without_touching_the_chain() {
    let mut chain = MockChain::new();
    chain.expect_transaction().times(0);

    let validator = TransactionValidator::new(
        Arc::new(chain),
        Arc::new(MemoryActivityStore::new()),
    );
    assert!(
        !validator
            .validate_tx_hash_for_cancel(
                "not-a-hash",
                "1",
                "some-id",
                CancelKind::Listing
            )
            .await
    );
}

#[tokio::test]
async fn chain_errors_fail_closed() {
    let mut chain = MockChain::new();
    chain
        .expect_transaction()
        .returning(|_| Err(anyhow::anyhow!("rpc unavailable")));

    let validator = TransactionValidator::new(
        Arc::new(chain),
        Arc::new(MemoryActivityStore::new()),
    );
    assert!(
        !validator
            .validate_tx_hash_for_cancel(TX_HASH, "1", "some-id", CancelKind::Listing)
            .await
    );
}

#[tokio::test]
async fn a_matching_cancel_event_validates_the_activity() {
    let maker_raw = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
    let maker: Address = maker_raw.parse().unwrap();
    let struct_hash = B256::from([0x11u8; 32]);

    // The ledger knows the order under its struct hash and maker.
    let store = Arc::new(MemoryActivityStore::new());
    let ledger = ActivityLedger::new(store.clone());
    let mut order = listing(Exchange::Internal, &struct_hash.to_string(), "100");
    order.maker_address = Some(maker.to_checksum(None));
    let activity = ledger.record_order(&order, "1").await.unwrap();

    let mut chain = MockChain::new();
    chain.expect_transaction().returning(|hash| {
        Ok(Some(ChainTransaction {
            hash,
            block_number: Some(100),
            confirmations: 3,
        }))
    });
    chain
        .expect_wait_for_receipt()
        .returning(move |_| Ok(vec![cancel_log(struct_hash, maker)]));

    let validator = TransactionValidator::new(Arc::new(chain), store);
    assert!(
        validator
            .validate_tx_hash_for_cancel(TX_HASH, "1", &activity.id, CancelKind::Listing)
            .await
    );

    // Same receipt, wrong activity id: rejected.
    assert!(
        !validator
            .validate_tx_hash_for_cancel(TX_HASH, "1", "other-id", CancelKind::Listing)
            .await
    );

    // Same receipt, wrong claimed kind: rejected.
    assert!(
        !validator
            .validate_tx_hash_for_cancel(TX_HASH, "1", &activity.id, CancelKind::Bid)
            .await
    );
}
