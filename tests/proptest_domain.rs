//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the merge and identity helpers
//! maintain their invariants across random inputs.

use proptest::prelude::*;

use nft_order_aggregator::domain::nft::{nft_id, token_id_hex};
use nft_order_aggregator::domain::order::{
    AssetClass, Exchange, ExpirationFilter, Order, OrderAsset, OrderFilters,
    OrderSide,
};
use nft_order_aggregator::usecases::aggregator::merge_orders;

fn arb_exchange() -> impl Strategy<Value = Exchange> {
    prop_oneof![
        Just(Exchange::OpenSea),
        Just(Exchange::LooksRare),
        Just(Exchange::X2Y2),
        Just(Exchange::Internal),
    ]
}

fn arb_side() -> impl Strategy<Value = OrderSide> {
    prop_oneof![Just(OrderSide::Listing), Just(OrderSide::Offer)]
}

prop_compose! {
    fn arb_order()(
        exchange in arb_exchange(),
        side in arb_side(),
        hash_seed in 0u64..50,
        price in 0u64..1_000_000,
        end in 0i64..2_000,
    ) -> Order {
        Order {
            exchange,
            order_hash: format!("0x{hash_seed:064x}"),
            maker_address: None,
            taker_address: None,
            assets: vec![OrderAsset {
                contract_address:
                    "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into(),
                token_id: "0x1".into(),
                quantity: 1,
                asset_class: AssetClass::Erc721,
            }],
            price: price.to_string(),
            currency: "0x0000000000000000000000000000000000000000".into(),
            start: 0,
            end,
            nonce: None,
            salt: None,
            protocol_signature: None,
            side,
        }
    }
}

// ── Merge Properties ────────────────────────────────────────

proptest! {
    /// Merging is commutative over batch order: permuting the
    /// per-adapter batches never changes the result.
    #[test]
    fn merge_is_commutative_over_batches(
        batches in prop::collection::vec(
            prop::collection::vec(arb_order(), 0..8),
            0..5,
        ),
        now in 0i64..2_000,
    ) {
        let filters = OrderFilters::default();
        let forward = merge_orders(batches.clone(), &filters, now);
        let mut reversed_input = batches;
        reversed_input.reverse();
        let reversed = merge_orders(reversed_input, &filters, now);
        prop_assert_eq!(forward, reversed);
    }

    /// Merging is idempotent: feeding a merged result back through
    /// the merge changes nothing.
    #[test]
    fn merge_is_idempotent(
        batches in prop::collection::vec(
            prop::collection::vec(arb_order(), 0..8),
            0..4,
        ),
        now in 0i64..2_000,
    ) {
        let filters = OrderFilters::default();
        let once = merge_orders(batches, &filters, now);
        let again = merge_orders(
            vec![once.listings.clone(), once.offers.clone()],
            &filters,
            now,
        );
        prop_assert_eq!(once, again);
    }

    /// No `(exchange, order_hash)` identity survives twice, and the
    /// active view admits no expired order.
    #[test]
    fn merge_dedupes_and_respects_expiration(
        batch in prop::collection::vec(arb_order(), 0..30),
        now in 0i64..2_000,
    ) {
        let merged = merge_orders(vec![batch], &OrderFilters::default(), now);
        let all: Vec<&Order> =
            merged.listings.iter().chain(merged.offers.iter()).collect();

        let mut identities: Vec<_> = all.iter().map(|o| o.dedupe_key()).collect();
        identities.sort();
        let before = identities.len();
        identities.dedup();
        prop_assert_eq!(before, identities.len(), "duplicate identity survived");

        for order in &all {
            prop_assert!(!order.is_expired(now));
        }
    }

    /// The three expiration views partition every order: each order
    /// is admitted by exactly one of active-only and expired-only,
    /// and always by the unfiltered view.
    #[test]
    fn expiration_views_partition(order in arb_order(), now in 0i64..2_000) {
        let active = ExpirationFilter::ActiveOnly.admits(&order, now);
        let expired = ExpirationFilter::ExpiredOnly.admits(&order, now);
        prop_assert!(active ^ expired);
        prop_assert!(ExpirationFilter::All.admits(&order, now));
    }

    /// Listings come back sorted cheapest-first, offers best-first.
    #[test]
    fn merge_orders_by_price(
        batch in prop::collection::vec(arb_order(), 0..30),
    ) {
        let merged = merge_orders(
            vec![batch],
            &OrderFilters {
                expiration: ExpirationFilter::All,
                include_offers: true,
            },
            0,
        );
        for pair in merged.listings.windows(2) {
            prop_assert!(pair[0].price_decimal() <= pair[1].price_decimal());
        }
        for pair in merged.offers.windows(2) {
            prop_assert!(pair[0].price_decimal() >= pair[1].price_decimal());
        }
    }
}

// ── Identity Helper Properties ──────────────────────────────

proptest! {
    /// Hex rendering of a decimal token id round-trips through the
    /// hex parser.
    #[test]
    fn token_id_hex_roundtrips(id in 0u128..u128::MAX) {
        let hex = token_id_hex(&id.to_string()).unwrap();
        prop_assert!(hex.starts_with("0x"));
        prop_assert_eq!(token_id_hex(&hex).unwrap(), hex);
    }

    /// Composite NFT ids are insensitive to address casing.
    #[test]
    fn nft_id_ignores_address_casing(id in 0u64..u64::MAX) {
        let lower = nft_id(
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            &id.to_string(),
        );
        let mixed = nft_id(
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            &id.to_string(),
        );
        prop_assert_eq!(lower, mixed);
    }
}
