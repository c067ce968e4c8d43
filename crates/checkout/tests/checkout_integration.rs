//! Integration tests for the checkout core: orchestration, payment
//! dispatch, and settlement reconciliation over the in-memory store.

use std::sync::Arc;

use checkout::{
    CheckoutError, CheckoutOrchestrator, InMemoryNotifier, MockProvider, PaymentConfig,
    ProviderKind, ProviderRegistry, ProviderSession, ReconcileError, ReconcileOutcome, Reconciler,
    SettlementClaim, VerificationError,
};
use common::{Money, UserId};
use domain::{Cart, Order, Product, ShippingInfo, UpsertMode};
use store::{CheckoutStore, InMemoryStore};

const GATEWAY_SECRET: &str = "test_gateway_secret";

struct Harness {
    store: Arc<InMemoryStore>,
    orchestrator: CheckoutOrchestrator<InMemoryStore>,
    reconciler: Reconciler<InMemoryStore, InMemoryNotifier>,
    notifier: InMemoryNotifier,
    gateway: MockProvider,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let gateway = MockProvider::new(ProviderKind::Razorpay, GATEWAY_SECRET);

    let mut registry = ProviderRegistry::from_config(&PaymentConfig::default());
    registry.register(Arc::new(gateway.clone()));
    let registry = Arc::new(registry);

    let notifier = InMemoryNotifier::new();
    Harness {
        store: store.clone(),
        orchestrator: CheckoutOrchestrator::new(store.clone(), registry.clone()),
        reconciler: Reconciler::new(store, registry, notifier.clone()),
        notifier,
        gateway,
    }
}

fn shipping() -> ShippingInfo {
    ShippingInfo {
        first_name: "Ava".to_string(),
        last_name: "Mehta".to_string(),
        email: "ava@example.com".to_string(),
        address: "9 Rose Walk".to_string(),
        postal_code: "400001".to_string(),
        city: "Mumbai".to_string(),
    }
}

fn sign(payload: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(GATEWAY_SECRET.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn capture_payload(correlation_id: &str, settlement_id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "event": "payment.captured",
        "correlation_id": correlation_id,
        "settlement_id": settlement_id,
    }))
    .unwrap()
}

/// Creates an order and dispatches it to the mock gateway, returning the
/// order (reloaded, with its correlation id) and the correlation id.
async fn dispatched_order(h: &Harness, user_id: UserId) -> (Order, String) {
    let product = Product::new("Jar", Money::from_cents(5_000), 10);
    h.store.insert_product(product.clone()).await.unwrap();

    let mut cart = Cart::new();
    cart.upsert_line(product.id, 1, UpsertMode::Add).unwrap();
    let order = h
        .orchestrator
        .create_order(&mut cart, shipping(), user_id)
        .await
        .unwrap();

    let session = h
        .orchestrator
        .start_payment(order.id, ProviderKind::Razorpay, user_id)
        .await
        .unwrap();
    let correlation_id = session.correlation_id().unwrap().to_string();

    let order = h.store.get_order(order.id).await.unwrap().unwrap();
    (order, correlation_id)
}

mod order_creation {
    use super::*;

    #[tokio::test]
    async fn cart_checks_out_and_inventory_decreases_exactly() {
        let h = harness();
        let a = Product::new("Product A", Money::from_cents(10_000), 10);
        let b = Product::new("Product B", Money::from_cents(20_000), 5);
        h.store.insert_product(a.clone()).await.unwrap();
        h.store.insert_product(b.clone()).await.unwrap();

        let mut cart = Cart::new();
        cart.upsert_line(a.id, 2, UpsertMode::Add).unwrap();
        cart.upsert_line(b.id, 1, UpsertMode::Add).unwrap();

        let order = h
            .orchestrator
            .create_order(&mut cart, shipping(), UserId::new())
            .await
            .unwrap();

        assert_eq!(order.total().cents(), 40_000);
        assert_eq!(order.items.len(), 2);
        assert!(!order.paid);
        assert_eq!(h.store.stock_of(a.id).await, Some(8));
        assert_eq!(h.store.stock_of(b.id).await, Some(4));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn excess_quantity_fails_with_precise_availability() {
        let h = harness();
        let a = Product::new("Product A", Money::from_cents(10_000), 10);
        h.store.insert_product(a.clone()).await.unwrap();

        let mut cart = Cart::new();
        cart.upsert_line(a.id, 20, UpsertMode::Add).unwrap();

        let err = h
            .orchestrator
            .create_order(&mut cart, shipping(), UserId::new())
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].product_id, a.id);
                assert_eq!(shortages[0].requested, 20);
                assert_eq!(shortages[0].available, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.store.stock_of(a.id).await, Some(10));
        assert_eq!(h.store.order_count().await, 0);
        // The cart survives a failed checkout so the user can fix it.
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn all_violations_are_collected() {
        let h = harness();
        let a = Product::new("Scarce A", Money::from_cents(100), 1);
        let b = Product::new("Scarce B", Money::from_cents(100), 2);
        let c = Product::new("Plenty C", Money::from_cents(100), 50);
        for p in [&a, &b, &c] {
            h.store.insert_product(p.clone()).await.unwrap();
        }

        let mut cart = Cart::new();
        cart.upsert_line(a.id, 5, UpsertMode::Add).unwrap();
        cart.upsert_line(b.id, 5, UpsertMode::Add).unwrap();
        cart.upsert_line(c.id, 5, UpsertMode::Add).unwrap();

        let err = h
            .orchestrator
            .create_order(&mut cart, shipping(), UserId::new())
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 2);
                assert!(shortages.iter().any(|s| s.product_id == a.id && s.available == 1));
                assert!(shortages.iter().any(|s| s.product_id == b.id && s.available == 2));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.store.stock_of(c.id).await, Some(50));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let h = harness();
        let mut cart = Cart::new();
        let err = h
            .orchestrator
            .create_order(&mut cart, shipping(), UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn later_price_changes_do_not_alter_the_order() {
        let h = harness();
        let mut product = Product::new("Drifting", Money::from_cents(10_000), 10);
        h.store.insert_product(product.clone()).await.unwrap();

        let mut cart = Cart::new();
        cart.upsert_line(product.id, 2, UpsertMode::Add).unwrap();
        let order = h
            .orchestrator
            .create_order(&mut cart, shipping(), UserId::new())
            .await
            .unwrap();
        assert_eq!(order.total().cents(), 20_000);

        // Reprice the product after the fact.
        product.unit_price = Money::from_cents(99_999);
        product.stock = 8;
        h.store.insert_product(product.clone()).await.unwrap();

        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items[0].unit_price.cents(), 10_000);
        assert_eq!(reloaded.total().cents(), 20_000);
    }
}

mod payment_dispatch {
    use super::*;

    #[tokio::test]
    async fn gateway_dispatch_persists_the_correlation_id() {
        let h = harness();
        let user_id = UserId::new();
        let (order, correlation_id) = dispatched_order(&h, user_id).await;

        assert_eq!(order.payment_intent_id.as_deref(), Some(correlation_id.as_str()));
        assert_eq!(h.gateway.initiated_orders(), vec![order.id]);
    }

    #[tokio::test]
    async fn offline_dispatch_leaves_the_order_unpaid_with_no_intent() {
        let h = harness();
        let user_id = UserId::new();
        let product = Product::new("Basket", Money::from_cents(3_000), 4);
        h.store.insert_product(product.clone()).await.unwrap();

        let mut cart = Cart::new();
        cart.upsert_line(product.id, 1, UpsertMode::Add).unwrap();
        let order = h
            .orchestrator
            .create_order(&mut cart, shipping(), user_id)
            .await
            .unwrap();

        let session = h
            .orchestrator
            .start_payment(order.id, ProviderKind::CashOnDelivery, user_id)
            .await
            .unwrap();

        assert!(matches!(session, ProviderSession::Instructions { .. }));
        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert!(!reloaded.paid);
        assert!(reloaded.payment_intent_id.is_none());
    }

    #[tokio::test]
    async fn foreign_users_cannot_start_payment() {
        let h = harness();
        let (order, _) = dispatched_order(&h, UserId::new()).await;

        let err = h
            .orchestrator
            .start_payment(order.id, ProviderKind::CashOnDelivery, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Forbidden));
    }

    #[tokio::test]
    async fn paid_orders_cannot_be_dispatched_again() {
        let h = harness();
        let user_id = UserId::new();
        let (order, _) = dispatched_order(&h, user_id).await;
        h.store.mark_paid(order.id, "pay_done").await.unwrap();

        let err = h
            .orchestrator
            .start_payment(order.id, ProviderKind::Razorpay, user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AlreadyPaid));
    }

    #[tokio::test]
    async fn disabled_method_is_unavailable() {
        let h = harness();
        let user_id = UserId::new();
        let (order, _) = dispatched_order(&h, user_id).await;

        let err = h
            .orchestrator
            .start_payment(order.id, ProviderKind::Stripe, user_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::ProviderUnavailable(ProviderKind::Stripe)
        ));
    }

    #[tokio::test]
    async fn no_enabled_providers_is_an_operational_error() {
        let store = Arc::new(InMemoryStore::new());
        let registry = Arc::new(ProviderRegistry::from_config(&PaymentConfig {
            cod_enabled: false,
            ..PaymentConfig::default()
        }));
        let orchestrator = CheckoutOrchestrator::new(store, registry);

        let err = orchestrator.payment_methods().unwrap_err();
        assert!(matches!(err, CheckoutError::NoProvidersEnabled));
    }
}

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn valid_webhook_settles_the_order_once() {
        let h = harness();
        let (order, correlation_id) = dispatched_order(&h, UserId::new()).await;

        let payload = capture_payload(&correlation_id, "pay_001");
        let outcome = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &payload, &sign(&payload))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated { order_id: order.id });
        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert!(reloaded.paid);
        assert_eq!(reloaded.provider_reference.as_deref(), Some("pay_001"));
        assert_eq!(h.notifier.sent(), vec![order.id]);
    }

    #[tokio::test]
    async fn duplicate_delivery_is_a_noop_without_side_effects() {
        let h = harness();
        let (order, correlation_id) = dispatched_order(&h, UserId::new()).await;

        let payload = capture_payload(&correlation_id, "pay_001");
        let signature = sign(&payload);

        let first = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &payload, &signature)
            .await
            .unwrap();
        let second = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &payload, &signature)
            .await
            .unwrap();

        assert_eq!(first, ReconcileOutcome::Updated { order_id: order.id });
        assert_eq!(second, ReconcileOutcome::AlreadyPaid { order_id: order.id });

        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert!(reloaded.paid);
        assert_eq!(reloaded.provider_reference.as_deref(), Some("pay_001"));
        // Exactly one confirmation went out.
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn one_byte_of_tampering_rejects_the_delivery() {
        let h = harness();
        let (order, correlation_id) = dispatched_order(&h, UserId::new()).await;

        let payload = capture_payload(&correlation_id, "pay_001");
        let signature = sign(&payload);

        // Tamper with the payload.
        let mut tampered = payload.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 1;
        let err = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &tampered, &signature)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Verification(VerificationError::InvalidSignature)
        ));

        // Tamper with the signature.
        let mut bad_signature = signature.into_bytes();
        bad_signature[0] = if bad_signature[0] == b'0' { b'1' } else { b'0' };
        let err = h
            .reconciler
            .reconcile_webhook(
                ProviderKind::Razorpay,
                &payload,
                std::str::from_utf8(&bad_signature).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Verification(VerificationError::InvalidSignature)
        ));

        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert!(!reloaded.paid);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_correlation_id_is_acknowledged() {
        let h = harness();
        let payload = capture_payload("mock_intent_9999", "pay_404");

        let outcome = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &payload, &sign(&payload))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::OrderNotFound {
                correlation_id: "mock_intent_9999".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_capture_events_are_ignored() {
        let h = harness();
        let (order, _) = dispatched_order(&h, UserId::new()).await;

        let payload = serde_json::to_vec(&serde_json::json!({
            "event": "payment.authorized",
        }))
        .unwrap();
        let outcome = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &payload, &sign(&payload))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Ignored);
        assert!(!h.store.get_order(order.id).await.unwrap().unwrap().paid);
    }

    #[tokio::test]
    async fn webhook_for_disabled_provider_is_acknowledged() {
        let h = harness();
        let payload = capture_payload("whatever", "pay_1");

        let outcome = h
            .reconciler
            .reconcile_webhook(ProviderKind::Stripe, &payload, "t=0,v1=00")
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Ignored);
    }

    #[tokio::test]
    async fn sync_claim_settles_for_the_owner() {
        let h = harness();
        let user_id = UserId::new();
        let (order, correlation_id) = dispatched_order(&h, user_id).await;

        let message = format!("{correlation_id}|pay_sync");
        let claim = SettlementClaim {
            provider_order_id: correlation_id,
            provider_payment_id: "pay_sync".to_string(),
            provider_signature: sign(message.as_bytes()),
        };

        let outcome = h
            .reconciler
            .verify_settlement(ProviderKind::Razorpay, &claim, user_id)
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Updated { order_id: order.id });

        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert!(reloaded.paid);
        assert_eq!(reloaded.provider_reference.as_deref(), Some("pay_sync"));
    }

    #[tokio::test]
    async fn sync_claim_from_a_foreign_user_is_forbidden() {
        let h = harness();
        let (order, correlation_id) = dispatched_order(&h, UserId::new()).await;

        let message = format!("{correlation_id}|pay_sync");
        let claim = SettlementClaim {
            provider_order_id: correlation_id,
            provider_payment_id: "pay_sync".to_string(),
            provider_signature: sign(message.as_bytes()),
        };

        let err = h
            .reconciler
            .verify_settlement(ProviderKind::Razorpay, &claim, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Forbidden));
        assert!(!h.store.get_order(order.id).await.unwrap().unwrap().paid);
    }

    #[tokio::test]
    async fn sync_claim_with_unknown_correlation_id_is_an_error() {
        let h = harness();
        let message = "mock_intent_0042|pay_x";
        let claim = SettlementClaim {
            provider_order_id: "mock_intent_0042".to_string(),
            provider_payment_id: "pay_x".to_string(),
            provider_signature: sign(message.as_bytes()),
        };

        let err = h
            .reconciler
            .verify_settlement(ProviderKind::Razorpay, &claim, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_verify_and_webhook_settle_exactly_once() {
        let h = harness();
        let user_id = UserId::new();
        let (order, correlation_id) = dispatched_order(&h, user_id).await;

        let message = format!("{correlation_id}|pay_sync");
        let claim = SettlementClaim {
            provider_order_id: correlation_id.clone(),
            provider_payment_id: "pay_sync".to_string(),
            provider_signature: sign(message.as_bytes()),
        };
        let payload = capture_payload(&correlation_id, "pay_hook");
        let signature = sign(&payload);

        let (sync_outcome, webhook_outcome) = tokio::join!(
            h.reconciler
                .verify_settlement(ProviderKind::Razorpay, &claim, user_id),
            h.reconciler
                .reconcile_webhook(ProviderKind::Razorpay, &payload, &signature),
        );
        let sync_outcome = sync_outcome.unwrap();
        let webhook_outcome = webhook_outcome.unwrap();

        let updated = ReconcileOutcome::Updated { order_id: order.id };
        let duplicate = ReconcileOutcome::AlreadyPaid { order_id: order.id };
        assert!(
            (sync_outcome == updated && webhook_outcome == duplicate)
                || (sync_outcome == duplicate && webhook_outcome == updated),
            "expected exactly one winner, got {sync_outcome:?} / {webhook_outcome:?}"
        );

        let reloaded = h.store.get_order(order.id).await.unwrap().unwrap();
        assert!(reloaded.paid);
        let expected_reference = if sync_outcome == updated {
            "pay_sync"
        } else {
            "pay_hook"
        };
        assert_eq!(reloaded.provider_reference.as_deref(), Some(expected_reference));
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_reconciliation() {
        let h = harness();
        let (order, correlation_id) = dispatched_order(&h, UserId::new()).await;
        h.notifier.set_fail_on_send(true);

        let payload = capture_payload(&correlation_id, "pay_001");
        let outcome = h
            .reconciler
            .reconcile_webhook(ProviderKind::Razorpay, &payload, &sign(&payload))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated { order_id: order.id });
        assert!(h.store.get_order(order.id).await.unwrap().unwrap().paid);
    }
}
