//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and are
//! ignored by default because they need a local Docker daemon. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, UserId};
use domain::{NewOrder, NewOrderItem, Product, ShippingInfo};
use sqlx::PgPool;
use store::{CheckoutStore, PostgresStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_checkout_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_store() -> PostgresStore {
    let info = get_container_info().await;
    let pool = PgPool::connect(&info.connection_string).await.unwrap();
    PostgresStore::new(pool)
}

fn shipping() -> ShippingInfo {
    ShippingInfo {
        first_name: "Nia".to_string(),
        last_name: "Imani".to_string(),
        email: "nia@example.com".to_string(),
        address: "7 Garden Lane".to_string(),
        postal_code: "560001".to_string(),
        city: "Bengaluru".to_string(),
    }
}

fn line(product: &Product, quantity: u32) -> NewOrderItem {
    NewOrderItem {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity,
        unit_price: product.unit_price,
    }
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn order_creation_is_atomic_with_inventory() {
    let store = get_store().await;

    let a = Product::new("Atomic A", Money::from_cents(10_000), 10);
    let b = Product::new("Atomic B", Money::from_cents(20_000), 5);
    store.insert_product(a.clone()).await.unwrap();
    store.insert_product(b.clone()).await.unwrap();

    let order = store
        .create_order(NewOrder {
            user_id: UserId::new(),
            shipping: shipping(),
            items: vec![line(&a, 2), line(&b, 1)],
        })
        .await
        .unwrap();

    assert_eq!(order.total().cents(), 40_000);
    assert_eq!(store.get_product(a.id).await.unwrap().unwrap().stock, 8);
    assert_eq!(store.get_product(b.id).await.unwrap().unwrap().stock, 4);

    let reloaded = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.items.len(), 2);
    assert_eq!(reloaded.total().cents(), 40_000);
    assert!(!reloaded.paid);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn shortage_rolls_back_everything() {
    let store = get_store().await;

    let plenty = Product::new("Rollback Plenty", Money::from_cents(5_000), 10);
    let scarce = Product::new("Rollback Scarce", Money::from_cents(5_000), 3);
    store.insert_product(plenty.clone()).await.unwrap();
    store.insert_product(scarce.clone()).await.unwrap();

    let err = store
        .create_order(NewOrder {
            user_id: UserId::new(),
            shipping: shipping(),
            items: vec![line(&plenty, 4), line(&scarce, 20)],
        })
        .await
        .unwrap_err();

    match err {
        StoreError::InsufficientStock {
            product_id,
            available,
        } => {
            assert_eq!(product_id, scarce.id);
            assert_eq!(available, 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The earlier line's decrement must not have survived the rollback.
    assert_eq!(store.get_product(plenty.id).await.unwrap().unwrap().stock, 10);
    assert_eq!(store.get_product(scarce.id).await.unwrap().unwrap().stock, 3);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn mark_paid_conditional_update() {
    let store = get_store().await;

    let product = Product::new("Paid Once", Money::from_cents(1_000), 5);
    store.insert_product(product.clone()).await.unwrap();

    let order = store
        .create_order(NewOrder {
            user_id: UserId::new(),
            shipping: shipping(),
            items: vec![line(&product, 1)],
        })
        .await
        .unwrap();

    store.set_payment_intent(order.id, "pg_intent_1").await.unwrap();

    assert!(store.mark_paid(order.id, "pay_first").await.unwrap());
    assert!(!store.mark_paid(order.id, "pay_second").await.unwrap());

    let reloaded = store.get_order(order.id).await.unwrap().unwrap();
    assert!(reloaded.paid);
    assert_eq!(reloaded.provider_reference.as_deref(), Some("pay_first"));
    assert_eq!(reloaded.payment_intent_id.as_deref(), Some("pg_intent_1"));

    let by_intent = store.find_order_by_intent("pg_intent_1").await.unwrap().unwrap();
    assert_eq!(by_intent.id, order.id);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn concurrent_checkouts_serialize_on_stock() {
    let store = get_store().await;

    let product = Product::new("Contended", Money::from_cents(2_000), 6);
    store.insert_product(product.clone()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        let product = product.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_order(NewOrder {
                    user_id: UserId::new(),
                    shipping: shipping(),
                    items: vec![line(&product, 2)],
                })
                .await
        }));
    }

    let mut successes = 0;
    let mut shortages = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(StoreError::InsufficientStock { .. }) => shortages += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // 6 units / 2 per order: exactly three checkouts can win.
    assert_eq!(successes, 3);
    assert_eq!(shortages, 1);
    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 0);
}
