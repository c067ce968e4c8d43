use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use domain::{Money, NewOrder, Order, OrderItem, Product, ShippingInfo};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::CheckoutStore,
};

/// PostgreSQL-backed checkout store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL checkout store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            stock: row.try_get::<i64, _>("stock")? as u32,
        })
    }

    fn row_to_order(row: PgRow, items: Vec<OrderItem>) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            shipping: ShippingInfo {
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                email: row.try_get("email")?,
                address: row.try_get("address")?,
                postal_code: row.try_get("postal_code")?,
                city: row.try_get("city")?,
            },
            paid: row.try_get("paid")?,
            payment_intent_id: row.try_get("payment_intent_id")?,
            provider_reference: row.try_get("provider_reference")?,
            created_at: row.try_get("created_at")?,
            items,
        })
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderItem {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    product_name: row.try_get("product_name")?,
                    quantity: row.try_get::<i64, _>("quantity")? as u32,
                    unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                })
            })
            .collect()
    }

    async fn order_from_header_row(&self, row: Option<PgRow>) -> Result<Option<Order>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let items = self.items_for_order(order_id).await?;
        Ok(Some(Self::row_to_order(row, items)?))
    }
}

#[async_trait]
impl CheckoutStore for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, unit_price_cents, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                unit_price_cents = EXCLUDED.unit_price_cents,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.unit_price.cents())
        .bind(i64::from(product.stock))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, unit_price_cents, stock FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, unit_price_cents, stock FROM products ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let order_id = OrderId::new();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, user_id, first_name, last_name, email, address, postal_code, city, paid, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(new_order.user_id.as_uuid())
        .bind(&new_order.shipping.first_name)
        .bind(&new_order.shipping.last_name)
        .bind(&new_order.shipping.email)
        .bind(&new_order.shipping.address)
        .bind(&new_order.shipping.postal_code)
        .bind(&new_order.shipping.city)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for item in &new_order.items {
            // Reservation: check-and-decrement in one statement. Zero rows
            // means a shortage (or a vanished product); dropping the
            // transaction rolls back the header, earlier items, and earlier
            // decrements together.
            let reserved = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if reserved == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(item.product_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;

                tracing::debug!(
                    product_id = %item.product_id,
                    requested = item.quantity,
                    available = ?available,
                    "reservation failed, rolling back order creation"
                );

                return match available {
                    Some(stock) => Err(StoreError::InsufficientStock {
                        product_id: item.product_id,
                        available: stock as u32,
                    }),
                    None => Err(StoreError::ProductNotFound(item.product_id)),
                };
            }

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            user_id: new_order.user_id,
            shipping: new_order.shipping,
            paid: false,
            payment_intent_id: None,
            provider_reference: None,
            created_at,
            items: new_order
                .items
                .into_iter()
                .map(|i| OrderItem {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        self.order_from_header_row(row).await
    }

    async fn find_order_by_intent(&self, intent: &str) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE payment_intent_id = $1")
            .bind(intent)
            .fetch_optional(&self.pool)
            .await?;

        self.order_from_header_row(row).await
    }

    async fn set_payment_intent(&self, id: OrderId, intent: &str) -> Result<()> {
        let updated = sqlx::query("UPDATE orders SET payment_intent_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(intent)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn mark_paid(&self, id: OrderId, provider_reference: &str) -> Result<bool> {
        // Conditional update: only the first settlement delivery can flip
        // the flag; every later delivery sees zero rows touched.
        let updated = sqlx::query(
            "UPDATE orders SET paid = TRUE, provider_reference = $2 WHERE id = $1 AND paid = FALSE",
        )
        .bind(id.as_uuid())
        .bind(provider_reference)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 1 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Ok(false)
        } else {
            Err(StoreError::OrderNotFound(id))
        }
    }
}
