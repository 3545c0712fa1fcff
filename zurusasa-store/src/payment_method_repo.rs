use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use zurusasa_core::repository::PaymentMethodRepository;
use zurusasa_core::{NewPaymentMethod, PaymentMethod, RepositoryResult};
use zurusasa_shared::pii::Masked;

use crate::database::db_error;

pub struct StorePaymentMethodRepository {
    pool: PgPool,
}

impl StorePaymentMethodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentMethodRow {
    id: Uuid,
    user_id: Uuid,
    provider: String,
    gateway_reference: String,
    authorization_code: String,
    card_brand: String,
    last4: String,
    created_at: DateTime<Utc>,
}

impl From<PaymentMethodRow> for PaymentMethod {
    fn from(row: PaymentMethodRow) -> Self {
        PaymentMethod {
            id: row.id,
            user_id: row.user_id,
            provider: row.provider,
            gateway_reference: row.gateway_reference,
            authorization_code: Masked::new(row.authorization_code),
            card_brand: row.card_brand,
            last4: row.last4,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PaymentMethodRepository for StorePaymentMethodRepository {
    async fn list_payment_methods(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentMethod>> {
        let rows: Vec<PaymentMethodRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, provider, gateway_reference, authorization_code, card_brand, last4, created_at
            FROM payment_methods
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(PaymentMethod::from).collect())
    }

    async fn get_payment_method(&self, id: Uuid) -> RepositoryResult<Option<PaymentMethod>> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, provider, gateway_reference, authorization_code, card_brand, last4, created_at
            FROM payment_methods
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(PaymentMethod::from))
    }

    async fn create_payment_method(&self, method: &NewPaymentMethod) -> RepositoryResult<PaymentMethod> {
        let row: PaymentMethodRow = sqlx::query_as(
            r#"
            INSERT INTO payment_methods (user_id, provider, gateway_reference, authorization_code, card_brand, last4)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, provider, gateway_reference, authorization_code, card_brand, last4, created_at
            "#,
        )
        .bind(method.user_id)
        .bind(&method.provider)
        .bind(&method.gateway_reference)
        .bind(method.authorization_code.expose())
        .bind(&method.card_brand)
        .bind(&method.last4)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        tracing::info!("Saved {} card ending {} for user {}", row.card_brand, row.last4, row.user_id);
        Ok(row.into())
    }
}
