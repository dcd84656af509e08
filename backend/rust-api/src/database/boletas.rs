//! Receipt persistence. Every read and delete is scoped to the owning user.

use async_trait::async_trait;

use crate::database::DatabasePool;
use crate::models::{page_offset, Boleta, BoletaId, BoletaStats, NewBoleta};

#[async_trait]
pub trait BoletaStore: Send + Sync {
    async fn create(&self, new: NewBoleta) -> anyhow::Result<Boleta>;

    async fn get(&self, id: BoletaId, user_id: &str) -> anyhow::Result<Option<Boleta>>;

    /// Newest first. `page` is 1-based. Returns the page and the user's total count.
    async fn list(&self, user_id: &str, page: i64, limit: i64) -> anyhow::Result<(Vec<Boleta>, i64)>;

    /// True when a row owned by `user_id` was removed.
    async fn delete(&self, id: BoletaId, user_id: &str) -> anyhow::Result<bool>;

    async fn stats(&self, user_id: &str) -> anyhow::Result<BoletaStats>;
}

const BOLETA_COLUMNS: &str =
    "id, nombre_archivo, text, merchant, total_amount, date, confidence, fecha, user_id";

pub struct PgBoletaStore {
    pool: DatabasePool,
}

impl PgBoletaStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoletaStore for PgBoletaStore {
    async fn create(&self, new: NewBoleta) -> anyhow::Result<Boleta> {
        let sql = format!(
            r#"
            INSERT INTO boletas (nombre_archivo, text, merchant, total_amount, date, confidence, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BOLETA_COLUMNS
        );
        let boleta = sqlx::query_as::<_, Boleta>(&sql)
            .bind(&new.nombre_archivo)
            .bind(new.text.as_deref())
            .bind(new.merchant.as_deref())
            .bind(new.total_amount)
            .bind(new.date)
            .bind(new.confidence)
            .bind(&new.user_id)
            .fetch_one(&*self.pool)
            .await?;
        tracing::info!("Boleta created: id={} user={}", boleta.id, boleta.user_id);
        Ok(boleta)
    }

    async fn get(&self, id: BoletaId, user_id: &str) -> anyhow::Result<Option<Boleta>> {
        let sql = format!("SELECT {} FROM boletas WHERE id = $1 AND user_id = $2", BOLETA_COLUMNS);
        let boleta = sqlx::query_as::<_, Boleta>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(boleta)
    }

    async fn list(&self, user_id: &str, page: i64, limit: i64) -> anyhow::Result<(Vec<Boleta>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM boletas WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&*self.pool)
            .await?;

        let Some(offset) = page_offset(page, limit) else {
            return Ok((Vec::new(), total));
        };

        let sql = format!(
            "SELECT {} FROM boletas WHERE user_id = $1 ORDER BY fecha DESC, id DESC LIMIT $2 OFFSET $3",
            BOLETA_COLUMNS
        );
        let items = sqlx::query_as::<_, Boleta>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await?;

        tracing::debug!("Listed {} boletas for user {} (page {})", items.len(), user_id, page);
        Ok((items, total))
    }

    async fn delete(&self, id: BoletaId, user_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM boletas WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self, user_id: &str) -> anyhow::Result<BoletaStats> {
        let (total_boletas, total_amount, avg_confidence) = sqlx::query_as::<_, (i64, f64, f64)>(
            r#"
            SELECT COUNT(*)::BIGINT,
                   COALESCE(SUM(total_amount), 0)::FLOAT8,
                   COALESCE(AVG(confidence), 0)::FLOAT8
            FROM boletas
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(BoletaStats {
            total_boletas,
            total_amount,
            avg_confidence,
        })
    }
}
