use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::leave_type::LeaveType;

/// Leave types are immutable reference data; cache them by id so the
/// request workflow does not hit the database for every lookup.
pub static LEAVE_TYPE_CACHE: Lazy<Cache<u64, LeaveType>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn insert(leave_type: LeaveType) {
    LEAVE_TYPE_CACHE.insert(leave_type.id, leave_type).await;
}

/// Cache-first lookup with a database fallback.
pub async fn get_or_load(pool: &MySqlPool, id: u64) -> Result<Option<LeaveType>, sqlx::Error> {
    if let Some(lt) = LEAVE_TYPE_CACHE.get(&id).await {
        return Ok(Some(lt));
    }

    let row = sqlx::query_as::<_, LeaveType>(
        r#"
        SELECT id, name, code, max_days_per_year, is_paid, requires_approval
        FROM leave_types
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if let Some(lt) = &row {
        LEAVE_TYPE_CACHE.insert(lt.id, lt.clone()).await;
    }

    Ok(row)
}

async fn batch_insert(leave_types: Vec<LeaveType>) {
    let futures: Vec<_> = leave_types
        .into_iter()
        .map(|lt| LEAVE_TYPE_CACHE.insert(lt.id, lt))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load all leave types into the in-memory cache (batched).
pub async fn warmup_leave_type_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, LeaveType>(
        r#"
        SELECT id, name, code, max_days_per_year, is_paid, requires_approval
        FROM leave_types
        ORDER BY id
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_insert(std::mem::take(&mut batch)).await;
        }
    }

    if !batch.is_empty() {
        batch_insert(batch).await;
    }

    log::info!("Leave type cache warmup complete: {} types", total_count);

    Ok(())
}
