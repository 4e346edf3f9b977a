use sqlx::PgPool;

/// Create the diplomacy tables and indexes (all `IF NOT EXISTS`, so reruns are harmless).
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}
