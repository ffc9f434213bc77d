use sqlx::SqliteConnection;

use crate::db_types::{CatalogItem, Category};

/// The storefront submits item names, not ids, so this is the lookup the order path uses.
pub async fn fetch_item_by_name(
    name: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM catalog_items WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

pub async fn fetch_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<CatalogItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM catalog_items WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_category(id: i64, conn: &mut SqliteConnection) -> Result<Option<Category>, sqlx::Error> {
    let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(category)
}
