//! Product and category store

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Category, Paginated, Product, ProductCreate, ProductStatus, ProductUpdate, ProductWithCategory,
};
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::ServiceResult;

/// List filter for the product catalog
#[derive(Debug, Clone)]
pub struct ProductListFilter {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub status: ProductStatus,
    pub sort_by: SortField,
    pub descending: bool,
}

/// Whitelisted sort columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    CreatedAt,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn as_column(self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductCategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    image: Option<String>,
    status: String,
    category_id: Uuid,
    created_at: i64,
    updated_at: i64,
    cat_name: Option<String>,
    cat_description: Option<String>,
}

impl From<ProductCategoryRow> for ProductWithCategory {
    fn from(row: ProductCategoryRow) -> Self {
        let category = row.cat_name.map(|name| Category {
            id: row.category_id,
            name,
            description: row.cat_description,
        });
        ProductWithCategory {
            product: Product {
                id: row.id,
                name: row.name,
                description: row.description,
                price: row.price,
                image: row.image,
                status: row.status,
                category_id: row.category_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            category,
        }
    }
}

const SELECT_WITH_CATEGORY: &str = "SELECT p.id, p.name, p.description, p.price, p.image, \
     p.status, p.category_id, p.created_at, p.updated_at, \
     c.name AS cat_name, c.description AS cat_description \
     FROM products p LEFT JOIN categories c ON c.id = p.category_id";

/// Paginated catalog listing with optional filters
pub async fn list_products(
    pool: &PgPool,
    filter: &ProductListFilter,
    page: i64,
    limit: i64,
    offset: i64,
) -> Result<Paginated<ProductWithCategory>, sqlx::Error> {
    let mut count_qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
        "SELECT COUNT(*) FROM products p LEFT JOIN categories c ON c.id = p.category_id",
    );
    push_filters(&mut count_qb, filter);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    let mut qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(SELECT_WITH_CATEGORY);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ")
        .push(filter.sort_by.as_column())
        .push(if filter.descending { " DESC" } else { " ASC" })
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<ProductCategoryRow> = qb.build_query_as().fetch_all(pool).await?;
    let items = rows.into_iter().map(Into::into).collect();

    Ok(Paginated::new(items, page, limit, total))
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, sqlx::Postgres>, filter: &'a ProductListFilter) {
    qb.push(" WHERE p.status = ")
        .push_bind(filter.status.as_db());
    if let Some(category) = &filter.category {
        qb.push(" AND c.name = ").push_bind(category);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }
}

/// Fetch a single product with its category
pub async fn get_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<ProductWithCategory>, sqlx::Error> {
    let row: Option<ProductCategoryRow> =
        sqlx::query_as(&format!("{SELECT_WITH_CATEGORY} WHERE p.id = $1"))
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

/// All categories
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, description FROM categories ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Create a product
pub async fn create_product(pool: &PgPool, data: &ProductCreate) -> ServiceResult<Product> {
    let category_exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(data.category_id)
            .fetch_optional(pool)
            .await?;
    if category_exists.is_none() {
        return Err(AppError::new(ErrorCode::CategoryNotFound).into());
    }

    let now = now_millis();
    let product: Product = sqlx::query_as(
        "INSERT INTO products \
             (id, name, description, price, image, status, category_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image)
    .bind(data.status.unwrap_or(ProductStatus::Available).as_db())
    .bind(data.category_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

/// Partially update a product
pub async fn update_product(
    pool: &PgPool,
    product_id: Uuid,
    data: &ProductUpdate,
) -> ServiceResult<Product> {
    if let Some(category_id) = data.category_id {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::new(ErrorCode::CategoryNotFound).into());
        }
    }

    let product: Option<Product> = sqlx::query_as(
        "UPDATE products SET \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             price = COALESCE($4, price), \
             image = COALESCE($5, image), \
             status = COALESCE($6, status), \
             category_id = COALESCE($7, category_id), \
             updated_at = $8 \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(product_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image)
    .bind(data.status.map(|s| s.as_db()))
    .bind(data.category_id)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;

    product.ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).into())
}

/// Delete a product
pub async fn delete_product(pool: &PgPool, product_id: Uuid) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(pool)
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => Err(AppError::new(ErrorCode::ProductNotFound).into()),
        Ok(_) => Ok(()),
        // 23503: foreign_key_violation — product is referenced by a cart
        Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23503") => Err(
            AppError::with_message(ErrorCode::InvalidRequest, "Product is referenced by carts")
                .into(),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Re-read a product for index sync (consume-time re-fetch)
pub async fn get_product_for_index(
    conn: &mut PgConnection,
    product_id: Uuid,
) -> Result<Option<ProductWithCategory>, sqlx::Error> {
    let row: Option<ProductCategoryRow> =
        sqlx::query_as(&format!("{SELECT_WITH_CATEGORY} WHERE p.id = $1"))
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(Into::into))
}

/// Every product with its category (full index resynchronization)
pub async fn all_products_for_index(
    pool: &PgPool,
) -> Result<Vec<ProductWithCategory>, sqlx::Error> {
    let rows: Vec<ProductCategoryRow> = sqlx::query_as(SELECT_WITH_CATEGORY)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!(SortField::parse("name"), Some(SortField::Name));
        assert_eq!(SortField::parse("price"), Some(SortField::Price));
        assert_eq!(SortField::parse("createdAt"), Some(SortField::CreatedAt));
        assert_eq!(SortField::parse("id; DROP TABLE products"), None);
    }
}
