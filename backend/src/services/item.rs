//! Item catalogue service
//!
//! Items can be created with an opening balance, but after that the on-hand
//! quantity is owned by the movement workflows and never written here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    double_option, generate_item_code, normalize_text, validate_item_code, validate_location,
    validate_opening_stock, Capability, Item, PaginatedResponse, Pagination,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::AuthUser;

/// Item catalogue service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Database row for an item
#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    id: Uuid,
    code: String,
    name: String,
    category_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
    unit: String,
    unit_price: Decimal,
    location: Option<String>,
    quantity: i32,
    minimum_stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            code: row.code,
            name: row.name,
            category_id: row.category_id,
            supplier_id: row.supplier_id,
            unit: row.unit,
            unit_price: row.unit_price,
            location: row.location,
            quantity: row.quantity,
            minimum_stock: row.minimum_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, code, name, category_id, supplier_id, unit, unit_price, \
                            location, quantity, minimum_stock, created_at, updated_at";

/// Input for creating an item
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub code: Option<String>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, max = 32, message = "Unit must be 1-32 characters"))]
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: Option<i32>,
}

/// Input for updating an item. Quantity is deliberately absent.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    #[validate(length(min = 1, max = 32, message = "Unit must be 1-32 characters"))]
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    /// `null` or blank clears the location
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: Option<i32>,
}

/// Lock an item row for the rest of the transaction
pub(crate) async fn lock_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
) -> AppResult<Option<Item>> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {} FROM items WHERE id = $1 FOR UPDATE",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(Item::from))
}

/// Persist a new on-hand balance computed by the stock ledger
pub(crate) async fn write_quantity(
    tx: &mut Transaction<'_, Postgres>,
    item: &Item,
) -> AppResult<()> {
    sqlx::query("UPDATE items SET quantity = $1 WHERE id = $2")
        .bind(item.quantity)
        .bind(item.id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn validate_price(price: Option<Decimal>) -> AppResult<()> {
    match price {
        Some(p) if p < Decimal::ZERO => Err(AppError::invalid("unit_price", "Price cannot be negative")),
        _ => Ok(()),
    }
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn ensure_references(
        &self,
        category_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
    ) -> AppResult<()> {
        if let Some(category_id) = category_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
            )
            .bind(category_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::invalid("category_id", "Category does not exist"));
            }
        }

        if let Some(supplier_id) = supplier_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
            )
            .bind(supplier_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::invalid("supplier_id", "Supplier does not exist"));
            }
        }

        Ok(())
    }

    /// List items, optionally filtered by a name/code search term
    pub async fn list_items(
        &self,
        pagination: &Pagination,
        search: Option<String>,
    ) -> AppResult<PaginatedResponse<Item>> {
        let pattern = normalize_text(search).map(|s| format!("%{}%", s));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM items WHERE ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {}
            FROM items
            WHERE ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1)
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
            ITEM_COLUMNS
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Item::from).collect(),
            pagination,
            total.max(0) as u64,
        ))
    }

    /// Get a single item
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        sqlx::query_as::<_, ItemRow>(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .map(Item::from)
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Items at or below their minimum stock level
    pub async fn list_low_stock(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE quantity <= minimum_stock ORDER BY quantity, name",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Create an item with an optional opening balance
    pub async fn create_item(&self, actor: &AuthUser, input: CreateItemInput) -> AppResult<Item> {
        actor.require(Capability::ManageItems)?;
        input.validate()?;
        validate_price(input.unit_price)?;

        let quantity = input.quantity.unwrap_or(0);
        validate_opening_stock(quantity).map_err(|m| AppError::invalid("quantity", m))?;

        let id = Uuid::new_v4();
        let code = match normalize_text(input.code) {
            Some(code) => {
                let code = code.to_uppercase();
                validate_item_code(&code).map_err(|m| AppError::invalid("code", m))?;
                code
            }
            None => generate_item_code(id),
        };

        self.ensure_references(input.category_id, input.supplier_id)
            .await?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO items (id, code, name, category_id, supplier_id, unit, unit_price,
                               location, quantity, minimum_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(&code)
        .bind(input.name.trim())
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(input.unit.as_deref().unwrap_or("pcs"))
        .bind(input.unit_price.unwrap_or(Decimal::ZERO))
        .bind(normalize_text(input.location))
        .bind(quantity)
        .bind(input.minimum_stock.unwrap_or(0))
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("code".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        tracing::info!(item_id = %row.id, code = %row.code, "Item created");
        Ok(row.into())
    }

    /// Update descriptive fields of an item
    pub async fn update_item(
        &self,
        actor: &AuthUser,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<Item> {
        actor.require(Capability::ManageItems)?;
        input.validate()?;
        validate_price(input.unit_price)?;
        let location = input.location.map(normalize_text);
        if let Some(Some(l)) = location.as_ref() {
            validate_location(l).map_err(|m| AppError::invalid("location", m))?;
        }

        let existing = self.get_item(item_id).await?;
        self.ensure_references(input.category_id.flatten(), input.supplier_id.flatten())
            .await?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            UPDATE items
            SET name = $1, category_id = $2, supplier_id = $3, unit = $4, unit_price = $5,
                location = $6, minimum_stock = $7
            WHERE id = $8
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(input.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(input.category_id.unwrap_or(existing.category_id))
        .bind(input.supplier_id.unwrap_or(existing.supplier_id))
        .bind(input.unit.as_deref().unwrap_or(&existing.unit))
        .bind(input.unit_price.unwrap_or(existing.unit_price))
        .bind(location.unwrap_or(existing.location))
        .bind(input.minimum_stock.unwrap_or(existing.minimum_stock))
        .bind(item_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete an item
    pub async fn delete_item(&self, actor: &AuthUser, item_id: Uuid) -> AppResult<()> {
        actor.require(Capability::ManageItems)?;

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        tracing::info!(%item_id, "Item deleted");
        Ok(())
    }
}
