//! Inbound movement service
//!
//! Receipts are recorded as `pending` and only count towards the on-hand
//! balance once an inventory admin approves them. Approval, rejection, edits
//! and deletes all lock the movement row first and then, when the ledger is
//! touched, the item row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    double_option, normalize_text, validate_note, validate_quantity, Capability, InboundMovement,
    InboundStatus, PaginatedResponse, Pagination,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::audit;
use crate::services::item::{lock_item, write_quantity};

/// Inbound movement service
#[derive(Clone)]
pub struct InboundService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct InboundRow {
    id: Uuid,
    item_id: Uuid,
    supplier_id: Option<Uuid>,
    quantity: i32,
    movement_date: NaiveDate,
    note: Option<String>,
    recorded_by: Uuid,
    status: String,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    rejected_by: Option<Uuid>,
    rejected_at: Option<DateTime<Utc>>,
    reject_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InboundRow> for InboundMovement {
    type Error = AppError;

    fn try_from(row: InboundRow) -> Result<Self, Self::Error> {
        Ok(InboundMovement {
            id: row.id,
            item_id: row.item_id,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            movement_date: row.movement_date,
            note: row.note,
            recorded_by: row.recorded_by,
            status: row
                .status
                .parse::<InboundStatus>()
                .map_err(AppError::Internal)?,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            rejected_by: row.rejected_by,
            rejected_at: row.rejected_at,
            reject_reason: row.reject_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const INBOUND_COLUMNS: &str = "id, item_id, supplier_id, quantity, movement_date, note, \
                               recorded_by, status, approved_by, approved_at, rejected_by, \
                               rejected_at, reject_reason, created_at, updated_at";

/// Input for recording a receipt
#[derive(Debug, Deserialize)]
pub struct CreateInboundInput {
    pub item_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub movement_date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Partial update of a pending receipt
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInboundInput {
    pub item_id: Option<Uuid>,
    /// `null` detaches the supplier
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    pub quantity: Option<i32>,
    pub movement_date: Option<NaiveDate>,
    /// `null` clears the note
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

/// Input for rejecting a receipt
#[derive(Debug, Default, Deserialize)]
pub struct RejectInboundInput {
    pub reason: Option<String>,
}

async fn lock_movement(
    tx: &mut Transaction<'_, Postgres>,
    movement_id: Uuid,
) -> AppResult<InboundMovement> {
    sqlx::query_as::<_, InboundRow>(&format!(
        "SELECT {} FROM inbound_movements WHERE id = $1 FOR UPDATE",
        INBOUND_COLUMNS
    ))
    .bind(movement_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Inbound movement".to_string()))?
    .try_into()
}

fn checked_note(note: Option<String>) -> AppResult<Option<String>> {
    let note = normalize_text(note);
    if let Some(n) = note.as_deref() {
        validate_note(n).map_err(|m| AppError::invalid("note", m))?;
    }
    Ok(note)
}

impl InboundService {
    /// Create a new InboundService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn ensure_item(&self, item_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::invalid("item_id", "Item does not exist"));
        }
        Ok(())
    }

    async fn ensure_supplier(&self, supplier_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                .bind(supplier_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::invalid("supplier_id", "Supplier does not exist"));
        }
        Ok(())
    }

    /// Record a pending receipt
    pub async fn create_movement(
        &self,
        actor: &AuthUser,
        input: CreateInboundInput,
    ) -> AppResult<InboundMovement> {
        validate_quantity(input.quantity).map_err(|m| AppError::invalid("quantity", m))?;
        let note = checked_note(input.note)?;
        self.ensure_item(input.item_id).await?;
        if let Some(supplier_id) = input.supplier_id {
            self.ensure_supplier(supplier_id).await?;
        }

        let movement: InboundMovement = sqlx::query_as::<_, InboundRow>(&format!(
            r#"
            INSERT INTO inbound_movements (item_id, supplier_id, quantity, movement_date, note,
                                           recorded_by, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INBOUND_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.supplier_id)
        .bind(input.quantity)
        .bind(
            input
                .movement_date
                .unwrap_or_else(|| Utc::now().date_naive()),
        )
        .bind(note)
        .bind(actor.user_id)
        .bind(InboundStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?
        .try_into()?;

        tracing::info!(
            movement_id = %movement.id,
            item_id = %movement.item_id,
            quantity = movement.quantity,
            "Inbound movement recorded"
        );
        Ok(movement)
    }

    /// List receipts, newest first
    pub async fn list_movements(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<InboundMovement>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inbound_movements")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, InboundRow>(&format!(
            r#"
            SELECT {}
            FROM inbound_movements
            ORDER BY movement_date DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
            INBOUND_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(InboundMovement::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PaginatedResponse::new(data, pagination, total.max(0) as u64))
    }

    /// Approve a pending receipt and add it to the item's balance.
    ///
    /// The status stamp, the ledger increment and the audit entry commit
    /// together or not at all.
    pub async fn approve(&self, actor: &AuthUser, movement_id: Uuid) -> AppResult<InboundMovement> {
        actor.require(Capability::ManageInbound)?;

        let mut tx = self.db.begin().await?;

        let mut movement = lock_movement(&mut tx, movement_id).await?;
        let quantity = movement.approve(actor.user_id, Utc::now())?;

        let mut item = lock_item(&mut tx, movement.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        item.receive(quantity)?;
        write_quantity(&mut tx, &item).await?;

        let movement: InboundMovement = sqlx::query_as::<_, InboundRow>(&format!(
            r#"
            UPDATE inbound_movements
            SET status = $1, approved_by = $2, approved_at = $3
            WHERE id = $4
            RETURNING {}
            "#,
            INBOUND_COLUMNS
        ))
        .bind(movement.status.as_str())
        .bind(movement.approved_by)
        .bind(movement.approved_at)
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        audit::record(
            &mut *tx,
            actor.user_id,
            &format!(
                "Approved inbound {} (+{} for item {})",
                movement_id, quantity, item.id
            ),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            %movement_id,
            item_id = %item.id,
            quantity,
            on_hand = item.quantity,
            "Inbound movement approved"
        );
        Ok(movement)
    }

    /// Reject a pending receipt. The balance is not touched.
    pub async fn reject(
        &self,
        actor: &AuthUser,
        movement_id: Uuid,
        input: RejectInboundInput,
    ) -> AppResult<InboundMovement> {
        actor.require(Capability::ManageInbound)?;
        let reason = checked_note(input.reason)?;

        let mut tx = self.db.begin().await?;

        let mut movement = lock_movement(&mut tx, movement_id).await?;
        movement.reject(actor.user_id, Utc::now(), reason)?;

        let movement: InboundMovement = sqlx::query_as::<_, InboundRow>(&format!(
            r#"
            UPDATE inbound_movements
            SET status = $1, rejected_by = $2, rejected_at = $3, reject_reason = $4
            WHERE id = $5
            RETURNING {}
            "#,
            INBOUND_COLUMNS
        ))
        .bind(movement.status.as_str())
        .bind(movement.rejected_by)
        .bind(movement.rejected_at)
        .bind(&movement.reject_reason)
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        tx.commit().await?;

        tracing::info!(%movement_id, "Inbound movement rejected");
        audit::record_best_effort(
            &self.db,
            actor.user_id,
            &format!("Rejected inbound {}", movement_id),
        )
        .await;

        Ok(movement)
    }

    /// Edit a receipt that is still pending
    pub async fn update_movement(
        &self,
        actor: &AuthUser,
        movement_id: Uuid,
        input: UpdateInboundInput,
    ) -> AppResult<InboundMovement> {
        actor.require(Capability::ManageInbound)?;

        if let Some(quantity) = input.quantity {
            validate_quantity(quantity).map_err(|m| AppError::invalid("quantity", m))?;
        }
        let note = input.note.map(checked_note).transpose()?;
        if let Some(item_id) = input.item_id {
            self.ensure_item(item_id).await?;
        }
        if let Some(Some(supplier_id)) = input.supplier_id {
            self.ensure_supplier(supplier_id).await?;
        }

        let mut tx = self.db.begin().await?;

        let existing = lock_movement(&mut tx, movement_id).await?;
        existing.ensure_editable()?;

        let movement: InboundMovement = sqlx::query_as::<_, InboundRow>(&format!(
            r#"
            UPDATE inbound_movements
            SET item_id = $1, supplier_id = $2, quantity = $3, movement_date = $4, note = $5
            WHERE id = $6
            RETURNING {}
            "#,
            INBOUND_COLUMNS
        ))
        .bind(input.item_id.unwrap_or(existing.item_id))
        .bind(input.supplier_id.unwrap_or(existing.supplier_id))
        .bind(input.quantity.unwrap_or(existing.quantity))
        .bind(input.movement_date.unwrap_or(existing.movement_date))
        .bind(note.unwrap_or(existing.note))
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        tx.commit().await?;

        tracing::info!(%movement_id, "Inbound movement updated");
        Ok(movement)
    }

    /// Delete a receipt, taking an approved quantity back off the balance
    pub async fn delete_movement(&self, actor: &AuthUser, movement_id: Uuid) -> AppResult<()> {
        actor.require(Capability::ManageInbound)?;

        let mut tx = self.db.begin().await?;

        let movement = lock_movement(&mut tx, movement_id).await?;
        if let Some(quantity) = movement.ledger_reversal() {
            if let Some(mut item) = lock_item(&mut tx, movement.item_id).await? {
                let before = item.quantity;
                item.reverse_receipt(quantity);
                write_quantity(&mut tx, &item).await?;
                tracing::info!(
                    %movement_id,
                    item_id = %item.id,
                    before,
                    after = item.quantity,
                    "Reversed approved receipt"
                );
            }
        }

        sqlx::query("DELETE FROM inbound_movements WHERE id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        audit::record_best_effort(
            &self.db,
            actor.user_id,
            &format!("Deleted inbound {}", movement_id),
        )
        .await;

        Ok(())
    }
}
