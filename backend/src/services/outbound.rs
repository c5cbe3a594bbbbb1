//! Outbound movement service and request fulfillment
//!
//! Directly recorded outbound movements are bookkeeping only. Stock leaves
//! the balance through [`OutboundService::process_request`], which turns an
//! approved request into a `done` movement.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    fulfillment, normalize_text, validate_location, validate_note, validate_quantity, Capability,
    OutboundMovement, OutboundStatus, PaginatedResponse, Pagination,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::item::{lock_item, write_quantity};
use crate::services::request::lock_request;

/// Outbound movement service
#[derive(Clone)]
pub struct OutboundService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct OutboundRow {
    id: Uuid,
    item_id: Uuid,
    request_id: Option<Uuid>,
    quantity: i32,
    movement_date: NaiveDate,
    issued_by: Uuid,
    note: Option<String>,
    location: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OutboundRow> for OutboundMovement {
    type Error = AppError;

    fn try_from(row: OutboundRow) -> Result<Self, Self::Error> {
        Ok(OutboundMovement {
            id: row.id,
            item_id: row.item_id,
            request_id: row.request_id,
            quantity: row.quantity,
            movement_date: row.movement_date,
            issued_by: row.issued_by,
            note: row.note,
            location: row.location,
            status: row
                .status
                .parse::<OutboundStatus>()
                .map_err(AppError::Internal)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const OUTBOUND_COLUMNS: &str = "id, item_id, request_id, quantity, movement_date, issued_by, \
                                note, location, status, created_at, updated_at";

/// Input for recording an outbound movement directly
#[derive(Debug, Deserialize)]
pub struct CreateOutboundInput {
    pub item_id: Uuid,
    pub request_id: Option<Uuid>,
    pub quantity: i32,
    pub movement_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

/// Input for editing an outbound movement
#[derive(Debug, Deserialize)]
pub struct UpdateOutboundInput {
    pub quantity: i32,
    pub movement_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

/// Input for fulfilling an approved request
#[derive(Debug, Deserialize)]
pub struct ProcessRequestInput {
    pub quantity: i32,
    pub movement_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub location: Option<String>,
}

fn parse_status(status: Option<String>) -> AppResult<Option<OutboundStatus>> {
    normalize_text(status)
        .map(|s| {
            s.to_lowercase()
                .parse::<OutboundStatus>()
                .map_err(|m| AppError::invalid("status", m))
        })
        .transpose()
}

/// Trim and length-check the free-text fields of a movement
fn checked_text(
    note: Option<String>,
    location: Option<String>,
) -> AppResult<(Option<String>, Option<String>)> {
    let note = normalize_text(note);
    if let Some(n) = note.as_deref() {
        validate_note(n).map_err(|m| AppError::invalid("note", m))?;
    }
    let location = normalize_text(location);
    if let Some(l) = location.as_deref() {
        validate_location(l).map_err(|m| AppError::invalid("location", m))?;
    }
    Ok((note, location))
}

impl OutboundService {
    /// Create a new OutboundService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an outbound movement without touching the balance
    pub async fn create_movement(
        &self,
        actor: &AuthUser,
        input: CreateOutboundInput,
    ) -> AppResult<OutboundMovement> {
        actor.require(Capability::RecordOutbound)?;
        validate_quantity(input.quantity).map_err(|m| AppError::invalid("quantity", m))?;
        let status = parse_status(input.status)?.unwrap_or_default();
        let (note, location) = checked_text(input.note, input.location)?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(input.item_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::invalid("item_id", "Item does not exist"));
        }

        if let Some(request_id) = input.request_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM item_requests WHERE id = $1)",
            )
            .bind(request_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::invalid("request_id", "Request does not exist"));
            }
        }

        let movement: OutboundMovement = sqlx::query_as::<_, OutboundRow>(&format!(
            r#"
            INSERT INTO outbound_movements (item_id, request_id, quantity, movement_date,
                                            issued_by, note, location, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            OUTBOUND_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.request_id)
        .bind(input.quantity)
        .bind(
            input
                .movement_date
                .unwrap_or_else(|| Utc::now().date_naive()),
        )
        .bind(actor.user_id)
        .bind(note)
        .bind(location)
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await?
        .try_into()?;

        tracing::info!(movement_id = %movement.id, "Outbound movement recorded");
        Ok(movement)
    }

    /// List outbound movements, newest first
    pub async fn list_movements(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<OutboundMovement>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM outbound_movements")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, OutboundRow>(&format!(
            r#"
            SELECT {}
            FROM outbound_movements
            ORDER BY movement_date DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
            OUTBOUND_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(OutboundMovement::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PaginatedResponse::new(data, pagination, total.max(0) as u64))
    }

    /// Edit an outbound movement. The balance is not adjusted.
    pub async fn update_movement(
        &self,
        actor: &AuthUser,
        movement_id: Uuid,
        input: UpdateOutboundInput,
    ) -> AppResult<OutboundMovement> {
        actor.require(Capability::RecordOutbound)?;
        validate_quantity(input.quantity).map_err(|m| AppError::invalid("quantity", m))?;
        let status = parse_status(input.status)?;
        let (note, location) = checked_text(input.note, input.location)?;

        let movement: OutboundMovement = sqlx::query_as::<_, OutboundRow>(&format!(
            r#"
            UPDATE outbound_movements
            SET quantity = $1,
                movement_date = COALESCE($2, movement_date),
                note = COALESCE($3, note),
                location = COALESCE($4, location),
                status = COALESCE($5, status)
            WHERE id = $6
            RETURNING {}
            "#,
            OUTBOUND_COLUMNS
        ))
        .bind(input.quantity)
        .bind(input.movement_date)
        .bind(note)
        .bind(location)
        .bind(status.map(|s| s.as_str()))
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Outbound movement".to_string()))?
        .try_into()?;

        tracing::info!(%movement_id, "Outbound movement updated");
        Ok(movement)
    }

    /// Delete an outbound movement. The balance is not adjusted.
    pub async fn delete_movement(&self, actor: &AuthUser, movement_id: Uuid) -> AppResult<()> {
        actor.require(Capability::RecordOutbound)?;

        let result = sqlx::query("DELETE FROM outbound_movements WHERE id = $1")
            .bind(movement_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Outbound movement".to_string()));
        }

        tracing::info!(%movement_id, "Outbound movement deleted");
        Ok(())
    }

    /// Fulfill an approved request.
    ///
    /// The request row is locked before its status is checked and the item
    /// row before its balance is checked, so a concurrent second attempt
    /// waits and then sees `done` or the reduced stock. The movement insert,
    /// the balance decrement and the request status change commit together.
    pub async fn process_request(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
        input: ProcessRequestInput,
    ) -> AppResult<OutboundMovement> {
        actor.require(Capability::FulfillRequests)?;
        let (note, location) = checked_text(input.note, input.location)?;

        let mut tx = self.db.begin().await?;

        let mut request = lock_request(&mut tx, request_id).await?;
        fulfillment::check_request(actor.role, &request, input.quantity)?;

        let mut item = lock_item(&mut tx, request.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        fulfillment::fulfill(actor.role, &mut request, &mut item, input.quantity)?;

        let movement: OutboundMovement = sqlx::query_as::<_, OutboundRow>(&format!(
            r#"
            INSERT INTO outbound_movements (item_id, request_id, quantity, movement_date,
                                            issued_by, note, location, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            OUTBOUND_COLUMNS
        ))
        .bind(item.id)
        .bind(request.id)
        .bind(input.quantity)
        .bind(
            input
                .movement_date
                .unwrap_or_else(|| Utc::now().date_naive()),
        )
        .bind(actor.user_id)
        .bind(note)
        .bind(location)
        .bind(OutboundStatus::Done.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        write_quantity(&mut tx, &item).await?;

        sqlx::query("UPDATE item_requests SET status = $1 WHERE id = $2")
            .bind(request.status.as_str())
            .bind(request.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            %request_id,
            movement_id = %movement.id,
            item_id = %item.id,
            quantity = input.quantity,
            on_hand = item.quantity,
            "Request fulfilled"
        );
        Ok(movement)
    }
}
