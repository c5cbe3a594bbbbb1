//! Item request workflow service

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    normalize_text, validate_note, validate_quantity, Capability, ItemRequest, PaginatedResponse,
    Pagination, RequestCreated, RequestStatus,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::audit;
use crate::services::notification::Notifier;

/// Item request service
#[derive(Clone)]
pub struct RequestService {
    db: PgPool,
    notifier: Notifier,
}

#[derive(Debug, FromRow)]
pub(crate) struct RequestRow {
    id: Uuid,
    requested_by: Uuid,
    item_id: Uuid,
    quantity: i32,
    request_date: NaiveDate,
    status: String,
    rejection_reason: Option<String>,
    approved_by: Option<Uuid>,
    approved_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for ItemRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RequestStatus>()
            .map_err(AppError::Internal)?;
        Ok(ItemRequest {
            id: row.id,
            requested_by: row.requested_by,
            item_id: row.item_id,
            quantity: row.quantity,
            request_date: row.request_date,
            status,
            rejection_reason: row.rejection_reason,
            approved_by: row.approved_by,
            approved_on: row.approved_on,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, requested_by, item_id, quantity, request_date, status, \
                               rejection_reason, approved_by, approved_on, created_at, updated_at";

fn into_requests(rows: Vec<RequestRow>) -> AppResult<Vec<ItemRequest>> {
    rows.into_iter().map(ItemRequest::try_from).collect()
}

/// Input for creating a request
#[derive(Debug, Deserialize)]
pub struct CreateRequestInput {
    pub item_id: Uuid,
    pub quantity: i32,
    pub request_date: Option<NaiveDate>,
}

/// Input for an approver's decision
#[derive(Debug, Deserialize)]
pub struct SetStatusInput {
    pub status: String,
    pub reason: Option<String>,
}

/// Lock a request row for the rest of the transaction
pub(crate) async fn lock_request(
    tx: &mut Transaction<'_, Postgres>,
    request_id: Uuid,
) -> AppResult<ItemRequest> {
    sqlx::query_as::<_, RequestRow>(&format!(
        "SELECT {} FROM item_requests WHERE id = $1 FOR UPDATE",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Request".to_string()))?
    .try_into()
}

/// Parse a status filter from a query string
fn parse_status_filter(status: Option<String>) -> AppResult<Option<RequestStatus>> {
    normalize_text(status)
        .map(|s| {
            s.to_lowercase()
                .parse::<RequestStatus>()
                .map_err(|m| AppError::invalid("status", m))
        })
        .transpose()
}

impl RequestService {
    /// Create a new RequestService instance
    pub fn new(db: PgPool, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Submit a request. Any authenticated user may do this.
    pub async fn create_request(
        &self,
        actor: &AuthUser,
        input: CreateRequestInput,
    ) -> AppResult<ItemRequest> {
        validate_quantity(input.quantity).map_err(|m| AppError::invalid("quantity", m))?;

        let item_name = sqlx::query_scalar::<_, String>("SELECT name FROM items WHERE id = $1")
            .bind(input.item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::invalid("item_id", "Item does not exist"))?;

        let request_date = input
            .request_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let request: ItemRequest = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            INSERT INTO item_requests (requested_by, item_id, quantity, request_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(actor.user_id)
        .bind(input.item_id)
        .bind(input.quantity)
        .bind(request_date)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?
        .try_into()?;

        tracing::info!(
            request_id = %request.id,
            item_id = %request.item_id,
            quantity = request.quantity,
            "Item request created"
        );

        self.notifier.request_created(RequestCreated {
            request_id: request.id,
            item_id: request.item_id,
            item_name,
            quantity: request.quantity,
            requested_by: request.requested_by,
        });

        Ok(request)
    }

    /// Approve or reject a pending request
    pub async fn set_status(
        &self,
        actor: &AuthUser,
        request_id: Uuid,
        input: SetStatusInput,
    ) -> AppResult<ItemRequest> {
        actor.require(Capability::DecideRequests)?;

        let decision = input
            .status
            .trim()
            .to_lowercase()
            .parse::<RequestStatus>()
            .map_err(|m| AppError::invalid("status", m))?;
        let reason = normalize_text(input.reason);
        if let Some(reason) = reason.as_deref() {
            validate_note(reason).map_err(|m| AppError::invalid("reason", m))?;
        }

        let mut tx = self.db.begin().await?;

        let mut request = lock_request(&mut tx, request_id).await?;
        request.decide(decision, actor.user_id, Utc::now().date_naive(), reason)?;

        let request: ItemRequest = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE item_requests
            SET status = $1, approved_by = $2, approved_on = $3, rejection_reason = $4
            WHERE id = $5
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(request.status.as_str())
        .bind(request.approved_by)
        .bind(request.approved_on)
        .bind(&request.rejection_reason)
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        tx.commit().await?;

        tracing::info!(%request_id, status = %request.status, "Request decided");
        audit::record_best_effort(
            &self.db,
            actor.user_id,
            &format!("Set request {} to {}", request_id, request.status),
        )
        .await;

        Ok(request)
    }

    /// List all requests, newest first
    pub async fn list_requests(
        &self,
        pagination: &Pagination,
        status: Option<String>,
    ) -> AppResult<PaginatedResponse<ItemRequest>> {
        let status = parse_status_filter(status)?.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM item_requests WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {}
            FROM item_requests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            REQUEST_COLUMNS
        ))
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(
            into_requests(rows)?,
            pagination,
            total.max(0) as u64,
        ))
    }

    /// Requests submitted by the given user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ItemRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM item_requests WHERE requested_by = $1 ORDER BY created_at DESC",
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        into_requests(rows)
    }

    /// Get a single request
    pub async fn get_request(&self, request_id: Uuid) -> AppResult<ItemRequest> {
        sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM item_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))?
        .try_into()
    }
}
