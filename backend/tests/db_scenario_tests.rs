//! Database scenario tests
//!
//! Full workflow runs against PostgreSQL. Each test gets a fresh database
//! with migrations applied. They need `DATABASE_URL`, so they are ignored by
//! default: `cargo test -- --ignored`.

use axum::http::StatusCode;
use serde_json::json;
use shared::{InboundStatus, OutboundStatus, RequestStatus, Role};
use sqlx::PgPool;
use stockroom_backend::{
    error::AppError,
    middleware::AuthUser,
    services::{
        inbound::{CreateInboundInput, RejectInboundInput, UpdateInboundInput},
        item::UpdateItemInput,
        outbound::ProcessRequestInput,
        request::{CreateRequestInput, SetStatusInput},
        InboundService, ItemService, NotificationService, Notifier, OutboundService,
        RequestService,
    },
};
use uuid::Uuid;

async fn user(db: &PgPool, role: Role) -> AuthUser {
    let user_id: Uuid =
        sqlx::query_scalar("INSERT INTO users (name, role) VALUES ($1, $2) RETURNING id")
            .bind(format!("{} user", role))
            .bind(role.as_str())
            .fetch_one(db)
            .await
            .unwrap();
    AuthUser { user_id, role }
}

async fn item(db: &PgPool, quantity: i32) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO items (code, name, quantity) VALUES ($1, 'Toner', $2) RETURNING id",
    )
    .bind(format!("T-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase()))
    .bind(quantity)
    .fetch_one(db)
    .await
    .unwrap()
}

async fn stock(db: &PgPool, item_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT quantity FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_one(db)
        .await
        .unwrap()
}

fn requests(db: &PgPool) -> RequestService {
    let (notifier, _rx) = Notifier::channel(8);
    RequestService::new(db.clone(), notifier)
}

async fn approved_request(db: &PgPool, item_id: Uuid, quantity: i32) -> Uuid {
    let employee = user(db, Role::Employee).await;
    let manager = user(db, Role::Manager).await;
    let service = requests(db);

    let request = service
        .create_request(
            &employee,
            CreateRequestInput {
                item_id,
                quantity,
                request_date: None,
            },
        )
        .await
        .unwrap();
    service
        .set_status(
            &manager,
            request.id,
            SetStatusInput {
                status: "approved".to_string(),
                reason: None,
            },
        )
        .await
        .unwrap();
    request.id
}

fn process(quantity: i32) -> ProcessRequestInput {
    ProcessRequestInput {
        quantity,
        movement_date: None,
        note: None,
        location: Some("Floor 2".to_string()),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_request_round_trip(db: PgPool) {
    let item_id = item(&db, 5).await;
    let request_id = approved_request(&db, item_id, 3).await;
    let operator = user(&db, Role::Operator).await;

    let movement = OutboundService::new(db.clone())
        .process_request(&operator, request_id, process(3))
        .await
        .unwrap();

    assert_eq!(movement.quantity, 3);
    assert_eq!(movement.request_id, Some(request_id));
    assert_eq!(movement.status, OutboundStatus::Done);
    assert_eq!(stock(&db, item_id).await, 2);

    let request = requests(&db).get_request(request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Done);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_second_processing_is_refused(db: PgPool) {
    let item_id = item(&db, 10).await;
    let request_id = approved_request(&db, item_id, 3).await;
    let operator = user(&db, Role::Operator).await;
    let service = OutboundService::new(db.clone());

    service
        .process_request(&operator, request_id, process(3))
        .await
        .unwrap();
    let err = service
        .process_request(&operator, request_id, process(3))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidStateTransition(_)));
    assert_eq!(stock(&db, item_id).await, 7);

    let movements: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM outbound_movements WHERE request_id = $1")
            .bind(request_id)
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(movements, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_overdraw_rolls_back(db: PgPool) {
    let item_id = item(&db, 2).await;
    let request_id = approved_request(&db, item_id, 3).await;
    let operator = user(&db, Role::Operator).await;

    let err = OutboundService::new(db.clone())
        .process_request(&operator, request_id, process(3))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(stock(&db, item_id).await, 2);
    let request = requests(&db).get_request(request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Approved);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_processing_serializes(db: PgPool) {
    let item_id = item(&db, 10).await;
    let request_id = approved_request(&db, item_id, 4).await;
    let operator = user(&db, Role::Operator).await;
    let service = OutboundService::new(db.clone());

    let (a, b) = tokio::join!(
        service.process_request(&operator, request_id, process(4)),
        service.process_request(&operator, request_id, process(4)),
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(stock(&db, item_id).await, 6);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_inbound_approve_reject_delete(db: PgPool) {
    let item_id = item(&db, 0).await;
    let admin = user(&db, Role::Admin).await;
    let clerk = user(&db, Role::Employee).await;
    let service = InboundService::new(db.clone());

    let receipt = |quantity| CreateInboundInput {
        item_id,
        supplier_id: None,
        quantity,
        movement_date: None,
        note: None,
    };

    // Approve adds once and writes an audit entry
    let first = service.create_movement(&clerk, receipt(10)).await.unwrap();
    let approved = service.approve(&admin, first.id).await.unwrap();
    assert_eq!(approved.status, InboundStatus::Approved);
    assert_eq!(stock(&db, item_id).await, 10);
    assert!(matches!(
        service.approve(&admin, first.id).await,
        Err(AppError::InvalidStateTransition(_))
    ));
    assert_eq!(stock(&db, item_id).await, 10);

    let audits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log WHERE user_id = $1")
        .bind(admin.user_id)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(audits, 1);

    // Reject leaves the balance alone
    let second = service.create_movement(&clerk, receipt(5)).await.unwrap();
    let rejected = service
        .reject(
            &admin,
            second.id,
            RejectInboundInput {
                reason: Some("damaged".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, InboundStatus::Rejected);
    assert_eq!(rejected.reject_reason.as_deref(), Some("damaged"));
    assert_eq!(stock(&db, item_id).await, 10);

    // Deleting the approved receipt takes it back off
    service.delete_movement(&admin, first.id).await.unwrap();
    assert_eq!(stock(&db, item_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_delete_reversal_clamps_at_zero(db: PgPool) {
    let item_id = item(&db, 0).await;
    let admin = user(&db, Role::Admin).await;
    let service = InboundService::new(db.clone());

    let movement = service
        .create_movement(
            &admin,
            CreateInboundInput {
                item_id,
                supplier_id: None,
                quantity: 10,
                movement_date: None,
                note: None,
            },
        )
        .await
        .unwrap();
    service.approve(&admin, movement.id).await.unwrap();

    let request_id = approved_request(&db, item_id, 7).await;
    let operator = user(&db, Role::Operator).await;
    OutboundService::new(db.clone())
        .process_request(&operator, request_id, process(7))
        .await
        .unwrap();
    assert_eq!(stock(&db, item_id).await, 3);

    service.delete_movement(&admin, movement.id).await.unwrap();
    assert_eq!(stock(&db, item_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_new_request_notifies_approvers(db: PgPool) {
    let item_id = item(&db, 1).await;
    let admin = user(&db, Role::Admin).await;
    let manager = user(&db, Role::Manager).await;
    let operator = user(&db, Role::Operator).await;
    let employee = user(&db, Role::Employee).await;

    let (notifier, mut rx) = Notifier::channel(8);
    let request = RequestService::new(db.clone(), notifier)
        .create_request(
            &employee,
            CreateRequestInput {
                item_id,
                quantity: 1,
                request_date: None,
            },
        )
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.request_id, request.id);

    let notifications = NotificationService::new(db.clone());
    assert_eq!(notifications.notify_approvers(&event).await.unwrap(), 2);
    assert_eq!(notifications.list_for_user(admin.user_id, 10).await.unwrap().len(), 1);
    assert_eq!(notifications.list_for_user(manager.user_id, 10).await.unwrap().len(), 1);
    assert!(notifications
        .list_for_user(operator.user_id, 10)
        .await
        .unwrap()
        .is_empty());
}

async fn supplier(db: &PgPool) -> Uuid {
    sqlx::query_scalar("INSERT INTO suppliers (name) VALUES ('Acme') RETURNING id")
        .fetch_one(db)
        .await
        .unwrap()
}

// ============================================================================
// Rollback on a failed write
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_approve_rolls_back_when_audit_fails(db: PgPool) {
    let item_id = item(&db, 0).await;
    let admin = user(&db, Role::Admin).await;
    let service = InboundService::new(db.clone());

    let movement = service
        .create_movement(
            &admin,
            CreateInboundInput {
                item_id,
                supplier_id: None,
                quantity: 10,
                movement_date: None,
                note: None,
            },
        )
        .await
        .unwrap();

    sqlx::query("DROP TABLE activity_log")
        .execute(&db)
        .await
        .unwrap();

    let err = service.approve(&admin, movement.id).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stock(&db, item_id).await, 0);

    let status: String = sqlx::query_scalar("SELECT status FROM inbound_movements WHERE id = $1")
        .bind(movement.id)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(status, "pending");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_processing_rolls_back_when_status_write_fails(db: PgPool) {
    let item_id = item(&db, 5).await;
    let request_id = approved_request(&db, item_id, 3).await;
    let operator = user(&db, Role::Operator).await;

    // The movement insert and stock write succeed, the final request update does not
    sqlx::query("ALTER TABLE item_requests ADD CONSTRAINT refuse_done CHECK (status <> 'done')")
        .execute(&db)
        .await
        .unwrap();

    let err = OutboundService::new(db.clone())
        .process_request(&operator, request_id, process(3))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stock(&db, item_id).await, 5);

    let request = requests(&db).get_request(request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Approved);

    let movements: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM outbound_movements WHERE request_id = $1")
            .bind(request_id)
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(movements, 0);
}

// ============================================================================
// Partial updates
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_item_update_clears_nullable_fields(db: PgPool) {
    let admin = user(&db, Role::Admin).await;
    let supplier_id = supplier(&db).await;
    let category_id: Uuid =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ('Office') RETURNING id")
            .fetch_one(&db)
            .await
            .unwrap();
    let item_id = item(&db, 4).await;
    sqlx::query(
        "UPDATE items SET category_id = $1, supplier_id = $2, location = 'Shelf A' WHERE id = $3",
    )
    .bind(category_id)
    .bind(supplier_id)
    .bind(item_id)
    .execute(&db)
    .await
    .unwrap();

    let service = ItemService::new(db.clone());

    // Absent keys keep their stored values
    let kept: UpdateItemInput = serde_json::from_value(json!({ "name": "Toner XL" })).unwrap();
    let item = service.update_item(&admin, item_id, kept).await.unwrap();
    assert_eq!(item.name, "Toner XL");
    assert_eq!(item.supplier_id, Some(supplier_id));
    assert_eq!(item.location.as_deref(), Some("Shelf A"));

    let cleared: UpdateItemInput = serde_json::from_value(json!({
        "category_id": null,
        "supplier_id": null,
        "location": null,
    }))
    .unwrap();
    let item = service.update_item(&admin, item_id, cleared).await.unwrap();
    assert_eq!(item.category_id, None);
    assert_eq!(item.supplier_id, None);
    assert_eq!(item.location, None);
    assert_eq!(item.name, "Toner XL");
    assert_eq!(item.quantity, 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_inbound_update_clears_supplier_and_note(db: PgPool) {
    let item_id = item(&db, 0).await;
    let admin = user(&db, Role::Admin).await;
    let supplier_id = supplier(&db).await;
    let service = InboundService::new(db.clone());

    let movement = service
        .create_movement(
            &admin,
            CreateInboundInput {
                item_id,
                supplier_id: Some(supplier_id),
                quantity: 2,
                movement_date: None,
                note: Some("first delivery".to_string()),
            },
        )
        .await
        .unwrap();

    let quantity_only = UpdateInboundInput {
        quantity: Some(3),
        ..Default::default()
    };
    let updated = service
        .update_movement(&admin, movement.id, quantity_only)
        .await
        .unwrap();
    assert_eq!(updated.quantity, 3);
    assert_eq!(updated.supplier_id, Some(supplier_id));
    assert_eq!(updated.note.as_deref(), Some("first delivery"));

    let cleared: UpdateInboundInput =
        serde_json::from_value(json!({ "supplier_id": null, "note": null })).unwrap();
    let updated = service
        .update_movement(&admin, movement.id, cleared)
        .await
        .unwrap();
    assert_eq!(updated.supplier_id, None);
    assert_eq!(updated.note, None);
    assert_eq!(updated.quantity, 3);
}
