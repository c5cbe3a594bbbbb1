//! Fulfillment of approved item requests
//!
//! Turning a request into an outbound movement is checked in a fixed order so
//! that each failure mode is reported before anything is written:
//!
//! 1. the actor may fulfill requests
//! 2. the request exists (checked by the caller's lookup)
//! 3. the request is `approved`
//! 4. the quantity is positive
//! 5. the item exists (checked by the caller's lookup)
//! 6. the item has enough stock
//!
//! The fulfilled quantity is supplied by the operator and is not tied to the
//! quantity originally requested.

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{Capability, Item, ItemRequest, Role};

/// Checks 1, 3 and 4, which need only the actor and the request
pub fn check_request(role: Role, request: &ItemRequest, quantity: i32) -> WorkflowResult<()> {
    role.require(Capability::FulfillRequests)?;
    request.ensure_processable()?;
    if quantity <= 0 {
        return Err(WorkflowError::validation("quantity", "must be at least 1"));
    }
    Ok(())
}

/// Apply a fulfillment to in-memory copies of the request and its item.
///
/// Re-runs every check, then decrements stock and closes the request. On
/// error neither value has been modified.
pub fn fulfill(
    role: Role,
    request: &mut ItemRequest,
    item: &mut Item,
    quantity: i32,
) -> WorkflowResult<()> {
    check_request(role, request, quantity)?;
    if item.id != request.item_id {
        return Err(WorkflowError::validation(
            "item_id",
            "item does not match the request",
        ));
    }
    item.ensure_available(quantity)?;

    item.issue(quantity)?;
    request.mark_done()?;
    Ok(())
}
