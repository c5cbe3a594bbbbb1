//! Employee requests for items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};

/// Lifecycle status of an item request.
///
/// `pending -> approved | rejected`, then `approved -> done` through
/// fulfillment only. `rejected` and `done` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Done,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Done => "done",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            "done" => Ok(RequestStatus::Done),
            other => Err(format!("unknown request status '{}'", other)),
        }
    }
}

/// An employee's ask for a quantity of an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRequest {
    pub id: Uuid,
    pub requested_by: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub request_date: NaiveDate,
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemRequest {
    /// Apply an approver's decision.
    ///
    /// Only `approved` and `rejected` are valid targets, and only from
    /// `pending`. `done` is reachable through fulfillment alone.
    pub fn decide(
        &mut self,
        decision: RequestStatus,
        approver: Uuid,
        today: NaiveDate,
        reason: Option<String>,
    ) -> WorkflowResult<()> {
        match decision {
            RequestStatus::Approved | RequestStatus::Rejected => {}
            other => {
                return Err(WorkflowError::validation(
                    "status",
                    format!("'{}' cannot be set by an approver", other),
                ))
            }
        }

        if self.status != RequestStatus::Pending {
            return Err(WorkflowError::invalid_state(format!(
                "request is already {}; only pending requests can be {}",
                self.status, decision
            )));
        }

        self.status = decision;
        if decision == RequestStatus::Approved {
            self.approved_by = Some(approver);
            self.approved_on = Some(today);
        } else {
            self.rejection_reason = reason;
        }
        Ok(())
    }

    pub fn ensure_processable(&self) -> WorkflowResult<()> {
        if self.status != RequestStatus::Approved {
            return Err(WorkflowError::invalid_state(format!(
                "request must be approved before processing (currently {})",
                self.status
            )));
        }
        Ok(())
    }

    pub fn mark_done(&mut self) -> WorkflowResult<()> {
        self.ensure_processable()?;
        self.status = RequestStatus::Done;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_request(item_id: Uuid, quantity: i32) -> ItemRequest {
    let now = Utc::now();
    ItemRequest {
        id: Uuid::new_v4(),
        requested_by: Uuid::new_v4(),
        item_id,
        quantity,
        request_date: now.date_naive(),
        status: RequestStatus::Pending,
        rejection_reason: None,
        approved_by: None,
        approved_on: None,
        created_at: now,
        updated_at: now,
    }
}
