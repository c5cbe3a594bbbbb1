//! Inbound and outbound stock movements

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};

/// Status of stock received from a supplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InboundStatus {
    Pending,
    Approved,
    Rejected,
}

impl InboundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundStatus::Pending => "pending",
            InboundStatus::Approved => "approved",
            InboundStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for InboundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InboundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InboundStatus::Pending),
            "approved" => Ok(InboundStatus::Approved),
            "rejected" => Ok(InboundStatus::Rejected),
            other => Err(format!("unknown inbound status '{}'", other)),
        }
    }
}

/// Stock received from a supplier, waiting for admin approval before it
/// counts towards the on-hand balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub movement_date: NaiveDate,
    pub note: Option<String>,
    pub recorded_by: Uuid,
    pub status: InboundStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InboundMovement {
    fn ensure_pending(&self, action: &str) -> WorkflowResult<()> {
        if self.status != InboundStatus::Pending {
            return Err(WorkflowError::invalid_state(format!(
                "only pending records can be {} (currently {})",
                action, self.status
            )));
        }
        Ok(())
    }

    /// Approve the receipt. Returns the quantity to add to the item's balance.
    pub fn approve(&mut self, admin: Uuid, at: DateTime<Utc>) -> WorkflowResult<i32> {
        self.ensure_pending("approved")?;
        self.status = InboundStatus::Approved;
        self.approved_by = Some(admin);
        self.approved_at = Some(at);
        Ok(self.quantity)
    }

    pub fn reject(
        &mut self,
        admin: Uuid,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> WorkflowResult<()> {
        self.ensure_pending("rejected")?;
        self.status = InboundStatus::Rejected;
        self.rejected_by = Some(admin);
        self.rejected_at = Some(at);
        self.reject_reason = reason;
        Ok(())
    }

    pub fn ensure_editable(&self) -> WorkflowResult<()> {
        self.ensure_pending("edited")
    }

    /// Quantity to take back off the balance when this record is deleted
    pub fn ledger_reversal(&self) -> Option<i32> {
        (self.status == InboundStatus::Approved).then_some(self.quantity)
    }
}

/// Status recorded on an outbound movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutboundStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Done,
}

impl OutboundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundStatus::Pending => "pending",
            OutboundStatus::Approved => "approved",
            OutboundStatus::Rejected => "rejected",
            OutboundStatus::Done => "done",
        }
    }
}

impl fmt::Display for OutboundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboundStatus::Pending),
            "approved" => Ok(OutboundStatus::Approved),
            "rejected" => Ok(OutboundStatus::Rejected),
            "done" => Ok(OutboundStatus::Done),
            other => Err(format!("unknown outbound status '{}'", other)),
        }
    }
}

/// Stock leaving the store, either recorded directly or produced by
/// fulfilling an approved request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub request_id: Option<Uuid>,
    pub quantity: i32,
    pub movement_date: NaiveDate,
    pub issued_by: Uuid,
    pub note: Option<String>,
    pub location: Option<String>,
    pub status: OutboundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn sample_inbound(item_id: Uuid, quantity: i32) -> InboundMovement {
    let now = Utc::now();
    InboundMovement {
        id: Uuid::new_v4(),
        item_id,
        supplier_id: None,
        quantity,
        movement_date: now.date_naive(),
        note: None,
        recorded_by: Uuid::new_v4(),
        status: InboundStatus::Pending,
        approved_by: None,
        approved_at: None,
        rejected_by: None,
        rejected_at: None,
        reject_reason: None,
        created_at: now,
        updated_at: now,
    }
}
