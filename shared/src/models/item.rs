//! Catalogue items and the stock ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};

/// A stock-keeping unit.
///
/// `quantity` is the on-hand balance and the only source of truth for
/// availability. It changes through [`Item::receive`], [`Item::reverse_receipt`]
/// and [`Item::issue`]; nothing else writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub unit: String,
    pub unit_price: Decimal,
    pub location: Option<String>,
    pub quantity: i32,
    pub minimum_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Add an approved receipt to the balance
    pub fn receive(&mut self, quantity: i32) -> WorkflowResult<()> {
        if quantity <= 0 {
            return Err(WorkflowError::validation("quantity", "must be at least 1"));
        }
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| WorkflowError::validation("quantity", "stock balance overflow"))?;
        Ok(())
    }

    /// Undo a previously approved receipt. The balance is clamped at zero
    /// because stock may have been issued in the meantime.
    pub fn reverse_receipt(&mut self, quantity: i32) {
        self.quantity = (self.quantity - quantity.max(0)).max(0);
    }

    pub fn ensure_available(&self, quantity: i32) -> WorkflowResult<()> {
        if self.quantity < quantity {
            return Err(WorkflowError::InsufficientStock {
                item_id: self.id,
                on_hand: self.quantity,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Take stock out. Refused without mutation if it would go negative.
    pub fn issue(&mut self, quantity: i32) -> WorkflowResult<()> {
        if quantity <= 0 {
            return Err(WorkflowError::validation("quantity", "must be at least 1"));
        }
        self.ensure_available(quantity)?;
        self.quantity -= quantity;
        Ok(())
    }
}

/// Generate an item code from a random suffix, e.g. `BRG3F9A0C`
pub fn generate_item_code(id: Uuid) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("BRG{}", &simple[simple.len() - 6..])
}

#[cfg(test)]
pub(crate) fn sample_item(quantity: i32) -> Item {
    let now = Utc::now();
    Item {
        id: Uuid::new_v4(),
        code: "BRG000001".to_string(),
        name: "Kertas A4".to_string(),
        category_id: None,
        supplier_id: None,
        unit: "rim".to_string(),
        unit_price: Decimal::new(4500000, 2),
        location: Some("Rak A1".to_string()),
        quantity,
        minimum_stock: 2,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_increments() {
        let mut item = sample_item(5);
        item.receive(10).unwrap();
        assert_eq!(item.quantity, 15);
    }

    #[test]
    fn test_receive_rejects_non_positive() {
        let mut item = sample_item(5);
        assert!(item.receive(0).is_err());
        assert_eq!(item.quantity, 5);
    }

    #[test]
    fn test_reverse_receipt_clamps_at_zero() {
        let mut item = sample_item(10);
        item.reverse_receipt(10);
        assert_eq!(item.quantity, 0);

        let mut item = sample_item(4);
        item.reverse_receipt(10);
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn test_issue_refuses_overdraw() {
        let mut item = sample_item(2);
        let err = item.issue(3).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InsufficientStock {
                item_id: item.id,
                on_hand: 2,
                requested: 3
            }
        );
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_issue_exact_balance() {
        let mut item = sample_item(3);
        item.issue(3).unwrap();
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn test_generated_code_shape() {
        let code = generate_item_code(Uuid::new_v4());
        assert_eq!(code.len(), 9);
        assert!(code.starts_with("BRG"));
        assert!(code[3..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
