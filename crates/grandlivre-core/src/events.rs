//! # Business Events
//!
//! Completed business events handed to the ledger by the operational
//! workflows (POS, logistics, expenses). These are the collaborator
//! contracts: the workflows fill them in, the posting rules read them.
//!
//! All amounts are in cents; quantities are whole units.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{PaymentMethod, Scope};

/// One tender received at the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayment {
    pub method: PaymentMethod,
    pub amount_cents: i64,
}

impl SalePayment {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        SalePayment {
            method,
            amount_cents: amount.cents(),
        }
    }
}

/// A sold line valued at cost, for the COGS sub-posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldItem {
    pub product_id: String,
    pub cost_price_cents: i64,
    pub quantity: i64,
}

impl SoldItem {
    /// `cost_price × qty`, `None` on overflow.
    pub fn cost(&self) -> Option<Money> {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

/// A sale completed by the POS workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCompleted {
    pub sale_id: String,
    pub reference: String,
    pub date: NaiveDate,
    pub scope: Scope,
    pub payments: Vec<SalePayment>,
    pub items: Vec<SoldItem>,
    /// Pre-discount subtotal.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// Amount left for the customer to pay later.
    pub amount_due_cents: i64,
}

/// A customer settling part of an outstanding credit sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPaymentReceived {
    pub payment_id: String,
    /// Reference of the sale being settled.
    pub sale_reference: String,
    pub date: NaiveDate,
    pub scope: Scope,
    pub method: PaymentMethod,
    pub amount_cents: i64,
}

/// A line of a supply request or a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedItem {
    pub product_id: String,
    pub cost_price_cents: i64,
    pub quantity_requested: i64,
    /// `None` until counted at reception.
    pub quantity_received: Option<i64>,
}

impl ReceivedItem {
    /// Received quantity when counted, otherwise the requested quantity.
    pub fn effective_quantity(&self) -> i64 {
        match self.quantity_received {
            Some(qty) if qty > 0 => qty,
            _ => self.quantity_requested,
        }
    }

    pub fn cost(&self) -> Option<Money> {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.effective_quantity())
    }
}

/// A logistic charge attached to a supply request or a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedCharge {
    pub charge_id: String,
    pub label: String,
    pub amount_cents: i64,
}

/// Goods received from a supplier into a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyReceived {
    pub supply_id: String,
    pub reference: String,
    pub date: NaiveDate,
    pub scope: Scope,
    pub items: Vec<ReceivedItem>,
    pub charges: Vec<AttachedCharge>,
}

/// Goods received at the destination of an inter-site transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceived {
    pub transfer_id: String,
    pub reference: String,
    pub date: NaiveDate,
    /// Destination scope.
    pub scope: Scope,
    pub source_warehouse_id: Option<String>,
    pub items: Vec<ReceivedItem>,
    pub charges: Vec<AttachedCharge>,
}

/// Stock movement subtypes. Only `Loss` and `Adjustment` reach the ledger;
/// the others are posted by the sale, transfer and supply rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementKind {
    Entry,
    Exit,
    Sale,
    Transfer,
    Loss,
    Adjustment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub movement_id: String,
    pub kind: StockMovementKind,
    pub product_name: String,
    pub date: NaiveDate,
    pub scope: Scope,
    pub cost_price_cents: i64,
    /// Signed for adjustments (negative = shrinkage); magnitude for losses.
    pub quantity: i64,
    pub reason: Option<String>,
}

/// Fuel purchased for a delivery vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelLog {
    pub fuel_log_id: String,
    pub vehicle: String,
    pub date: NaiveDate,
    pub scope: Scope,
    pub cost_cents: i64,
}

/// A logistic charge recorded on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticCharge {
    pub charge_id: String,
    pub label: String,
    pub date: NaiveDate,
    pub scope: Scope,
    pub amount_cents: i64,
    pub supply_request_id: Option<String>,
    pub transfer_id: Option<String>,
}

impl LogisticCharge {
    /// Charges tied to a supply or transfer are posted by those rules.
    pub fn is_attached(&self) -> bool {
        self.supply_request_id.is_some() || self.transfer_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_quantity_prefers_received() {
        let mut item = ReceivedItem {
            product_id: "p".to_string(),
            cost_price_cents: 150,
            quantity_requested: 10,
            quantity_received: Some(8),
        };
        assert_eq!(item.effective_quantity(), 8);
        assert_eq!(item.cost(), Some(Money::from_cents(1200)));

        item.quantity_received = None;
        assert_eq!(item.effective_quantity(), 10);

        item.quantity_received = Some(0);
        assert_eq!(item.effective_quantity(), 10);
    }

    #[test]
    fn test_attached_charge_detection() {
        let charge = LogisticCharge {
            charge_id: "c".to_string(),
            label: "Freight".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            scope: Scope::none(),
            amount_cents: 500,
            supply_request_id: Some("s".to_string()),
            transfer_id: None,
        };
        assert!(charge.is_attached());
    }
}
