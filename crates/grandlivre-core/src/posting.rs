//! # Posting Rules
//!
//! Deterministic translation of completed business events into journal
//! lines addressed by account code.
//!
//! ## Rule Catalogue
//! ```text
//! ┌──────────────────────┬────────────────────────────┬────────────────────────┐
//! │ Event                │ Debit                      │ Credit                 │
//! ├──────────────────────┼────────────────────────────┼────────────────────────┤
//! │ Sale                 │ treasury per tender,       │ sales revenue          │
//! │                      │ receivables (due),         │ (pre-discount)         │
//! │                      │ discounts given            │                        │
//! │   └─ COGS            │ cost of goods sold         │ inventory              │
//! │ Credit payment       │ treasury per tender        │ receivables            │
//! │ Supply reception     │ inventory                  │ payables               │
//! │   └─ charges         │ logistics expense          │ cash                   │
//! │ Transfer reception   │ inventory (destination)    │ inventory (source)     │
//! │   └─ charges         │ logistics expense          │ cash                   │
//! │ Stock loss           │ stock loss                 │ inventory              │
//! │ Stock adjustment (+) │ inventory                  │ stock loss             │
//! │ Fuel log             │ fuel expense               │ cash                   │
//! │ Logistic charge      │ logistics expense          │ cash                   │
//! │ Approved expense     │ category account | logist. │ treasury per method    │
//! └──────────────────────┴────────────────────────────┴────────────────────────┘
//! ```
//!
//! Every rule is pure: it returns zero or more [`Posting`]s and never looks
//! at storage. An empty result means "nothing to post". Amounts that come
//! out zero or negative never produce a posting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::{
    AccountCodes, CATEGORY_FUEL, CATEGORY_LOGISTICS, CATEGORY_PURCHASES, CATEGORY_STOCK_LOSS,
};
use crate::events::{
    CreditPaymentReceived, FuelLog, LogisticCharge, SaleCompleted, StockMovement,
    StockMovementKind, SupplyReceived, TransferReceived,
};
use crate::money::Money;
use crate::types::{Expense, ExpenseStatus, PaymentMethod, Scope, SourceKind, SourceRef};
use crate::MAX_LABEL_LENGTH;

/// Rule-built text embeds product names and free-text reasons; it is cut to
/// the stored label length instead of failing the posting.
fn clip(text: &str) -> String {
    text.chars().take(MAX_LABEL_LENGTH).collect()
}

// =============================================================================
// Posting Output
// =============================================================================

/// A journal line addressed by chart-of-accounts code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    pub description: String,
}

/// Expense row to synthesize alongside a posting, for expense reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoExpense {
    pub category_code: String,
    pub label: String,
    pub amount: Money,
}

/// One journal entry to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub description: String,
    pub date: NaiveDate,
    pub source: SourceRef,
    pub scope: Scope,
    pub lines: Vec<PostingLine>,
    pub auto_expense: Option<AutoExpense>,
}

impl Posting {
    fn new(description: String, date: NaiveDate, source: SourceRef, scope: &Scope) -> Self {
        Posting {
            description: clip(&description),
            date,
            source,
            scope: scope.clone(),
            lines: Vec::new(),
            auto_expense: None,
        }
    }

    /// Adds a debit, merging with an existing debit line on the same code.
    fn debit(mut self, code: &str, amount: Money, description: &str) -> Self {
        if !amount.is_positive() {
            return self;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.account_code == code && l.credit.is_zero())
        {
            // An overflowing merge falls through to a separate line, which
            // entry validation then rejects.
            if let Some(merged) = line.debit.checked_add(amount) {
                line.debit = merged;
                return self;
            }
        }
        self.lines.push(PostingLine {
            account_code: code.to_string(),
            debit: amount,
            credit: Money::zero(),
            description: clip(description),
        });
        self
    }

    fn credit(mut self, code: &str, amount: Money, description: &str) -> Self {
        if !amount.is_positive() {
            return self;
        }
        self.lines.push(PostingLine {
            account_code: code.to_string(),
            debit: Money::zero(),
            credit: amount,
            description: clip(description),
        });
        self
    }

    fn with_auto_expense(mut self, category_code: &str, label: String, amount: Money) -> Self {
        self.auto_expense = Some(AutoExpense {
            category_code: category_code.to_string(),
            label: clip(&label),
            amount,
        });
        self
    }

    pub fn total_debit(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Distinct account codes the posting needs, in line order.
    pub fn account_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !codes.contains(&line.account_code.as_str()) {
                codes.push(&line.account_code);
            }
        }
        codes
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Posting rules bound to one tenant's account codes.
#[derive(Debug, Clone, Default)]
pub struct PostingRules {
    codes: AccountCodes,
}

impl PostingRules {
    pub fn new(codes: AccountCodes) -> Self {
        PostingRules { codes }
    }

    pub fn codes(&self) -> &AccountCodes {
        &self.codes
    }

    /// Sale: revenue entry plus a separate cost-of-goods-sold entry.
    ///
    /// ## Example
    /// ```text
    /// subtotal 10,000  discount 1,000  cash 9,000
    ///
    ///   Dr Caisse             9,000
    ///   Dr Remises accordées  1,000
    ///       Cr Ventes                10,000
    /// ```
    pub fn sale(&self, sale: &SaleCompleted) -> Vec<Posting> {
        let c = &self.codes;
        let source = SourceRef::new(SourceKind::Sale, &sale.sale_id);
        let mut postings = Vec::new();

        let subtotal = Money::from_cents(sale.subtotal_cents);
        if subtotal.is_positive() {
            let mut revenue = Posting::new(
                format!("Sale {}", sale.reference),
                sale.date,
                source.clone(),
                &sale.scope,
            );
            for payment in &sale.payments {
                revenue = revenue.debit(
                    c.for_payment(payment.method),
                    Money::from_cents(payment.amount_cents),
                    &format!("Payment received - {}", sale.reference),
                );
            }
            revenue = revenue
                .debit(
                    &c.receivables,
                    Money::from_cents(sale.amount_due_cents),
                    &format!("Amount due - {}", sale.reference),
                )
                .debit(
                    &c.discounts_given,
                    Money::from_cents(sale.discount_cents),
                    &format!("Discount granted - {}", sale.reference),
                )
                .credit(
                    &c.sales_revenue,
                    subtotal,
                    &format!("Sales revenue - {}", sale.reference),
                );
            postings.push(revenue);
        }

        let cost = Money::checked_sum(
            sale.items
                .iter()
                .filter(|item| item.quantity > 0 && item.cost_price_cents > 0)
                .map(|item| item.cost()),
        );
        if let Some(cost) = cost.filter(Money::is_positive) {
            let description = format!("Cost of goods sold - {}", sale.reference);
            postings.push(
                Posting::new(description.clone(), sale.date, source, &sale.scope)
                    .debit(&c.cost_of_goods_sold, cost, &description)
                    .credit(&c.inventory, cost, &format!("Stock issued - {}", sale.reference)),
            );
        }

        postings
    }

    /// Credit payment: the customer's debt moves into treasury.
    ///
    /// A "payment" tendered on credit settles nothing and is not posted.
    pub fn credit_payment(&self, payment: &CreditPaymentReceived) -> Vec<Posting> {
        let amount = Money::from_cents(payment.amount_cents);
        if !amount.is_positive() || payment.method == PaymentMethod::Credit {
            return Vec::new();
        }

        let c = &self.codes;
        let description = format!("Credit settlement - {}", payment.sale_reference);
        vec![Posting::new(
            description.clone(),
            payment.date,
            SourceRef::new(SourceKind::CreditPayment, &payment.payment_id),
            &payment.scope,
        )
        .debit(c.for_payment(payment.method), amount, &description)
        .credit(&c.receivables, amount, &description)]
    }

    /// Supply reception: stock on account, plus attached logistic charges.
    ///
    /// The first posting carries an auto-expense for purchase + charges.
    pub fn supply_reception(&self, supply: &SupplyReceived) -> Vec<Posting> {
        let c = &self.codes;
        let source = SourceRef::new(SourceKind::Supply, &supply.supply_id);
        let purchase = Money::checked_sum(supply.items.iter().map(|item| item.cost()));
        let charges = Money::checked_sum(
            supply
                .charges
                .iter()
                .map(|charge| Money::from_cents(charge.amount_cents))
                .filter(Money::is_positive)
                .map(Some),
        );
        let (Some(purchase), Some(charges)) = (purchase, charges) else {
            return Vec::new();
        };
        let Some(total) = purchase.max(Money::zero()).checked_add(charges) else {
            return Vec::new();
        };

        let mut postings = Vec::new();

        if purchase.is_positive() {
            let description = format!("Supply reception {}", supply.reference);
            postings.push(
                Posting::new(description.clone(), supply.date, source.clone(), &supply.scope)
                    .debit(&c.inventory, purchase, &description)
                    .credit(&c.payables, purchase, &format!("Supplier debt - {}", supply.reference)),
            );
        }

        if charges.is_positive() {
            let description = format!("Logistic charges - supply {}", supply.reference);
            postings.push(
                Posting::new(description.clone(), supply.date, source, &supply.scope)
                    .debit(&c.logistics_expense, charges, &description)
                    .credit(&c.cash, charges, &description),
            );
        }

        if let Some(first) = postings.first_mut() {
            first.auto_expense = Some(AutoExpense {
                category_code: CATEGORY_PURCHASES.to_string(),
                label: clip(&format!("Supply {}", supply.reference)),
                amount: total,
            });
        }

        postings
    }

    /// Transfer reception: inventory memo entry plus attached charges.
    ///
    /// Both memo lines address the same inventory code, so the memo is
    /// net-zero unless sites carry distinct inventory accounts.
    pub fn transfer_reception(&self, transfer: &TransferReceived) -> Vec<Posting> {
        let c = &self.codes;
        let source = SourceRef::new(SourceKind::Transfer, &transfer.transfer_id);
        let value = Money::checked_sum(transfer.items.iter().map(|item| item.cost()));
        let charges = Money::checked_sum(
            transfer
                .charges
                .iter()
                .map(|charge| Money::from_cents(charge.amount_cents))
                .filter(Money::is_positive)
                .map(Some),
        );
        let (Some(value), Some(charges)) = (value, charges) else {
            return Vec::new();
        };

        let mut postings = Vec::new();

        if value.is_positive() {
            let destination = transfer.scope.warehouse_id.as_deref().unwrap_or("destination");
            let origin = transfer.source_warehouse_id.as_deref().unwrap_or("source");
            postings.push(
                Posting::new(
                    format!("Transfer reception {}", transfer.reference),
                    transfer.date,
                    source.clone(),
                    &transfer.scope,
                )
                .debit(&c.inventory, value, &format!("Stock in - {destination}"))
                .credit(&c.inventory, value, &format!("Stock out - {origin}")),
            );
        }

        if charges.is_positive() {
            let description = format!("Logistic charges - transfer {}", transfer.reference);
            postings.push(
                Posting::new(description.clone(), transfer.date, source, &transfer.scope)
                    .debit(&c.logistics_expense, charges, &description)
                    .credit(&c.cash, charges, &description)
                    .with_auto_expense(
                        CATEGORY_LOGISTICS,
                        format!("Transfer {}", transfer.reference),
                        charges,
                    ),
            );
        }

        postings
    }

    /// Stock movement: only losses and adjustments are posted here.
    pub fn stock_movement(&self, movement: &StockMovement) -> Vec<Posting> {
        let c = &self.codes;
        let value = movement
            .quantity
            .checked_abs()
            .and_then(|qty| Money::from_cents(movement.cost_price_cents).multiply_quantity(qty));
        let Some(value) = value.filter(Money::is_positive) else {
            return Vec::new();
        };

        let source = SourceRef::new(SourceKind::StockMovement, &movement.movement_id);
        let reason = movement.reason.as_deref().unwrap_or("unspecified");

        match movement.kind {
            StockMovementKind::Loss => {
                let description = format!("Stock loss - {} ({reason})", movement.product_name);
                vec![Posting::new(description.clone(), movement.date, source, &movement.scope)
                    .debit(&c.stock_loss, value, &description)
                    .credit(&c.inventory, value, &description)
                    .with_auto_expense(
                        CATEGORY_STOCK_LOSS,
                        format!("Stock loss - {}", movement.product_name),
                        value,
                    )]
            }
            StockMovementKind::Adjustment if movement.quantity > 0 => {
                let description = format!("Stock adjustment + {} ({reason})", movement.product_name);
                vec![Posting::new(description.clone(), movement.date, source, &movement.scope)
                    .debit(&c.inventory, value, &description)
                    .credit(&c.stock_loss, value, &description)]
            }
            StockMovementKind::Adjustment => {
                let description = format!("Stock adjustment - {} ({reason})", movement.product_name);
                vec![Posting::new(description.clone(), movement.date, source, &movement.scope)
                    .debit(&c.stock_loss, value, &description)
                    .credit(&c.inventory, value, &description)]
            }
            StockMovementKind::Entry
            | StockMovementKind::Exit
            | StockMovementKind::Sale
            | StockMovementKind::Transfer => Vec::new(),
        }
    }

    pub fn fuel_log(&self, log: &FuelLog) -> Vec<Posting> {
        let cost = Money::from_cents(log.cost_cents);
        if !cost.is_positive() {
            return Vec::new();
        }

        let c = &self.codes;
        let description = format!("Fuel - {}", log.vehicle);
        vec![Posting::new(
            description.clone(),
            log.date,
            SourceRef::new(SourceKind::FuelLog, &log.fuel_log_id),
            &log.scope,
        )
        .debit(&c.fuel_expense, cost, &description)
        .credit(&c.cash, cost, &description)
        .with_auto_expense(CATEGORY_FUEL, description.clone(), cost)]
    }

    /// Standalone logistic charge. Attached charges are left to the supply
    /// and transfer rules.
    pub fn logistic_charge(&self, charge: &LogisticCharge) -> Vec<Posting> {
        let amount = Money::from_cents(charge.amount_cents);
        if charge.is_attached() || !amount.is_positive() {
            return Vec::new();
        }

        let c = &self.codes;
        let description = format!("Logistic charge - {}", charge.label);
        vec![Posting::new(
            description.clone(),
            charge.date,
            SourceRef::new(SourceKind::LogisticCharge, &charge.charge_id),
            &charge.scope,
        )
        .debit(&c.logistics_expense, amount, &description)
        .credit(&c.cash, amount, &description)
        .with_auto_expense(CATEGORY_LOGISTICS, description.clone(), amount)]
    }

    /// Approved manual expense.
    ///
    /// `category_account_code` is the code of the account linked to the
    /// expense's category, when it has one. Expenses already linked to an
    /// entry are never posted twice.
    pub fn approved_expense(
        &self,
        expense: &Expense,
        category_account_code: Option<&str>,
    ) -> Vec<Posting> {
        let amount = expense.amount();
        if expense.status != ExpenseStatus::Approved
            || expense.journal_entry_id.is_some()
            || !amount.is_positive()
        {
            return Vec::new();
        }

        let c = &self.codes;
        let debit_code = category_account_code.unwrap_or(&c.logistics_expense);
        let credit_code = match expense.payment_method.unwrap_or_default() {
            PaymentMethod::Credit => c.payables.as_str(),
            method => c.for_payment(method),
        };
        let description = format!("Expense {} - {}", expense.reference, expense.label);
        let scope = Scope {
            shop_id: expense.shop_id.clone(),
            warehouse_id: expense.warehouse_id.clone(),
        };

        vec![Posting::new(
            description.clone(),
            expense.date,
            SourceRef::new(SourceKind::Expense, &expense.id),
            &scope,
        )
        .debit(debit_code, amount, &description)
        .credit(credit_code, amount, &description)]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
