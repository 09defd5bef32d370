//! # Chart of Accounts
//!
//! The account codes the posting rules address, and the catalogue of system
//! accounts and expense categories seeded for every tenant.
//!
//! ## Default Numbering (SYSCOHADA style)
//! ```text
//! ┌──────────┬──────────────────────────────────┬───────────┐
//! │ Code     │ Account                          │ Type      │
//! ├──────────┼──────────────────────────────────┼───────────┤
//! │ 311      │ Marchandises (inventory)         │ Asset     │
//! │ 409      │ Fournisseurs débiteurs           │ Asset     │
//! │ 411      │ Clients (receivables)            │ Asset     │
//! │ 521      │ Banque                           │ Asset     │
//! │ 552      │ Monnaie électronique             │ Asset     │
//! │ 571      │ Caisse                           │ Asset     │
//! │ 585      │ Paiements par carte              │ Asset     │
//! │ 401      │ Fournisseurs (payables)          │ Liability │
//! │ 701      │ Ventes de marchandises           │ Revenue   │
//! │ 601      │ Coût des marchandises vendues    │ Expense   │
//! │ 605      │ Carburant                        │ Expense   │
//! │ 611      │ Transports et logistique         │ Expense   │
//! │ 659      │ Pertes et dépréciations de stock │ Expense   │
//! │ 673      │ Remises accordées                │ Expense   │
//! └──────────┴──────────────────────────────────┴───────────┘
//! ```
//!
//! Codes are plain configuration: a tenant with a different numbering gets
//! its own `AccountCodes` value.

use serde::{Deserialize, Serialize};

use crate::types::{AccountType, PaymentMethod};

/// Account codes addressed by the posting rules, one field per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCodes {
    pub cash: String,
    pub bank: String,
    pub mobile_money: String,
    pub card: String,
    pub receivables: String,
    pub inventory: String,
    pub supplier_advances: String,
    pub payables: String,
    pub sales_revenue: String,
    pub cost_of_goods_sold: String,
    pub fuel_expense: String,
    pub logistics_expense: String,
    pub stock_loss: String,
    pub discounts_given: String,
}

impl Default for AccountCodes {
    fn default() -> Self {
        AccountCodes {
            cash: "571".to_string(),
            bank: "521".to_string(),
            mobile_money: "552".to_string(),
            card: "585".to_string(),
            receivables: "411".to_string(),
            inventory: "311".to_string(),
            supplier_advances: "409".to_string(),
            payables: "401".to_string(),
            sales_revenue: "701".to_string(),
            cost_of_goods_sold: "601".to_string(),
            fuel_expense: "605".to_string(),
            logistics_expense: "611".to_string(),
            stock_loss: "659".to_string(),
            discounts_given: "673".to_string(),
        }
    }
}

impl AccountCodes {
    /// Treasury (or receivable) account a payment method lands in.
    pub fn for_payment(&self, method: PaymentMethod) -> &str {
        match method {
            PaymentMethod::Cash => &self.cash,
            PaymentMethod::Bank => &self.bank,
            PaymentMethod::MobileMoney => &self.mobile_money,
            PaymentMethod::Card => &self.card,
            PaymentMethod::Credit => &self.receivables,
        }
    }

    /// Mutable access by role name, used by configuration overrides.
    pub fn role_mut(&mut self, role: &str) -> Option<&mut String> {
        let slot = match role {
            "cash" => &mut self.cash,
            "bank" => &mut self.bank,
            "mobile_money" => &mut self.mobile_money,
            "card" => &mut self.card,
            "receivables" => &mut self.receivables,
            "inventory" => &mut self.inventory,
            "supplier_advances" => &mut self.supplier_advances,
            "payables" => &mut self.payables,
            "sales_revenue" => &mut self.sales_revenue,
            "cost_of_goods_sold" => &mut self.cost_of_goods_sold,
            "fuel_expense" => &mut self.fuel_expense,
            "logistics_expense" => &mut self.logistics_expense,
            "stock_loss" => &mut self.stock_loss,
            "discounts_given" => &mut self.discounts_given,
            _ => return None,
        };
        Some(slot)
    }

    /// Role names accepted by [`AccountCodes::role_mut`].
    pub const ROLES: [&'static str; 14] = [
        "cash",
        "bank",
        "mobile_money",
        "card",
        "receivables",
        "inventory",
        "supplier_advances",
        "payables",
        "sales_revenue",
        "cost_of_goods_sold",
        "fuel_expense",
        "logistics_expense",
        "stock_loss",
        "discounts_given",
    ];

    /// System accounts created by the bootstrap, in chart order.
    pub fn system_accounts(&self) -> Vec<AccountTemplate> {
        use AccountType::*;

        vec![
            AccountTemplate::new(&self.inventory, "Marchandises", Asset),
            AccountTemplate::new(&self.supplier_advances, "Fournisseurs débiteurs", Asset),
            AccountTemplate::new(&self.receivables, "Clients", Asset),
            AccountTemplate::new(&self.bank, "Banque", Asset),
            AccountTemplate::new(&self.mobile_money, "Monnaie électronique", Asset),
            AccountTemplate::new(&self.cash, "Caisse", Asset),
            AccountTemplate::new(&self.card, "Paiements par carte", Asset),
            AccountTemplate::new(&self.payables, "Fournisseurs", Liability),
            AccountTemplate::new(&self.sales_revenue, "Ventes de marchandises", Revenue),
            AccountTemplate::new(&self.cost_of_goods_sold, "Coût des marchandises vendues", Expense),
            AccountTemplate::new(&self.fuel_expense, "Carburant", Expense),
            AccountTemplate::new(&self.logistics_expense, "Transports et logistique", Expense),
            AccountTemplate::new(&self.stock_loss, "Pertes et dépréciations de stock", Expense),
            AccountTemplate::new(&self.discounts_given, "Remises accordées", Expense),
        ]
    }

    /// Expense categories created by the bootstrap.
    pub fn expense_categories(&self) -> Vec<CategoryTemplate> {
        vec![
            CategoryTemplate::new(CATEGORY_PURCHASES, "Achats", Some(&self.cost_of_goods_sold)),
            CategoryTemplate::new(CATEGORY_LOGISTICS, "Logistique", Some(&self.logistics_expense)),
            CategoryTemplate::new(CATEGORY_STOCK_LOSS, "Pertes de stock", Some(&self.stock_loss)),
            CategoryTemplate::new(CATEGORY_FUEL, "Carburant", Some(&self.fuel_expense)),
        ]
    }
}

pub const CATEGORY_PURCHASES: &str = "purchases";
pub const CATEGORY_LOGISTICS: &str = "logistics";
pub const CATEGORY_STOCK_LOSS: &str = "stock_loss";
pub const CATEGORY_FUEL: &str = "fuel";

/// An account to create if absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTemplate {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
}

impl AccountTemplate {
    fn new(code: &str, name: &str, account_type: AccountType) -> Self {
        AccountTemplate {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
        }
    }
}

/// An expense category to create if absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTemplate {
    pub code: String,
    pub name: String,
    /// Code of the account the category debits.
    pub account_code: Option<String>,
}

impl CategoryTemplate {
    fn new(code: &str, name: &str, account_code: Option<&str>) -> Self {
        CategoryTemplate {
            code: code.to_string(),
            name: name.to_string(),
            account_code: account_code.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_shape() {
        let accounts = AccountCodes::default().system_accounts();
        let count = |t: AccountType| accounts.iter().filter(|a| a.account_type == t).count();

        assert_eq!(count(AccountType::Asset), 7);
        assert_eq!(count(AccountType::Liability), 1);
        assert_eq!(count(AccountType::Revenue), 1);
        assert_eq!(count(AccountType::Expense), 5);

        let codes: HashSet<_> = accounts.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes.len(), accounts.len(), "codes must be distinct");
    }

    #[test]
    fn test_categories_link_to_catalogue_accounts() {
        let codes = AccountCodes::default();
        let accounts: HashSet<_> = codes
            .system_accounts()
            .into_iter()
            .map(|a| a.code)
            .collect();

        let categories = codes.expense_categories();
        assert_eq!(categories.len(), 4);
        for category in categories {
            let account = category.account_code.expect("bootstrap categories are linked");
            assert!(accounts.contains(&account));
        }
    }

    #[test]
    fn test_payment_routing() {
        let codes = AccountCodes::default();
        assert_eq!(codes.for_payment(PaymentMethod::Cash), "571");
        assert_eq!(codes.for_payment(PaymentMethod::Bank), "521");
        assert_eq!(codes.for_payment(PaymentMethod::MobileMoney), "552");
        assert_eq!(codes.for_payment(PaymentMethod::Card), "585");
        assert_eq!(codes.for_payment(PaymentMethod::Credit), "411");
    }

    #[test]
    fn test_role_override() {
        let mut codes = AccountCodes::default();
        *codes.role_mut("cash").unwrap() = "5711".to_string();
        assert_eq!(codes.cash, "5711");
        assert!(codes.role_mut("unknown").is_none());

        for role in AccountCodes::ROLES {
            assert!(codes.role_mut(role).is_some(), "{role} must be addressable");
        }
    }
}
