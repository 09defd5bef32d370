//! End-to-end ledger scenarios: business events in, balances out.

use grandlivre_core::chart::{CATEGORY_LOGISTICS, CATEGORY_PURCHASES, CATEGORY_STOCK_LOSS};
use grandlivre_core::events::{
    AttachedCharge, CreditPaymentReceived, FuelLog, LogisticCharge, ReceivedItem, SaleCompleted,
    SalePayment, SoldItem, StockMovement, StockMovementKind, SupplyReceived, TransferReceived,
};
use grandlivre_core::{
    AccountCodes, AccountType, CoreError, ExpenseStatus, JournalStatus, Money, PaymentMethod,
    Scope, SourceKind, SourceRef,
};

use crate::repository::account::NewAccount;
use crate::repository::expense::NewExpense;
use crate::testing::{
    balance, bootstrapped, bootstrapped_file, day, remove_file_db, setup, TENANT,
};
use crate::{Database, DbError, LedgerIntegration};

fn ledger(db: &Database) -> LedgerIntegration {
    db.ledger(AccountCodes::default())
}

fn cash_sale(id: &str) -> SaleCompleted {
    SaleCompleted {
        sale_id: id.to_string(),
        reference: "VTE-0001".to_string(),
        date: day(),
        scope: Scope::shop("shop-1"),
        payments: vec![SalePayment::new(PaymentMethod::Cash, Money::from_cents(900_000))],
        items: vec![SoldItem {
            product_id: "p-1".to_string(),
            cost_price_cents: 300_000,
            quantity: 2,
        }],
        subtotal_cents: 1_000_000,
        discount_cents: 100_000,
        amount_due_cents: 0,
    }
}

fn fuel(id: &str, cost_cents: i64) -> FuelLog {
    FuelLog {
        fuel_log_id: id.to_string(),
        vehicle: "Camion 2".to_string(),
        date: day(),
        scope: Scope::warehouse("wh-1"),
        cost_cents,
    }
}

fn movement(id: &str, kind: StockMovementKind, quantity: i64) -> StockMovement {
    StockMovement {
        movement_id: id.to_string(),
        kind,
        product_name: "Riz 25kg".to_string(),
        date: day(),
        scope: Scope::warehouse("wh-1"),
        cost_price_cents: 20_000,
        quantity,
        reason: Some("inventaire".to_string()),
    }
}

fn received(cost_price_cents: i64, quantity: i64) -> ReceivedItem {
    ReceivedItem {
        product_id: "p-1".to_string(),
        cost_price_cents,
        quantity_requested: quantity,
        quantity_received: Some(quantity),
    }
}

fn charge(amount_cents: i64) -> AttachedCharge {
    AttachedCharge {
        charge_id: "c-1".to_string(),
        label: "Transport".to_string(),
        amount_cents,
    }
}

fn new_expense(amount_cents: i64) -> NewExpense {
    NewExpense {
        label: "Réparation portail".to_string(),
        amount: Money::from_cents(amount_cents),
        date: day(),
        category_id: None,
        payment_method: None,
        scope: Scope::shop("shop-1"),
    }
}

async fn line_on(db: &Database, entry_id: &str, code: &str) -> (i64, i64) {
    let account = db.accounts().get_by_code(TENANT, code).await.unwrap().unwrap();
    db.journal()
        .lines(entry_id)
        .await
        .unwrap()
        .iter()
        .filter(|l| l.account_id == account.id)
        .fold((0, 0), |(d, c), l| (d + l.debit_cents, c + l.credit_cents))
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn test_sale_posts_revenue_and_cost_of_goods_sold() {
    let db = bootstrapped().await;

    let entry = ledger(&db)
        .record_sale(TENANT, &cash_sale("sale-1"), "cashier")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.reference, "JE-VTE-20261018-0001");
    assert_eq!(entry.status, JournalStatus::Posted);
    assert_eq!(entry.total_debit_cents, 1_000_000);
    assert_eq!(entry.total_credit_cents, 1_000_000);
    assert_eq!(entry.shop_id.as_deref(), Some("shop-1"));
    assert_eq!(line_on(&db, &entry.id, "571").await, (900_000, 0));
    assert_eq!(line_on(&db, &entry.id, "673").await, (100_000, 0));
    assert_eq!(line_on(&db, &entry.id, "701").await, (0, 1_000_000));

    let entries = db
        .journal()
        .find_by_source(TENANT, &SourceRef::new(SourceKind::Sale, "sale-1"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].reference, "JE-VTE-20261018-0002");
    assert_eq!(entries[1].total_debit_cents, 600_000);

    assert_eq!(balance(&db, "571").await, 900_000);
    assert_eq!(balance(&db, "673").await, 100_000);
    assert_eq!(balance(&db, "701").await, 1_000_000);
    assert_eq!(balance(&db, "601").await, 600_000);
    assert_eq!(balance(&db, "311").await, -600_000);
}

#[tokio::test]
async fn test_sale_is_posted_once() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);

    ledger.record_sale(TENANT, &cash_sale("sale-1"), "cashier").await.unwrap();
    let again = ledger.record_sale(TENANT, &cash_sale("sale-1"), "cashier").await.unwrap();

    assert!(again.is_none());
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 2);
    assert_eq!(balance(&db, "571").await, 900_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_recording_of_one_sale_posts_once() {
    const ROUNDS: i64 = 20;
    let (db, path) = bootstrapped_file(4).await;
    let ledger = ledger(&db);

    for round in 0..ROUNDS {
        let sale = cash_sale(&format!("sale-{round}"));
        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let ledger = ledger.clone();
                let sale = sale.clone();
                tokio::spawn(async move { ledger.record_sale(TENANT, &sale, "cashier").await })
            })
            .collect();

        let mut posted = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().is_some() {
                posted += 1;
            }
        }
        assert_eq!(posted, 1, "round {round}");

        let source = SourceRef::new(SourceKind::Sale, sale.sale_id.clone());
        let entries = db.journal().find_by_source(TENANT, &source).await.unwrap();
        assert_eq!(entries.len(), 2, "round {round}");
    }

    assert_eq!(db.journal().count(TENANT).await.unwrap(), 2 * ROUNDS);
    assert_eq!(balance(&db, "571").await, 900_000 * ROUNDS);
    assert_eq!(balance(&db, "601").await, 600_000 * ROUNDS);

    remove_file_db(db, path).await;
}

#[tokio::test]
async fn test_sale_without_chart_is_skipped() {
    let db = setup().await;

    let entry = ledger(&db).record_sale(TENANT, &cash_sale("sale-1"), "cashier").await.unwrap();

    assert!(entry.is_none());
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_account_posts_nothing_for_the_event() {
    let db = bootstrapped().await;
    db.accounts().deactivate(TENANT, "673").await.unwrap();

    let entry = ledger(&db).record_sale(TENANT, &cash_sale("sale-1"), "cashier").await.unwrap();

    // Neither the revenue entry nor the cost entry
    assert!(entry.is_none());
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 0);
    assert_eq!(balance(&db, "571").await, 0);
    assert_eq!(balance(&db, "601").await, 0);
    assert_eq!(balance(&db, "311").await, 0);
}

#[tokio::test]
async fn test_inconsistent_sale_totals_are_rejected() {
    let db = bootstrapped().await;
    let mut sale = cash_sale("sale-1");
    sale.payments = vec![SalePayment::new(PaymentMethod::Cash, Money::from_cents(850_000))];

    let entry = ledger(&db).record_sale(TENANT, &sale, "cashier").await.unwrap();

    assert!(entry.is_none());
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 0);
    assert_eq!(balance(&db, "571").await, 0);
}

#[tokio::test]
async fn test_credit_sale_then_settlement() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);
    let mut sale = cash_sale("sale-2");
    sale.payments = vec![SalePayment::new(PaymentMethod::MobileMoney, Money::from_cents(400_000))];
    sale.amount_due_cents = 500_000;

    ledger.record_sale(TENANT, &sale, "cashier").await.unwrap().unwrap();
    assert_eq!(balance(&db, "552").await, 400_000);
    assert_eq!(balance(&db, "411").await, 500_000);

    let payment = CreditPaymentReceived {
        payment_id: "pay-1".to_string(),
        sale_reference: "VTE-0001".to_string(),
        date: day(),
        scope: Scope::shop("shop-1"),
        method: PaymentMethod::Bank,
        amount_cents: 300_000,
    };
    let entry = ledger.record_credit_payment(TENANT, &payment, "cashier").await.unwrap().unwrap();

    assert_eq!(entry.reference, "JE-AUTO-20261018-0001");
    assert_eq!(balance(&db, "521").await, 300_000);
    assert_eq!(balance(&db, "411").await, 200_000);
}

// =============================================================================
// Supply and transfers
// =============================================================================

#[tokio::test]
async fn test_supply_reception_with_charges() {
    let db = bootstrapped().await;
    let supply = SupplyReceived {
        supply_id: "sup-1".to_string(),
        reference: "APR-0001".to_string(),
        date: day(),
        scope: Scope::warehouse("wh-1"),
        items: vec![received(150_000, 10)],
        charges: vec![charge(50_000)],
    };

    let entry = ledger(&db)
        .record_supply_reception(TENANT, &supply, "storekeeper")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.reference, "JE-APR-20261018-0001");
    assert_eq!(balance(&db, "311").await, 1_500_000);
    assert_eq!(balance(&db, "401").await, 1_500_000);
    assert_eq!(balance(&db, "611").await, 50_000);
    assert_eq!(balance(&db, "571").await, -50_000);

    let expenses = db.expenses().find_by_entry(&entry.id).await.unwrap();
    assert_eq!(expenses.len(), 1);
    let purchases = db.categories().find_by_code(TENANT, CATEGORY_PURCHASES).await.unwrap().unwrap();
    assert_eq!(expenses[0].amount_cents, 1_550_000);
    assert_eq!(expenses[0].category_id, Some(purchases.id));
    assert_eq!(expenses[0].warehouse_id.as_deref(), Some("wh-1"));
}

#[tokio::test]
async fn test_transfer_memo_nets_to_zero_and_charges_are_expensed() {
    let db = bootstrapped().await;
    let transfer = TransferReceived {
        transfer_id: "trf-1".to_string(),
        reference: "TRF-0001".to_string(),
        date: day(),
        scope: Scope::warehouse("wh-2"),
        source_warehouse_id: Some("wh-1".to_string()),
        items: vec![received(20_000, 30)],
        charges: vec![charge(25_000)],
    };

    let entry = ledger(&db)
        .record_transfer_reception(TENANT, &transfer, "storekeeper")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.reference, "JE-TRF-20261018-0001");
    assert_eq!(entry.total_debit_cents, 600_000);
    assert_eq!(balance(&db, "311").await, 0);
    assert_eq!(balance(&db, "611").await, 25_000);

    let entries = db
        .journal()
        .find_by_source(TENANT, &SourceRef::new(SourceKind::Transfer, "trf-1"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    let expenses = db.expenses().find_by_entry(&entries[1].id).await.unwrap();
    let logistics = db.categories().find_by_code(TENANT, CATEGORY_LOGISTICS).await.unwrap().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category_id, Some(logistics.id));
    assert_eq!(expenses[0].amount_cents, 25_000);
}

// =============================================================================
// Stock, fuel, logistics
// =============================================================================

#[tokio::test]
async fn test_stock_loss_creates_linked_auto_expense() {
    let db = bootstrapped().await;

    let entry = ledger(&db)
        .record_stock_movement(TENANT, &movement("mv-1", StockMovementKind::Loss, 5), "storekeeper")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.reference, "JE-STK-20261018-0001");
    assert_eq!(line_on(&db, &entry.id, "659").await, (100_000, 0));
    assert_eq!(line_on(&db, &entry.id, "311").await, (0, 100_000));

    let expenses = db.expenses().find_by_entry(&entry.id).await.unwrap();
    assert_eq!(expenses.len(), 1);
    let auto = &expenses[0];
    let stock_loss = db.categories().find_by_code(TENANT, CATEGORY_STOCK_LOSS).await.unwrap().unwrap();
    assert_eq!(auto.amount_cents, 100_000);
    assert_eq!(auto.status, ExpenseStatus::Approved);
    assert_eq!(auto.reference, "DEP-AUTO-20261018-0001");
    assert_eq!(auto.category_id, Some(stock_loss.id));
    assert_eq!(auto.journal_entry_id.as_deref(), Some(entry.id.as_str()));
    assert_eq!(auto.approved_by.as_deref(), Some("storekeeper"));
}

#[tokio::test]
async fn test_long_loss_reason_still_posts() {
    let db = bootstrapped().await;
    let mut loss = movement("mv-1", StockMovementKind::Loss, 5);
    loss.reason = Some("x".repeat(250));

    let entry = ledger(&db)
        .record_stock_movement(TENANT, &loss, "storekeeper")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.description.chars().count(), grandlivre_core::MAX_LABEL_LENGTH);
    assert!(entry.description.starts_with("Stock loss - Riz 25kg (xxx"));
    assert_eq!(balance(&db, "659").await, 100_000);
    assert_eq!(balance(&db, "311").await, -100_000);
    assert_eq!(db.expenses().find_by_entry(&entry.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_adjustments_post_without_auto_expense() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);

    let up = ledger
        .record_stock_movement(TENANT, &movement("mv-1", StockMovementKind::Adjustment, 3), "sk")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance(&db, "311").await, 60_000);
    assert_eq!(balance(&db, "659").await, -60_000);
    assert!(db.expenses().find_by_entry(&up.id).await.unwrap().is_empty());

    ledger
        .record_stock_movement(TENANT, &movement("mv-2", StockMovementKind::Adjustment, -1), "sk")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance(&db, "311").await, 40_000);
    assert_eq!(balance(&db, "659").await, -40_000);
    assert!(db.expenses().list(TENANT, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_stock_movements_are_not_posted() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);

    for (id, kind) in [
        ("mv-1", StockMovementKind::Entry),
        ("mv-2", StockMovementKind::Exit),
        ("mv-3", StockMovementKind::Sale),
        ("mv-4", StockMovementKind::Transfer),
    ] {
        let entry = ledger.record_stock_movement(TENANT, &movement(id, kind, 4), "sk").await.unwrap();
        assert!(entry.is_none());
    }

    let mut free = movement("mv-5", StockMovementKind::Loss, 5);
    free.cost_price_cents = 0;
    assert!(ledger.record_stock_movement(TENANT, &free, "sk").await.unwrap().is_none());
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 0);
}

#[tokio::test]
async fn test_void_fuel_entry_restores_balances() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);
    let fuel_before = balance(&db, "605").await;
    let cash_before = balance(&db, "571").await;

    let entry = ledger.record_fuel_log(TENANT, &fuel("f-1", 300_000), "driver").await.unwrap().unwrap();
    assert_eq!(entry.reference, "JE-CBR-20261018-0001");
    assert_eq!(balance(&db, "605").await, fuel_before + 300_000);
    assert_eq!(balance(&db, "571").await, cash_before - 300_000);

    let voided = ledger.void_journal_entry(TENANT, &entry.id, "accountant").await.unwrap();
    assert_eq!(voided.status, JournalStatus::Voided);
    assert!(voided.voided_at.is_some());
    assert_eq!(balance(&db, "605").await, fuel_before);
    assert_eq!(balance(&db, "571").await, cash_before);

    let err = ledger.void_journal_entry(TENANT, &entry.id, "accountant").await.unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::InvalidEntryStatus { .. })));
    assert_eq!(balance(&db, "605").await, fuel_before);
}

#[tokio::test]
async fn test_voided_event_can_be_recorded_again() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);

    let first = ledger.record_fuel_log(TENANT, &fuel("f-1", 10_000), "driver").await.unwrap().unwrap();
    ledger.void_journal_entry(TENANT, &first.id, "accountant").await.unwrap();

    let second = ledger.record_fuel_log(TENANT, &fuel("f-1", 12_000), "driver").await.unwrap().unwrap();
    assert_eq!(second.reference, "JE-CBR-20261018-0002");
    assert_eq!(balance(&db, "605").await, 12_000);
}

#[tokio::test]
async fn test_zero_cost_fuel_is_a_no_op() {
    let db = bootstrapped().await;
    let entry = ledger(&db).record_fuel_log(TENANT, &fuel("f-1", 0), "driver").await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_sequential_fuel_logs_get_sequential_references() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);

    let mut references = Vec::new();
    for n in 1..=5 {
        let log = fuel(&format!("f-{n}"), 1_000 * n);
        references.push(ledger.record_fuel_log(TENANT, &log, "driver").await.unwrap().unwrap().reference);
    }

    assert_eq!(
        references,
        vec![
            "JE-CBR-20261018-0001",
            "JE-CBR-20261018-0002",
            "JE-CBR-20261018-0003",
            "JE-CBR-20261018-0004",
            "JE-CBR-20261018-0005",
        ]
    );

    let autos: Vec<String> = db
        .expenses()
        .list(TENANT, Some(ExpenseStatus::Approved))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.reference)
        .collect();
    assert_eq!(autos.len(), 5);
    assert!(autos.contains(&"DEP-AUTO-20261018-0005".to_string()));
}

#[tokio::test]
async fn test_attached_logistic_charges_are_left_to_their_workflow() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);
    let mut charge = LogisticCharge {
        charge_id: "lc-1".to_string(),
        label: "Manutention".to_string(),
        date: day(),
        scope: Scope::warehouse("wh-1"),
        amount_cents: 15_000,
        supply_request_id: Some("sup-1".to_string()),
        transfer_id: None,
    };

    assert!(ledger.record_logistic_charge(TENANT, &charge, "sk").await.unwrap().is_none());

    charge.supply_request_id = None;
    let entry = ledger.record_logistic_charge(TENANT, &charge, "sk").await.unwrap().unwrap();
    assert_eq!(entry.reference, "JE-LOG-20261018-0001");
    assert_eq!(balance(&db, "611").await, 15_000);
    assert_eq!(db.expenses().find_by_entry(&entry.id).await.unwrap().len(), 1);
}

// =============================================================================
// Manual expenses
// =============================================================================

#[tokio::test]
async fn test_approving_expense_posts_once() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);
    let expense = db.expenses().create(TENANT, new_expense(500_000), "clerk").await.unwrap();

    let entry = ledger.approve_expense(TENANT, &expense.id, "boss").await.unwrap().unwrap();

    assert_eq!(entry.reference, "JE-DEP-20261018-0001");
    assert_eq!(line_on(&db, &entry.id, "611").await, (500_000, 0));
    assert_eq!(line_on(&db, &entry.id, "571").await, (0, 500_000));

    let stored = db.expenses().get(TENANT, &expense.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ExpenseStatus::Approved);
    assert_eq!(stored.approved_by.as_deref(), Some("boss"));
    assert_eq!(stored.journal_entry_id.as_deref(), Some(entry.id.as_str()));

    let again = ledger.approve_expense(TENANT, &expense.id, "boss").await.unwrap();
    assert!(again.is_none());
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 1);
    assert_eq!(balance(&db, "611").await, 500_000);
}

#[tokio::test]
async fn test_expense_uses_category_account_and_payment_method() {
    let db = bootstrapped().await;
    let rent = db
        .accounts()
        .create(
            TENANT,
            NewAccount {
                code: "622".to_string(),
                name: "Locations".to_string(),
                account_type: AccountType::Expense,
            },
            "admin",
        )
        .await
        .unwrap();
    let category = db.categories().create(TENANT, "rent", "Loyer", Some(rent.id.as_str())).await.unwrap();

    let mut input = new_expense(250_000);
    input.category_id = Some(category.id);
    input.payment_method = Some(PaymentMethod::Bank);
    let expense = db.expenses().create(TENANT, input, "clerk").await.unwrap();

    ledger(&db).approve_expense(TENANT, &expense.id, "boss").await.unwrap().unwrap();

    assert_eq!(balance(&db, "622").await, 250_000);
    assert_eq!(balance(&db, "521").await, -250_000);
    assert_eq!(balance(&db, "611").await, 0);
}

#[tokio::test]
async fn test_expense_category_of_another_tenant_is_not_used() {
    let db = bootstrapped().await;
    let other = "tenant-2";
    ledger(&db).initialize_chart_of_accounts(other, "admin").await.unwrap();
    let rent = db
        .accounts()
        .create(
            other,
            NewAccount {
                code: "622".to_string(),
                name: "Locations".to_string(),
                account_type: AccountType::Expense,
            },
            "admin",
        )
        .await
        .unwrap();
    let foreign = db.categories().create(other, "rent", "Loyer", Some(rent.id.as_str())).await.unwrap();

    let mut input = new_expense(120_000);
    input.category_id = Some(foreign.id.clone());
    let err = db.expenses().create(TENANT, input, "clerk").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));

    // A row that already points across tenants posts as uncategorized.
    let expense = db.expenses().create(TENANT, new_expense(120_000), "clerk").await.unwrap();
    sqlx::query("UPDATE expenses SET category_id = ?1 WHERE id = ?2")
        .bind(&foreign.id)
        .bind(&expense.id)
        .execute(db.pool())
        .await
        .unwrap();

    ledger(&db).approve_expense(TENANT, &expense.id, "boss").await.unwrap().unwrap();

    assert_eq!(balance(&db, "611").await, 120_000);
    assert_eq!(balance(&db, "571").await, -120_000);
    let untouched = db.accounts().get_by_code(other, "622").await.unwrap().unwrap();
    assert_eq!(untouched.balance_cents, 0);
    assert_eq!(db.journal().count(other).await.unwrap(), 0);
}

#[tokio::test]
async fn test_expense_on_credit_lands_in_payables() {
    let db = bootstrapped().await;
    let mut input = new_expense(80_000);
    input.payment_method = Some(PaymentMethod::Credit);
    let expense = db.expenses().create(TENANT, input, "clerk").await.unwrap();

    ledger(&db).approve_expense(TENANT, &expense.id, "boss").await.unwrap().unwrap();

    assert_eq!(balance(&db, "401").await, 80_000);
}

#[tokio::test]
async fn test_approval_succeeds_without_chart() {
    let db = setup().await;
    let expense = db.expenses().create(TENANT, new_expense(500_000), "clerk").await.unwrap();

    let entry = ledger(&db).approve_expense(TENANT, &expense.id, "boss").await.unwrap();

    assert!(entry.is_none());
    let stored = db.expenses().get(TENANT, &expense.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ExpenseStatus::Approved);
    assert!(stored.journal_entry_id.is_none());
}

#[tokio::test]
async fn test_approved_expense_is_posted_once_chart_exists() {
    let db = setup().await;
    let ledger = ledger(&db);
    let expense = db.expenses().create(TENANT, new_expense(70_000), "clerk").await.unwrap();
    ledger.approve_expense(TENANT, &expense.id, "boss").await.unwrap();

    ledger.initialize_chart_of_accounts(TENANT, "admin").await.unwrap();
    let entry = ledger.record_expense(TENANT, &expense.id, "boss").await.unwrap().unwrap();

    let stored = db.expenses().get(TENANT, &expense.id).await.unwrap().unwrap();
    assert_eq!(stored.journal_entry_id, Some(entry.id));
    assert!(ledger.record_expense(TENANT, &expense.id, "boss").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_expense_cannot_be_approved() {
    let db = bootstrapped().await;
    let expense = db.expenses().create(TENANT, new_expense(10_000), "clerk").await.unwrap();
    db.expenses().reject(TENANT, &expense.id, "boss").await.unwrap();

    let err = ledger(&db).approve_expense(TENANT, &expense.id, "boss").await.unwrap_err();

    assert!(matches!(err, DbError::Core(CoreError::InvalidExpenseStatus { .. })));
    assert_eq!(db.journal().count(TENANT).await.unwrap(), 0);
}

#[tokio::test]
async fn test_pending_expense_is_not_recorded() {
    let db = bootstrapped().await;
    let expense = db.expenses().create(TENANT, new_expense(10_000), "clerk").await.unwrap();

    let entry = ledger(&db).record_expense(TENANT, &expense.id, "boss").await.unwrap();
    assert!(entry.is_none());
}

// =============================================================================
// Ledger-wide invariants
// =============================================================================

#[tokio::test]
async fn test_balances_equal_sum_of_posted_movements() {
    let db = bootstrapped().await;
    let ledger = ledger(&db);

    ledger.record_sale(TENANT, &cash_sale("sale-1"), "cashier").await.unwrap();
    ledger
        .record_stock_movement(TENANT, &movement("mv-1", StockMovementKind::Loss, 5), "sk")
        .await
        .unwrap();
    let fuel_entry = ledger.record_fuel_log(TENANT, &fuel("f-1", 300_000), "driver").await.unwrap().unwrap();
    ledger.record_fuel_log(TENANT, &fuel("f-2", 45_000), "driver").await.unwrap();
    ledger.void_journal_entry(TENANT, &fuel_entry.id, "accountant").await.unwrap();
    let expense = db.expenses().create(TENANT, new_expense(500_000), "clerk").await.unwrap();
    ledger.approve_expense(TENANT, &expense.id, "boss").await.unwrap();

    for account in db.accounts().list(TENANT, true).await.unwrap() {
        let (debits, credits): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(l.debit_cents), 0), COALESCE(SUM(l.credit_cents), 0) \
             FROM journal_entry_lines l JOIN journal_entries e ON e.id = l.entry_id \
             WHERE l.account_id = ?1 AND e.status = 'posted'",
        )
        .bind(&account.id)
        .fetch_one(db.pool())
        .await
        .unwrap();

        let expected = account
            .account_type
            .balance_delta(Money::from_cents(debits), Money::from_cents(credits));
        assert_eq!(account.balance(), expected, "account {}", account.code);
    }

    for entry in db.journal().list(TENANT, None).await.unwrap() {
        assert!(entry.is_balanced(), "entry {}", entry.reference);
        let lines = db.journal().lines(&entry.id).await.unwrap();
        let debit: i64 = lines.iter().map(|l| l.debit_cents).sum();
        let credit: i64 = lines.iter().map(|l| l.credit_cents).sum();
        assert_eq!(debit, credit);
        assert_eq!(debit, entry.total_debit_cents);
    }

    let voided = db.journal().list(TENANT, Some(JournalStatus::Voided)).await.unwrap();
    assert_eq!(voided.len(), 1);
}
