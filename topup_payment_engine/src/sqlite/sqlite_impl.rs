//! `SqliteDatabase` is a concrete implementation of a top-up storefront backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`StorefrontDatabase`] trait. The multi-row
//! operations run inside a single sqlx transaction so that the invariants (no negative balances, at-most-once
//! voucher redemption, at-most-once deposit credit) hold under concurrent access.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;
use tps_common::Rupiah;

use super::db::{catalog, db_url, deposits, invoices, new_pool, purchases, transactions, users, vouchers};
use crate::{
    db_types::{
        CatalogItem,
        Category,
        Deposit,
        Invoice,
        NewPurchase,
        NewTransaction,
        OrderId,
        PaymentStatus,
        Purchase,
        Transaction,
        User,
        Voucher,
    },
    traits::{DepositSettlement, NewDeposit, StatusTransition, StorefrontDatabase, StorefrontError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_item_by_name(&self, name: &str) -> Result<Option<CatalogItem>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let item = catalog::fetch_item_by_name(name, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_item(&self, id: i64) -> Result<Option<CatalogItem>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let item = catalog::fetch_item(id, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_category(&self, id: i64) -> Result<Option<Category>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let category = catalog::fetch_category(id, &mut conn).await?;
        Ok(category)
    }

    async fn fetch_voucher(&self, code: &str) -> Result<Option<Voucher>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = vouchers::fetch_voucher_by_code(code, &mut conn).await?;
        Ok(voucher)
    }

    async fn fetch_user(&self, id: &str) -> Result<Option<User>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(id, &mut conn).await?;
        Ok(user)
    }

    async fn balance_covers(&self, user_id: &str, amount: Rupiah) -> Result<bool, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        users::balance_covers(user_id, amount, &mut conn).await
    }

    async fn credit_balance(&self, user_id: &str, amount: Rupiah) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        users::credit(user_id, amount, &mut conn).await
    }

    async fn ensure_guest_user(&self, order_id: &OrderId) -> Result<User, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        users::ensure_guest_user(order_id, &mut conn).await
    }

    /// The order-creation atomic unit. Inserts the transaction and its purchase, redeems the voucher and debits the
    /// wallet as one sqlx transaction; any precondition failing rolls the whole thing back.
    async fn insert_order(
        &self,
        transaction: NewTransaction,
        purchase: NewPurchase,
        debit: Option<Rupiah>,
    ) -> Result<Transaction, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let record = transactions::insert_transaction(transaction, &mut tx).await?;
        if let Some(voucher_id) = record.voucher_id {
            vouchers::redeem(voucher_id, &mut tx).await?;
        }
        if let Some(amount) = debit {
            let user_id = record
                .user_id
                .as_deref()
                .ok_or_else(|| StorefrontError::DatabaseError("Wallet debit without a user".to_string()))?;
            users::debit(user_id, amount, &mut tx).await?;
            debug!("🗃️ {amount} debited from {user_id} for order {}", record.merchant_order_id);
        }
        purchases::insert_purchase(purchase, record.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", record.merchant_order_id, record.id);
        Ok(record)
    }

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert_transaction(transaction, &mut conn).await
    }

    async fn insert_deposit(&self, deposit: NewDeposit) -> Result<Deposit, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        deposits::insert_deposit(deposit, &mut conn).await
    }

    async fn attach_deposit_order_id(&self, deposit_id: i64, order_id: &OrderId) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        deposits::attach_order_id(deposit_id, order_id, &mut conn).await
    }

    async fn mark_deposit_failed(&self, deposit_id: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        deposits::mark_failed(deposit_id, &mut conn).await
    }

    /// The deposit-settlement atomic unit. The transaction's conditional status transition, the deposit's
    /// PENDING → outcome update and the balance credit commit together, so the transaction can never be PAID with
    /// the credit lost, and a deposit can never be credited without being settled, or twice.
    async fn settle_deposit(
        &self,
        order_id: &OrderId,
        outcome: PaymentStatus,
        message: &str,
        reference: Option<&str>,
    ) -> Result<DepositSettlement, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let transition = transactions::transition_status(order_id, outcome, message, reference, &mut tx).await?;
        if let StatusTransition::Duplicate(t) = transition {
            debug!("🗃️ Deposit order {order_id} is already {}. Nothing to settle.", t.payment_status);
            let deposit = deposits::fetch_by_order_id(order_id, &mut tx)
                .await?
                .ok_or_else(|| StorefrontError::DepositNotFound(order_id.clone()))?;
            tx.commit().await?;
            return Ok(DepositSettlement::Duplicate(deposit));
        }
        let settlement = match deposits::settle(order_id, outcome, &mut tx).await? {
            DepositSettlement::Applied { deposit, .. } if outcome == PaymentStatus::Paid => {
                users::credit(&deposit.user_id, deposit.amount, &mut tx).await?;
                DepositSettlement::Applied { deposit, credited: true }
            },
            other => other,
        };
        tx.commit().await?;
        Ok(settlement)
    }

    async fn fetch_transaction(&self, order_id: &OrderId) -> Result<Option<Transaction>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::fetch_transaction_by_order_id(order_id, &mut conn).await?;
        Ok(transaction)
    }

    async fn record_gateway_acceptance(
        &self,
        order_id: &OrderId,
        reference: &str,
        payment_url: &str,
    ) -> Result<Transaction, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        transactions::record_gateway_acceptance(order_id, reference, payment_url, &mut conn).await
    }

    async fn mark_order_failed(&self, order_id: &OrderId, message: &str) -> Result<Transaction, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::transition_status(order_id, PaymentStatus::Failed, message, None, &mut conn).await?;
        let transaction = match result {
            StatusTransition::Applied(t) => t,
            StatusTransition::Duplicate(t) => {
                warn!("🗃️ Order {order_id} could not be failed. It is already {}.", t.payment_status);
                t
            },
        };
        Ok(transaction)
    }

    async fn transition_status(
        &self,
        order_id: &OrderId,
        target: PaymentStatus,
        message: &str,
        reference: Option<&str>,
    ) -> Result<StatusTransition, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        transactions::transition_status(order_id, target, message, reference, &mut conn).await
    }

    async fn fetch_purchase(&self, order_id: &OrderId) -> Result<Option<Purchase>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let purchase = purchases::fetch_purchase_by_order_id(order_id, &mut conn).await?;
        Ok(purchase)
    }

    async fn record_provisioning_accepted(&self, order_id: &OrderId, ref_id: &str) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        purchases::record_provisioning_accepted(order_id, ref_id, &mut conn).await
    }

    async fn create_invoice_once(
        &self,
        transaction: &Transaction,
        user_id: &str,
    ) -> Result<Option<Invoice>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let invoice = invoices::insert_invoice_once(transaction, user_id, &mut conn).await?;
        Ok(invoice)
    }

    async fn close(&mut self) -> Result<(), StorefrontError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
