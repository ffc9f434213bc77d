use thiserror::Error;
use tps_common::Rupiah;

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
    traits::data_objects::{DepositSettlement, NewDeposit, StatusTransition},
};

/// The Data Store interface: everything the order orchestrator and the callback reconciler need from durable
/// storage.
///
/// The multi-row operations ([`Self::insert_order`], [`Self::settle_deposit`]) are atomic units: all of their writes
/// succeed or none do, re-validating their preconditions (voucher usage limit, balance sufficiency, current status)
/// at write time. Implementations must bound how long they will wait to start such a unit; on timeout the whole
/// operation fails with [`StorefrontError::DatabaseError`] and no partial writes.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    //----------------------------------------- Catalog reads ---------------------------------------------------------
    async fn fetch_item_by_name(&self, name: &str) -> Result<Option<CatalogItem>, StorefrontError>;

    async fn fetch_item(&self, id: i64) -> Result<Option<CatalogItem>, StorefrontError>;

    async fn fetch_category(&self, id: i64) -> Result<Option<Category>, StorefrontError>;

    /// Fetches a voucher by code, including its category links. Validity (active flag, window, usage) is judged by
    /// the pricing engine; redemption is re-validated atomically inside [`Self::insert_order`].
    async fn fetch_voucher(&self, code: &str) -> Result<Option<Voucher>, StorefrontError>;

    //------------------------------------------ Users & ledger -------------------------------------------------------
    async fn fetch_user(&self, id: &str) -> Result<Option<User>, StorefrontError>;

    /// True iff the user exists and `balance >= amount`. Advisory only: the caller must still let
    /// [`Self::insert_order`] re-validate the debit at write time, since two concurrent orders may both pass this
    /// check.
    async fn balance_covers(&self, user_id: &str, amount: Rupiah) -> Result<bool, StorefrontError>;

    /// Atomic balance increment.
    async fn credit_balance(&self, user_id: &str, amount: Rupiah) -> Result<(), StorefrontError>;

    /// Resolves the actor for a guest order: creates (or returns) a user with the deterministic id
    /// `guest_{order_id}`. Idempotent under concurrent callback delivery.
    async fn ensure_guest_user(&self, order_id: &OrderId) -> Result<User, StorefrontError>;

    //------------------------------------------- Order creation ------------------------------------------------------
    /// The order-creation atomic unit: inserts the transaction and its purchase, increments the voucher usage count
    /// when `transaction.voucher_id` is set (failing with [`StorefrontError::VoucherExhausted`] if the limit has
    /// been reached in the meantime), and debits `debit` from the user's balance when the order is paid from the
    /// wallet (failing with [`StorefrontError::InsufficientBalance`] if the balance no longer covers it).
    ///
    /// A transaction row existing is the single source of truth for "an order was accepted": nothing downstream
    /// happens without it.
    async fn insert_order(
        &self,
        transaction: NewTransaction,
        purchase: NewPurchase,
        debit: Option<Rupiah>,
    ) -> Result<Transaction, StorefrontError>;

    /// Inserts a standalone transaction (deposits and manual orders carry no purchase record).
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StorefrontError>;

    //--------------------------------------------- Deposits ----------------------------------------------------------
    async fn insert_deposit(&self, deposit: NewDeposit) -> Result<Deposit, StorefrontError>;

    /// Links the deposit to the transaction that will pay for it.
    async fn attach_deposit_order_id(&self, deposit_id: i64, order_id: &OrderId) -> Result<(), StorefrontError>;

    async fn mark_deposit_failed(&self, deposit_id: i64) -> Result<(), StorefrontError>;

    /// Settles the deposit linked to `order_id` as one atomic unit: the transaction's conditional status transition
    /// (as for [`Self::transition_status`]), the deposit's PENDING → `outcome` update, and the balance credit when
    /// the outcome is a successful payment all commit together. A transaction that has already left the source
    /// state comes back as [`DepositSettlement::Duplicate`] with no writes, which is what makes redelivered
    /// callbacks credit at most once.
    async fn settle_deposit(
        &self,
        order_id: &OrderId,
        outcome: PaymentStatus,
        message: &str,
        reference: Option<&str>,
    ) -> Result<DepositSettlement, StorefrontError>;

    //------------------------------------------- Transactions --------------------------------------------------------
    async fn fetch_transaction(&self, order_id: &OrderId) -> Result<Option<Transaction>, StorefrontError>;

    /// Records the gateway's acceptance of a payment request: reference and payment URL, status unchanged.
    async fn record_gateway_acceptance(
        &self,
        order_id: &OrderId,
        reference: &str,
        payment_url: &str,
    ) -> Result<Transaction, StorefrontError>;

    /// Marks a transaction FAILED with the given message. Used when the gateway rejects or times out after the
    /// order record was durably created; the transaction row stays behind as the audit trail.
    async fn mark_order_failed(&self, order_id: &OrderId, message: &str) -> Result<Transaction, StorefrontError>;

    /// Applies a conditional status transition: the update only matches when the transaction's current status is in
    /// `target.allowed_sources()`. Returns [`StatusTransition::Duplicate`] when it matches nothing but the
    /// transaction exists, and [`StorefrontError::TransactionNotFound`] when it doesn't.
    ///
    /// This single conditional update is the per-order mutual-exclusion point: of N concurrent deliveries of the
    /// same callback, exactly one observes `Applied`.
    async fn transition_status(
        &self,
        order_id: &OrderId,
        target: PaymentStatus,
        message: &str,
        reference: Option<&str>,
    ) -> Result<StatusTransition, StorefrontError>;

    //---------------------------------------- Purchases & invoices ---------------------------------------------------
    async fn fetch_purchase(&self, order_id: &OrderId) -> Result<Option<Purchase>, StorefrontError>;

    /// Records the provisioning provider's acceptance on the purchase: `ref_id` plus the PROCESS status.
    async fn record_provisioning_accepted(&self, order_id: &OrderId, ref_id: &str) -> Result<(), StorefrontError>;

    /// Creates the immutable invoice snapshot for a settled transaction, exactly once: returns `None` when an
    /// invoice already exists for it.
    async fn create_invoice_once(
        &self,
        transaction: &Transaction,
        user_id: &str,
    ) -> Result<Option<Invoice>, StorefrontError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StorefrontError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorefrontError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("Voucher usage limit reached")]
    VoucherExhausted,
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("The requested transaction {0} does not exist")]
    TransactionNotFound(OrderId),
    #[error("No deposit is linked to order {0}")]
    DepositNotFound(OrderId),
    #[error("The requested user {0} does not exist")]
    UserNotFound(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontError::DatabaseError(e.to_string())
    }
}
