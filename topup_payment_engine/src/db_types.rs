use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tps_common::Rupiah;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------        OrderId        --------------------------------------------------------
/// The merchant order id: the system-generated correlation key shared with the payment gateway. Globally unique, and
/// the idempotency key for every write that follows order creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PaymentStatus     --------------------------------------------------------
/// The payment status of a transaction.
///
/// The lifecycle is `Pending → Paid → Process → Success`, with `Failed` reachable only from `Pending`.
/// `Success` and `Failed` are terminal; a transaction never regresses out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// The transaction has been created; no payment has been confirmed.
    Pending,
    /// The gateway reported a successful payment.
    Paid,
    /// The provisioning provider has accepted the fulfilment job.
    Process,
    /// The provider confirmed fulfilment.
    Success,
    /// The payment failed, was rejected, or expired.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }

    /// The set of statuses a transaction may be in for a transition into `self` to be applied. Conditional updates
    /// in the database are keyed on this set, which is what makes callback handling idempotent: a duplicate delivery
    /// finds the transaction already moved on and matches nothing.
    pub fn allowed_sources(&self) -> &'static [PaymentStatus] {
        use PaymentStatus::*;
        match self {
            Pending => &[],
            Paid => &[Pending],
            Process => &[Paid],
            Success => &[Paid, Process],
            Failed => &[Pending],
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Process => "PROCESS",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "PROCESS" => Ok(Self::Process),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    TransactionType    --------------------------------------------------------
/// Discriminates what a transaction pays for. Stored on the transaction itself so the reconciler can dispatch on it
/// directly, rather than pattern-matching the order id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// A balance top-up into the user's stored wallet.
    Deposit,
    /// A purchase of a digital good, fulfilled by the provisioning provider.
    TopUp,
    /// An admin-created order that bypassed the payment gateway.
    Manual,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::TopUp => "TOPUP",
            TransactionType::Manual => "MANUAL",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------         Role          --------------------------------------------------------
/// The role/tier of a user. `Platinum` members get preferential tier pricing; `Admin` may create manual orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Role {
    Member,
    Platinum,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Member => "Member",
            Role::Platinum => "Platinum",
            Role::Admin => "Admin",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------         User          --------------------------------------------------------
/// A storefront user. The `balance` field is the stored-value wallet; it is mutated only by the ledger operations on
/// [`crate::traits::StorefrontDatabase`] and is never negative.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: Role,
    pub whatsapp: String,
    pub balance: Rupiah,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Category        --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

//--------------------------------------      CatalogItem      --------------------------------------------------------
/// A purchasable catalog item (a game-credit denomination, voucher, etc.). Immutable during an order's lifetime;
/// the price is snapshotted onto the transaction at order time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    /// The standard price.
    pub base_price: Rupiah,
    /// The preferential price for Platinum-tier members.
    pub platinum_price: Rupiah,
    pub is_flash_sale: bool,
    pub flash_sale_price: Option<Rupiah>,
    pub flash_sale_expiry: Option<DateTime<Utc>>,
    /// The product code used when submitting the fulfilment job to the provisioning provider.
    pub provider_code: String,
    pub cost_price: Rupiah,
    pub profit: Rupiah,
}

//--------------------------------------      DiscountType     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

//--------------------------------------        Voucher        --------------------------------------------------------
/// A discount voucher. `usage_count` is shared state, incremented atomically at redemption time (order commit),
/// never during pricing previews, and never decremented.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub max_discount: Option<Rupiah>,
    pub min_purchase: Option<Rupiah>,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub is_for_all_categories: bool,
    /// Categories this voucher applies to when `is_for_all_categories` is false. Loaded from the link table.
    #[sqlx(skip)]
    pub category_ids: Vec<i64>,
}

impl Voucher {
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.map(|limit| self.usage_count >= limit).unwrap_or(false)
    }

    pub fn applies_to_category(&self, category_id: i64) -> bool {
        self.is_for_all_categories || self.category_ids.contains(&category_id)
    }
}

//--------------------------------------      Transaction      --------------------------------------------------------
/// The financial record of one attempted purchase or deposit: the aggregate root of an order. Created once at order
/// initiation and never deleted; only the orchestrator (initial writes) and the reconciler (status transitions)
/// mutate it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub merchant_order_id: OrderId,
    /// Nullable: guest orders have no user until the reconciler resolves one.
    pub user_id: Option<String>,
    pub voucher_id: Option<i64>,
    pub original_amount: Rupiah,
    pub discount_amount: Rupiah,
    /// `original_amount - discount_amount`, floored at zero.
    pub final_amount: Rupiah,
    pub payment_status: PaymentStatus,
    /// The payment method code, e.g. a gateway channel code or `SALDO` for wallet payment.
    pub payment_code: String,
    /// The gateway-assigned payment reference.
    pub payment_reference: Option<String>,
    pub payment_url: Option<String>,
    pub status_message: Option<String>,
    pub transaction_type: TransactionType,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewTransaction    --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub merchant_order_id: OrderId,
    pub user_id: Option<String>,
    pub voucher_id: Option<i64>,
    pub original_amount: Rupiah,
    pub discount_amount: Rupiah,
    pub final_amount: Rupiah,
    pub payment_status: PaymentStatus,
    pub payment_code: String,
    pub transaction_type: TransactionType,
    pub phone_number: String,
    pub status_message: Option<String>,
    pub payment_reference: Option<String>,
}

impl NewTransaction {
    pub fn new(
        merchant_order_id: OrderId,
        amount: Rupiah,
        payment_code: String,
        transaction_type: TransactionType,
        phone_number: String,
    ) -> Self {
        Self {
            merchant_order_id,
            user_id: None,
            voucher_id: None,
            original_amount: amount,
            discount_amount: Rupiah::from(0),
            final_amount: amount,
            payment_status: PaymentStatus::Pending,
            payment_code,
            transaction_type,
            phone_number,
            status_message: None,
            payment_reference: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_discount(mut self, original: Rupiah, discount: Rupiah, voucher_id: Option<i64>) -> Self {
        self.original_amount = original;
        self.discount_amount = discount;
        self.final_amount = original.saturating_sub_floor_zero(discount);
        self.voucher_id = voucher_id;
        self
    }

    pub fn with_status(mut self, status: PaymentStatus, message: Option<String>) -> Self {
        self.payment_status = status;
        self.status_message = message;
        self
    }
}

//--------------------------------------       Purchase        --------------------------------------------------------
/// The provisioning-side record of a top-up order, tied 1:1 to its transaction. `ref_id` is filled in once the
/// provisioning provider accepts the job.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub order_id: OrderId,
    pub transaction_id: i64,
    pub item_name: String,
    pub game: String,
    /// The target account at the game/service being topped up.
    pub account_id: String,
    /// Optional server/zone qualifier for the target account.
    pub zone: Option<String>,
    pub nickname: String,
    pub username: String,
    pub user_id: Option<String>,
    pub provider_code: String,
    pub ref_id: Option<String>,
    pub status: PaymentStatus,
    pub price: Rupiah,
    pub profit: Rupiah,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewPurchase      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub order_id: OrderId,
    pub item_name: String,
    pub game: String,
    pub account_id: String,
    pub zone: Option<String>,
    pub nickname: String,
    pub username: String,
    pub user_id: Option<String>,
    pub provider_code: String,
    pub price: Rupiah,
    pub profit: Rupiah,
}

//--------------------------------------        Invoice        --------------------------------------------------------
/// An immutable snapshot of the amounts of a settled transaction, created exactly once when the transaction reaches
/// a paid state.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub transaction_id: i64,
    pub user_id: String,
    pub subtotal: Rupiah,
    pub discount_amount: Rupiah,
    pub total_amount: Rupiah,
    pub status: PaymentStatus,
    pub due_date: DateTime<Utc>,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Deposit        --------------------------------------------------------
/// A balance top-up request. Linked to its transaction by `merchant_order_id` so the reconciler never needs to parse
/// the order id to find it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Deposit {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub method: String,
    pub amount: Rupiah,
    pub status: PaymentStatus,
    pub merchant_order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::PaymentStatus::*;

    #[test]
    fn terminal_states() {
        assert!(Success.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Paid.is_terminal());
        assert!(!Process.is_terminal());
    }

    #[test]
    fn no_transition_regresses_a_terminal_state() {
        for target in [Pending, Paid, Process, Success, Failed] {
            assert!(!target.allowed_sources().contains(&Success));
            assert!(!target.allowed_sources().contains(&Failed));
        }
    }

    #[test]
    fn paid_is_only_reachable_from_pending() {
        assert_eq!(Paid.allowed_sources(), &[Pending]);
    }
}
