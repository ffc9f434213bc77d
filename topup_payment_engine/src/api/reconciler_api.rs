use std::fmt::Debug;

use log::*;
use serde::Deserialize;

use crate::{
    api::{errors::CallbackError, MerchantConfig},
    db_types::{OrderId, PaymentStatus, Transaction, TransactionType},
    helpers,
    traits::{
        DepositSettlement,
        Notifier,
        OrderNotification,
        ProvisioningProvider,
        ProvisionRequest,
        StatusTransition,
        StorefrontDatabase,
    },
};

/// The inbound gateway callback, as deserialized from the request body. Every field is optional at the wire level;
/// [`ReconcilerApi::handle_callback`] enforces which ones are required.
///
/// `amount` keeps its wire representation as a string because it participates verbatim in the signature check.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub merchant_code: Option<String>,
    pub merchant_order_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: Option<String>,
    pub signature: Option<String>,
    pub result_code: Option<String>,
    pub reference: Option<String>,
    pub product_details: Option<String>,
    pub phone_number: Option<String>,
}

/// The gateway sends `amount` as a JSON number in some channels and as a string in others. Accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: serde::Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", f as i64)
            } else {
                f.to_string()
            }
        },
    }))
}

/// What [`ReconcilerApi::handle_callback`] did with a callback. The server acknowledges all of these with a 200.
#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// The transaction was moved to the given status.
    Applied(PaymentStatus),
    /// The transaction had already left the source state; nothing was written.
    Duplicate,
    /// The callback reported a still-pending payment; nothing to record.
    StillPending,
}

/// `ReconcilerApi` converts asynchronous gateway callbacks into durable state transitions. It is the only component
/// that moves a transaction out of PENDING on the gateway's say-so, and it is safe under redelivery: every write it
/// performs is conditional on the current status, so the same callback applied N times changes state exactly once.
pub struct ReconcilerApi<B, P, N> {
    db: B,
    provider: P,
    notifier: N,
    merchant: MerchantConfig,
}

impl<B, P, N> Debug for ReconcilerApi<B, P, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcilerApi")
    }
}

impl<B, P, N> ReconcilerApi<B, P, N>
where
    B: StorefrontDatabase,
    P: ProvisioningProvider,
    N: Notifier,
{
    pub fn new(db: B, provider: P, notifier: N, merchant: MerchantConfig) -> Self {
        Self { db, provider, notifier, merchant }
    }

    /// Handles one gateway callback end to end: field validation, merchant and signature checks, the conditional
    /// status transition, and then the type-specific follow-up (crediting a deposit, or invoicing and provisioning a
    /// top-up).
    pub async fn handle_callback(&self, payload: CallbackPayload) -> Result<CallbackOutcome, CallbackError> {
        let merchant_code = payload.merchant_code.as_deref().ok_or(CallbackError::MissingFields("merchantCode"))?;
        let order_id =
            payload.merchant_order_id.as_deref().ok_or(CallbackError::MissingFields("merchantOrderId"))?;
        let amount = payload.amount.as_deref().ok_or(CallbackError::MissingFields("amount"))?;
        let signature = payload.signature.as_deref().ok_or(CallbackError::MissingFields("signature"))?;
        let result_code = payload.result_code.as_deref().ok_or(CallbackError::MissingFields("resultCode"))?;

        if merchant_code != self.merchant.merchant_code {
            warn!("🔄️ Callback for {order_id} carries merchant code {merchant_code}, which is not ours");
            return Err(CallbackError::MerchantMismatch);
        }
        let expected =
            helpers::callback_signature(merchant_code, amount, order_id, self.merchant.api_key.reveal());
        if signature != expected {
            warn!("🔄️ Callback for {order_id} failed the signature check");
            return Err(CallbackError::InvalidSignature);
        }

        let order_id = OrderId(order_id.to_string());
        let transaction =
            self.db.fetch_transaction(&order_id).await?.ok_or(CallbackError::TransactionNotFound(order_id.clone()))?;
        let target = helpers::status_for_result_code(result_code);
        if target == PaymentStatus::Pending {
            // Result code 01: the gateway will call again once the payment resolves.
            debug!("🔄️ Callback for {order_id} reports a still-pending payment. Acknowledged, nothing recorded.");
            return Ok(CallbackOutcome::StillPending);
        }

        let message = helpers::status_message(result_code);
        if transaction.transaction_type == TransactionType::Deposit {
            return self.settle_deposit(&order_id, target, message, payload.reference.as_deref()).await;
        }
        let transaction =
            match self.db.transition_status(&order_id, target, message, payload.reference.as_deref()).await? {
                StatusTransition::Applied(t) => t,
                StatusTransition::Duplicate(t) => {
                    info!(
                        "🔄️ Callback for {order_id} arrived with the transaction already {}. Nothing to do.",
                        t.payment_status
                    );
                    return Ok(CallbackOutcome::Duplicate);
                },
            };
        info!("🔄️ {} {order_id} moved to {target}", transaction.transaction_type);

        if transaction.transaction_type == TransactionType::TopUp && target == PaymentStatus::Paid {
            self.fulfil_paid_order(transaction, &payload).await?;
        }
        Ok(CallbackOutcome::Applied(target))
    }

    /// Deposit follow-up: the transaction's status transition, the deposit's PENDING → outcome move and the balance
    /// credit commit as one atomic unit, so an interrupted settlement can never leave the transaction PAID with the
    /// credit lost, and a redelivered callback cannot credit twice.
    async fn settle_deposit(
        &self,
        order_id: &OrderId,
        target: PaymentStatus,
        message: &str,
        reference: Option<&str>,
    ) -> Result<CallbackOutcome, CallbackError> {
        match self.db.settle_deposit(order_id, target, message, reference).await? {
            DepositSettlement::Applied { deposit, credited } => {
                if credited {
                    info!("🔄️ Deposit #{} settled. {} credited to {}", deposit.id, deposit.amount, deposit.user_id);
                } else {
                    info!("🔄️ Deposit #{} closed as {target} with no credit", deposit.id);
                }
                Ok(CallbackOutcome::Applied(target))
            },
            DepositSettlement::Duplicate(deposit) => {
                info!("🔄️ Deposit #{} was already settled. Nothing to do.", deposit.id);
                Ok(CallbackOutcome::Duplicate)
            },
        }
    }

    /// Top-up follow-up after a PAID transition: resolve the actor (creating a deterministic guest user when the
    /// order was anonymous), snapshot the invoice, and hand the fulfilment job to the provisioning provider.
    ///
    /// A provider failure here leaves the transaction PAID. The money has been taken; failing the order would lie
    /// about that, so the order is left for the operator to retry or refund.
    async fn fulfil_paid_order(
        &self,
        transaction: Transaction,
        payload: &CallbackPayload,
    ) -> Result<(), CallbackError> {
        let order_id = transaction.merchant_order_id.clone();
        let user_id = match &transaction.user_id {
            Some(id) => id.clone(),
            None => {
                let guest = self.db.ensure_guest_user(&order_id).await?;
                debug!("🔄️ Guest order {order_id} resolved to user {}", guest.id);
                guest.id
            },
        };
        self.db.create_invoice_once(&transaction, &user_id).await?;

        let purchase = match self.db.fetch_purchase(&order_id).await? {
            Some(p) => p,
            None => {
                // A top-up transaction without a purchase should not exist. Log and leave the order PAID.
                error!("🔄️ Order {order_id} is PAID but has no purchase record");
                return Ok(());
            },
        };
        let provision = ProvisionRequest {
            product_code: purchase.provider_code.clone(),
            account_id: purchase.account_id.clone(),
            server_id: purchase.zone.clone(),
            whatsapp: transaction.phone_number.clone(),
        };
        let mut status = transaction.payment_status;
        match self.provider.top_up(&provision).await {
            Ok(receipt) => {
                self.db.record_provisioning_accepted(&order_id, &receipt.ref_id).await?;
                if let StatusTransition::Applied(t) =
                    self.db.transition_status(&order_id, PaymentStatus::Process, "Pesanan diproses", None).await?
                {
                    status = t.payment_status;
                }
                info!("🔄️ Order {order_id} handed to provider as {}", receipt.ref_id);
            },
            Err(e) => {
                error!("🔄️ Provider rejected order {order_id}. The order stays PAID for manual follow-up. {e}");
            },
        }

        let note = OrderNotification {
            order_id: order_id.clone(),
            product_name: purchase.item_name.clone(),
            amount: transaction.final_amount,
            status,
            method: transaction.payment_code.clone(),
            payment_url: None,
            customer_name: purchase.nickname.clone(),
            recipient: payload.phone_number.clone().unwrap_or_else(|| transaction.phone_number.clone()),
        };
        if let Err(e) = self.notifier.notify_customer(&note).await {
            warn!("📣️ Customer notification for {order_id} failed. {e}");
        }
        if let Err(e) = self.notifier.notify_admin(&note).await {
            warn!("📣️ Admin notification for {order_id} failed. {e}");
        }
        Ok(())
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
