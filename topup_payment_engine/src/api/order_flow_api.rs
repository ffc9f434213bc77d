use std::fmt::Debug;

use chrono::Utc;
use log::*;
use tps_common::Rupiah;

use crate::{
    api::errors::OrderFlowError,
    db_types::{
        NewPurchase,
        NewTransaction,
        OrderId,
        PaymentStatus,
        Role,
        Transaction,
        TransactionType,
        User,
        Voucher,
    },
    helpers,
    pricing,
    pricing::PricingError,
    traits::{
        NewDeposit,
        Notifier,
        OrderNotification,
        PaymentGatewayClient,
        PaymentRequest,
        ProvisioningProvider,
        ProvisionRequest,
        StatusTransition,
        StorefrontDatabase,
    },
};

/// The payment-method code that pays an order from the user's stored balance instead of the external gateway.
pub const WALLET_PAYMENT_CODE: &str = "SALDO";

/// An incoming order-initiation request, as assembled by the HTTP layer.
#[derive(Debug, Clone)]
pub struct NewOrderRequest {
    /// The catalog item's display name (the storefront submits names, not ids).
    pub item_name: String,
    pub payment_code: String,
    pub phone_number: String,
    /// The target account at the game/service being topped up.
    pub account_id: String,
    pub server_id: Option<String>,
    pub voucher_code: Option<String>,
    pub game: String,
    pub nickname: String,
}

/// What the caller gets back from a successful order initiation.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub merchant_order_id: OrderId,
    pub status: PaymentStatus,
    pub payment_url: Option<String>,
    pub reference: Option<String>,
    pub original_amount: Rupiah,
    pub discount_amount: Rupiah,
    pub final_amount: Rupiah,
}

#[derive(Debug, Clone)]
pub struct DepositReceipt {
    pub merchant_order_id: OrderId,
    pub payment_url: String,
    pub reference: String,
    pub amount: Rupiah,
}

/// A manual/admin order request. Bypasses the payment gateway entirely.
#[derive(Debug, Clone)]
pub struct ManualOrderRequest {
    pub item_id: i64,
    pub account_id: String,
    pub server_id: Option<String>,
    pub whatsapp: String,
}

/// `OrderFlowApi` is the order orchestrator: it prices an order, reserves funds, creates the durable
/// transaction/purchase records as one atomic unit, and hands the order to the payment gateway (or straight to the
/// provisioning provider for wallet and manual orders).
pub struct OrderFlowApi<B, G, P, N> {
    db: B,
    gateway: G,
    provider: P,
    notifier: N,
}

impl<B, G, P, N> Debug for OrderFlowApi<B, G, P, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G, P, N> OrderFlowApi<B, G, P, N>
where
    B: StorefrontDatabase,
    G: PaymentGatewayClient,
    P: ProvisioningProvider,
    N: Notifier,
{
    pub fn new(db: B, gateway: G, provider: P, notifier: N) -> Self {
        Self { db, gateway, provider, notifier }
    }

    /// Initiates a top-up order.
    ///
    /// The sequence is: price (read-only) → advisory balance check → atomic creation of transaction + purchase +
    /// voucher redemption (and the wallet debit, for wallet orders) → gateway call or immediate provisioning →
    /// fire-and-forget notifications. Business-rule failures before the atomic unit leave no trace; failures after
    /// it are recorded onto the transaction, which is the permanent audit trail.
    pub async fn initiate_order(
        &self,
        request: NewOrderRequest,
        actor: Option<&User>,
    ) -> Result<OrderReceipt, OrderFlowError> {
        let item = self.db.fetch_item_by_name(&request.item_name).await?.ok_or(OrderFlowError::ItemNotFound)?;
        self.db.fetch_category(item.category_id).await?.ok_or(OrderFlowError::CategoryNotFound)?;
        let voucher = self.resolve_voucher(request.voucher_code.as_deref()).await?;
        let tier = actor.map(|u| u.role);
        let quote = pricing::quote(&item, tier, voucher.as_ref(), Utc::now())?;

        let pay_from_wallet = request.payment_code == WALLET_PAYMENT_CODE;
        if pay_from_wallet {
            let user = actor.ok_or(OrderFlowError::Unauthorized)?;
            // Advisory only. The debit is re-validated inside the atomic unit below.
            if !self.db.balance_covers(&user.id, quote.final_price).await? {
                return Err(OrderFlowError::InsufficientBalance);
            }
        }

        let order_id = helpers::new_order_id();
        let initial_status = if pay_from_wallet { PaymentStatus::Paid } else { PaymentStatus::Pending };
        let transaction = {
            let mut t = NewTransaction::new(
                order_id.clone(),
                quote.original_price,
                request.payment_code.clone(),
                TransactionType::TopUp,
                request.phone_number.clone(),
            )
            .with_discount(quote.original_price, quote.discount_amount, quote.applied_voucher_id)
            .with_status(initial_status, None);
            if let Some(user) = actor {
                t = t.with_user(user.id.clone());
            }
            t
        };
        let purchase = NewPurchase {
            order_id: order_id.clone(),
            item_name: item.name.clone(),
            game: request.game.clone(),
            account_id: request.account_id.clone(),
            zone: request.server_id.clone(),
            nickname: request.nickname.clone(),
            username: actor.map(|u| u.username.clone()).unwrap_or_else(|| "Guest".to_string()),
            user_id: actor.map(|u| u.id.clone()),
            provider_code: item.provider_code.clone(),
            price: quote.final_price,
            profit: item.profit,
        };
        let debit = pay_from_wallet.then_some(quote.final_price);
        let transaction = self.db.insert_order(transaction, purchase, debit).await?;
        debug!("🧾️ Order {order_id} created with status {}", transaction.payment_status);

        if pay_from_wallet {
            return self.fulfil_wallet_order(transaction, &item.name, &request).await;
        }

        let payment_request = PaymentRequest {
            merchant_order_id: order_id.clone(),
            amount: quote.final_price,
            payment_method: request.payment_code.clone(),
            product_details: item.name.clone(),
            customer_name: actor.map(|u| u.name.clone()).unwrap_or_else(|| "GUEST".to_string()),
            phone_number: request.phone_number.clone(),
        };
        let session = match self.gateway.create_payment(&payment_request).await {
            Ok(session) => session,
            Err(e) => {
                warn!("🧾️ Gateway declined order {order_id}. {e}");
                self.db.mark_order_failed(&order_id, &e.to_string()).await?;
                return Err(OrderFlowError::GatewayRejected(e.to_string()));
            },
        };
        let transaction = self.db.record_gateway_acceptance(&order_id, &session.reference, &session.payment_url).await?;
        info!("🧾️ Order {order_id} accepted by gateway with reference {}", session.reference);

        let note = OrderNotification {
            order_id: order_id.clone(),
            product_name: item.name,
            amount: quote.final_price,
            status: transaction.payment_status,
            method: request.payment_code,
            payment_url: Some(session.payment_url.clone()),
            customer_name: payment_request.customer_name,
            recipient: request.phone_number,
        };
        self.dispatch_notifications(&note).await;

        Ok(OrderReceipt {
            merchant_order_id: order_id,
            status: transaction.payment_status,
            payment_url: Some(session.payment_url),
            reference: Some(session.reference),
            original_amount: quote.original_price,
            discount_amount: quote.discount_amount,
            final_amount: quote.final_price,
        })
    }

    /// Completes a wallet-paid order: the debit already happened inside the atomic unit, so the order is PAID and
    /// goes straight to invoicing and provisioning.
    async fn fulfil_wallet_order(
        &self,
        transaction: Transaction,
        item_name: &str,
        request: &NewOrderRequest,
    ) -> Result<OrderReceipt, OrderFlowError> {
        let order_id = transaction.merchant_order_id.clone();
        let user_id = transaction
            .user_id
            .clone()
            .ok_or_else(|| OrderFlowError::Internal(format!("Wallet order {order_id} has no user")))?;
        self.db.create_invoice_once(&transaction, &user_id).await?;
        let purchase = self
            .db
            .fetch_purchase(&order_id)
            .await?
            .ok_or_else(|| OrderFlowError::Internal(format!("Order {order_id} has no purchase record")))?;
        let provision = ProvisionRequest {
            product_code: purchase.provider_code,
            account_id: request.account_id.clone(),
            server_id: request.server_id.clone(),
            whatsapp: request.phone_number.clone(),
        };
        let mut status = transaction.payment_status;
        let mut reference = None;
        match self.provider.top_up(&provision).await {
            Ok(receipt) => {
                self.db.record_provisioning_accepted(&order_id, &receipt.ref_id).await?;
                if let StatusTransition::Applied(t) =
                    self.db.transition_status(&order_id, PaymentStatus::Process, "Pesanan diproses", None).await?
                {
                    status = t.payment_status;
                }
                reference = Some(receipt.ref_id);
                info!("🧾️ Wallet order {order_id} handed to provider");
            },
            Err(e) => {
                // Paid but unprovisioned: keep PAID, record the failure, leave the rest to the operator.
                error!("🧾️ Provider rejected wallet order {order_id}. {e}");
            },
        }
        let note = OrderNotification {
            order_id: order_id.clone(),
            product_name: item_name.to_string(),
            amount: transaction.final_amount,
            status,
            method: WALLET_PAYMENT_CODE.to_string(),
            payment_url: None,
            customer_name: request.nickname.clone(),
            recipient: request.phone_number.clone(),
        };
        self.dispatch_notifications(&note).await;
        Ok(OrderReceipt {
            merchant_order_id: order_id,
            status,
            payment_url: None,
            reference,
            original_amount: transaction.original_amount,
            discount_amount: transaction.discount_amount,
            final_amount: transaction.final_amount,
        })
    }

    /// Opens a balance top-up: creates the deposit and its DEPOSIT-type transaction, then asks the gateway for a
    /// payment session. Settlement happens later, via the reconciler.
    pub async fn initiate_deposit(
        &self,
        actor: &User,
        amount: Rupiah,
        method_code: &str,
    ) -> Result<DepositReceipt, OrderFlowError> {
        if amount <= Rupiah::from(0) {
            return Err(OrderFlowError::InvalidDepositAmount(amount));
        }
        let deposit = self
            .db
            .insert_deposit(NewDeposit {
                user_id: actor.id.clone(),
                username: actor.username.clone(),
                method: method_code.to_string(),
                amount,
            })
            .await?;
        let order_id = helpers::new_deposit_order_id(deposit.id);
        self.db.attach_deposit_order_id(deposit.id, &order_id).await?;
        let transaction = NewTransaction::new(
            order_id.clone(),
            amount,
            method_code.to_string(),
            TransactionType::Deposit,
            actor.whatsapp.clone(),
        )
        .with_user(actor.id.clone());
        self.db.insert_transaction(transaction).await?;
        debug!("🧾️ Deposit #{} opened as {order_id}", deposit.id);

        let payment_request = PaymentRequest {
            merchant_order_id: order_id.clone(),
            amount,
            payment_method: method_code.to_string(),
            product_details: format!("Deposit for {}", actor.username),
            customer_name: actor.name.clone(),
            phone_number: actor.whatsapp.clone(),
        };
        match self.gateway.create_payment(&payment_request).await {
            Ok(session) => {
                self.db.record_gateway_acceptance(&order_id, &session.reference, &session.payment_url).await?;
                info!("🧾️ Deposit {order_id} accepted by gateway");
                Ok(DepositReceipt {
                    merchant_order_id: order_id,
                    payment_url: session.payment_url,
                    reference: session.reference,
                    amount,
                })
            },
            Err(e) => {
                warn!("🧾️ Gateway declined deposit {order_id}. {e}");
                self.db.mark_deposit_failed(deposit.id).await?;
                self.db.mark_order_failed(&order_id, &e.to_string()).await?;
                Err(OrderFlowError::GatewayRejected(e.to_string()))
            },
        }
    }

    /// The privileged manual order path: Admin only. Calls the provisioning provider directly and records a MANUAL
    /// transaction whose status is taken from the provider's immediate response.
    pub async fn create_manual_order(
        &self,
        actor: &User,
        request: ManualOrderRequest,
    ) -> Result<Transaction, OrderFlowError> {
        if actor.role != Role::Admin {
            warn!("🧾️ {} attempted a manual order without the Admin role", actor.username);
            return Err(OrderFlowError::Unauthorized);
        }
        let item = self.db.fetch_item(request.item_id).await?.ok_or(OrderFlowError::ItemNotFound)?;
        let provision = ProvisionRequest {
            product_code: item.provider_code.clone(),
            account_id: request.account_id.clone(),
            server_id: request.server_id.clone(),
            whatsapp: request.whatsapp.clone(),
        };
        let receipt =
            self.provider.top_up(&provision).await.map_err(|e| OrderFlowError::ProviderFailed(e.to_string()))?;
        let status = receipt.payment_status();
        let transaction = NewTransaction::new(
            OrderId(receipt.ref_id.clone()),
            item.base_price,
            "MANUAL".to_string(),
            TransactionType::Manual,
            request.whatsapp.clone(),
        )
        .with_user(actor.id.clone())
        .with_status(status, Some(receipt.status.clone()));
        let transaction = self.db.insert_transaction(transaction).await?;
        info!("🧾️ Manual order {} recorded with status {status}", transaction.merchant_order_id);
        Ok(transaction)
    }

    async fn dispatch_notifications(&self, note: &OrderNotification) {
        // Failures are logged and swallowed; notifications never roll an order back.
        if let Err(e) = self.notifier.notify_admin(note).await {
            warn!("📣️ Admin notification for {} failed. {e}", note.order_id);
        }
        if let Err(e) = self.notifier.notify_customer(note).await {
            warn!("📣️ Customer notification for {} failed. {e}", note.order_id);
        }
    }

    async fn resolve_voucher(&self, code: Option<&str>) -> Result<Option<Voucher>, OrderFlowError> {
        match code {
            None => Ok(None),
            Some(code) => {
                let voucher =
                    self.db.fetch_voucher(code).await?.ok_or(OrderFlowError::Pricing(PricingError::VoucherInvalid))?;
                Ok(Some(voucher))
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
