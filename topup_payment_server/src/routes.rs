//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the engine's trait seams and are registered with concrete types in
//! [`crate::server::create_server_instance`]; the endpoint tests register the same handlers with in-memory doubles.
use actix_web::{get, web, Either, HttpRequest, HttpResponse, Responder};
use log::*;
use topup_payment_engine::{
    traits::{Notifier, PaymentGatewayClient, ProvisioningProvider, StorefrontDatabase},
    CallbackError,
    CallbackPayload,
    NewOrderRequest,
    OrderFlowApi,
    ReconcilerApi,
};
use tps_common::Rupiah;

use crate::{
    auth::{require_actor, resolve_actor},
    data_objects::{DepositRequestBody, DepositResponseBody, JsonResponse, ManualOrderBody, OrderRequestBody, OrderResponseBody},
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
/// `POST /api/payment/initiate`. Creates a top-up order and, for gateway payments, a payment session the customer
/// can complete. Guests may order; wallet (SALDO) payment requires the actor header.
pub async fn initiate_order<B, G, P, N>(
    req: HttpRequest,
    body: web::Json<OrderRequestBody>,
    api: web::Data<OrderFlowApi<B, G, P, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: PaymentGatewayClient + 'static,
    P: ProvisioningProvider + 'static,
    N: Notifier + 'static,
{
    let body = body.into_inner();
    trace!("💻️ Received order request for {}", body.item_name);
    let actor = resolve_actor(&req, api.db()).await?;
    let request = NewOrderRequest {
        item_name: body.item_name,
        payment_code: body.payment_code,
        phone_number: body.phone_number,
        account_id: body.account_id,
        server_id: body.server_id,
        voucher_code: body.voucher_code,
        game: body.game,
        nickname: body.nickname,
    };
    let receipt = api.initiate_order(request, actor.as_ref()).await?;
    Ok(HttpResponse::Ok().json(OrderResponseBody::from(receipt)))
}

/// `POST /api/payment/deposit`. Opens a balance top-up for the authenticated user.
pub async fn initiate_deposit<B, G, P, N>(
    req: HttpRequest,
    body: web::Json<DepositRequestBody>,
    api: web::Data<OrderFlowApi<B, G, P, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: PaymentGatewayClient + 'static,
    P: ProvisioningProvider + 'static,
    N: Notifier + 'static,
{
    let actor = require_actor(&req, api.db()).await?;
    trace!("💻️ Received deposit request from {}", actor.username);
    let receipt = api.initiate_deposit(&actor, Rupiah::from(body.amount), &body.payment_code).await?;
    Ok(HttpResponse::Ok().json(DepositResponseBody::from(receipt)))
}

/// `POST /api/order/manual`. The admin-only manual order path.
pub async fn manual_order<B, G, P, N>(
    req: HttpRequest,
    body: web::Json<ManualOrderBody>,
    api: web::Data<OrderFlowApi<B, G, P, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: PaymentGatewayClient + 'static,
    P: ProvisioningProvider + 'static,
    N: Notifier + 'static,
{
    let actor = require_actor(&req, api.db()).await?;
    let body = body.into_inner();
    let request = topup_payment_engine::ManualOrderRequest {
        item_id: body.item_id,
        account_id: body.account_id,
        server_id: body.server_id,
        whatsapp: body.whatsapp,
    };
    let transaction = api.create_manual_order(&actor, request).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

//----------------------------------------------   Callback  ----------------------------------------------------
/// `POST /api/payment/callback`. The gateway's asynchronous payment notification. Duitku delivers form-encoded
/// bodies, but JSON is accepted too.
///
/// Validation failures (bad signature, wrong merchant, unknown order) are real rejections. Internal failures after
/// a valid callback are acknowledged with a 200 so the gateway does not retry-storm a callback we can never
/// process; the order stays in its current state for the operator.
pub async fn payment_callback<B, P, N>(
    payload: Either<web::Form<CallbackPayload>, web::Json<CallbackPayload>>,
    api: web::Data<ReconcilerApi<B, P, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    P: ProvisioningProvider + 'static,
    N: Notifier + 'static,
{
    let payload = match payload {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    };
    trace!("💻️ Received payment callback for {:?}", payload.merchant_order_id);
    match api.handle_callback(payload).await {
        Ok(outcome) => {
            debug!("💻️ Callback handled: {outcome:?}");
            Ok(HttpResponse::Ok().json(JsonResponse::success("OK")))
        },
        Err(CallbackError::Internal(e)) => {
            error!("💻️ Callback processing failed internally. Acknowledging anyway. {e}");
            Ok(HttpResponse::Ok().json(JsonResponse::failure("Callback acknowledged but not processed")))
        },
        Err(e) => Err(e.into()),
    }
}
