use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use topup_payment_engine::{OrderFlowApi, ReconcilerApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{DigiflazzClient, DuitkuClient, WhatsAppNotifier},
    routes::{health, initiate_deposit, initiate_order, manual_order, payment_callback},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
) -> Result<actix_web::dev::Server, ServerError> {
    let gateway = DuitkuClient::new(config.gateway.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let provider = DigiflazzClient::new(config.provider.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let notifier = WhatsAppNotifier::new(config.whatsapp.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let merchant = config.gateway.merchant.clone();
    let srv = HttpServer::new(move || {
        let order_api = OrderFlowApi::new(db.clone(), gateway.clone(), provider.clone(), notifier.clone());
        let reconciler_api = ReconcilerApi::new(db.clone(), provider.clone(), notifier.clone(), merchant.clone());
        let api_scope = web::scope("/api")
            .route(
                "/payment/initiate",
                web::post().to(initiate_order::<SqliteDatabase, DuitkuClient, DigiflazzClient, WhatsAppNotifier>),
            )
            .route(
                "/payment/deposit",
                web::post().to(initiate_deposit::<SqliteDatabase, DuitkuClient, DigiflazzClient, WhatsAppNotifier>),
            )
            .route(
                "/payment/callback",
                web::post().to(payment_callback::<SqliteDatabase, DigiflazzClient, WhatsAppNotifier>),
            )
            .route(
                "/order/manual",
                web::post().to(manual_order::<SqliteDatabase, DuitkuClient, DigiflazzClient, WhatsAppNotifier>),
            );
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tps::access_log"))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(reconciler_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
