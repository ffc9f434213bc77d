//! # Top-up payment server
//! This module hosts the HTTP surface of the top-up storefront. It is responsible for:
//! Accepting order, deposit and manual-order requests from the storefront.
//! Receiving and acknowledging asynchronous payment callbacks from the gateway.
//! Wiring the engine's orchestrator and reconciler to the live Duitku, Digiflazz and WhatsApp integrations.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/payment/initiate`: Creates a top-up order and a gateway payment session.
//! * `/api/payment/deposit`: Opens a balance top-up for the authenticated user.
//! * `/api/payment/callback`: The gateway's asynchronous payment notification endpoint.
//! * `/api/order/manual`: The admin-only manual order path.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
