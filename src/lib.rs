//! SharpSpring Lead Endpoint Library
//!
//! Receives lead-capture form submissions and forwards them to the
//! SharpSpring API as `createLeads` calls, keeping the account id and secret
//! key on the server.
//!
//! # Modules
//!
//! - `app`: Router assembly and middleware.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: Shared state and the health check.
//! - `lead_handler`: The `addLead` endpoint.
//! - `lead_models`: Lead form models and validation.
//! - `settings_handler`: Administrative settings page.
//! - `settings_store`: Credential store.
//! - `sharpspring_client`: SharpSpring HTTP transport.
//! - `sharpspring_request`: SharpSpring request construction and validation.

pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod lead_handler;
pub mod lead_models;
pub mod settings_handler;
pub mod settings_store;
pub mod sharpspring_client;
pub mod sharpspring_request;
