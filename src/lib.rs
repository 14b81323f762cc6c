//! Lead Signup API Library
//!
//! This library provides the core functionality for the lead signup
//! backend: email/VAT/vendor validation, the one-time-passcode lifecycle,
//! the SMTP notifier, the HubSpot contact gateway, and the pipeline that
//! ties them together behind the HTTP handlers.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `hubspot_client`: HubSpot contacts API client.
//! - `mailer`: SMTP delivery of OTP mails.
//! - `models`: Request payloads and lead lifecycle types.
//! - `otp_store`: Time-expiring one-time-passcode store.
//! - `services`: Lead pipeline orchestration.
//! - `validation`: Input validation rules and allow-lists.

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod errors;
pub mod handlers;
pub mod hubspot_client;
pub mod mailer;
pub mod models;
pub mod otp_store;
pub mod services;
pub mod validation;
