//! Escuela Cuid-Arte lead capture library
//!
//! This library provides the core of the registration landing page: the
//! view state machine, form state, the hosted lead-table client, and the
//! HTTP surface that serves one controller per visitor session.
//!
//! # Modules
//!
//! - `attribution`: Entry URL and timezone detection.
//! - `config`: Configuration management.
//! - `controller`: Per-visitor driver of the view state machine.
//! - `countries`: Country and dial-code table.
//! - `errors`: Error handling types.
//! - `form`: Form state, progress and normalization.
//! - `handlers`: HTTP request handlers.
//! - `identifier_store`: Remembered-visitor identifier slot.
//! - `links`: Invitation, magic and share links.
//! - `models`: Lead data models.
//! - `record_store`: Hosted lead table client.
//! - `state_machine`: Pure view transitions.
//! - `views`: Screen view models.

pub mod attribution;
pub mod config;
pub mod controller;
pub mod countries;
pub mod errors;
pub mod form;
pub mod handlers;
pub mod identifier_store;
pub mod links;
pub mod models;
pub mod record_store;
pub mod state_machine;
pub mod views;
