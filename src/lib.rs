//! IncluScore API Library
//!
//! Credit scoring for unbanked individuals from alternative financial
//! signals (UPI activity, bill payments, mobile recharges, savings
//! behavior), served over HTTP and WebSocket.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `model`: Trained ensemble model artifact.
//! - `models`: Core data models.
//! - `scoring`: Scoring engine (model path + rule-based fallback).
//! - `store`: Optional external profile store and mock dataset.
//! - `validation`: Feature validation.
//! - `ws`: WebSocket scoring channel.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod model;
pub mod models;
pub mod scoring;
pub mod store;
pub mod validation;
pub mod ws;
