//! Shared infrastructure for the AI Wars backend: configuration, errors,
//! request plumbing, session token signing, the identity provider client and
//! database bootstrap.

pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod rejection;
