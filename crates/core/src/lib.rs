//! MIX Catálogo Digital Core - Shared types library.
//!
//! This crate provides the types used by the `storefront` binary, which
//! serves both the public catalog and the `/admin` back-office.
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no HTTP
//! clients. Everything here can be unit tested without a running backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`pricing`] - Effective price and discount derivation for promotions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::PriceBreakdown;
pub use types::*;
