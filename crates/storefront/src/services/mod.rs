//! Business logic services for storefront.
//!
//! # Services
//!
//! - `session` - Login, registration, logout, and session rehydration
//! - `cart` - Cart store over the backend cart endpoints
//! - `flash` - One-shot notifications

pub mod cart;
pub mod flash;
pub mod session;

pub use cart::{CartBackend, CartError, CartStore};
pub use session::{AuthError, Registration, SessionState, SessionStore, load_state};
