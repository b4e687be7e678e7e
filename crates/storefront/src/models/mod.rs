//! Session-stored types for the storefront.

pub mod session;
pub mod toast;

pub use session::{AuthSession, CartSnapshot, SessionUser, keys as session_keys};
pub use toast::{Toast, ToastKind};
