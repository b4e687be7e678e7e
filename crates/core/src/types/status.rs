//! Status and role enums shared by the storefront and the back-office.
//!
//! Serialized with the backend's wire names (`pendente`, `vendedor`, ...).

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Progression is linear `Pending → Processing → Shipped → Delivered`;
/// `Cancelled` can be reached from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "processando")]
    Processing,
    #[serde(rename = "enviado")]
    Shipped,
    #[serde(rename = "entregue")]
    Delivered,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The linear delivery timeline (cancellation is off the timeline).
    pub const TIMELINE: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// Wire name used by the backend and in URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendente",
            Self::Processing => "processando",
            Self::Shipped => "enviado",
            Self::Delivered => "entregue",
            Self::Cancelled => "cancelado",
        }
    }

    /// Display label, e.g. `"Pendente"`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Processing => "Processando",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregue",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Human description shown on the tracking page.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Pedido pendente de processamento",
            Self::Processing => "Pedido sendo preparado",
            Self::Shipped => "Pedido enviado para entrega",
            Self::Delivered => "Pedido entregue",
            Self::Cancelled => "Pedido cancelado",
        }
    }

    /// CSS badge class used by order tables.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge badge-warning",
            Self::Processing | Self::Shipped => "badge badge-info",
            Self::Delivered => "badge badge-success",
            Self::Cancelled => "badge badge-danger",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the order may still be cancelled.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// The next status on the timeline, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }

    /// Position on the timeline, `None` for cancelled orders.
    #[must_use]
    pub fn timeline_index(&self) -> Option<usize> {
        Self::TIMELINE.iter().position(|s| s == self)
    }

    /// Timeline progress in percent (0, 33, 66, 100), `None` when cancelled.
    #[must_use]
    pub fn progress_percent(&self) -> Option<u32> {
        let index = u32::try_from(self.timeline_index()?).ok()?;
        let last = u32::try_from(Self::TIMELINE.len() - 1).ok()?;
        Some(index * 100 / last)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("status de pedido inválido: {s}"))
    }
}

/// Account type of a MIX user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Platform administrator.
    #[serde(rename = "admin")]
    Admin,
    /// Vendor selling through the catalog.
    #[serde(rename = "vendedor")]
    Vendor,
    /// Shopper.
    #[serde(rename = "cliente")]
    Customer,
}

impl UserRole {
    /// Roles allowed into the back-office when a route does not say otherwise.
    pub const STAFF: &'static [Self] = &[Self::Admin, Self::Vendor];

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendedor",
            Self::Customer => "cliente",
        }
    }

    /// Label for profile screens.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrador",
            Self::Vendor => "Vendedor",
            Self::Customer => "Cliente",
        }
    }

    /// Whether this role can enter the back-office.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Vendor)
    }

    /// Landing page for this role.
    #[must_use]
    pub const fn home_path(&self) -> &'static str {
        match self {
            Self::Admin | Self::Vendor => "/admin/dashboard",
            Self::Customer => "/",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "vendedor" => Ok(Self::Vendor),
            "cliente" => Ok(Self::Customer),
            _ => Err(format!("tipo de usuário inválido: {s}")),
        }
    }
}
