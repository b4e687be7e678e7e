//! Cache entries for public listings.

use super::{Category, Product};

/// Which listing a cache entry holds. Limits are part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Categories,
    Bestsellers,
    Promotions(u32),
    NewArrivals(u32),
    MostSold(u32),
}

#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Products(Vec<Product>),
}
