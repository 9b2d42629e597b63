//! # Checkout Totalizer
//!
//! Monetary total computation under two trust modes. Estimate mode sums
//! whatever prices the client already has, for display only. Authoritative
//! mode is the trust boundary before money moves: it accepts only
//! `(product_id, qty)` pairs, re-resolves every price from the catalog, and
//! rejects anything malformed instead of coercing it.

use crate::cart::{CartEntry, CartItem};
use crate::catalog::Catalog;
use crate::error::{CartError, CartResult};
use crate::product::Currency;
use serde::Serialize;

/// Display-only total in decimal major units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutEstimate {
    pub subtotal: f64,
    pub shipping: f64,
    pub total: f64,
    pub currency: Currency,
}

/// Trusted total in integer minor units, ready for payment-intent creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutTotal {
    pub subtotal_minor: i64,
    pub shipping_minor: i64,
    pub total_minor: i64,
    pub currency: Currency,
}

/// Computes checkout totals from line items plus a flat shipping surcharge
#[derive(Debug, Clone)]
pub struct CheckoutTotalizer {
    currency: Currency,
    shipping_minor: i64,
}

impl CheckoutTotalizer {
    /// Create a totalizer for a currency and flat shipping in minor units
    pub fn new(currency: Currency, shipping_minor: i64) -> Self {
        Self {
            currency,
            shipping_minor,
        }
    }

    /// The configured currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// The flat shipping surcharge in minor units
    pub fn shipping_minor(&self) -> i64 {
        self.shipping_minor
    }

    /// Estimate mode: client-visible display total.
    ///
    /// Prices come from the joined product records as supplied; the result
    /// is never transmitted as authoritative.
    pub fn estimate(&self, items: &[CartItem]) -> CheckoutEstimate {
        let subtotal: f64 = items.iter().map(CartItem::line_total).sum();
        let shipping = self.currency.from_minor_units(self.shipping_minor);
        CheckoutEstimate {
            subtotal,
            shipping,
            total: subtotal + shipping,
            currency: self.currency,
        }
    }

    /// Authoritative mode: recompute the total from trusted catalog prices.
    ///
    /// Every line is converted to minor units with round-half-away-from-zero
    /// before summing; any price the caller may have attached to its items
    /// never reaches this function. Validation is strict: empty cart or an
    /// unresolvable product is `InvalidCart`, a malformed pair is
    /// `InvalidLineItem`, and a total of zero or less is `NonPositiveAmount`.
    pub async fn authoritative(
        &self,
        catalog: &dyn Catalog,
        pairs: &[CartEntry],
    ) -> CartResult<CheckoutTotal> {
        if pairs.is_empty() {
            return Err(CartError::InvalidCart("cart is empty".into()));
        }

        for pair in pairs {
            if pair.product_id.is_empty() {
                return Err(CartError::InvalidLineItem("product id is empty".into()));
            }
            if pair.qty == 0 {
                return Err(CartError::InvalidLineItem(format!(
                    "non-positive quantity for product {}",
                    pair.product_id
                )));
            }
        }

        let mut ids: Vec<String> = pairs.iter().map(|p| p.product_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let products = catalog.resolve_products(&ids).await?;

        let mut subtotal_minor: i64 = 0;
        for pair in pairs {
            let product = products.get(&pair.product_id).ok_or_else(|| {
                CartError::InvalidCart(format!("unresolvable product: {}", pair.product_id))
            })?;
            subtotal_minor += self
                .currency
                .to_minor_units(product.price * pair.qty as f64);
        }

        let total_minor = subtotal_minor + self.shipping_minor;
        if total_minor <= 0 {
            return Err(CartError::NonPositiveAmount {
                amount_minor: total_minor,
            });
        }

        Ok(CheckoutTotal {
            subtotal_minor,
            shipping_minor: self.shipping_minor,
            total_minor,
            currency: self.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ItemRef;
    use crate::product::{Product, ProductCatalog};

    fn catalog() -> ProductCatalog {
        ProductCatalog::new()
            .with_product(Product::new("p1", "First", 12.50))
            .with_product(Product::new("p2", "Second", 3.99))
    }

    fn totalizer() -> CheckoutTotalizer {
        // EUR with the flat 10.00 shipping surcharge
        CheckoutTotalizer::new(Currency::EUR, 1000)
    }

    fn item(product: Product, qty: u32) -> CartItem {
        CartItem {
            item_ref: ItemRef::Product(product.id.clone()),
            product_id: product.id.clone(),
            qty,
            product,
        }
    }

    #[tokio::test]
    async fn test_authoritative_example_total() {
        // 12.50 * 2 + 10.00 shipping = 35.00 -> 3500 minor units
        let total = totalizer()
            .authoritative(&catalog(), &[CartEntry::new("p1", 2)])
            .await
            .unwrap();

        assert_eq!(total.subtotal_minor, 2500);
        assert_eq!(total.shipping_minor, 1000);
        assert_eq!(total.total_minor, 3500);
    }

    #[tokio::test]
    async fn test_authoritative_is_order_invariant() {
        let forward = totalizer()
            .authoritative(
                &catalog(),
                &[CartEntry::new("p1", 2), CartEntry::new("p2", 3)],
            )
            .await
            .unwrap();
        let reversed = totalizer()
            .authoritative(
                &catalog(),
                &[CartEntry::new("p2", 3), CartEntry::new("p1", 2)],
            )
            .await
            .unwrap();

        assert_eq!(forward, reversed);
    }

    #[tokio::test]
    async fn test_empty_cart_is_invalid() {
        let err = totalizer().authoritative(&catalog(), &[]).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidCart(_)));
    }

    #[tokio::test]
    async fn test_unresolvable_product_is_invalid() {
        let err = totalizer()
            .authoritative(&catalog(), &[CartEntry::new("ghost", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidCart(_)));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let err = totalizer()
            .authoritative(&catalog(), &[CartEntry::new("p1", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidLineItem(_)));
    }

    #[tokio::test]
    async fn test_client_prices_cannot_reach_authoritative_total() {
        // A tampered client claims p1 costs 0.01; the input type carries no
        // price field, so the catalog's 12.50 wins.
        let total = totalizer()
            .authoritative(&catalog(), &[CartEntry::new("p1", 2)])
            .await
            .unwrap();
        assert_eq!(total.total_minor, 3500);
    }

    #[tokio::test]
    async fn test_estimate_matches_authoritative_without_drift() {
        let tz = totalizer();
        let cat = catalog();

        let items = vec![
            item(cat.get("p1").unwrap().clone(), 2),
            item(cat.get("p2").unwrap().clone(), 1),
        ];
        let estimate = tz.estimate(&items);

        let pairs = vec![CartEntry::new("p1", 2), CartEntry::new("p2", 1)];
        let total = tz.authoritative(&cat, &pairs).await.unwrap();

        assert_eq!(
            Currency::EUR.to_minor_units(estimate.total),
            total.total_minor
        );
    }

    #[tokio::test]
    async fn test_authoritative_wins_on_stale_client_price() {
        let tz = totalizer();
        let cat = catalog();

        // Client cached a stale 0.01 price for p1
        let stale = Product::new("p1", "First", 0.01);
        let estimate = tz.estimate(&[item(stale, 2)]);

        let total = tz
            .authoritative(&cat, &[CartEntry::new("p1", 2)])
            .await
            .unwrap();

        assert_ne!(
            Currency::EUR.to_minor_units(estimate.total),
            total.total_minor
        );
        assert_eq!(total.total_minor, 3500);
    }

    #[test]
    fn test_estimate_includes_shipping() {
        let estimate = totalizer().estimate(&[]);
        assert_eq!(estimate.subtotal, 0.0);
        assert_eq!(estimate.shipping, 10.0);
        assert_eq!(estimate.total, 10.0);
    }
}
