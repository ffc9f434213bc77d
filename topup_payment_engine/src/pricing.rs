//! The pricing engine.
//!
//! Resolves the price of a catalog item for a given actor and moment in time, and applies at most one voucher.
//! Everything here is a pure function of its inputs: pricing must be callable speculatively (e.g. for a checkout
//! preview) without touching any state. The voucher `usage_count` increment happens at order-commit time in the
//! database layer, never here.
use chrono::{DateTime, Utc};
use thiserror::Error;
use tps_common::Rupiah;

use crate::db_types::{CatalogItem, DiscountType, Role, Voucher};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Invalid or expired voucher code")]
    VoucherInvalid,
    #[error("Voucher usage limit reached")]
    VoucherExhausted,
    #[error("Minimum purchase of {0} required for this voucher")]
    BelowMinimumPurchase(Rupiah),
    #[error("Voucher not applicable to this product category")]
    VoucherNotApplicable,
}

/// The result of pricing an order: the snapshot that gets written onto the transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub original_price: Rupiah,
    pub discount_amount: Rupiah,
    pub final_price: Rupiah,
    pub applied_voucher_id: Option<i64>,
}

impl PriceQuote {
    fn without_discount(price: Rupiah) -> Self {
        Self { original_price: price, discount_amount: Rupiah::from(0), final_price: price, applied_voucher_id: None }
    }
}

/// Selects the base price for an item. Strict precedence: an unexpired flash sale beats the Platinum tier price,
/// which beats the standard price. Guests (no tier) always pay the standard price unless a flash sale is running.
pub fn resolve_base_price(item: &CatalogItem, tier: Option<Role>, now: DateTime<Utc>) -> Rupiah {
    if item.is_flash_sale {
        if let (Some(price), Some(expiry)) = (item.flash_sale_price, item.flash_sale_expiry) {
            if now < expiry {
                return price;
            }
        }
    }
    if tier == Some(Role::Platinum) {
        item.platinum_price
    } else {
        item.base_price
    }
}

/// Prices an order: base price selection followed by optional voucher application.
///
/// The voucher, if supplied, must be active and inside its validity window, must not be exhausted, must meet its
/// minimum-purchase floor, and must apply to the item's category. The computed discount is clamped to
/// `[0, price]`, and to `max_discount` for percentage vouchers that carry a cap.
pub fn quote(
    item: &CatalogItem,
    tier: Option<Role>,
    voucher: Option<&Voucher>,
    now: DateTime<Utc>,
) -> Result<PriceQuote, PricingError> {
    let price = resolve_base_price(item, tier, now);
    let voucher = match voucher {
        Some(v) => v,
        None => return Ok(PriceQuote::without_discount(price)),
    };
    if !voucher.is_active || now < voucher.start_date || now >= voucher.expiry_date {
        return Err(PricingError::VoucherInvalid);
    }
    if voucher.is_exhausted() {
        return Err(PricingError::VoucherExhausted);
    }
    if let Some(min) = voucher.min_purchase {
        if price < min {
            return Err(PricingError::BelowMinimumPurchase(min));
        }
    }
    if !voucher.applies_to_category(item.category_id) {
        return Err(PricingError::VoucherNotApplicable);
    }
    let discount = compute_discount(price, voucher);
    Ok(PriceQuote {
        original_price: price,
        discount_amount: discount,
        final_price: price.saturating_sub_floor_zero(discount),
        applied_voucher_id: Some(voucher.id),
    })
}

fn compute_discount(price: Rupiah, voucher: &Voucher) -> Rupiah {
    let raw = match voucher.discount_type {
        DiscountType::Percentage => {
            let discounted = (price.value() as f64 * voucher.discount_value / 100.0).round() as i64;
            let discounted = Rupiah::from(discounted);
            match voucher.max_discount {
                Some(cap) => discounted.min(cap),
                None => discounted,
            }
        },
        DiscountType::Fixed => Rupiah::from(voucher.discount_value.round() as i64),
    };
    // Clamp to [0, price]
    raw.max(Rupiah::from(0)).min(price)
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use tps_common::Rupiah;

    use super::{quote, resolve_base_price, PricingError};
    use crate::db_types::{CatalogItem, DiscountType, Role, Voucher};

    fn item(base: i64) -> CatalogItem {
        CatalogItem {
            id: 1,
            name: "100 Diamonds".to_string(),
            category_id: 7,
            base_price: Rupiah::from(base),
            platinum_price: Rupiah::from(base - 2_000),
            is_flash_sale: false,
            flash_sale_price: None,
            flash_sale_expiry: None,
            provider_code: "ML100".to_string(),
            cost_price: Rupiah::from(base - 5_000),
            profit: Rupiah::from(5_000),
        }
    }

    fn voucher(discount_type: DiscountType, value: f64) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: 42,
            code: "HEMAT".to_string(),
            discount_type,
            discount_value: value,
            max_discount: None,
            min_purchase: None,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(1),
            is_active: true,
            usage_limit: None,
            usage_count: 0,
            is_for_all_categories: true,
            category_ids: vec![],
        }
    }

    #[test]
    fn flash_sale_beats_tier_price() {
        let mut item = item(100_000);
        item.is_flash_sale = true;
        item.flash_sale_price = Some(Rupiah::from(80_000));
        item.flash_sale_expiry = Some(Utc::now() + Duration::hours(1));
        assert_eq!(resolve_base_price(&item, Some(Role::Platinum), Utc::now()), Rupiah::from(80_000));
    }

    #[test]
    fn expired_flash_sale_falls_back_to_tier() {
        let mut item = item(100_000);
        item.is_flash_sale = true;
        item.flash_sale_price = Some(Rupiah::from(80_000));
        item.flash_sale_expiry = Some(Utc::now() - Duration::hours(1));
        assert_eq!(resolve_base_price(&item, Some(Role::Platinum), Utc::now()), Rupiah::from(98_000));
        assert_eq!(resolve_base_price(&item, None, Utc::now()), Rupiah::from(100_000));
    }

    #[test]
    fn percentage_discount_respects_cap() {
        // 10% of 100,000 is 10,000, capped at 5,000
        let item = item(100_000);
        let mut v = voucher(DiscountType::Percentage, 10.0);
        v.max_discount = Some(Rupiah::from(5_000));
        let q = quote(&item, None, Some(&v), Utc::now()).unwrap();
        assert_eq!(q.discount_amount, Rupiah::from(5_000));
        assert_eq!(q.final_price, Rupiah::from(95_000));
        assert_eq!(q.applied_voucher_id, Some(42));
    }

    #[test]
    fn fixed_discount_clamps_to_price() {
        let item = item(15_000);
        let v = voucher(DiscountType::Fixed, 20_000.0);
        let q = quote(&item, None, Some(&v), Utc::now()).unwrap();
        assert_eq!(q.discount_amount, Rupiah::from(15_000));
        assert_eq!(q.final_price, Rupiah::from(0));
    }

    #[test]
    fn inactive_or_out_of_window_voucher_is_invalid() {
        let item = item(100_000);
        let mut v = voucher(DiscountType::Fixed, 1_000.0);
        v.is_active = false;
        assert_eq!(quote(&item, None, Some(&v), Utc::now()), Err(PricingError::VoucherInvalid));
        let mut v = voucher(DiscountType::Fixed, 1_000.0);
        v.start_date = Utc::now() + Duration::hours(1);
        assert_eq!(quote(&item, None, Some(&v), Utc::now()), Err(PricingError::VoucherInvalid));
        let mut v = voucher(DiscountType::Fixed, 1_000.0);
        v.expiry_date = Utc::now() - Duration::hours(1);
        assert_eq!(quote(&item, None, Some(&v), Utc::now()), Err(PricingError::VoucherInvalid));
    }

    #[test]
    fn exhausted_voucher_is_rejected() {
        let item = item(100_000);
        let mut v = voucher(DiscountType::Fixed, 1_000.0);
        v.usage_limit = Some(3);
        v.usage_count = 3;
        assert_eq!(quote(&item, None, Some(&v), Utc::now()), Err(PricingError::VoucherExhausted));
    }

    #[test]
    fn minimum_purchase_is_enforced_on_the_resolved_price() {
        let item = item(40_000);
        let mut v = voucher(DiscountType::Fixed, 1_000.0);
        v.min_purchase = Some(Rupiah::from(50_000));
        assert_eq!(quote(&item, None, Some(&v), Utc::now()), Err(PricingError::BelowMinimumPurchase(Rupiah::from(50_000))));
    }

    #[test]
    fn category_applicability() {
        let item = item(100_000); // category 7
        let mut v = voucher(DiscountType::Fixed, 1_000.0);
        v.is_for_all_categories = false;
        v.category_ids = vec![3, 5];
        assert_eq!(quote(&item, None, Some(&v), Utc::now()), Err(PricingError::VoucherNotApplicable));
        v.category_ids.push(7);
        assert!(quote(&item, None, Some(&v), Utc::now()).is_ok());
    }

    #[test]
    fn discount_bounds_hold() {
        let item = item(100_000);
        for value in [0.0, 5.0, 50.0, 100.0, 250.0] {
            let v = voucher(DiscountType::Percentage, value);
            let q = quote(&item, None, Some(&v), Utc::now()).unwrap();
            assert!(q.discount_amount >= Rupiah::from(0));
            assert!(q.discount_amount <= q.original_price);
            assert_eq!(q.final_price, q.original_price - q.discount_amount);
        }
    }
}
