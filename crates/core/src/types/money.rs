//! Rupiah amounts and order total arithmetic.
//!
//! All amounts are [`Decimal`] so that sums of line items match the
//! `NUMERIC` columns exactly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Format an amount as Indonesian Rupiah without decimals.
///
/// Rounds half away from zero and groups thousands with `.`.
///
/// ```
/// use jamur_pos_core::format_rupiah;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_rupiah(Decimal::new(2_500_000, 2)), "Rp 25.000");
/// ```
#[must_use]
pub fn format_rupiah(amount: Decimal) -> String {
    format!("Rp {}", group_thousands(amount))
}

/// Group the integer part of a rounded amount with `.` separators.
#[must_use]
pub fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Largest value of a `NUMERIC(12,2)` column: 9999999999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Largest value of the `NUMERIC(10,2)` shipping column: 99999999.99.
pub const MAX_SHIPPING: Decimal = Decimal::from_parts(0x540B_E3FF, 0x2, 0, false, 2);

/// Subtotal of a single cart line, `None` on overflow.
#[must_use]
pub fn line_subtotal(price: Decimal, quantity: u32) -> Option<Decimal> {
    price.checked_mul(Decimal::from(quantity))
}

/// Recover the quantity of a stored order line.
///
/// Order lines persist only the unit price and the subtotal; the quantity is
/// `subtotal / price` truncated. A zero price yields 0.
#[must_use]
pub fn derive_quantity(subtotal: Decimal, price_at_purchase: Decimal) -> i64 {
    if price_at_purchase.is_zero() {
        return 0;
    }
    (subtotal / price_at_purchase).trunc().to_i64().unwrap_or(0)
}

/// Header totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of all line subtotals.
    pub total_amount: Decimal,
    /// Shipping cost charged on top of the lines.
    pub shiping_cost: Decimal,
    /// `total_amount + shiping_cost`.
    pub grand_total: Decimal,
}

impl OrderTotals {
    /// Compute the totals from line subtotals and the shipping cost.
    ///
    /// Returns `None` if a sum overflows `Decimal`.
    pub fn compute<I>(subtotals: I, shipping_cost: Decimal) -> Option<Self>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let total_amount = subtotals
            .into_iter()
            .try_fold(Decimal::ZERO, Decimal::checked_add)?;

        Some(Self {
            total_amount,
            shiping_cost: shipping_cost,
            grand_total: total_amount.checked_add(shipping_cost)?,
        })
    }

    /// Whether every amount fits its database column.
    #[must_use]
    pub fn fits_columns(&self) -> bool {
        self.total_amount <= MAX_AMOUNT
            && self.grand_total <= MAX_AMOUNT
            && self.shiping_cost <= MAX_SHIPPING
    }
}
