//! Price and discount resolution for products.
//!
//! Every edit made in the product form (sale toggle, discount percentage, the
//! customer-facing price or the original price) is dispatched through
//! [`resolve`], which returns a state satisfying:
//!
//! - not on sale: `final_price` is `None` and the customer pays `price`
//! - on sale at 100%: `final_price == Some(0.0)`, `price` keeps the original for the "was" badge
//! - on sale at `0 < d < 100`: `final_price == price * (100 - d) / 100`
//! - on sale at 0% (or unset): the customer pays `price`
//!
//! Amounts are stored unrounded; rounding happens only in [`format_amount`].

use db::models::product::PriceState;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("{field} must be a finite number")]
    NotANumber { field: &'static str },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("discount percentage must be between 0 and 100 (got {0})")]
    DiscountOutOfRange(f64),
}

/// The form field that changed, with its new value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PriceEdit {
    IsOnSale(bool),
    DiscountPercentage(f64),
    /// Price the customer pays
    FinalPrice(f64),
    /// Pre-discount price; the only editable amount while 100% off
    OriginalPrice(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Discount {
    None,
    Partial(f64),
    Free,
}

impl Discount {
    fn of(percentage: Option<f64>) -> Self {
        match percentage {
            Some(d) if d >= 100.0 => Self::Free,
            Some(d) if d > 0.0 => Self::Partial(d),
            _ => Self::None,
        }
    }
}

fn discounted(price: f64, percentage: f64) -> f64 {
    price * (100.0 - percentage) / 100.0
}

fn undiscounted(final_price: f64, percentage: f64) -> f64 {
    final_price / (1.0 - percentage / 100.0)
}

fn check_amount(field: &'static str, value: f64) -> Result<(), PriceError> {
    if !value.is_finite() {
        return Err(PriceError::NotANumber { field });
    }
    if value < 0.0 {
        return Err(PriceError::Negative { field, value });
    }
    Ok(())
}

fn check_percentage(value: f64) -> Result<(), PriceError> {
    if !value.is_finite() {
        return Err(PriceError::NotANumber {
            field: "discount_percentage",
        });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(PriceError::DiscountOutOfRange(value));
    }
    Ok(())
}

/// Reject states with NaN or negative amounts or an out-of-range percentage
pub fn validate(state: &PriceState) -> Result<(), PriceError> {
    check_amount("price", state.price)?;
    if let Some(final_price) = state.final_price {
        check_amount("final_price", final_price)?;
    }
    if let Some(percentage) = state.discount_percentage {
        check_percentage(percentage)?;
    }
    Ok(())
}

/// Apply one field edit to `state` and recompute the dependent fields
pub fn resolve(state: &PriceState, edit: PriceEdit) -> Result<PriceState, PriceError> {
    validate(state)?;

    let current_final = state.display_price();
    let mut next = *state;

    match edit {
        PriceEdit::IsOnSale(true) if !state.is_on_sale => {
            next.is_on_sale = true;
            match Discount::of(state.discount_percentage) {
                Discount::Free => {
                    next.final_price = Some(0.0);
                    if next.price <= 0.0 {
                        next.price = current_final;
                    }
                }
                Discount::Partial(d) => {
                    next.price = undiscounted(current_final, d);
                    next.final_price = Some(current_final);
                }
                Discount::None => {
                    next.price = current_final;
                    next.final_price = Some(current_final);
                }
            }
        }
        PriceEdit::IsOnSale(false) if state.is_on_sale => {
            next.is_on_sale = false;
            next.discount_percentage = Some(0.0);
            next.price = current_final;
            next.final_price = None;
        }
        PriceEdit::IsOnSale(_) => {
            if !next.is_on_sale {
                next.final_price = None;
            }
        }
        PriceEdit::DiscountPercentage(d) => {
            check_percentage(d)?;
            next.discount_percentage = Some(d);
            if !state.is_on_sale {
                next.final_price = None;
            } else {
                match Discount::of(Some(d)) {
                    Discount::Free => {
                        next.final_price = Some(0.0);
                        if next.price <= 0.0 {
                            next.price = current_final;
                        }
                    }
                    Discount::Partial(d) => next.final_price = Some(discounted(next.price, d)),
                    Discount::None => next.final_price = None,
                }
            }
        }
        PriceEdit::FinalPrice(f) => {
            check_amount("final_price", f)?;
            if !state.is_on_sale {
                next.price = f;
                next.final_price = None;
            } else {
                match Discount::of(state.discount_percentage) {
                    Discount::Free => next.final_price = Some(0.0),
                    Discount::Partial(d) => {
                        next.price = undiscounted(f, d);
                        next.final_price = Some(f);
                    }
                    Discount::None => {
                        next.price = f;
                        next.final_price = None;
                    }
                }
            }
        }
        PriceEdit::OriginalPrice(p) => {
            check_amount("price", p)?;
            next.price = p;
            next.final_price = if !state.is_on_sale {
                None
            } else {
                match Discount::of(state.discount_percentage) {
                    Discount::Free => Some(0.0),
                    Discount::Partial(d) => Some(discounted(p, d)),
                    Discount::None => None,
                }
            };
        }
    }

    Ok(next)
}

/// Apply several edits in order, as if made one after another in the form
pub fn resolve_all(
    state: &PriceState,
    edits: impl IntoIterator<Item = PriceEdit>,
) -> Result<PriceState, PriceError> {
    edits
        .into_iter()
        .try_fold(*state, |current, edit| resolve(&current, edit))
}

/// Build a consistent state from a create form submission, where
/// `price` is the original (pre-discount) price.
pub fn from_submission(
    price: f64,
    is_on_sale: bool,
    discount_percentage: Option<f64>,
) -> Result<PriceState, PriceError> {
    check_amount("price", price)?;
    if let Some(d) = discount_percentage {
        check_percentage(d)?;
    }

    if !is_on_sale {
        return Ok(PriceState::regular(price));
    }

    let final_price = match Discount::of(discount_percentage) {
        Discount::Free => Some(0.0),
        Discount::Partial(d) => Some(discounted(price, d)),
        Discount::None => None,
    };

    Ok(PriceState {
        price,
        final_price,
        is_on_sale,
        discount_percentage,
    })
}

/// What the storefront shows for a price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceDisplay {
    Regular {
        price: f64,
    },
    /// Localized "Free" label with the original price struck through
    Free {
        original_price: f64,
    },
    /// Discounted price, struck-through original and a `-N%` badge
    Discounted {
        price: f64,
        original_price: f64,
        discount_percentage: f64,
    },
}

impl PriceDisplay {
    pub fn of(state: &PriceState) -> Self {
        if !state.is_on_sale {
            return Self::Regular { price: state.price };
        }
        match Discount::of(state.discount_percentage) {
            Discount::Free => Self::Free {
                original_price: state.price,
            },
            Discount::Partial(d) => Self::Discounted {
                price: state.display_price(),
                original_price: state.price,
                discount_percentage: d,
            },
            Discount::None => Self::Regular {
                price: state.display_price(),
            },
        }
    }

    /// Amount charged
    pub fn amount(&self) -> f64 {
        match self {
            Self::Regular { price } | Self::Discounted { price, .. } => *price,
            Self::Free { .. } => 0.0,
        }
    }

    /// `-50%` style badge for partial discounts
    pub fn badge(&self) -> Option<String> {
        match self {
            Self::Discounted {
                discount_percentage,
                ..
            } => Some(format!("-{}%", format_percentage(*discount_percentage))),
            _ => None,
        }
    }
}

/// Two-decimal rendering of an amount
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

fn format_percentage(percentage: f64) -> String {
    if percentage.fract() == 0.0 {
        format!("{percentage:.0}")
    } else {
        format!("{percentage:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn regular(price: f64) -> PriceState {
        PriceState::regular(price)
    }

    #[test]
    fn test_sale_then_half_off_keeps_original() {
        let on_sale = resolve(&regular(20.0), PriceEdit::IsOnSale(true)).unwrap();
        assert!(on_sale.is_on_sale);
        assert_eq!(on_sale.price, 20.0);

        let half = resolve(&on_sale, PriceEdit::DiscountPercentage(50.0)).unwrap();
        assert_eq!(half.final_price, Some(10.0));
        assert_eq!(half.price, 20.0);
        assert_eq!(PriceDisplay::of(&half).badge().as_deref(), Some("-50%"));
    }

    #[test]
    fn test_half_off_to_free_keeps_original() {
        let half = PriceState {
            price: 20.0,
            final_price: Some(10.0),
            is_on_sale: true,
            discount_percentage: Some(50.0),
        };
        let free = resolve(&half, PriceEdit::DiscountPercentage(100.0)).unwrap();
        assert_eq!(free.final_price, Some(0.0));
        assert_eq!(free.price, 20.0);
        assert_eq!(PriceDisplay::of(&free), PriceDisplay::Free { original_price: 20.0 });
    }

    #[test]
    fn test_free_pins_final_price_to_zero() {
        let states = [
            regular(0.0),
            regular(49.99),
            resolve(&regular(15.0), PriceEdit::IsOnSale(true)).unwrap(),
            PriceState {
                price: 80.0,
                final_price: Some(60.0),
                is_on_sale: true,
                discount_percentage: Some(25.0),
            },
        ];
        for state in states {
            let on_sale = resolve(&state, PriceEdit::IsOnSale(true)).unwrap();
            let free = resolve(&on_sale, PriceEdit::DiscountPercentage(100.0)).unwrap();
            assert_eq!(free.final_price, Some(0.0), "from {state:?}");
            assert_eq!(free.display_price(), 0.0);

            let edited = resolve(&free, PriceEdit::FinalPrice(12.0)).unwrap();
            assert_eq!(edited.final_price, Some(0.0));
        }
    }

    #[test]
    fn test_original_price_editable_while_free() {
        let free = PriceState {
            price: 20.0,
            final_price: Some(0.0),
            is_on_sale: true,
            discount_percentage: Some(100.0),
        };
        let edited = resolve(&free, PriceEdit::OriginalPrice(35.0)).unwrap();
        assert_eq!(edited.price, 35.0);
        assert_eq!(edited.final_price, Some(0.0));
    }

    #[test]
    fn test_discount_round_trip_recovers_price() {
        for price in [0.99, 20.0, 149.5, 1234.56] {
            for d in [0.5, 12.5, 33.3, 50.0, 99.9] {
                let state = from_submission(price, true, Some(d)).unwrap();
                let final_price = state.final_price.unwrap();
                let back = resolve(&state, PriceEdit::FinalPrice(final_price)).unwrap();
                assert!(approx(back.price, price), "price {price} at {d}% came back as {}", back.price);
            }
        }
    }

    #[test]
    fn test_not_on_sale_never_has_final_price() {
        let edits = [
            PriceEdit::IsOnSale(false),
            PriceEdit::DiscountPercentage(30.0),
            PriceEdit::FinalPrice(18.0),
            PriceEdit::OriginalPrice(22.0),
        ];
        for edit in edits {
            let next = resolve(&regular(20.0), edit).unwrap();
            assert_eq!(next.final_price, None, "after {edit:?}");
            assert_eq!(PriceDisplay::of(&next), PriceDisplay::Regular { price: next.price });
        }
    }

    #[test]
    fn test_turning_sale_off_keeps_displayed_price() {
        let half = PriceState {
            price: 40.0,
            final_price: Some(20.0),
            is_on_sale: true,
            discount_percentage: Some(50.0),
        };
        let off = resolve(&half, PriceEdit::IsOnSale(false)).unwrap();
        assert!(!off.is_on_sale);
        assert_eq!(off.price, 20.0);
        assert_eq!(off.final_price, None);
        assert_eq!(off.discount_percentage, Some(0.0));
    }

    #[test]
    fn test_turning_sale_on_with_preset_discount_keeps_displayed_price() {
        let preset = PriceState {
            price: 30.0,
            final_price: None,
            is_on_sale: false,
            discount_percentage: Some(25.0),
        };
        let on = resolve(&preset, PriceEdit::IsOnSale(true)).unwrap();
        assert_eq!(on.final_price, Some(30.0));
        assert!(approx(on.price, 40.0));
    }

    #[test]
    fn test_final_price_edit_derives_original() {
        let quarter = from_submission(80.0, true, Some(25.0)).unwrap();
        let edited = resolve(&quarter, PriceEdit::FinalPrice(45.0)).unwrap();
        assert_eq!(edited.final_price, Some(45.0));
        assert!(approx(edited.price, 60.0));
    }

    #[test]
    fn test_zero_discount_means_full_price() {
        let half = from_submission(20.0, true, Some(50.0)).unwrap();
        let zero = resolve(&half, PriceEdit::DiscountPercentage(0.0)).unwrap();
        assert_eq!(zero.final_price, None);
        assert_eq!(zero.display_price(), 20.0);
        assert_eq!(PriceDisplay::of(&zero), PriceDisplay::Regular { price: 20.0 });
    }

    #[test]
    fn test_rejects_invalid_values() {
        let on_sale = from_submission(20.0, true, None).unwrap();
        assert_eq!(
            resolve(&on_sale, PriceEdit::DiscountPercentage(120.0)),
            Err(PriceError::DiscountOutOfRange(120.0))
        );
        assert!(matches!(
            resolve(&on_sale, PriceEdit::FinalPrice(f64::NAN)),
            Err(PriceError::NotANumber { field: "final_price" })
        ));
        assert!(matches!(
            from_submission(-1.0, false, None),
            Err(PriceError::Negative { field: "price", .. })
        ));
    }

    #[test]
    fn test_submission_not_on_sale_drops_discount() {
        let state = from_submission(20.0, false, Some(40.0)).unwrap();
        assert_eq!(state, PriceState::regular(20.0));
    }

    #[test]
    fn test_format_amount_rounds_at_display_only() {
        let state = from_submission(9.99, true, Some(33.3)).unwrap();
        assert_eq!(state.final_price, Some(9.99 * (100.0 - 33.3) / 100.0));
        assert_eq!(format_amount(state.display_price()), "6.66");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn test_badge_with_fractional_percentage() {
        let display = PriceDisplay::of(&from_submission(10.0, true, Some(12.5)).unwrap());
        assert_eq!(display.badge().as_deref(), Some("-12.5%"));
        assert_eq!(display.amount(), 8.75);
    }

    #[test]
    fn test_edit_wire_format() {
        let edit: PriceEdit = serde_json::from_str(r#"{"field": "discount_percentage", "value": 50}"#).unwrap();
        assert_eq!(edit, PriceEdit::DiscountPercentage(50.0));
        let edit: PriceEdit = serde_json::from_str(r#"{"field": "is_on_sale", "value": true}"#).unwrap();
        assert_eq!(edit, PriceEdit::IsOnSale(true));
    }

    #[test]
    fn test_resolve_all_folds_in_order() {
        let start = from_submission(20.0, true, Some(50.0)).unwrap();
        let folded = resolve_all(&start, [PriceEdit::IsOnSale(false), PriceEdit::OriginalPrice(30.0)]).unwrap();
        let stepwise = resolve(&resolve(&start, PriceEdit::IsOnSale(false)).unwrap(), PriceEdit::OriginalPrice(30.0)).unwrap();
        assert_eq!(folded, stepwise);
        assert_eq!(resolve_all(&start, []).unwrap(), start);
    }
}
