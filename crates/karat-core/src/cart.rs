//! # Settlement Cart
//!
//! The heterogeneous checkout cart and its signed-value math.
//!
//! ## Line Value Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              CartLine::value - order is load-bearing                    │
//! │                                                                         │
//! │  normalized amount                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  × quantity            (sale lines only, default 1)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  + 15% protection plan (when flagged)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  + sales tax           (sale lines only, unless customer tax-exempt)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  apply sign            (buy/pawn = money out = negative)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Normalization
//! The browser sends polymorphic line shapes - `price` for sales, `value`
//! for pawns, `fee` for repairs, `amount` for payments. That shape exists
//! once, as [`RawCartLine`], and is resolved into a single `amount` field at
//! ingestion. Everything downstream sees one tagged union. Malformed or
//! absent amounts normalize to zero; cart math never fails on input shape.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentEvent, PaymentMethod, Rate};
use crate::PROTECTION_PLAN_RATE_BPS;

// =============================================================================
// Line Kind
// =============================================================================

/// The transaction type of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Store sells inventory to the customer.
    Sale,
    /// Store buys goods from the customer.
    Buy,
    /// Store lends against collateral.
    Pawn,
    /// Customer repays a pawn loan and reclaims collateral.
    Redeem,
    /// Customer trades goods against a purchase.
    Trade,
    /// Repair service fee.
    Repair,
    /// Loan payment (extension) against an existing ticket.
    Payment,
}

impl LineKind {
    /// Buy and pawn lines are money leaving the drawer.
    #[inline]
    pub const fn is_money_out(&self) -> bool {
        matches!(self, LineKind::Buy | LineKind::Pawn)
    }

    /// Only sale lines are quantity-scaled and taxed.
    #[inline]
    pub const fn is_sale(&self) -> bool {
        matches!(self, LineKind::Sale)
    }
}

// =============================================================================
// Raw Line (wire shape)
// =============================================================================

/// The polymorphic line shape as the frontend sends it.
///
/// Exactly one of the amount fields is normally set, depending on the
/// transaction type; redeem lines carry `total_redemption_amount` plus
/// `interest` instead. Resolution order on ingestion:
/// `price` → `value` → `fee` → `amount` → `total_amount` → 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCartLine {
    pub kind: Option<LineKind>,
    pub price: Option<Money>,
    pub value: Option<Money>,
    pub fee: Option<Money>,
    pub amount: Option<Money>,
    pub total_amount: Option<Money>,
    /// Redeem lines: the quoted redemption total for the ticket.
    pub total_redemption_amount: Option<Money>,
    /// Redeem lines: interest component, added on top of the quote.
    pub interest: Option<Money>,
    pub quantity: Option<i64>,
    pub protection_plan: Option<bool>,
    pub ticket_id: Option<String>,
    pub item_id: Option<String>,
    /// Payment (extension) lines: where the ticket's due date moves.
    /// Caller-supplied; there is no implicit advancement rule.
    #[ts(as = "Option<String>")]
    pub new_due_date: Option<NaiveDate>,
    /// Payment (extension) lines: days of extension being bought.
    pub extension_days: Option<u32>,
}

// =============================================================================
// Cart Line (normalized)
// =============================================================================

/// A normalized settlement cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub kind: LineKind,
    /// The single resolved amount for this line.
    pub amount: Money,
    /// Unit count; meaningful for sale lines, 1 otherwise.
    pub quantity: i64,
    /// Adds 15% of the quantity-scaled value when set.
    pub protection_plan: bool,
    /// Pawn ticket linkage (redeem, pawn, payment lines).
    pub ticket_id: Option<String>,
    /// Existing inventory reference (sale lines); `None` on buy/pawn/trade
    /// lines means the settlement creates a new item artifact.
    pub item_id: Option<String>,
    /// Extension target due date (payment lines only, caller-supplied).
    #[ts(as = "Option<String>")]
    pub new_due_date: Option<NaiveDate>,
    /// Extension length in days (payment lines only).
    pub extension_days: Option<u32>,
}

impl CartLine {
    /// A plain line of a given kind and amount, quantity 1, no extras.
    pub fn new(kind: LineKind, amount: Money) -> Self {
        CartLine {
            kind,
            amount,
            quantity: 1,
            protection_plan: false,
            ticket_id: None,
            item_id: None,
            new_due_date: None,
            extension_days: None,
        }
    }

    /// Normalizes a raw frontend line into the tagged shape.
    ///
    /// Missing kind defaults to `Sale` (the common case); missing or
    /// malformed amounts resolve to zero rather than erroring. Quantity
    /// defaults to 1 and is floored at 1.
    pub fn from_raw(raw: RawCartLine) -> Self {
        let kind = raw.kind.unwrap_or(LineKind::Sale);

        let amount = match kind {
            // Redeem lines total the quote plus its interest component.
            LineKind::Redeem => {
                raw.total_redemption_amount.unwrap_or(Money::zero())
                    + raw.interest.unwrap_or(Money::zero())
            }
            _ => raw
                .price
                .or(raw.value)
                .or(raw.fee)
                .or(raw.amount)
                .or(raw.total_amount)
                .unwrap_or(Money::zero()),
        };

        CartLine {
            kind,
            amount,
            quantity: raw.quantity.unwrap_or(1).max(1),
            protection_plan: raw.protection_plan.unwrap_or(false),
            ticket_id: raw.ticket_id,
            item_id: raw.item_id,
            new_due_date: raw.new_due_date,
            extension_days: raw.extension_days,
        }
    }

    /// Computes this line's signed contribution to the cart total.
    ///
    /// `redeemed` tracks ticket IDs already counted: a multi-item pawn
    /// redeemed in one ticket appears as several redeem lines but must be
    /// charged once - only the first line per ticket contributes.
    pub fn value(&self, tax_rate: Rate, tax_exempt: bool, redeemed: &mut HashSet<String>) -> Money {
        if self.kind == LineKind::Redeem {
            if let Some(ticket_id) = &self.ticket_id {
                if !redeemed.insert(ticket_id.clone()) {
                    return Money::zero();
                }
            }
        }

        let mut value = self.amount;

        if self.kind.is_sale() {
            value = value.multiply_quantity(self.quantity);
        }
        if self.protection_plan {
            value = value.with_markup(Rate::from_bps(PROTECTION_PLAN_RATE_BPS));
        }
        if self.kind.is_sale() && !tax_exempt {
            value = value.with_markup(tax_rate);
        }

        if self.kind.is_money_out() {
            -value.abs()
        } else {
            value.abs()
        }
    }
}

// =============================================================================
// Settlement Cart
// =============================================================================

/// Outcome of one accepted partial payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub remaining_balance: Money,
    pub is_fully_settled: bool,
}

/// The ephemeral checkout cart: ordered lines, a payment log, and the
/// running balance.
///
/// ## Lifecycle
/// - Created when checkout starts, with the customer's tax context and the
///   tax rate snapshot in effect
/// - `remaining_balance` moves toward zero with each accepted payment
/// - Cleared only on confirmed full settlement or explicit cancel; a failed
///   commit leaves the cart intact and re-submittable
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SettlementCart {
    pub lines: Vec<CartLine>,
    /// Tax rate snapshot captured at cart creation.
    pub tax_rate: Rate,
    /// Customer-level tax exemption.
    pub tax_exempt: bool,
    /// Ordered, append-only log of accepted payments.
    pub payments: Vec<PaymentEvent>,
}

impl SettlementCart {
    /// Creates an empty cart with the customer's tax context.
    pub fn new(tax_rate: Rate, tax_exempt: bool) -> Self {
        SettlementCart {
            lines: Vec::new(),
            tax_rate,
            tax_exempt,
            payments: Vec::new(),
        }
    }

    /// Appends a normalized line.
    pub fn add_line(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    /// Normalizes and appends a raw frontend line.
    pub fn add_raw_line(&mut self, raw: RawCartLine) {
        self.lines.push(CartLine::from_raw(raw));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The signed cart total: Σ line values.
    ///
    /// Positive means the customer owes the store; negative means the store
    /// pays out (a cart dominated by buys/pawns).
    pub fn total(&self) -> Money {
        let mut redeemed = HashSet::new();
        self.lines
            .iter()
            .fold(Money::zero(), |acc, line| {
                acc + line.value(self.tax_rate, self.tax_exempt, &mut redeemed)
            })
    }

    /// Sum of accepted payments so far.
    pub fn paid(&self) -> Money {
        self.payments
            .iter()
            .fold(Money::zero(), |acc, p| acc + p.amount)
    }

    /// How far the cart is from settled, signed like the total.
    ///
    /// Derived, not stored: total minus payments applied toward zero.
    pub fn remaining_balance(&self) -> Money {
        let total = self.total();
        if total.is_negative() {
            total + self.paid()
        } else {
            total - self.paid()
        }
    }

    /// Fully settled when the remaining balance is within a cent of zero.
    pub fn is_fully_settled(&self) -> bool {
        self.remaining_balance().abs().cents() < 1
    }

    /// Accepts a partial payment, moving the balance toward zero.
    ///
    /// ## Rejections (`InvalidPayment`, balance untouched)
    /// - `amount` is zero or negative
    /// - `amount` exceeds the absolute remaining balance (overpayment)
    pub fn accept_payment(
        &mut self,
        amount: Money,
        method: PaymentMethod,
    ) -> CoreResult<PaymentOutcome> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidPayment {
                reason: format!("amount {amount} must be positive"),
            });
        }

        let remaining = self.remaining_balance();
        if amount > remaining.abs() {
            return Err(CoreError::InvalidPayment {
                reason: format!("amount {amount} exceeds remaining balance {remaining}"),
            });
        }

        self.payments.push(PaymentEvent {
            method,
            amount,
            timestamp: Utc::now(),
        });

        Ok(PaymentOutcome {
            remaining_balance: self.remaining_balance(),
            is_fully_settled: self.is_fully_settled(),
        })
    }

    /// Empties the cart. Called on confirmed settlement or explicit cancel -
    /// never on a failed commit.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.payments.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
