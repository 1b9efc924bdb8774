//! # Pawn Ticket Ledger
//!
//! Pure accrual math and the ticket state machine.
//!
//! ## Ticket State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                    ┌──── extend (history only) ────┐                   │
//! │                    │                               │                   │
//! │                    ▼                               │                   │
//! │               ┌─────────┐                          │                   │
//! │     create ──►│  PAWN   │──────────────────────────┘                   │
//! │               └────┬────┘                                              │
//! │                    │                                                   │
//! │        ┌───────────┴───────────┐                                       │
//! │        │ redeem                │ forfeit (manual or sweep)             │
//! │        ▼                       ▼                                       │
//! │  ┌───────────┐          ┌────────────┐                                 │
//! │  │ REDEEMED  │          │ FORFEITED  │        (both terminal)          │
//! │  └───────────┘          └────────────┘                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Division of Labor
//! Everything here is a pure function of the ticket's **frozen** terms -
//! nothing reads live configuration. Redemption/extension amounts paid at
//! checkout are computed by the settlement side and handed back to `redeem`/
//! `extend` as facts; the ledger is a state machine over caller-supplied
//! financial facts plus the quote functions the settlement side calls.

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    PaidAmounts, PawnAction, PawnHistoryRecord, PawnItem, PawnTerms, PawnTicket, TicketStatus,
};
use crate::validation::validate_identifier;
use crate::INSURANCE_RATE_BPS;

// =============================================================================
// Ticket Creation
// =============================================================================

/// Creates a pawn ticket, freezing the supplied terms into it.
///
/// ## Behavior
/// - `due_date = transaction_date + term_days`, computed once and persisted
/// - Emits the ticket's single `Created` history record with
///   `principal = Σ item.price`
/// - `ticket_id` and `customer_id` must pass identifier validation; empty
///   `items` is a validation error; zero-price items are allowed and
///   contribute 0 to the principal
///
/// The terms are copied **by value** from the snapshot in effect at creation.
/// Changing store configuration afterwards has no effect on this ticket.
pub fn create_ticket(
    ticket_id: &str,
    customer_id: &str,
    items: Vec<PawnItem>,
    transaction_date: NaiveDate,
    terms: PawnTerms,
    performed_by: &str,
) -> CoreResult<(PawnTicket, PawnHistoryRecord)> {
    validate_identifier("ticket_id", ticket_id)?;
    validate_identifier("customer_id", customer_id)?;
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        }
        .into());
    }

    let due_date = transaction_date
        .checked_add_days(Days::new(terms.term_days as u64))
        .unwrap_or(transaction_date);

    let ticket = PawnTicket {
        ticket_id: ticket_id.to_string(),
        customer_id: customer_id.to_string(),
        items,
        transaction_date,
        terms,
        due_date,
        status: TicketStatus::Pawn,
    };

    let record = PawnHistoryRecord {
        ticket_id: ticket.ticket_id.clone(),
        action: PawnAction::Created,
        timestamp: Utc::now(),
        principal: Some(ticket.principal()),
        interest_paid: None,
        fee_paid: None,
        total_paid: None,
        new_due_date: None,
        extension_days: None,
        performed_by: performed_by.to_string(),
        notes: None,
    };

    Ok((ticket, record))
}

// =============================================================================
// Accrual Quotes
// =============================================================================

/// Interest and insurance accrued over one or more periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionQuote {
    pub interest: Money,
    pub insurance_fee: Money,
}

impl ExtensionQuote {
    /// Interest plus insurance: what one extension payment costs.
    pub fn total(&self) -> Money {
        self.interest + self.insurance_fee
    }
}

/// Number of interest periods the full term spans: `ceil(term / frequency)`.
///
/// Any partial period counts as a full period - the tie-break favors the
/// house. A 90-day term billed every 30 days is 3 periods; a 91-day term
/// would be 4.
pub fn interest_periods(terms: &PawnTerms) -> u32 {
    let frequency = terms.frequency_days.max(1);
    terms.term_days.div_ceil(frequency)
}

/// Quotes the full redemption amount for a ticket.
///
/// ```text
/// periods   = ceil(term_days / frequency_days)
/// interest  = principal × rate × periods
/// insurance = principal × 1% × periods
/// total     = principal + interest + insurance     (appraisal fee fixed at 0)
/// ```
///
/// Deterministic, pure function of the ticket's frozen terms.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use karat_core::ledger::{create_ticket, redemption_amount};
/// use karat_core::money::Money;
/// use karat_core::types::{PawnItem, PawnTerms};
///
/// let (ticket, _) = create_ticket(
///     "PT-1",
///     "C-1",
///     vec![PawnItem { item_id: "I-1".into(), price: Money::from_cents(100_000) }],
///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
///     PawnTerms { term_days: 90, interest_rate_bps: 290, frequency_days: 30 },
///     "emp-1",
/// ).unwrap();
///
/// let quote = redemption_amount(&ticket);
/// assert_eq!(quote.total.cents(), 111_700); // $1,117.00
/// ```
pub fn redemption_amount(ticket: &PawnTicket) -> PaidAmounts {
    let principal = ticket.principal();
    let periods = interest_periods(&ticket.terms);

    let interest = principal.apply_bps(ticket.terms.interest_rate_bps) * periods;
    let insurance_fee = principal.apply_bps(INSURANCE_RATE_BPS) * periods;

    PaidAmounts {
        principal,
        interest,
        insurance_fee,
        total: principal + interest + insurance_fee,
    }
}

/// Quotes a single extension payment: one frequency cycle of interest and
/// insurance, no principal.
pub fn extension_amount(ticket: &PawnTicket) -> ExtensionQuote {
    let principal = ticket.principal();

    ExtensionQuote {
        interest: principal.apply_bps(ticket.terms.interest_rate_bps),
        insurance_fee: principal.apply_bps(INSURANCE_RATE_BPS),
    }
}

// =============================================================================
// Overdue Detection
// =============================================================================

/// An active ticket is overdue strictly after its stored due date.
///
/// The due date itself is NOT overdue. Uses the due date persisted at
/// creation - never recomputed from possibly-changed configuration.
pub fn is_overdue(ticket: &PawnTicket, today: NaiveDate) -> bool {
    ticket.status == TicketStatus::Pawn && today > ticket.due_date
}

// =============================================================================
// Transitions
// =============================================================================

fn guard_pawn(ticket: &PawnTicket, action: PawnAction) -> CoreResult<()> {
    if ticket.status != TicketStatus::Pawn {
        return Err(CoreError::InvalidTransition {
            ticket_id: ticket.ticket_id.clone(),
            status: ticket.status,
            action,
        });
    }
    Ok(())
}

/// Transitions PAWN → REDEEMED and appends the Redeem history record.
///
/// `amounts` are the figures actually settled at checkout, recorded as-is.
pub fn redeem(
    ticket: &mut PawnTicket,
    performed_by: &str,
    amounts: PaidAmounts,
) -> CoreResult<PawnHistoryRecord> {
    guard_pawn(ticket, PawnAction::Redeem)?;
    ticket.status = TicketStatus::Redeemed;

    Ok(PawnHistoryRecord {
        ticket_id: ticket.ticket_id.clone(),
        action: PawnAction::Redeem,
        timestamp: Utc::now(),
        principal: Some(amounts.principal),
        interest_paid: Some(amounts.interest),
        fee_paid: Some(amounts.insurance_fee),
        total_paid: Some(amounts.total),
        new_due_date: None,
        extension_days: None,
        performed_by: performed_by.to_string(),
        notes: None,
    })
}

/// Transitions PAWN → FORFEITED and appends the Forfeit history record.
///
/// Releasing the collateral into store inventory is the inventory
/// collaborator's job; the ledger only records the event.
pub fn forfeit(
    ticket: &mut PawnTicket,
    performed_by: &str,
    reason: Option<String>,
) -> CoreResult<PawnHistoryRecord> {
    guard_pawn(ticket, PawnAction::Forfeit)?;
    ticket.status = TicketStatus::Forfeited;

    Ok(PawnHistoryRecord {
        ticket_id: ticket.ticket_id.clone(),
        action: PawnAction::Forfeit,
        timestamp: Utc::now(),
        principal: Some(ticket.principal()),
        interest_paid: None,
        fee_paid: None,
        total_paid: None,
        new_due_date: None,
        extension_days: None,
        performed_by: performed_by.to_string(),
        notes: reason,
    })
}

/// Records an extension payment and moves the due date.
///
/// Status stays PAWN (self-loop). The new due date is caller-supplied -
/// there is no hidden `+frequency_days` default; whoever drives the checkout
/// decides how far out the ticket moves.
pub fn extend(
    ticket: &mut PawnTicket,
    performed_by: &str,
    amounts: ExtensionQuote,
    new_due_date: NaiveDate,
    extension_days: u32,
) -> CoreResult<PawnHistoryRecord> {
    guard_pawn(ticket, PawnAction::Extend)?;
    ticket.due_date = new_due_date;

    Ok(PawnHistoryRecord {
        ticket_id: ticket.ticket_id.clone(),
        action: PawnAction::Extend,
        timestamp: Utc::now(),
        principal: Some(ticket.principal()),
        interest_paid: Some(amounts.interest),
        fee_paid: Some(amounts.insurance_fee),
        total_paid: Some(amounts.total()),
        new_due_date: Some(new_due_date),
        extension_days: Some(extension_days),
        performed_by: performed_by.to_string(),
        notes: None,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_terms() -> PawnTerms {
        PawnTerms {
            term_days: 90,
            interest_rate_bps: 290, // 2.9%
            frequency_days: 30,
        }
    }

    fn ticket_with(principal_cents: i64, terms: PawnTerms) -> PawnTicket {
        let (ticket, _) = create_ticket(
            "PT-1",
            "C-1",
            vec![PawnItem {
                item_id: "I-1".to_string(),
                price: Money::from_cents(principal_cents),
            }],
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            terms,
            "emp-1",
        )
        .unwrap();
        ticket
    }

    #[test]
    fn test_create_computes_due_date() {
        let ticket = ticket_with(100_000, standard_terms());
        assert_eq!(
            ticket.due_date,
            NaiveDate::from_ymd_opt(2026, 4, 15).unwrap()
        );
        assert_eq!(ticket.status, TicketStatus::Pawn);
    }

    #[test]
    fn test_create_emits_single_created_record() {
        let (ticket, record) = create_ticket(
            "PT-2",
            "C-1",
            vec![
                PawnItem {
                    item_id: "I-1".to_string(),
                    price: Money::from_cents(50_000),
                },
                PawnItem {
                    item_id: "I-2".to_string(),
                    price: Money::zero(), // zero-price collateral is fine
                },
            ],
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            standard_terms(),
            "emp-1",
        )
        .unwrap();

        assert_eq!(record.action, PawnAction::Created);
        assert_eq!(record.principal, Some(Money::from_cents(50_000)));
        assert_eq!(ticket.principal().cents(), 50_000);
    }

    #[test]
    fn test_create_rejects_empty_items() {
        let result = create_ticket(
            "PT-3",
            "C-1",
            vec![],
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            standard_terms(),
            "emp-1",
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_bad_identifiers() {
        let items = vec![PawnItem {
            item_id: "I-1".to_string(),
            price: Money::from_cents(10_000),
        }];
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

        let blank = create_ticket("   ", "C-1", items.clone(), date, standard_terms(), "emp-1");
        assert!(matches!(blank, Err(CoreError::Validation(_))));

        let overlong = create_ticket(
            &"X".repeat(80),
            "C-1",
            items,
            date,
            standard_terms(),
            "emp-1",
        );
        assert!(matches!(overlong, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_interest_periods_exact_division() {
        assert_eq!(interest_periods(&standard_terms()), 3);
    }

    #[test]
    fn test_interest_periods_partial_rounds_up() {
        // One day over the third period charges a fourth full period.
        let terms = PawnTerms {
            term_days: 91,
            interest_rate_bps: 290,
            frequency_days: 30,
        };
        assert_eq!(interest_periods(&terms), 4);
    }

    #[test]
    fn test_redemption_reference_scenario() {
        // $1,000 @ 90 days / 30-day periods / 2.9%:
        //   3 periods → interest $87.00, insurance $30.00, total $1,117.00
        let ticket = ticket_with(100_000, standard_terms());
        let quote = redemption_amount(&ticket);

        assert_eq!(quote.interest.cents(), 8_700);
        assert_eq!(quote.insurance_fee.cents(), 3_000);
        assert_eq!(quote.total.cents(), 111_700);
    }

    #[test]
    fn test_redemption_monotone_in_term_and_rate() {
        let base = redemption_amount(&ticket_with(100_000, standard_terms()));

        let longer = redemption_amount(&ticket_with(
            100_000,
            PawnTerms {
                term_days: 120,
                ..standard_terms()
            },
        ));
        let steeper = redemption_amount(&ticket_with(
            100_000,
            PawnTerms {
                interest_rate_bps: 400,
                ..standard_terms()
            },
        ));

        assert!(longer.total >= base.total);
        assert!(steeper.total >= base.total);
    }

    #[test]
    fn test_redemption_ignores_later_config() {
        // Frozen-terms invariant: the quote is a function of the ticket
        // alone. Build a ticket, then pretend the store changed its rates -
        // a second quote from the same ticket is identical.
        let ticket = ticket_with(100_000, standard_terms());
        let before = redemption_amount(&ticket);
        let _new_store_terms = PawnTerms {
            term_days: 30,
            interest_rate_bps: 900,
            frequency_days: 15,
        };
        let after = redemption_amount(&ticket);
        assert_eq!(before, after);
    }

    #[test]
    fn test_extension_is_one_period() {
        let ticket = ticket_with(100_000, standard_terms());
        let quote = extension_amount(&ticket);

        assert_eq!(quote.interest.cents(), 2_900);
        assert_eq!(quote.insurance_fee.cents(), 1_000);
        assert_eq!(quote.total().cents(), 3_900);
    }

    #[test]
    fn test_overdue_is_strict() {
        let ticket = ticket_with(100_000, standard_terms());
        let due = ticket.due_date;

        assert!(!is_overdue(&ticket, due)); // due date itself is not overdue
        assert!(is_overdue(&ticket, due.succ_opt().unwrap()));
        assert!(!is_overdue(&ticket, due.pred_opt().unwrap()));
    }

    #[test]
    fn test_overdue_only_for_pawn_status() {
        let mut ticket = ticket_with(100_000, standard_terms());
        let past_due = ticket.due_date.succ_opt().unwrap();
        assert!(is_overdue(&ticket, past_due));

        let quote = redemption_amount(&ticket);
        redeem(&mut ticket, "emp-1", quote).unwrap();
        assert!(!is_overdue(&ticket, past_due));
    }

    #[test]
    fn test_redeem_transitions_and_records() {
        let mut ticket = ticket_with(100_000, standard_terms());
        let quote = redemption_amount(&ticket);

        let record = redeem(&mut ticket, "emp-1", quote).unwrap();
        assert_eq!(ticket.status, TicketStatus::Redeemed);
        assert_eq!(record.action, PawnAction::Redeem);
        assert_eq!(record.total_paid, Some(Money::from_cents(111_700)));
    }

    #[test]
    fn test_redeem_twice_rejected() {
        let mut ticket = ticket_with(100_000, standard_terms());
        let quote = redemption_amount(&ticket);

        redeem(&mut ticket, "emp-1", quote).unwrap();
        let second = redeem(&mut ticket, "emp-1", quote);
        assert!(matches!(
            second,
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_forfeit_from_terminal_rejected() {
        let mut ticket = ticket_with(100_000, standard_terms());
        forfeit(&mut ticket, "emp-1", None).unwrap();
        assert_eq!(ticket.status, TicketStatus::Forfeited);

        let again = forfeit(&mut ticket, "emp-1", None);
        assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
    }

    #[test]
    fn test_extend_keeps_status_and_moves_due_date() {
        let mut ticket = ticket_with(100_000, standard_terms());
        let quote = extension_amount(&ticket);
        let new_due = ticket.due_date.checked_add_days(Days::new(30)).unwrap();

        let record = extend(&mut ticket, "emp-1", quote, new_due, 30).unwrap();
        assert_eq!(ticket.status, TicketStatus::Pawn);
        assert_eq!(ticket.due_date, new_due);
        assert_eq!(record.new_due_date, Some(new_due));
        assert_eq!(record.extension_days, Some(30));
        assert_eq!(record.total_paid, Some(Money::from_cents(3_900)));
    }
}
