//! Overdue sweep: automatic forfeiture, idempotence, and collateral release.

mod common;

use chrono::NaiveDate;

use karat_core::{ledger, ForfeitureMode, Money, PawnAction, PawnItem, TicketStatus};
use karat_engine::{ItemStatus, OverdueSweep, AUTO_FORFEIT_NOTE};

use common::{standard_terms, Fixture};

fn ticket(id: &str, written: NaiveDate) -> karat_core::PawnTicket {
    let (ticket, _) = ledger::create_ticket(
        id,
        "C-1",
        vec![PawnItem {
            item_id: format!("{id}-item"),
            price: Money::from_cents(40_000),
        }],
        written,
        standard_terms(),
        "emp-1",
    )
    .unwrap();
    ticket
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_sweep_forfeits_only_overdue_tickets() {
    let fixture = Fixture::new();
    let sweep = OverdueSweep::new(fixture.history.clone(), fixture.inventory.clone());

    // 90-day terms: written Jan 1 is due Apr 1 (overdue in August), written
    // Aug 1 is not.
    let mut tickets = [
        ticket("PT-OLD", date(2026, 1, 1)),
        ticket("PT-NEW", date(2026, 8, 1)),
    ];

    let forfeited = sweep
        .run(
            &mut tickets,
            date(2026, 8, 28),
            ForfeitureMode::Automatic,
            "system",
        )
        .await
        .expect("sweep");

    assert_eq!(forfeited, vec!["PT-OLD".to_string()]);
    assert_eq!(tickets[0].status, TicketStatus::Forfeited);
    assert_eq!(tickets[1].status, TicketStatus::Pawn);

    // Collateral released to the processing queue.
    let status_calls = fixture.inventory.status_calls.lock().unwrap();
    assert_eq!(
        status_calls.as_slice(),
        &[(
            "PT-OLD-item".to_string(),
            ItemStatus::AvailableForProcessing
        )]
    );
}

#[tokio::test]
async fn test_sweep_is_idempotent() {
    let fixture = Fixture::new();
    let sweep = OverdueSweep::new(fixture.history.clone(), fixture.inventory.clone());

    let mut tickets = [ticket("PT-OLD", date(2026, 1, 1))];
    let today = date(2026, 8, 28);

    let first = sweep
        .run(&mut tickets, today, ForfeitureMode::Automatic, "system")
        .await
        .expect("first pass");
    let second = sweep
        .run(&mut tickets, today, ForfeitureMode::Automatic, "system")
        .await
        .expect("second pass");

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());

    // Exactly one Forfeit record across both passes, carrying the sweep note.
    let history = fixture.history.records_for("PT-OLD");
    let forfeits: Vec<_> = history
        .iter()
        .filter(|r| r.action == PawnAction::Forfeit)
        .collect();
    assert_eq!(forfeits.len(), 1);
    assert_eq!(forfeits[0].notes.as_deref(), Some(AUTO_FORFEIT_NOTE));
    assert_eq!(forfeits[0].performed_by, "system");
}

#[tokio::test]
async fn test_sweep_is_noop_in_manual_mode() {
    let fixture = Fixture::new();
    let sweep = OverdueSweep::new(fixture.history.clone(), fixture.inventory.clone());

    let mut tickets = [ticket("PT-OLD", date(2026, 1, 1))];

    let forfeited = sweep
        .run(
            &mut tickets,
            date(2026, 8, 28),
            ForfeitureMode::Manual,
            "system",
        )
        .await
        .expect("sweep");

    assert!(forfeited.is_empty());
    assert_eq!(tickets[0].status, TicketStatus::Pawn);
    assert!(fixture.history.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_sweep_respects_strict_overdue_boundary() {
    let fixture = Fixture::new();
    let sweep = OverdueSweep::new(fixture.history.clone(), fixture.inventory.clone());

    // Written May 30 with 90-day terms: due exactly Aug 28. On the due date
    // itself the ticket is not overdue; one day later it is.
    let mut tickets = [ticket("PT-DUE", date(2026, 5, 30))];
    assert_eq!(tickets[0].due_date, date(2026, 8, 28));

    let on_due = sweep
        .run(
            &mut tickets,
            date(2026, 8, 28),
            ForfeitureMode::Automatic,
            "system",
        )
        .await
        .expect("sweep on due date");
    assert!(on_due.is_empty());

    let after_due = sweep
        .run(
            &mut tickets,
            date(2026, 8, 29),
            ForfeitureMode::Automatic,
            "system",
        )
        .await
        .expect("sweep after due date");
    assert_eq!(after_due.len(), 1);
}
