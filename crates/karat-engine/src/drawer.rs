//! # Cash Session Gate
//!
//! Tracks per-employee cash-drawer sessions and guards the settlement commit.
//!
//! ## Session Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cash Drawer Sessions                                 │
//! │                                                                         │
//! │  open(emp, Physical) ──► session            ── one open physical        │
//! │  open(emp, Physical) ──► DrawerAlreadyOpen     session per employee     │
//! │                                                                         │
//! │  close(session_id)   ──► sets closed_at                                 │
//! │                                                                         │
//! │  is_open(emp, Physical)  ──► consulted by SettlementProcessor::commit   │
//! │                              BEFORE any mutation                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! Sessions live behind a `Mutex` because drawer opens/closes and commit
//! guards may run from concurrent tasks.

use std::sync::Mutex;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use karat_core::{CashDrawerSession, DrawerKind};

use crate::error::{EngineError, EngineResult};

/// In-memory registry of cash-drawer sessions.
#[derive(Debug, Default)]
pub struct CashSessionGate {
    sessions: Mutex<Vec<CashDrawerSession>>,
}

impl CashSessionGate {
    /// Creates an empty gate with no sessions.
    pub fn new() -> Self {
        CashSessionGate {
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Opens a session for an employee.
    ///
    /// Rejects with `DrawerAlreadyOpen` if the employee already has an open
    /// session on the same drawer kind.
    pub fn open(&self, employee_id: &str, drawer: DrawerKind) -> EngineResult<CashDrawerSession> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");

        let already_open = sessions
            .iter()
            .any(|s| s.employee_id == employee_id && s.drawer == drawer && s.is_open());
        if already_open {
            return Err(EngineError::DrawerAlreadyOpen {
                employee_id: employee_id.to_string(),
            });
        }

        let session = CashDrawerSession {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            drawer,
            opened_at: Utc::now(),
            closed_at: None,
        };
        sessions.push(session.clone());

        info!(session_id = %session.id, employee_id = %employee_id, ?drawer, "Cash session opened");

        Ok(session)
    }

    /// Closes a session by ID, stamping `closed_at`.
    pub fn close(&self, session_id: &str) -> EngineResult<()> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");

        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.is_open())
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

        session.closed_at = Some(Utc::now());

        info!(session_id = %session_id, employee_id = %session.employee_id, "Cash session closed");

        Ok(())
    }

    /// Whether the employee has an open session on the given drawer kind.
    ///
    /// This is the commit-time guard: settlement refuses to proceed unless
    /// `is_open(employee, Physical)` holds.
    pub fn is_open(&self, employee_id: &str, drawer: DrawerKind) -> bool {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .iter()
            .any(|s| s.employee_id == employee_id && s.drawer == drawer && s.is_open())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_then_is_open() {
        let gate = CashSessionGate::new();
        assert!(!gate.is_open("emp-1", DrawerKind::Physical));

        gate.open("emp-1", DrawerKind::Physical).unwrap();
        assert!(gate.is_open("emp-1", DrawerKind::Physical));
        assert!(!gate.is_open("emp-1", DrawerKind::Virtual));
        assert!(!gate.is_open("emp-2", DrawerKind::Physical));
    }

    #[test]
    fn test_double_open_rejected() {
        let gate = CashSessionGate::new();
        gate.open("emp-1", DrawerKind::Physical).unwrap();

        let second = gate.open("emp-1", DrawerKind::Physical);
        assert!(matches!(
            second,
            Err(EngineError::DrawerAlreadyOpen { .. })
        ));
    }

    #[test]
    fn test_virtual_session_does_not_block_physical() {
        let gate = CashSessionGate::new();
        gate.open("emp-1", DrawerKind::Virtual).unwrap();
        assert!(gate.open("emp-1", DrawerKind::Physical).is_ok());
    }

    #[test]
    fn test_close_reopens_allowed() {
        let gate = CashSessionGate::new();
        let session = gate.open("emp-1", DrawerKind::Physical).unwrap();

        gate.close(&session.id).unwrap();
        assert!(!gate.is_open("emp-1", DrawerKind::Physical));

        // A fresh shift can open again.
        assert!(gate.open("emp-1", DrawerKind::Physical).is_ok());
    }

    #[test]
    fn test_close_unknown_session() {
        let gate = CashSessionGate::new();
        let result = gate.close("no-such-session");
        assert!(matches!(result, Err(EngineError::SessionNotFound(_))));
    }
}
