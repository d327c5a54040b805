//! Lifecycle phases of one task run.

use serde::Serialize;

/// Where a task run is in its lifecycle.
///
/// `Created → Configured → [ConfirmPending → Confirmed | Aborted] →
/// Executing → HooksDispatched → Done`, with `Failed` reachable from
/// `Created`, `Configured`, `Confirmed`, `Executing` and `HooksDispatched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Created,
    Configured,
    ConfirmPending,
    Confirmed,
    Aborted,
    Executing,
    HooksDispatched,
    Done,
    Failed,
}

impl Phase {
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::{
            Aborted, Configured, ConfirmPending, Confirmed, Created, Done, Executing, Failed,
            HooksDispatched,
        };
        matches!(
            (self, next),
            (Created, Configured)
                // `help` mode
                | (Created, Done)
                | (Created, Failed)
                | (Configured, ConfirmPending)
                | (Configured, Executing)
                | (Configured, Failed)
                | (ConfirmPending, Confirmed)
                | (ConfirmPending, Aborted)
                | (Confirmed, Executing)
                // a later capability gate rejects the run
                | (Confirmed, Failed)
                | (Executing, HooksDispatched)
                | (Executing, Failed)
                | (HooksDispatched, Done)
                | (HooksDispatched, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed | Phase::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::Configured => "configured",
            Phase::ConfirmPending => "confirm_pending",
            Phase::Confirmed => "confirmed",
            Phase::Aborted => "aborted",
            Phase::Executing => "executing",
            Phase::HooksDispatched => "hooks_dispatched",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }
}
