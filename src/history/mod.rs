mod manager;
mod snapshot;

pub use manager::HistoryManager;
pub use snapshot::Snapshot;

/// What an undo or redo request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The cursor moved and the surface now shows this snapshot
    Moved(Snapshot),
    /// Already at the boundary; nothing changed
    NoOp,
}

impl HistoryOutcome {
    pub fn is_no_op(&self) -> bool {
        matches!(self, HistoryOutcome::NoOp)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            HistoryOutcome::Moved(snapshot) => Some(snapshot),
            HistoryOutcome::NoOp => None,
        }
    }
}
