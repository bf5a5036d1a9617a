use crate::BackupNodeHandle;
use crate::NodeHandle;

/// Occupancy of one cluster slot.
///
/// The backup/promotion exclusivity is an explicit state machine: the
/// reserved slot holds either a backup node or a promoted full member, never
/// both, and promoting requires the backup occupant to be closed first.
#[derive(Default)]
pub enum Slot {
    #[default]
    Empty,
    Member(NodeHandle),
    Backup(BackupNodeHandle),
}

impl Slot {
    pub fn as_member(&self) -> Option<&NodeHandle> {
        match self {
            Slot::Member(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_backup(&self) -> Option<&BackupNodeHandle> {
        match self {
            Slot::Backup(backup) => Some(backup),
            _ => None,
        }
    }

    /// Close whatever occupies the slot; empty slots are left alone.
    pub fn close(&self) {
        match self {
            Slot::Empty => {}
            Slot::Member(node) => node.close(),
            Slot::Backup(backup) => backup.close(),
        }
    }
}
