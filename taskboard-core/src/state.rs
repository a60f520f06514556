/// Local board state: the in-process snapshot the board view renders from.
///
/// Changes go through explicit transitions so callers never rely on a render
/// cycle to learn what happened:
/// - `apply_optimistic` applies a change before the store confirms it and
///   hands back a `Checkpoint`
/// - `confirm` / `rollback` settle that checkpoint
/// - `commit` applies a change that the store already accepted
/// - `replace` swaps the whole snapshot (synchronizer only)
///
/// Every transition bumps `BoardSnapshot::version` and broadcasts a
/// `BoardEvent`. The lock is never held across an await.
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{BoardId, BoardSnapshot};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardEvent {
    Replaced { version: u64 },
    Optimistic { version: u64 },
    Confirmed { version: u64 },
    RolledBack { version: u64 },
    Committed { version: u64 },
}

/// Pre-change snapshot kept while an optimistic change awaits its write.
#[derive(Debug)]
#[must_use = "an optimistic change must be confirmed or rolled back"]
pub struct Checkpoint {
    previous: BoardSnapshot,
    applied_version: u64,
}

impl Checkpoint {
    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }
}

pub struct LocalBoardState {
    snapshot: RwLock<BoardSnapshot>,
    events: broadcast::Sender<BoardEvent>,
}

impl std::fmt::Debug for LocalBoardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.read_guard();
        f.debug_struct("LocalBoardState")
            .field("board_id", &snap.board_id)
            .field("version", &snap.version)
            .field("columns", &snap.columns.len())
            .finish_non_exhaustive()
    }
}

impl LocalBoardState {
    pub fn new(board_id: BoardId) -> Self {
        Self::with_capacity(board_id, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(board_id: BoardId, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            snapshot: RwLock::new(BoardSnapshot::empty(board_id)),
            events,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, BoardSnapshot> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, BoardSnapshot> {
        self.snapshot.write().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: BoardEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn board_id(&self) -> BoardId {
        self.read_guard().board_id
    }

    pub fn version(&self) -> u64 {
        self.read_guard().version
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> BoardSnapshot {
        self.read_guard().clone()
    }

    /// Run a read against the current snapshot without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&BoardSnapshot) -> R) -> R {
        f(&self.read_guard())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Atomically swap in a freshly loaded snapshot.
    pub fn replace(&self, mut snapshot: BoardSnapshot) {
        let version = {
            let mut current = self.write_guard();
            snapshot.version = current.version + 1;
            *current = snapshot;
            current.version
        };
        self.emit(BoardEvent::Replaced { version });
    }

    pub fn apply_optimistic(&self, change: impl FnOnce(&mut BoardSnapshot)) -> Checkpoint {
        let checkpoint = {
            let mut current = self.write_guard();
            let previous = current.clone();
            change(&mut current);
            current.version += 1;
            Checkpoint {
                previous,
                applied_version: current.version,
            }
        };
        self.emit(BoardEvent::Optimistic {
            version: checkpoint.applied_version,
        });
        checkpoint
    }

    pub fn confirm(&self, checkpoint: Checkpoint) {
        self.emit(BoardEvent::Confirmed {
            version: checkpoint.applied_version,
        });
    }

    /// Restore the snapshot taken before the optimistic change. If another
    /// transition landed since, the state is left alone and `false` is
    /// returned; a resync is then the only safe recovery.
    pub fn rollback(&self, checkpoint: Checkpoint) -> bool {
        let version = {
            let mut current = self.write_guard();
            if current.version != checkpoint.applied_version {
                return false;
            }
            let mut previous = checkpoint.previous;
            previous.version = current.version + 1;
            *current = previous;
            current.version
        };
        self.emit(BoardEvent::RolledBack { version });
        true
    }

    /// Apply a change the store has already accepted.
    pub fn commit<R>(&self, change: impl FnOnce(&mut BoardSnapshot) -> R) -> R {
        let (result, version) = {
            let mut current = self.write_guard();
            let result = change(&mut current);
            current.version += 1;
            (result, current.version)
        };
        self.emit(BoardEvent::Committed { version });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, ColumnView, Tag};
    use chrono::Utc;
    use uuid::Uuid;

    fn column(board_id: BoardId, name: &str) -> ColumnView {
        ColumnView {
            column: Column {
                id: Uuid::new_v4(),
                board_id,
                name: name.into(),
                position: 0,
                created_at: Utc::now(),
            },
            cards: vec![],
        }
    }

    #[test]
    fn test_replace_bumps_version_and_swaps() {
        let board_id = Uuid::new_v4();
        let state = LocalBoardState::new(board_id);
        let mut rx = state.subscribe();

        let mut snap = BoardSnapshot::empty(board_id);
        snap.columns.push(column(board_id, "To Do"));
        snap.version = 999; // ignored
        state.replace(snap);

        assert_eq!(state.version(), 1);
        assert_eq!(state.snapshot().columns.len(), 1);
        assert_eq!(rx.try_recv().unwrap(), BoardEvent::Replaced { version: 1 });
    }

    #[test]
    fn test_rollback_restores_previous() {
        let board_id = Uuid::new_v4();
        let state = LocalBoardState::new(board_id);
        state.commit(|s| s.columns.push(column(board_id, "To Do")));

        let cp = state.apply_optimistic(|s| s.columns.clear());
        assert!(state.snapshot().columns.is_empty());

        assert!(state.rollback(cp));
        let snap = state.snapshot();
        assert_eq!(snap.columns.len(), 1);
        assert_eq!(snap.version, 3);
    }

    #[test]
    fn test_rollback_skipped_after_intervening_change() {
        let board_id = Uuid::new_v4();
        let state = LocalBoardState::new(board_id);
        let cp = state.apply_optimistic(|s| s.columns.push(column(board_id, "A")));
        state.commit(|s| {
            s.tags.push(Tag {
                id: Uuid::new_v4(),
                board_id,
                name: "x".into(),
                color: None,
            })
        });

        assert!(!state.rollback(cp));
        let snap = state.snapshot();
        assert_eq!(snap.columns.len(), 1);
        assert_eq!(snap.tags.len(), 1);
    }

    #[test]
    fn test_event_sequence() {
        let board_id = Uuid::new_v4();
        let state = LocalBoardState::new(board_id);
        let mut rx = state.subscribe();

        let cp = state.apply_optimistic(|_| {});
        state.confirm(cp);
        state.commit(|_| {});

        assert_eq!(
            rx.try_recv().unwrap(),
            BoardEvent::Optimistic { version: 1 }
        );
        assert_eq!(rx.try_recv().unwrap(), BoardEvent::Confirmed { version: 1 });
        assert_eq!(rx.try_recv().unwrap(), BoardEvent::Committed { version: 2 });
    }
}
