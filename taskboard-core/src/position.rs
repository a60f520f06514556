/// Position allocation for cards within a column.
///
/// Every call site renumbers the whole affected column, so gaps left by the
/// stride are never relied on. Positions start at 0 and grow by `stride`.
use crate::types::{CardId, CardPlacement, ColumnId};

/// Largest accepted stride; leaves room for billions of cards per column
/// before a position could leave `i64`.
pub const MAX_STRIDE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionAllocator {
    stride: i64,
}

impl Default for PositionAllocator {
    fn default() -> Self {
        Self { stride: 1 }
    }
}

impl PositionAllocator {
    /// The stride is clamped to `1..=MAX_STRIDE`.
    pub fn new(stride: i64) -> Self {
        Self {
            stride: stride.clamp(1, MAX_STRIDE),
        }
    }

    pub fn stride(&self) -> i64 {
        self.stride
    }

    /// Move `placed` to `target_index` (clamped to `[0, len]`) within
    /// `ordered` and number the resulting sequence. If `placed` is not in
    /// the sequence it is inserted. An empty sequence yields nothing.
    pub fn allocate(
        &self,
        ordered: &[CardId],
        placed: CardId,
        target_index: usize,
    ) -> Vec<(CardId, i64)> {
        if ordered.is_empty() {
            return Vec::new();
        }
        self.renumber(&reinsert(ordered, placed, target_index))
    }

    /// Number a sequence in order, 0-indexed.
    pub fn renumber(&self, ordered: &[CardId]) -> Vec<(CardId, i64)> {
        ordered
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, self.position_at(i)))
            .collect()
    }

    /// Position for the card at `index` of a freshly numbered column; used
    /// to append without renumbering.
    pub fn position_at(&self, index: usize) -> i64 {
        i64::try_from(index)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.stride)
    }

    /// Same as [`renumber`](Self::renumber) but shaped as store writes.
    pub fn placements(&self, column_id: ColumnId, ordered: &[CardId]) -> Vec<CardPlacement> {
        self.renumber(ordered)
            .into_iter()
            .map(|(id, position)| CardPlacement {
                id,
                column_id,
                position,
            })
            .collect()
    }
}

/// Remove `placed` from its slot (if any) and insert it at the clamped index.
pub fn reinsert(ordered: &[CardId], placed: CardId, target_index: usize) -> Vec<CardId> {
    let mut seq: Vec<CardId> = ordered.iter().copied().filter(|id| *id != placed).collect();
    let index = target_index.min(seq.len());
    seq.insert(index, placed);
    seq
}
