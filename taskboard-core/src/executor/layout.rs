use std::collections::{BTreeSet, HashMap};

use crate::types::{BoardSnapshot, CardId, CardPlacement, CardWithTags, ColumnId};

/// Apply placements to a snapshot in one pass: pull every placed card out of
/// whatever column holds it, drop it into its target column with the new
/// position, then re-sort the touched columns. A placement naming a card or
/// column the snapshot doesn't have is ignored, and a card is never dropped.
pub(crate) fn apply_placements(snap: &mut BoardSnapshot, placements: &[CardPlacement]) {
    let placed: HashMap<CardId, &CardPlacement> = placements.iter().map(|p| (p.id, p)).collect();
    let known_columns: BTreeSet<ColumnId> = snap.columns.iter().map(|c| c.column.id).collect();
    let mut touched: BTreeSet<ColumnId> = BTreeSet::new();
    let mut moving: Vec<CardWithTags> = Vec::new();

    for view in &mut snap.columns {
        let column_id = view.column.id;
        let mut kept = Vec::with_capacity(view.cards.len());
        for card in view.cards.drain(..) {
            match placed.get(&card.card.id) {
                Some(p) if known_columns.contains(&p.column_id) => {
                    touched.insert(column_id);
                    moving.push(card);
                }
                _ => kept.push(card),
            }
        }
        view.cards = kept;
    }

    for mut card in moving {
        let Some(p) = placed.get(&card.card.id) else {
            continue;
        };
        card.card.column_id = p.column_id;
        card.card.position = p.position;
        touched.insert(p.column_id);
        if let Some(view) = snap.column_mut(p.column_id) {
            view.cards.push(card);
        }
    }

    for column_id in touched {
        if let Some(view) = snap.column_mut(column_id) {
            view.cards.sort_by_key(|c| c.card.position);
        }
    }
}

/// Whether the snapshot already matches every placement.
pub(crate) fn is_noop(snap: &BoardSnapshot, placements: &[CardPlacement]) -> bool {
    placements.iter().all(|p| {
        snap.card(p.id)
            .is_some_and(|c| c.card.column_id == p.column_id && c.card.position == p.position)
    })
}
