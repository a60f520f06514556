/// Card ↔ tag association reconciliation.
///
/// The UI always submits a card's complete tag set, so a reconcile replaces
/// the card's associations wholesale: delete all existing rows, then insert
/// exactly the desired set. Unchanged rows get rewritten, but a shrinking
/// set can never leave an orphaned association behind. The delta is still
/// computed and returned for logging and callers that care.
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::storage::{BoardStore, StoreError};
use crate::types::{CardId, CardTagAssociation, TagId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    pub added: Vec<TagId>,
    pub removed: Vec<TagId>,
}

impl TagDelta {
    pub fn between(current: &[TagId], desired: &[TagId]) -> Self {
        let current: BTreeSet<TagId> = current.iter().copied().collect();
        let desired: BTreeSet<TagId> = desired.iter().copied().collect();
        Self {
            added: desired.difference(&current).copied().collect(),
            removed: current.difference(&desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone)]
pub struct TagReconciler {
    store: Arc<dyn BoardStore>,
}

impl TagReconciler {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self { store }
    }

    /// Make the card's associations exactly `desired`.
    ///
    /// The delete step is skipped when `current` is empty (a freshly created
    /// card); the insert step is skipped when `desired` is empty.
    pub async fn reconcile(
        &self,
        card_id: CardId,
        current: &[TagId],
        desired: &[TagId],
    ) -> Result<TagDelta, StoreError> {
        let delta = TagDelta::between(current, desired);
        log::debug!(
            target: "taskboard.tags.reconcile",
            "card {}: +{} -{}",
            card_id,
            delta.added.len(),
            delta.removed.len()
        );

        if !current.is_empty() {
            self.store.delete_card_tags(card_id).await?;
        }

        let pairs: Vec<CardTagAssociation> = desired
            .iter()
            .copied()
            .collect::<BTreeSet<TagId>>()
            .into_iter()
            .map(|tag_id| CardTagAssociation { card_id, tag_id })
            .collect();
        if !pairs.is_empty() {
            self.store.insert_card_tags(&pairs).await?;
        }

        Ok(delta)
    }

    /// Reconcile against whatever the store currently holds for the card.
    pub async fn replace(
        &self,
        card_id: CardId,
        desired: &[TagId],
    ) -> Result<TagDelta, StoreError> {
        let current = self.store.card_tag_ids(card_id).await?;
        self.reconcile(card_id, &current, desired).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStore, StoreOp};
    use crate::types::*;

    struct Fixture {
        store: Arc<MemoryStore>,
        card: CardId,
        tags: Vec<TagId>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let board = store
            .insert_board(NewBoard {
                name: "Team".into(),
                expires_at: None,
            })
            .await
            .unwrap();
        let column = store
            .insert_column(NewColumn {
                board_id: board.id,
                name: "To Do".into(),
                position: 0,
            })
            .await
            .unwrap();
        let card = store
            .insert_card(NewCard {
                column_id: column.id,
                title: "A".into(),
                description: None,
                color: None,
                due_date: None,
                position: 0,
            })
            .await
            .unwrap();
        let mut tags = Vec::new();
        for name in ["t1", "t2", "t3"] {
            let tag = store
                .insert_tag(NewTag {
                    board_id: board.id,
                    name: name.into(),
                    color: None,
                })
                .await
                .unwrap();
            tags.push(tag.id);
        }
        Fixture {
            store,
            card: card.id,
            tags,
        }
    }

    fn sorted(mut ids: Vec<TagId>) -> Vec<TagId> {
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_replace_swaps_set() {
        let f = fixture().await;
        let reconciler = TagReconciler::new(f.store.clone());
        let (t1, t2, t3) = (f.tags[0], f.tags[1], f.tags[2]);

        reconciler.reconcile(f.card, &[], &[t1, t2]).await.unwrap();
        let delta = reconciler.replace(f.card, &[t2, t3]).await.unwrap();

        assert_eq!(delta.added, vec![t3]);
        assert_eq!(delta.removed, vec![t1]);
        assert_eq!(
            sorted(f.store.card_tag_ids(f.card).await.unwrap()),
            sorted(vec![t2, t3])
        );
    }

    #[tokio::test]
    async fn test_idempotent() {
        let f = fixture().await;
        let reconciler = TagReconciler::new(f.store.clone());
        let desired = vec![f.tags[0], f.tags[2]];

        reconciler.replace(f.card, &desired).await.unwrap();
        let once = sorted(f.store.card_tag_ids(f.card).await.unwrap());
        let delta = reconciler.replace(f.card, &desired).await.unwrap();
        let twice = sorted(f.store.card_tag_ids(f.card).await.unwrap());

        assert_eq!(once, twice);
        assert!(delta.is_empty());
    }

    #[tokio::test]
    async fn test_empty_desired_clears_without_insert() {
        let f = fixture().await;
        let reconciler = TagReconciler::new(f.store.clone());
        reconciler.reconcile(f.card, &[], &f.tags).await.unwrap();
        let inserts_before = f.store.calls(StoreOp::InsertCardTags);

        reconciler.replace(f.card, &[]).await.unwrap();

        assert!(f.store.card_tag_ids(f.card).await.unwrap().is_empty());
        assert_eq!(f.store.calls(StoreOp::InsertCardTags), inserts_before);
    }

    #[tokio::test]
    async fn test_new_card_skips_delete() {
        let f = fixture().await;
        let reconciler = TagReconciler::new(f.store.clone());
        reconciler
            .reconcile(f.card, &[], &[f.tags[0]])
            .await
            .unwrap();
        assert_eq!(f.store.calls(StoreOp::DeleteCardTags), 0);
        assert_eq!(f.store.calls(StoreOp::InsertCardTags), 1);
    }

    #[tokio::test]
    async fn test_duplicate_desired_ids_collapse() {
        let f = fixture().await;
        let reconciler = TagReconciler::new(f.store.clone());
        reconciler
            .reconcile(f.card, &[], &[f.tags[1], f.tags[1]])
            .await
            .unwrap();
        assert_eq!(f.store.card_tag_ids(f.card).await.unwrap(), vec![f.tags[1]]);
    }

    #[tokio::test]
    async fn test_insert_failure_propagates() {
        let f = fixture().await;
        let reconciler = TagReconciler::new(f.store.clone());
        f.store.fail_on(StoreOp::InsertCardTags);
        assert!(reconciler
            .reconcile(f.card, &[], &[f.tags[0]])
            .await
            .is_err());
    }
}
