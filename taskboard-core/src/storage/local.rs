/// Local filesystem store.
///
/// Keeps every collection in one JSON document with:
/// - Atomic writes (write to .tmp, fsync, rename, fsync directory)
/// - SHA-256 content hash to notice edits made by another process
/// - A write mutex so one write is in flight at a time
///
/// When the file changed on disk since we last read or wrote it, the write
/// is applied on top of the disk content rather than our cached copy, which
/// gives last-writer-wins per row instead of clobbering the whole file.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::dataset::Dataset;
use super::{BoardStore, StoreError};
use crate::types::*;

struct Cached {
    data: Dataset,
    /// SHA-256 of the last content read or written
    content_hash: String,
}

pub struct JsonFileStore {
    path: PathBuf,
    cached: RwLock<Cached>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonFileStore {
    /// Open (or start) a store at `path`. A missing file is an empty store;
    /// it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let (data, content_hash) = match fs::read_to_string(&path) {
            Ok(content) => (Self::parse(&content)?, Self::content_hash(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    target: "taskboard.storage.local",
                    "No data file at {}, starting empty",
                    path.display()
                );
                (Dataset::default(), String::new())
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            cached: RwLock::new(Cached { data, content_hash }),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(content: &str) -> Result<Dataset, StoreError> {
        if content.trim().is_empty() {
            return Ok(Dataset::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Compute SHA-256 hash of content (for change detection).
    fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.replace("\r\n", "\n").as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Latest data: the cache, or the disk copy if someone else wrote it.
    fn current(&self) -> Result<Dataset, StoreError> {
        let disk = match fs::read_to_string(&self.path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let cached = self.cached.read().unwrap_or_else(|e| e.into_inner());
        match disk {
            Some(content) if Self::content_hash(&content) != cached.content_hash => {
                log::info!(
                    target: "taskboard.storage.local",
                    "{} changed on disk, reloading before write",
                    self.path.display()
                );
                Self::parse(&content)
            }
            _ => Ok(cached.data.clone()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Dataset) -> R) -> Result<R, StoreError> {
        Ok(f(&self.current()?))
    }

    /// Apply one mutation and persist it. Nothing is written if `f` fails.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut Dataset) -> Result<R,
        StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut data = self.current()?;
        let result = f(&mut data)?;
        let content = serde_json::to_string_pretty(&data)?;
        Self::atomic_write(&self.path, &content)?;
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = Cached {
            data,
            content_hash: Self::content_hash(&content),
        };
        Ok(result)
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    /// Refuses to write empty content over a non-empty file.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if content.trim().is_empty() {
            if let Ok(existing) = fs::read_to_string(path) {
                if !existing.trim().is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Refusing to overwrite non-empty file with empty content",
                    ));
                }
            }
        }

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let tmp_path = path.with_extension("taskboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BoardStore for JsonFileStore {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        self.read(|d| d.list_boards())
    }

    async fn fetch_board(&self, board_id: BoardId) -> Result<Option<Board>, StoreError> {
        self.read(|d| d.fetch_board(board_id))
    }

    async fn insert_board(&self, board: NewBoard) -> Result<Board, StoreError> {
        self.write(|d| Ok(d.insert_board(board)))
    }

    async fn list_columns(&self, board_id: BoardId) -> Result<Vec<Column>, StoreError> {
        self.read(|d| d.list_columns(board_id))
    }

    async fn fetch_columns(&self, ids: &[ColumnId]) -> Result<Vec<Column>, StoreError> {
        self.read(|d| d.fetch_columns(ids))
    }

    async fn insert_column(&self, column: NewColumn) -> Result<Column, StoreError> {
        self.write(|d| d.insert_column(column))
    }

    async fn rename_column(&self, id: ColumnId, name: &str) -> Result<Column, StoreError> {
        self.write(|d| d.rename_column(id, name))
    }

    async fn delete_column(&self, id: ColumnId) -> Result<(), StoreError> {
        self.write(|d| d.delete_column(id))
    }

    async fn list_cards(&self, column_ids: &[ColumnId]) -> Result<Vec<CardWithTags>, StoreError> {
        self.read(|d| d.list_cards(column_ids))
    }

    async fn insert_card(&self, card: NewCard) -> Result<Card, StoreError> {
        self.write(|d| d.insert_card(card))
    }

    async fn update_card(&self, id: CardId, patch: CardPatch) -> Result<Card, StoreError> {
        self.write(|d| d.update_card(id, patch))
    }

    async fn update_card_placements(&self, placements: &[CardPlacement]) -> Result<(), StoreError> {
        self.write(|d| d.update_card_placements(placements))
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StoreError> {
        self.write(|d| d.delete_card(id))
    }

    async fn delete_cards_in_column(&self, column_id: ColumnId) -> Result<(), StoreError> {
        self.write(|d| {
            d.delete_cards_in_column(column_id);
            Ok(())
        })
    }

    async fn list_tags(&self, board_id: BoardId) -> Result<Vec<Tag>, StoreError> {
        self.read(|d| d.list_tags(board_id))
    }

    async fn insert_tag(&self, tag: NewTag) -> Result<Tag, StoreError> {
        self.write(|d| d.insert_tag(tag))
    }

    async fn delete_tag(&self, id: TagId) -> Result<(), StoreError> {
        self.write(|d| d.delete_tag(id))
    }

    async fn card_tag_ids(&self, card_id: CardId) -> Result<Vec<TagId>, StoreError> {
        self.read(|d| d.card_tag_ids(card_id))
    }

    async fn insert_card_tags(&self, pairs: &[CardTagAssociation]) -> Result<(), StoreError> {
        if pairs.is_empty() {
            return Ok(());
        }
        self.write(|d| d.insert_card_tags(pairs))
    }

    async fn delete_card_tags(&self, card_id: CardId) -> Result<(), StoreError> {
        self.write(|d| {
            d.delete_card_tags(card_id);
            Ok(())
        })
    }

    async fn append_history(&self, entry: NewHistory) -> Result<CardHistory, StoreError> {
        self.write(|d| Ok(d.append_history(entry)))
    }

    async fn list_history(&self, card_id: CardId) -> Result<Vec<CardHistory>, StoreError> {
        self.read(|d| d.list_history(card_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn seeded(store: &JsonFileStore) -> (BoardId, ColumnId) {
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
        (board.id, column.id)
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("board.json")).unwrap();
        assert!(store.list_boards().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("board.json");
        let (board_id, column_id) = {
            let store = JsonFileStore::open(&path).unwrap();
            seeded(&store).await
        };

        let reopened = JsonFileStore::open(&path).unwrap();
        let columns = reopened.list_columns(board_id).await.unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].id, column_id);
        assert!(!path.with_extension("taskboard.tmp").exists());
    }

    #[tokio::test]
    async fn test_external_edit_is_picked_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let first = JsonFileStore::open(&path).unwrap();
        let second = JsonFileStore::open(&path).unwrap();
        let (board_id, _) = seeded(&first).await;

        // `second` cached an empty dataset but must see the new board and
        // keep it when it writes.
        second
            .insert_tag(NewTag {
                board_id,
                name: "bug".into(),
                color: None,
            })
            .await
            .unwrap();

        assert_eq!(first.list_tags(board_id).await.unwrap().len(), 1);
        assert_eq!(first.list_columns(board_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let store = JsonFileStore::open(&path).unwrap();
        seeded(&store).await;
        let before = fs::read_to_string(&path).unwrap();

        let result = store
            .update_card_placements(&[CardPlacement {
                id: uuid::Uuid::new_v4(),
                column_id: uuid::Uuid::new_v4(),
                position: 0,
            }])
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_refuses_empty_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        fs::write(&path, "{}").unwrap();
        assert!(JsonFileStore::atomic_write(&path, "  ").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }
}
