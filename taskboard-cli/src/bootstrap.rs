/// Startup: find (or create) the configured board and open a session on it.
use std::sync::Arc;

use chrono::Utc;
use taskboard_core::types::{NewBoard, NewColumn};
use taskboard_core::{BoardSession, BoardStore, EngineConfig};

use crate::error::CliError;

/// Open the board called `name`, creating it with `columns` if no board
/// has that name yet. Expired boards are refused.
pub async fn open_board(
    store: Arc<dyn BoardStore>,
    name: &str,
    columns: &[String],
    engine: &EngineConfig,
) -> Result<BoardSession, CliError> {
    let existing = store
        .list_boards()
        .await?
        .into_iter()
        .find(|b| b.name == name);

    let board = match existing {
        Some(board) => board,
        None => {
            log::info!(target: "taskboard.cli.bootstrap", "Creating board {:?}", name);
            let board = store
                .insert_board(NewBoard {
                    name: name.to_string(),
                    expires_at: None,
                })
                .await?;
            for (position, column) in columns.iter().enumerate() {
                store
                    .insert_column(NewColumn {
                        board_id: board.id,
                        name: column.clone(),
                        position: position as i64,
                    })
                    .await?;
            }
            board
        }
    };

    if board.is_expired(Utc::now()) {
        return Err(CliError::BoardExpired(board.name));
    }

    Ok(BoardSession::open(store, board.id, engine).await?)
}
