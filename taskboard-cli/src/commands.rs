/// Line commands for the board: parsing and dispatch onto a `BoardSession`.
///
/// Grammar:
///   create|cr <title> [in <column>]
///   move|mv <title> to <column> [at <n>]
///   delete|dl <title>
///   history|hi <title>
///   list|l
///   help|h
///   quit|exit
///
/// Positions given with `at` are 1-based, matching what `list` prints.
use std::fmt::Write as _;

use taskboard_core::types::{BoardSnapshot, CardDraft, CardWithTags};
use taskboard_core::BoardSession;

use crate::error::CliError;

pub const USAGE: &str = "\
Commands:
  create|cr <title> [in <column>]        add a card (default: first column)
  move|mv <title> to <column> [at <n>]   move a card (default: end of column)
  delete|dl <title>                      delete a card
  history|hi <title>                     show a card's column moves
  list|l                                 show the board
  help|h                                 show this help
  quit|exit                              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        title: String,
        column: Option<String>,
    },
    Move {
        title: String,
        column: String,
        position: Option<usize>,
    },
    Delete { title: String },
    History { title: String },
    List,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CliError> {
    parse_tokens(&split_tokens(line))
}

/// Parse already split words, e.g. the process arguments.
pub fn parse_tokens(tokens: &[String]) -> Result<Option<Command>, CliError> {
    let Some((verb, rest)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match verb.to_lowercase().as_str() {
        "create" | "cr" => {
            let (title, column) = split_at_keyword(rest, "in");
            let title = required(title, "create <title> [in <column>]")?;
            let column = match column {
                Some(words) => Some(required(words, "create <title> in <column>")?),
                None => None,
            };
            Command::Create { title, column }
        }
        "move" | "mv" => {
            const MOVE_USAGE: &str = "move <title> to <column> [at <n>]";
            let (title, target) = split_at_keyword(rest, "to");
            let title = required(title, MOVE_USAGE)?;
            let Some(target) = target else {
                return Err(CliError::Usage(format!("usage: {}", MOVE_USAGE)));
            };
            let (column, at) = split_at_keyword(target, "at");
            let column = required(column, MOVE_USAGE)?;
            let position = match at {
                Some(words) => Some(parse_position(&required(words, MOVE_USAGE)?)?),
                None => None,
            };
            Command::Move {
                title,
                column,
                position,
            }
        }
        "delete" | "dl" => Command::Delete {
            title: required(rest, "delete <title>")?,
        },
        "history" | "hi" => Command::History {
            title: required(rest, "history <title>")?,
        },
        "list" | "l" => Command::List,
        "help" | "h" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CliError::UnknownCommand(verb.clone())),
    };
    Ok(Some(command))
}

/// Split on whitespace, honouring double quotes and backslash escapes.
fn split_tokens(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            in_quotes = !in_quotes;
            if !in_quotes && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(ch);
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split `tokens` at the first `keyword` (case-insensitive) after the
/// leading word. Titles containing the keyword must be quoted.
fn split_at_keyword<'a>(
    tokens: &'a [String],
    keyword: &str,
) -> (&'a [String], Option<&'a [String]>) {
    let found = tokens
        .iter()
        .skip(1)
        .position(|t| t.eq_ignore_ascii_case(keyword));
    match found {
        Some(i) => (&tokens[..=i], Some(&tokens[i + 2..])),
        None => (tokens, None),
    }
}

fn required(words: &[String], usage: &str) -> Result<String, CliError> {
    let joined = words.join(" ");
    if joined.trim().is_empty() {
        return Err(CliError::Usage(format!("usage: {}", usage)));
    }
    Ok(joined)
}

fn parse_position(raw: &str) -> Result<usize, CliError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CliError::Usage(format!(
            "position must be a number starting at 1, got {:?}",
            raw
        ))),
    }
}

/// What the loop should do after a command ran.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

pub async fn execute(session: &BoardSession, command: Command) -> Result<Outcome, CliError> {
    let message = match command {
        Command::Create { title, column } => {
            let snapshot = session.snapshot();
            let column = match column {
                Some(name) => session
                    .find_column_by_name(&name)
                    .ok_or(CliError::ColumnNotFound(name))?,
                None => snapshot
                    .columns
                    .first()
                    .map(|c| c.column.clone())
                    .ok_or(CliError::NoColumns)?,
            };
            let card = session.add_card(column.id, CardDraft::titled(title)).await?;
            format!("Created {:?} in {}", card.card.title, column.name)
        }
        Command::Move {
            title,
            column,
            position,
        } => {
            let card = find_card(session, &title)?;
            let dest = session
                .find_column_by_name(&column)
                .ok_or(CliError::ColumnNotFound(column))?;
            let snapshot = session.snapshot();
            let dest_len = snapshot.column(dest.id).map_or(0, |c| c.cards.len());
            let same_column = card.card.column_id == dest.id;

            // Within a column the card itself occupies one slot.
            let last = if same_column {
                dest_len.saturating_sub(1)
            } else {
                dest_len
            };
            let to_index = position.map_or(last, |n| (n - 1).min(last));

            if same_column {
                let from_index = snapshot
                    .column(dest.id)
                    .and_then(|c| c.index_of(card.id()))
                    .unwrap_or(to_index);
                session
                    .reorder_card(dest.id, card.id(), from_index, to_index)
                    .await?;
            } else {
                session
                    .move_card(card.id(), card.card.column_id, dest.id, to_index)
                    .await?;
            }
            format!(
                "Moved {:?} to {} at {}",
                card.card.title,
                dest.name,
                to_index + 1
            )
        }
        Command::Delete { title } => {
            let card = find_card(session, &title)?;
            session.delete_card(card.id()).await?;
            format!("Deleted {:?}", card.card.title)
        }
        Command::History { title } => {
            let card = find_card(session, &title)?;
            let entries = session.card_history(card.id()).await?;
            if entries.is_empty() {
                format!("{:?} has not moved", card.card.title)
            } else {
                let mut out = String::new();
                for entry in entries {
                    let _ = writeln!(
                        out,
                        "{}  {} -> {}",
                        entry.moved_at.format("%Y-%m-%d %H:%M"),
                        entry.from_column,
                        entry.to_column
                    );
                }
                out.trim_end().to_string()
            }
        }
        Command::List => render(&session.snapshot()),
        Command::Help => USAGE.to_string(),
        Command::Quit => return Ok(Outcome::Quit),
    };
    Ok(Outcome::Continue(message))
}

fn find_card(session: &BoardSession, title: &str) -> Result<CardWithTags, CliError> {
    session
        .find_card_by_title(title)
        .ok_or_else(|| CliError::CardNotFound(title.to_string()))
}

/// Plain-text board: one block per column, cards numbered from 1.
pub fn render(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();
    for view in &snapshot.columns {
        let _ = writeln!(out, "{} ({})", view.column.name, view.cards.len());
        for (idx, card) in view.cards.iter().enumerate() {
            let _ = write!(out, "  {}. {}", idx + 1, card.card.title);
            if !card.tags.is_empty() {
                let names: Vec<&str> = card.tags.iter().map(|t| t.name.as_str()).collect();
                let _ = write!(out, " [{}]", names.join(", "));
            }
            if let Some(due) = card.card.due_date {
                let _ = write!(out, " (due {})", due);
            }
            out.push('\n');
        }
    }
    if out.is_empty() {
        out.push_str("(no columns)");
    }
    out.trim_end().to_string()
}
