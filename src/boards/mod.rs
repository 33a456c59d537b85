//! In-memory add/remove of card references on the named boards of an
//! aggregate. Nothing here persists; callers write the mutated aggregate back
//! with a full replace.

use thiserror::Error;

/// An aggregate holding one or more named lists of card ids.
pub trait Boards {
    /// Board names accepted by `board` / `board_mut`, in display order.
    const BOARDS: &'static [&'static str];

    fn board(&self, name: &str) -> Option<&Vec<String>>;

    fn board_mut(&mut self, name: &str) -> Option<&mut Vec<String>>;

    /// Every reference across all boards, board by board.
    fn all_references(&self) -> Vec<String> {
        Self::BOARDS
            .iter()
            .filter_map(|name| self.board(name))
            .flatten()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("unknown board '{board}' (expected one of: {expected})")]
    UnknownBoard { board: String, expected: String },
}

impl BoardError {
    fn unknown<A: Boards>(board: &str) -> Self {
        BoardError::UnknownBoard {
            board: board.to_string(),
            expected: A::BOARDS.join(", "),
        }
    }
}

/// Check that `board` names a board of `A`.
pub fn ensure_board<A: Boards>(board: &str) -> Result<(), BoardError> {
    if A::BOARDS.contains(&board) {
        Ok(())
    } else {
        Err(BoardError::unknown::<A>(board))
    }
}

/// Append `ids` to `board`. Ids already present are appended again; duplicate
/// policy is enforced during validation. Returns the number appended.
pub fn add_references<A: Boards>(aggregate: &mut A, board: &str, ids: &[String]) -> Result<usize, BoardError> {
    let target = aggregate
        .board_mut(board)
        .ok_or_else(|| BoardError::unknown::<A>(board))?;

    target.extend(ids.iter().cloned());
    Ok(ids.len())
}

/// Remove the first occurrence of each of `ids` from `board`. Ids that are not
/// on the board are skipped. Returns the number actually removed.
pub fn remove_references<A: Boards>(aggregate: &mut A, board: &str, ids: &[String]) -> Result<usize, BoardError> {
    let target = aggregate
        .board_mut(board)
        .ok_or_else(|| BoardError::unknown::<A>(board))?;

    let mut removed = 0;
    for id in ids {
        if let Some(pos) = target.iter().position(|existing| existing == id) {
            target.remove(pos);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardSet, Deck};

    const A: &str = "6f2c1a52-4a4e-5d6b-9c1e-0c4f5b2a7d10";
    const B: &str = "0b1d6f0e-7c3a-5e2b-a4d9-3e8f1c2b5a60";

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn add_then_remove_restores_board() {
        let mut deck = Deck {
            code: "ABC".into(),
            main_board: ids(&[B]),
            ..Default::default()
        };
        let original = deck.main_board.clone();

        assert_eq!(add_references(&mut deck, "mainBoard", &ids(&[A])).unwrap(), 1);
        assert_eq!(deck.main_board, ids(&[B, A]));

        assert_eq!(remove_references(&mut deck, "mainBoard", &ids(&[A])).unwrap(), 1);
        assert_eq!(deck.main_board, original);
    }

    #[test]
    fn add_does_not_reject_present_ids() {
        let mut deck = Deck {
            side_board: ids(&[A]),
            ..Default::default()
        };
        assert_eq!(add_references(&mut deck, "sideBoard", &ids(&[A])).unwrap(), 1);
        assert_eq!(deck.side_board, ids(&[A, A]));
    }

    #[test]
    fn remove_takes_first_occurrence_only() {
        let mut deck = Deck {
            commander: ids(&[A, B, A]),
            ..Default::default()
        };
        assert_eq!(remove_references(&mut deck, "commander", &ids(&[A])).unwrap(), 1);
        assert_eq!(deck.commander, ids(&[B, A]));
    }

    #[test]
    fn remove_counts_only_present_ids() {
        let mut deck = Deck {
            main_board: ids(&[A]),
            ..Default::default()
        };
        let removed = remove_references(&mut deck, "mainBoard", &ids(&[B, A, A])).unwrap();
        assert_eq!(removed, 1);
        assert!(deck.main_board.is_empty());
    }

    #[test]
    fn unknown_board_is_an_error() {
        let mut deck = Deck::default();
        let err = add_references(&mut deck, "maybeBoard", &ids(&[A])).unwrap_err();
        assert_eq!(
            err,
            BoardError::UnknownBoard {
                board: "maybeBoard".into(),
                expected: "mainBoard, sideBoard, commander".into(),
            }
        );
        assert!(remove_references(&mut deck, "contentIds", &ids(&[A])).is_err());

        let mut set = CardSet::default();
        assert!(add_references(&mut set, "mainBoard", &ids(&[A])).is_err());
        assert_eq!(add_references(&mut set, "contentIds", &ids(&[A, B])).unwrap(), 2);
        assert_eq!(set.content_ids, ids(&[A, B]));
    }

    #[test]
    fn all_references_walks_every_board() {
        let deck = Deck {
            main_board: ids(&[A]),
            side_board: ids(&[B]),
            commander: ids(&[A]),
            ..Default::default()
        };
        assert_eq!(deck.all_references(), ids(&[A, B, A]));
        assert!(ensure_board::<Deck>("sideBoard").is_ok());
        assert!(ensure_board::<CardSet>("sideBoard").is_err());
    }
}
