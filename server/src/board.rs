//! The nine face-up slots and the position ids that name them.

use shared::{any_solution, PositionId, Token, BOARD_SIZE, SET_SIZE};

/// The face-up slots. Each slot holds a token or is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    slots: [Option<Token>; BOARD_SIZE],
}

impl Board {
    /// Lays out freshly dealt tokens in canonical order.
    pub fn dealt(tokens: Vec<Token>) -> Self {
        let mut board = Self::default();
        for (index, token) in tokens.into_iter().take(BOARD_SIZE).enumerate() {
            board.slots[index] = Some(token.placed_at(PositionId::from_index(index)));
        }
        board
    }

    pub fn slots(&self) -> &[Option<Token>] {
        &self.slots
    }

    pub fn get(&self, id: PositionId) -> Option<&Token> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Occupied slots as references, with empty slots kept in place.
    pub fn refs(&self) -> Vec<Option<&Token>> {
        self.slots.iter().map(Option::as_ref).collect()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.slots.iter().flatten()
    }

    pub fn occupied(&self) -> usize {
        self.tokens().count()
    }

    pub fn has_solution(&self) -> bool {
        any_solution(&self.refs())
    }

    /// Maps three submitted ids to slot indices. Fails when an id names no
    /// slot, names an empty slot, or is repeated.
    pub fn resolve(&self, ids: &[PositionId; SET_SIZE]) -> Option<[usize; SET_SIZE]> {
        let slots = ids.map(|id| id.index());
        let distinct = slots[0] != slots[1] && slots[1] != slots[2] && slots[0] != slots[2];
        if !distinct || ids.iter().any(|id| self.get(*id).is_none()) {
            return None;
        }
        Some(slots)
    }

    /// Puts `token` into slot `index` under that slot's id and returns what was
    /// there before.
    ///
    /// Panics if `index` is not a board slot; callers pass indices from
    /// [`Board::resolve`].
    pub fn replace(&mut self, index: usize, token: Option<Token>) -> Option<Token> {
        let id = PositionId::from_index(index);
        std::mem::replace(&mut self.slots[index], token.map(|t| t.placed_at(id)))
    }

    /// Empties every slot, returning the tokens that were on the board.
    pub fn take_all(&mut self) -> Vec<Token> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}
