//! The reserve pool of tokens that are not on the board.

use derive_more::{Display, Error};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use shared::{PositionId, Token};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DeckError {
    #[display("cannot deal {requested} tokens, only {available} left in the deck")]
    Insufficient { requested: usize, available: usize },
}

/// Tokens waiting to be dealt, drawn from the front.
///
/// The deck owns its random source so shuffles are reproducible when it is
/// seeded with a fixed value.
pub struct Deck {
    tokens: VecDeque<Token>,
    rng: StdRng,
}

impl Deck {
    /// Creates a full, shuffled deck.
    pub fn new(rng: StdRng) -> Self {
        let mut deck = Self {
            tokens: VecDeque::new(),
            rng,
        };
        deck.reset();
        deck
    }

    /// Replaces the contents with the complete token universe, shuffled.
    pub fn reset(&mut self) {
        self.tokens = Token::universe().into();
        self.shuffle();
        debug!("Deck reset to {} tokens", self.tokens.len());
    }

    pub fn shuffle(&mut self) {
        self.tokens.make_contiguous().shuffle(&mut self.rng);
    }

    /// Removes the front token. `None` once the deck runs dry.
    pub fn draw(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    /// Removes the front `n` tokens, labelling them with position ids in
    /// canonical order. Nothing is consumed when fewer than `n` remain.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Token>, DeckError> {
        if self.tokens.len() < n {
            return Err(DeckError::Insufficient {
                requested: n,
                available: self.tokens.len(),
            });
        }

        Ok(self
            .tokens
            .drain(..n)
            .enumerate()
            .map(|(index, token)| token.placed_at(PositionId::from_index(index)))
            .collect())
    }

    /// Puts tokens back at the end of the deck with their positions cleared.
    pub fn give_back(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.tokens.extend(tokens.into_iter().map(Token::lifted));
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
