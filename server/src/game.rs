use crate::board::Board;
use crate::deck::{Deck, DeckError};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use shared::{any_solution, validate, PositionId, Status, Token, BOARD_SIZE, SET_SIZE};

/// Redeals tried before a pool is declared unplayable.
const MAX_DEAL_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The ids did not name a set on the current board.
    Rejected,
    /// The set was taken and the board is playable.
    Accepted,
    /// The set was taken and no playable board can be dealt anymore.
    GameOver,
}

/// Authoritative deck and board.
///
/// Every token of the universe is always in exactly one of the deck, the board
/// or the discard pile of matched sets.
pub struct GameState {
    deck: Deck,
    board: Board,
    discard: Vec<Token>,
    last_set: Option<Vec<Token>>,
    status: Status,
}

impl GameState {
    /// Shuffles a full deck and deals the first solvable board.
    pub fn new(rng: StdRng) -> Self {
        let mut game = Self {
            deck: Deck::new(rng),
            board: Board::default(),
            discard: Vec::new(),
            last_set: None,
            status: Status::Alive,
        };
        game.setup();
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn discard(&self) -> &[Token] {
        &self.discard
    }

    /// The most recently matched set, with the ids it was taken from.
    pub fn last_set(&self) -> Option<&[Token]> {
        self.last_set.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Deals boards until one holds a set. Starts over from a fresh deck when
    /// the remaining pool cannot produce one.
    pub fn setup(&mut self) {
        let mut attempts = 0;
        loop {
            match self.deal_board() {
                Ok(true) => break,
                Ok(false) if attempts < MAX_DEAL_ATTEMPTS => attempts += 1,
                Ok(false) => {
                    warn!("No playable board after {} deals, regenerating deck", attempts);
                    self.regenerate();
                    attempts = 0;
                }
                Err(e) => {
                    warn!("{}, regenerating deck", e);
                    self.regenerate();
                    attempts = 0;
                }
            }
        }
        self.status = Status::Alive;
        debug!("Dealt board, {} tokens left in deck", self.deck.len());
    }

    /// Regenerates the full deck and deals a new board. Scores are not the
    /// game's concern and survive a restart.
    pub fn restart(&mut self) {
        info!("Restarting game with a fresh deck");
        self.regenerate();
        self.last_set = None;
        self.setup();
    }

    /// Checks a submitted triple against the current board and, if it is a
    /// set, takes it.
    pub fn submit(&mut self, ids: &[PositionId; SET_SIZE]) -> MoveOutcome {
        if self.status == Status::Dead {
            return MoveOutcome::Rejected;
        }

        let Some(slots) = self.board.resolve(ids) else {
            return MoveOutcome::Rejected;
        };
        let refs = self.board.refs();
        if !validate(&slots.map(|index| refs[index])) {
            return MoveOutcome::Rejected;
        }

        match self.advance(slots) {
            Status::Alive => MoveOutcome::Accepted,
            Status::Dead => MoveOutcome::GameOver,
        }
    }

    /// Replaces the tokens in `slots` (already confirmed to be a set) with
    /// draws from the deck, then replenishes the board if no set is left.
    pub fn advance(&mut self, slots: [usize; SET_SIZE]) -> Status {
        let mut matched = Vec::with_capacity(SET_SIZE);
        for index in slots {
            let replacement = self.deck.draw();
            if let Some(token) = self.board.replace(index, replacement) {
                matched.push(token);
            }
        }

        self.discard.extend(matched.iter().cloned().map(Token::lifted));
        self.last_set = Some(matched);

        self.status = if self.board.has_solution() {
            Status::Alive
        } else {
            self.replenish()
        };

        if self.status == Status::Dead {
            info!(
                "Game over: {} tokens on board, {} in deck, {} matched",
                self.board.occupied(),
                self.deck.len(),
                self.discard.len()
            );
        }
        self.status
    }

    /// Pools the board back into the deck and redeals until a set shows up.
    /// The board is left untouched when the game cannot continue.
    fn replenish(&mut self) -> Status {
        if self.deck.len() < BOARD_SIZE {
            return Status::Dead;
        }

        let pool_playable = {
            let pool: Vec<Option<&Token>> =
                self.deck.tokens().chain(self.board.tokens()).map(Some).collect();
            any_solution(&pool)
        };
        if !pool_playable {
            return Status::Dead;
        }

        for _ in 0..MAX_DEAL_ATTEMPTS {
            match self.deal_board() {
                Ok(true) => {
                    debug!("Replenished board, {} tokens left in deck", self.deck.len());
                    return Status::Alive;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Replenishing failed: {}", e);
                    return Status::Dead;
                }
            }
        }
        Status::Dead
    }

    /// Returns the board to the deck, shuffles and deals nine. `Ok(true)` when
    /// the new board holds a set.
    fn deal_board(&mut self) -> Result<bool, DeckError> {
        self.deck.give_back(self.board.take_all());
        self.deck.shuffle();
        self.board = Board::dealt(self.deck.deal(BOARD_SIZE)?);
        Ok(self.board.has_solution())
    }

    fn regenerate(&mut self) {
        self.board = Board::default();
        self.discard.clear();
        self.deck.reset();
    }
}
