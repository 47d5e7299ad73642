/// Number of cards in a fresh (unshuffled) deck.
pub const DECK_SIZE: usize = 52;

/// Highest card rank (king). Aces are rank 1.
pub const MAX_RANK: u8 = 13;

/// Rank distance between an ace and a king. Aces play both high and low,
/// so this distance counts as adjacent just like a distance of 1.
pub const WRAPAROUND_DISTANCE: u8 = MAX_RANK - 1;

pub const DEFAULT_NUM_PLAYERS: usize = 2;
pub const DEFAULT_NUM_GAME_PILES: usize = 2;
pub const DEFAULT_LAYOUT_SIZE: usize = 4;

/// Upper bound on players in one session. Each player brings their own deck,
/// so this is a protocol/UI limit rather than a card-count one.
pub const MAX_PLAYERS: usize = 4;

/// Display names longer than this are truncated.
pub const MAX_NAME_LENGTH: usize = 32;
