use serde::{Deserialize, Serialize};
use std::fmt;

use super::super::game::entities::{Card, ClientView, PlayAction, SeatIndex, Username};

/// A message from a Spit client to the Spit server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ClientMessage {
    /// The name to show other players. Answers [`ServerMessage::NameRequest`].
    PlayerName(Username),
    /// The client is set up and waiting for the game to start.
    Ready,
    /// The client wants to play a card from its layout onto a center pile.
    Play(PlayAction),
    /// The client's rendering has caught up with the last move, flip, or
    /// state it was sent. The server only flips or ends the game once every
    /// client has said this.
    DoneMoving,
    /// The client has seen the game result. Only meaningful after a
    /// [`ServerMessage::GameStopped`] for a won, lost, or drawn game.
    GotResult,
    /// The client is leaving.
    Quitting,
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match &self {
            Self::PlayerName(name) => &format!("is called {name}"),
            Self::Ready => "is ready",
            Self::Play(action) => &format!("plays {action}"),
            Self::DoneMoving => "is done moving",
            Self::GotResult => "got the result",
            Self::Quitting => "is quitting",
        };
        write!(f, "{repr}")
    }
}

/// Whether a state update is the first one of the game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StateTag {
    Initial,
    New,
}

/// Who made a move, relative to the recipient.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Mover {
    Me,
    Them(SeatIndex),
}

/// Where a moved card landed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Target {
    /// A center pile.
    Mid(usize),
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StopReason {
    PlayerLeft,
    Draw,
    Won,
    Lost,
    ServerKilled,
}

impl StopReason {
    /// Whether the game reached an actual result, as opposed to being cut
    /// short. Clients acknowledge results with [`ClientMessage::GotResult`].
    #[must_use]
    pub const fn is_result(&self) -> bool {
        matches!(self, Self::Draw | Self::Won | Self::Lost)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayerLeft => "player-left",
            Self::Draw => "draw",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::ServerKilled => "server-killed",
        };
        write!(f, "{repr}")
    }
}

/// A message from the Spit server to a Spit client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ServerMessage {
    /// The address the server can be reached at, sent right after connecting.
    IpInfo(String),
    /// The server wants a [`ClientMessage::PlayerName`].
    NameRequest,
    /// Every player's name, in seat order.
    AllNames(Vec<Username>),
    /// The game as seen by the recipient.
    State(StateTag, ClientView),
    /// A card moved from a layout slot onto a target.
    Move {
        mover: Mover,
        slot: usize,
        target: Target,
    },
    /// Nobody could move, so these cards were flipped onto these piles.
    Flip { cards: Vec<Card>, piles: Vec<usize> },
    /// The recipient's play was refused.
    BadMove { slot: usize, pile: usize },
    /// The game is over. Clients must not send anything but
    /// [`ClientMessage::GotResult`] afterwards.
    GameStopped {
        reason: StopReason,
        detail: Option<String>,
    },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match &self {
            Self::IpInfo(addr) => format!("server at {addr}"),
            Self::NameRequest => "name request".to_string(),
            Self::AllNames(names) => {
                let names = names.iter().map(Username::to_string).collect::<Vec<_>>();
                format!("players: {}", names.join(", "))
            }
            Self::State(StateTag::Initial, _) => "initial state".to_string(),
            Self::State(StateTag::New, _) => "new state".to_string(),
            Self::Move {
                mover,
                slot,
                target: Target::Mid(pile),
            } => match mover {
                Mover::Me => format!("you moved slot {slot} onto pile {pile}"),
                Mover::Them(seat) => format!("seat {seat} moved slot {slot} onto pile {pile}"),
            },
            Self::Flip { cards, piles } => {
                let flips = cards
                    .iter()
                    .zip(piles)
                    .map(|(card, pile)| format!("{} onto pile {pile}", card.to_string().trim()))
                    .collect::<Vec<_>>();
                format!("flipped {}", flips.join(", "))
            }
            Self::BadMove { slot, pile } => format!("can't move slot {slot} onto pile {pile}"),
            Self::GameStopped { reason, detail } => match detail {
                Some(detail) => format!("game stopped ({reason}): {detail}"),
                None => format!("game stopped ({reason})"),
            },
        };
        write!(f, "{repr}")
    }
}
