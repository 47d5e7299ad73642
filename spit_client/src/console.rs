//! Plain terminal rendering of a game in progress.

use spit::{
    Frontend, Username,
    entities::SeatIndex,
    messages::{ClientMessage, Mover, ServerMessage, StateTag, StopReason, Target},
    net::driver::IntentQueue,
};

use super::commands::COMMANDS_HELP;

/// Prints everything the server says and acknowledges animation cues as
/// soon as they're printed.
#[derive(Debug, Default)]
pub struct Console {
    names: Vec<Username>,
}

impl Console {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&self, seat: SeatIndex) -> String {
        self.names
            .get(seat)
            .map_or_else(|| format!("seat {seat}"), Username::to_string)
    }

    /// One line describing a server message, or nothing for messages that
    /// have their own rendering.
    #[must_use]
    pub fn describe(&self, msg: &ServerMessage) -> Option<String> {
        let line = match msg {
            ServerMessage::IpInfo(addr) => format!("connected to the server at {addr}"),
            ServerMessage::NameRequest => return None,
            ServerMessage::AllNames(names) => {
                let names = names.iter().map(Username::to_string).collect::<Vec<_>>();
                format!("players: {}", names.join(" vs "))
            }
            ServerMessage::State(..) => return None,
            ServerMessage::Move {
                mover,
                slot,
                target: Target::Mid(pile),
            } => match mover {
                Mover::Me => format!("you moved slot {slot} onto pile {pile}"),
                Mover::Them(seat) => {
                    format!("{} moved slot {slot} onto pile {pile}", self.name(*seat))
                }
            },
            ServerMessage::Flip { .. } => format!("nobody could move! {msg}"),
            ServerMessage::BadMove { slot, pile } => {
                format!("slot {slot} can't go onto pile {pile}")
            }
            ServerMessage::GameStopped { reason, detail } => {
                result_screen(*reason, detail.as_deref())
            }
        };
        Some(line)
    }
}

/// What the player sees when the game is over, for every way it can end.
#[must_use]
pub fn result_screen(reason: StopReason, detail: Option<&str>) -> String {
    let headline = match reason {
        StopReason::Won => "YOU WIN!".to_string(),
        StopReason::Lost => match detail {
            Some(winner) => format!("You lose, {winner} won."),
            None => "You lose.".to_string(),
        },
        StopReason::Draw => "It's a draw.".to_string(),
        StopReason::PlayerLeft => match detail {
            Some(name) => format!("{name} left the game."),
            None => "A player left the game.".to_string(),
        },
        StopReason::ServerKilled => "The server shut down.".to_string(),
    };
    match (reason, detail) {
        (StopReason::Won, Some(detail)) => format!("*** {headline} {detail} ***"),
        _ => format!("*** {headline} ***"),
    }
}

impl Frontend for Console {
    fn on_message(&mut self, msg: &ServerMessage, intents: &IntentQueue) {
        if let ServerMessage::AllNames(names) = msg {
            self.names = names.clone();
        }
        if let Some(line) = self.describe(msg) {
            println!("{line}");
        }
        match msg {
            ServerMessage::State(tag, view) => {
                if *tag == StateTag::Initial {
                    println!("{COMMANDS_HELP}");
                    intents.push(ClientMessage::DoneMoving);
                }
                println!("{view}\n");
            }
            ServerMessage::Move { .. }
            | ServerMessage::Flip { .. }
            | ServerMessage::BadMove { .. } => intents.push(ClientMessage::DoneMoving),
            ServerMessage::GameStopped { .. } => println!("(press enter to exit)"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stop_reason_has_a_screen() {
        for reason in [
            StopReason::PlayerLeft,
            StopReason::Draw,
            StopReason::Won,
            StopReason::Lost,
            StopReason::ServerKilled,
        ] {
            assert!(!result_screen(reason, None).is_empty());
        }
    }

    #[test]
    fn test_result_screens_use_detail() {
        assert_eq!(
            result_screen(StopReason::Lost, Some("alice")),
            "*** You lose, alice won. ***"
        );
        assert_eq!(
            result_screen(StopReason::Won, Some("CONGRATS!")),
            "*** YOU WIN! CONGRATS! ***"
        );
        assert_eq!(
            result_screen(StopReason::PlayerLeft, Some("bob")),
            "*** bob left the game. ***"
        );
    }

    #[test]
    fn test_moves_use_player_names() {
        let intents = IntentQueue::default();
        let mut console = Console::new();
        console.on_message(
            &ServerMessage::AllNames(vec![Username::new("alice"), Username::new("bob")]),
            &intents,
        );
        let msg = ServerMessage::Move {
            mover: Mover::Them(1),
            slot: 2,
            target: Target::Mid(0),
        };
        assert_eq!(
            console.describe(&msg).as_deref(),
            Some("bob moved slot 2 onto pile 0")
        );
        assert!(intents.is_empty());

        console.on_message(&msg, &intents);
        assert_eq!(intents.pop(), Some(ClientMessage::DoneMoving));
    }
}
