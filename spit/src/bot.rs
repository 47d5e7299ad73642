//! A client that plays by itself.

use std::{thread, time::Duration};

use super::{
    game::entities::{ClientView, PlayAction},
    net::{
        driver::{Frontend, IntentQueue},
        messages::{ClientMessage, ServerMessage, StateTag},
    },
};

/// The first card in the viewer's layout that can go on some pile, and the
/// first pile it can go on.
#[must_use]
pub fn choose_play(view: &ClientView) -> Option<PlayAction> {
    view.layout.cards().find_map(|(slot, card)| {
        view.piles
            .iter()
            .position(|top| card.is_adjacent(top))
            .map(|pile| PlayAction { slot, pile })
    })
}

/// Acknowledges every animation cue straight away and plays whenever a new
/// state has a legal move for it.
#[derive(Debug, Default)]
pub struct AutoPlayer {
    delay: Duration,
    view: Option<ClientView>,
}

impl AutoPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before each play.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, view: None }
    }

    /// The latest state the bot has seen.
    #[must_use]
    pub fn view(&self) -> Option<&ClientView> {
        self.view.as_ref()
    }
}

impl Frontend for AutoPlayer {
    fn on_message(&mut self, msg: &ServerMessage, intents: &IntentQueue) {
        match msg {
            ServerMessage::State(tag, view) => {
                if *tag == StateTag::Initial {
                    intents.push(ClientMessage::DoneMoving);
                }
                if let Some(action) = choose_play(view) {
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    intents.push(ClientMessage::Play(action));
                }
                self.view = Some(view.clone());
            }
            ServerMessage::Move { .. } | ServerMessage::Flip { .. } | ServerMessage::BadMove { .. } => {
                intents.push(ClientMessage::DoneMoving);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, Layout, Suit};
    use crate::net::messages::{Mover, Target};

    fn view(layout: Vec<Option<Card>>, piles: Vec<Card>) -> ClientView {
        ClientView {
            seat: 0,
            layout: Layout(layout),
            deck_size: 0,
            piles,
            opponents: vec![],
        }
    }

    fn drain(intents: &IntentQueue) -> Vec<ClientMessage> {
        let mut msgs = Vec::new();
        while !intents.is_empty() {
            if let Some(msg) = intents.pop() {
                msgs.push(msg);
            }
        }
        msgs
    }

    #[test]
    fn picks_first_playable_slot() {
        let view = view(
            vec![None, Some(Card(9, Suit::Club)), Some(Card(1, Suit::Heart))],
            vec![Card(5, Suit::Spade), Card(13, Suit::Spade)],
        );
        assert_eq!(choose_play(&view), Some(PlayAction { slot: 2, pile: 1 }));
    }

    #[test]
    fn nothing_to_play() {
        let view = view(
            vec![Some(Card(9, Suit::Club)), None],
            vec![Card(5, Suit::Spade)],
        );
        assert_eq!(choose_play(&view), None);
    }

    #[test]
    fn initial_state_is_acknowledged_then_played() {
        let intents = IntentQueue::default();
        let mut bot = AutoPlayer::new();
        let state = view(vec![Some(Card(4, Suit::Club))], vec![Card(5, Suit::Spade)]);
        bot.on_message(&ServerMessage::State(StateTag::Initial, state), &intents);
        assert_eq!(
            drain(&intents),
            vec![
                ClientMessage::DoneMoving,
                ClientMessage::Play(PlayAction { slot: 0, pile: 0 })
            ]
        );
        assert!(bot.view().is_some());
    }

    #[test]
    fn cues_are_acknowledged() {
        let intents = IntentQueue::default();
        let mut bot = AutoPlayer::new();
        bot.on_message(
            &ServerMessage::Move {
                mover: Mover::Them(1),
                slot: 0,
                target: Target::Mid(0),
            },
            &intents,
        );
        bot.on_message(&ServerMessage::BadMove { slot: 0, pile: 1 }, &intents);
        bot.on_message(&ServerMessage::NameRequest, &intents);
        assert_eq!(
            drain(&intents),
            vec![ClientMessage::DoneMoving, ClientMessage::DoneMoving]
        );
    }
}
