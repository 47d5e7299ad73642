//! The server side of one game of Spit.
//!
//! A [`Session`] walks every connected client from the handshake through
//! the game to the result. It never touches sockets itself; everything goes
//! out through an [`Outbox`], which the server backs with a
//! [`Hub`](crate::net::connection::Hub).

use log::{debug, info, warn};
use std::{collections::BTreeMap, fmt, net::SocketAddr};

use super::{
    game::{
        GameOutcome, GameState,
        entities::{PlayAction, SeatIndex, Username},
    },
    net::{
        connection::{ConnectionId, Hub},
        messages::{ClientMessage, Mover, ServerMessage, StateTag, StopReason, Target},
    },
};

/// What the winner is told when the game ends.
pub const WINNER_DETAIL: &str = "CONGRATS!";

/// Where session messages go.
pub trait Outbox {
    /// Returns false if the message couldn't be handed to the connection.
    fn send(&mut self, id: ConnectionId, msg: &ServerMessage) -> bool;

    fn connections(&self) -> Vec<ConnectionId>;

    fn broadcast(&mut self, msg: &ServerMessage) -> usize {
        self.exclusive_broadcast(&[], msg)
    }

    fn exclusive_broadcast(&mut self, exclude: &[ConnectionId], msg: &ServerMessage) -> usize {
        self.connections()
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .filter(|&id| self.send(id, msg))
            .count()
    }
}

impl Outbox for Hub {
    fn send(&mut self, id: ConnectionId, msg: &ServerMessage) -> bool {
        Hub::send(self, id, msg)
    }

    fn connections(&self) -> Vec<ConnectionId> {
        Hub::connections(self)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    /// Waiting for every seat to connect, name itself, and ready up.
    Setup,
    Running,
    /// The game has a result; waiting for clients to acknowledge it.
    Stopping,
    Stopped,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Setup => "setup",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientStatus {
    Connected,
    Ready,
    Playing,
    Finished,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Participant {
    pub seat: SeatIndex,
    pub name: Option<Username>,
    pub status: ClientStatus,
    /// The client hasn't finished showing the last thing it was sent.
    pub animating: bool,
}

impl Participant {
    fn new(seat: SeatIndex) -> Self {
        Self {
            seat,
            name: None,
            status: ClientStatus::Connected,
            animating: true,
        }
    }

    fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("seat {}", self.seat),
        }
    }
}

pub struct Session {
    game: GameState,
    ip_info: String,
    phase: SessionPhase,
    participants: BTreeMap<ConnectionId, Participant>,
    stop_reason: Option<StopReason>,
    outcome: Option<GameOutcome>,
}

impl Session {
    /// A session waiting for as many clients as the game has players.
    /// `ip_info` is what connecting clients are told the server's
    /// address is.
    #[must_use]
    pub fn new(game: GameState, ip_info: String) -> Self {
        Self {
            game,
            ip_info,
            phase: SessionPhase::Setup,
            participants: BTreeMap::new(),
            stop_reason: None,
            outcome: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn game(&self) -> &GameState {
        &self.game
    }

    #[must_use]
    pub fn participant(&self, id: ConnectionId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Why the session stopped, once it has. A game with a winner reports
    /// [`StopReason::Won`].
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn max_players(&self) -> usize {
        self.game.num_players()
    }

    /// Seats are only handed out during setup, and only until they're full.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.phase == SessionPhase::Setup && self.participants.len() < self.max_players()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.phase == SessionPhase::Stopped
    }

    pub fn on_connect<O: Outbox>(&mut self, out: &mut O, id: ConnectionId, addr: SocketAddr) {
        if !self.is_accepting() {
            warn!("{addr} ({id}) connected during {} with no seat free", self.phase);
            return;
        }
        let seat = self.participants.len();
        self.participants.insert(id, Participant::new(seat));
        info!("{addr} ({id}) took seat {seat}");
        out.send(id, &ServerMessage::IpInfo(self.ip_info.clone()));
        out.send(id, &ServerMessage::NameRequest);
    }

    pub fn on_message<O: Outbox>(&mut self, out: &mut O, id: ConnectionId, msg: ClientMessage) {
        if !self.participants.contains_key(&id) {
            warn!("{id} has no seat, ignoring message that it {msg}");
            return;
        }
        debug!("{id} {msg}");
        match (self.phase, msg) {
            (SessionPhase::Stopped, _) => {}
            (_, ClientMessage::Quitting) => self.leave(out, id),
            (SessionPhase::Setup, ClientMessage::PlayerName(name)) => self.set_name(out, id, name),
            (SessionPhase::Setup, ClientMessage::Ready) => self.set_ready(out, id),
            (SessionPhase::Running, ClientMessage::Play(action)) => self.play(out, id, action),
            (SessionPhase::Running, ClientMessage::DoneMoving) => self.done_moving(out, id),
            // Clients still settle the final state while they read the result.
            (SessionPhase::Stopping, ClientMessage::DoneMoving) => {}
            (SessionPhase::Stopping, ClientMessage::GotResult) => self.got_result(id),
            (phase, msg) => warn!("{id} {msg} during {phase}, ignoring"),
        }
    }

    pub fn on_disconnect<O: Outbox>(&mut self, out: &mut O, id: ConnectionId) {
        if self.participants.contains_key(&id) {
            self.leave(out, id);
        }
    }

    /// Tell every client the server is going away.
    pub fn shutdown<O: Outbox>(&mut self, out: &mut O) {
        if self.phase == SessionPhase::Stopped {
            return;
        }
        info!("shutting down during {}", self.phase);
        out.broadcast(&ServerMessage::GameStopped {
            reason: StopReason::ServerKilled,
            detail: None,
        });
        self.stop(StopReason::ServerKilled);
    }

    fn stop(&mut self, reason: StopReason) {
        self.phase = SessionPhase::Stopped;
        let reason = *self.stop_reason.get_or_insert(reason);
        info!("session stopped ({reason})");
    }

    fn full(&self) -> bool {
        self.participants.len() == self.max_players()
    }

    fn leave<O: Outbox>(&mut self, out: &mut O, id: ConnectionId) {
        let Some(participant) = self.participants.remove(&id) else {
            return;
        };
        let name = participant.display_name();
        match self.phase {
            SessionPhase::Setup | SessionPhase::Running => {
                info!("{name} left during {}", self.phase);
                out.exclusive_broadcast(
                    &[id],
                    &ServerMessage::GameStopped {
                        reason: StopReason::PlayerLeft,
                        detail: Some(name),
                    },
                );
                self.stop(StopReason::PlayerLeft);
            }
            SessionPhase::Stopping => {
                info!("{name} left before acknowledging the result");
                self.check_finished();
            }
            SessionPhase::Stopped => {}
        }
    }

    fn set_name<O: Outbox>(&mut self, out: &mut O, id: ConnectionId, name: Username) {
        if let Some(participant) = self.participants.get_mut(&id) {
            info!("seat {} is {name}", participant.seat);
            participant.name = Some(name);
        }
        if !self.full() {
            return;
        }
        let mut names = Vec::with_capacity(self.participants.len());
        for participant in self.participants.values() {
            match &participant.name {
                Some(name) => names.push((participant.seat, name.clone())),
                None => return,
            }
        }
        names.sort_by_key(|(seat, _)| *seat);
        let names = names.into_iter().map(|(_, name)| name).collect();
        out.broadcast(&ServerMessage::AllNames(names));
    }

    fn set_ready<O: Outbox>(&mut self, out: &mut O, id: ConnectionId) {
        let Some(participant) = self.participants.get_mut(&id) else {
            return;
        };
        if participant.name.is_none() {
            warn!("{id} is ready before naming itself, ignoring");
            return;
        }
        participant.status = ClientStatus::Ready;
        let all_ready = self
            .participants
            .values()
            .all(|p| p.status == ClientStatus::Ready);
        if self.full() && all_ready {
            self.start(out);
        }
    }

    fn start<O: Outbox>(&mut self, out: &mut O) {
        info!("all {} players ready, starting", self.participants.len());
        self.phase = SessionPhase::Running;
        for (id, participant) in &mut self.participants {
            participant.status = ClientStatus::Playing;
            participant.animating = true;
            let view = self.game.view_for(participant.seat);
            out.send(*id, &ServerMessage::State(StateTag::Initial, view));
        }
    }

    fn publish_state<O: Outbox>(&mut self, out: &mut O) {
        for (id, participant) in &mut self.participants {
            participant.animating = true;
            let view = self.game.view_for(participant.seat);
            out.send(*id, &ServerMessage::State(StateTag::New, view));
        }
    }

    fn play<O: Outbox>(&mut self, out: &mut O, id: ConnectionId, action: PlayAction) {
        let Some(seat) = self.participants.get(&id).map(|p| p.seat) else {
            return;
        };
        let PlayAction { slot, pile } = action;
        match self.game.play(seat, slot, pile) {
            Ok(card) => {
                debug!("seat {seat} played {} onto pile {pile}", card.to_string().trim());
                for other in self.participants.keys() {
                    let mover = if *other == id {
                        Mover::Me
                    } else {
                        Mover::Them(seat)
                    };
                    out.send(
                        *other,
                        &ServerMessage::Move {
                            mover,
                            slot,
                            target: Target::Mid(pile),
                        },
                    );
                }
                self.publish_state(out);
            }
            Err(error) => {
                debug!("seat {seat} can't play {action}: {error}");
                if let Some(participant) = self.participants.get_mut(&id) {
                    participant.animating = true;
                }
                out.send(id, &ServerMessage::BadMove { slot, pile });
            }
        }
    }

    fn done_moving<O: Outbox>(&mut self, out: &mut O, id: ConnectionId) {
        if let Some(participant) = self.participants.get_mut(&id) {
            participant.animating = false;
        }
        if self.participants.values().any(|p| p.animating) {
            return;
        }
        if let Some(outcome) = self.game.game_over() {
            self.finish(out, outcome);
        } else if !self.game.moves_available() {
            let flipped = self.game.flip();
            let cards = flipped.iter().map(|&seat| self.game.piles()[seat]).collect();
            info!("nobody can move, flipped for seats {flipped:?}");
            out.broadcast(&ServerMessage::Flip {
                cards,
                piles: flipped,
            });
            self.publish_state(out);
        }
    }

    fn finish<O: Outbox>(&mut self, out: &mut O, outcome: GameOutcome) {
        info!("game over: {outcome}");
        self.phase = SessionPhase::Stopping;
        self.outcome = Some(outcome);
        self.publish_state(out);
        match outcome {
            GameOutcome::Winner(winner) => {
                self.stop_reason = Some(StopReason::Won);
                let winner_name = self
                    .participants
                    .values()
                    .find(|p| p.seat == winner)
                    .map_or_else(|| format!("seat {winner}"), Participant::display_name);
                for (id, participant) in &self.participants {
                    let msg = if participant.seat == winner {
                        ServerMessage::GameStopped {
                            reason: StopReason::Won,
                            detail: Some(WINNER_DETAIL.to_string()),
                        }
                    } else {
                        ServerMessage::GameStopped {
                            reason: StopReason::Lost,
                            detail: Some(winner_name.clone()),
                        }
                    };
                    out.send(*id, &msg);
                }
            }
            GameOutcome::Draw => {
                self.stop_reason = Some(StopReason::Draw);
                out.broadcast(&ServerMessage::GameStopped {
                    reason: StopReason::Draw,
                    detail: None,
                });
            }
        }
    }

    fn got_result(&mut self, id: ConnectionId) {
        if let Some(participant) = self.participants.get_mut(&id) {
            participant.status = ClientStatus::Finished;
        }
        self.check_finished();
    }

    fn check_finished(&mut self) {
        let all_finished = self
            .participants
            .values()
            .all(|p| p.status == ClientStatus::Finished);
        if all_finished {
            let reason = self.stop_reason.unwrap_or(StopReason::PlayerLeft);
            self.stop(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use mio::Token;
    use std::net::SocketAddr;

    use super::*;
    use crate::game::entities::{Card, Deck, Player, Suit};

    #[derive(Default)]
    struct MockOutbox {
        open: Vec<ConnectionId>,
        sent: Vec<(ConnectionId, ServerMessage)>,
    }

    impl MockOutbox {
        fn received(&self, id: ConnectionId) -> Vec<&ServerMessage> {
            self.sent
                .iter()
                .filter(|(to, _)| *to == id)
                .map(|(_, msg)| msg)
                .collect()
        }

        fn close(&mut self, id: ConnectionId) {
            self.open.retain(|open| *open != id);
        }
    }

    impl Outbox for MockOutbox {
        fn send(&mut self, id: ConnectionId, msg: &ServerMessage) -> bool {
            if !self.open.contains(&id) {
                return false;
            }
            self.sent.push((id, msg.clone()));
            true
        }

        fn connections(&self) -> Vec<ConnectionId> {
            self.open.clone()
        }
    }

    const A: ConnectionId = ConnectionId(1);
    const B: ConnectionId = ConnectionId(2);

    fn addr() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn connect(session: &mut Session, out: &mut MockOutbox, id: ConnectionId) {
        out.open.push(id);
        session.on_connect(out, id, addr());
    }

    fn player(layout: &[Option<Card>], deck: &[Card]) -> Player {
        Player::from_parts(layout.to_vec(), Deck::from(deck.to_vec()))
    }

    /// Seat 0 holds a 2 that can go on the 3 in pile 0; seat 1 holds
    /// nothing playable. Both have decks left.
    fn movable_game() -> GameState {
        GameState::from_parts(
            vec![
                player(
                    &[Some(Card(2, Suit::Club)), Some(Card(7, Suit::Club))],
                    &[Card(9, Suit::Club), Card(10, Suit::Club)],
                ),
                player(
                    &[Some(Card(7, Suit::Heart)), Some(Card(9, Suit::Heart))],
                    &[Card(5, Suit::Heart)],
                ),
            ],
            vec![Card(3, Suit::Spade), Card(12, Suit::Spade)],
        )
    }

    /// Nothing is playable, seat 0 has a deck and seat 1 doesn't.
    fn stuck_game() -> GameState {
        GameState::from_parts(
            vec![
                player(&[Some(Card(7, Suit::Club))], &[Card(3, Suit::Club)]),
                player(&[Some(Card(7, Suit::Heart))], &[]),
            ],
            vec![Card(10, Suit::Spade), Card(10, Suit::Heart)],
        )
    }

    /// Seat 0's last card can go on pile 0.
    fn winnable_game() -> GameState {
        GameState::from_parts(
            vec![
                player(&[Some(Card(2, Suit::Club)), None], &[]),
                player(&[Some(Card(7, Suit::Heart)), None], &[]),
            ],
            vec![Card(3, Suit::Spade), Card(12, Suit::Spade)],
        )
    }

    /// Nothing playable, no decks, one card each.
    fn drawn_game() -> GameState {
        GameState::from_parts(
            vec![
                player(&[Some(Card(7, Suit::Club))], &[]),
                player(&[Some(Card(7, Suit::Heart))], &[]),
            ],
            vec![Card(10, Suit::Spade), Card(10, Suit::Heart)],
        )
    }

    fn started(game: GameState) -> (Session, MockOutbox) {
        let mut session = Session::new(game, "127.0.0.1:9000".to_string());
        let mut out = MockOutbox::default();
        connect(&mut session, &mut out, A);
        connect(&mut session, &mut out, B);
        session.on_message(&mut out, A, ClientMessage::PlayerName(Username::new("alice")));
        session.on_message(&mut out, B, ClientMessage::PlayerName(Username::new("bob")));
        session.on_message(&mut out, A, ClientMessage::Ready);
        session.on_message(&mut out, B, ClientMessage::Ready);
        assert_eq!(session.phase(), SessionPhase::Running);
        out.sent.clear();
        (session, out)
    }

    fn both_done(session: &mut Session, out: &mut MockOutbox) {
        session.on_message(out, A, ClientMessage::DoneMoving);
        session.on_message(out, B, ClientMessage::DoneMoving);
    }

    #[test]
    fn connection_ids_come_from_tokens() {
        assert_eq!(ConnectionId::from(Token(1)), A);
    }

    #[test]
    fn setup_handshake_reaches_initial_state() {
        let mut session = Session::new(movable_game(), "10.0.0.1:9000".to_string());
        let mut out = MockOutbox::default();
        connect(&mut session, &mut out, A);
        assert!(session.is_accepting());
        connect(&mut session, &mut out, B);
        assert!(!session.is_accepting());

        assert_eq!(
            out.received(A),
            vec![
                &ServerMessage::IpInfo("10.0.0.1:9000".to_string()),
                &ServerMessage::NameRequest
            ]
        );

        // Plays before the game starts go nowhere.
        session.on_message(
            &mut out,
            A,
            ClientMessage::Play(PlayAction { slot: 0, pile: 0 }),
        );
        assert_eq!(out.sent.len(), 4);

        session.on_message(&mut out, B, ClientMessage::PlayerName(Username::new("bob")));
        session.on_message(&mut out, A, ClientMessage::PlayerName(Username::new("alice")));
        let names = ServerMessage::AllNames(vec![Username::new("alice"), Username::new("bob")]);
        assert_eq!(out.received(A).last(), Some(&&names));
        assert_eq!(out.received(B).last(), Some(&&names));

        session.on_message(&mut out, A, ClientMessage::Ready);
        assert_eq!(session.phase(), SessionPhase::Setup);
        session.on_message(&mut out, B, ClientMessage::Ready);
        assert_eq!(session.phase(), SessionPhase::Running);

        for (id, seat) in [(A, 0), (B, 1)] {
            let participant = session.participant(id).unwrap();
            assert_eq!(participant.status, ClientStatus::Playing);
            assert_eq!(
                out.received(id).last(),
                Some(&&ServerMessage::State(
                    StateTag::Initial,
                    session.game().view_for(seat)
                ))
            );
        }
    }

    #[test]
    fn ready_without_name_is_ignored() {
        let mut session = Session::new(movable_game(), String::new());
        let mut out = MockOutbox::default();
        connect(&mut session, &mut out, A);
        session.on_message(&mut out, A, ClientMessage::Ready);
        assert_eq!(session.participant(A).unwrap().status, ClientStatus::Connected);
    }

    #[test]
    fn legal_play_is_broadcast_directionally() {
        let (mut session, mut out) = started(movable_game());
        both_done(&mut session, &mut out);
        assert!(out.sent.is_empty());

        session.on_message(
            &mut out,
            A,
            ClientMessage::Play(PlayAction { slot: 0, pile: 0 }),
        );
        assert_eq!(
            out.received(A),
            vec![
                &ServerMessage::Move {
                    mover: Mover::Me,
                    slot: 0,
                    target: Target::Mid(0)
                },
                &ServerMessage::State(StateTag::New, session.game().view_for(0)),
            ]
        );
        assert_eq!(
            out.received(B),
            vec![
                &ServerMessage::Move {
                    mover: Mover::Them(0),
                    slot: 0,
                    target: Target::Mid(0)
                },
                &ServerMessage::State(StateTag::New, session.game().view_for(1)),
            ]
        );
        assert!(session.participant(A).unwrap().animating);
        assert!(session.participant(B).unwrap().animating);
        assert_eq!(session.game().piles()[0], Card(2, Suit::Club));
    }

    #[test]
    fn illegal_play_only_answers_the_mover() {
        let (mut session, mut out) = started(movable_game());
        both_done(&mut session, &mut out);
        let before = session.game().clone();

        session.on_message(
            &mut out,
            B,
            ClientMessage::Play(PlayAction { slot: 0, pile: 1 }),
        );
        assert_eq!(
            out.sent,
            vec![(B, ServerMessage::BadMove { slot: 0, pile: 1 })]
        );
        assert_eq!(session.game(), &before);
        assert!(session.participant(B).unwrap().animating);
        assert!(!session.participant(A).unwrap().animating);
    }

    #[test]
    fn flips_once_everyone_is_done() {
        let (mut session, mut out) = started(stuck_game());

        session.on_message(&mut out, A, ClientMessage::DoneMoving);
        assert!(out.sent.is_empty());
        session.on_message(&mut out, B, ClientMessage::DoneMoving);

        let flips: Vec<_> = out
            .sent
            .iter()
            .filter(|(_, msg)| matches!(msg, ServerMessage::Flip { .. }))
            .collect();
        assert_eq!(flips.len(), 2);
        let flip = ServerMessage::Flip {
            cards: vec![Card(3, Suit::Club)],
            piles: vec![0],
        };
        assert_eq!(out.received(A)[0], &flip);
        assert_eq!(out.received(B)[0], &flip);
        assert!(matches!(
            out.received(A)[1],
            ServerMessage::State(StateTag::New, _)
        ));
        assert!(session.participant(A).unwrap().animating);
        assert!(session.participant(B).unwrap().animating);
    }

    #[test]
    fn disconnect_mid_game_stops_with_player_left() {
        let (mut session, mut out) = started(movable_game());
        out.close(A);
        session.on_disconnect(&mut out, A);

        assert_eq!(
            out.sent,
            vec![(
                B,
                ServerMessage::GameStopped {
                    reason: StopReason::PlayerLeft,
                    detail: Some("alice".to_string())
                }
            )]
        );
        assert!(session.is_stopped());
        assert_eq!(session.stop_reason(), Some(StopReason::PlayerLeft));

        out.sent.clear();
        session.on_message(
            &mut out,
            B,
            ClientMessage::Play(PlayAction { slot: 0, pile: 0 }),
        );
        session.on_message(&mut out, B, ClientMessage::DoneMoving);
        assert!(out.sent.is_empty());
    }

    #[test]
    fn quitting_during_setup_stops_the_session() {
        let mut session = Session::new(movable_game(), String::new());
        let mut out = MockOutbox::default();
        connect(&mut session, &mut out, A);
        connect(&mut session, &mut out, B);
        out.sent.clear();

        session.on_message(&mut out, B, ClientMessage::Quitting);
        assert_eq!(
            out.sent,
            vec![(
                A,
                ServerMessage::GameStopped {
                    reason: StopReason::PlayerLeft,
                    detail: Some("seat 1".to_string())
                }
            )]
        );
        assert!(session.is_stopped());
        assert!(!session.is_accepting());
    }

    #[test]
    fn winner_and_loser_are_told_apart() {
        let (mut session, mut out) = started(winnable_game());
        session.on_message(
            &mut out,
            A,
            ClientMessage::Play(PlayAction { slot: 0, pile: 0 }),
        );
        // Nothing ends until both have caught up.
        session.on_message(&mut out, A, ClientMessage::DoneMoving);
        assert_eq!(session.phase(), SessionPhase::Running);
        out.sent.clear();
        session.on_message(&mut out, B, ClientMessage::DoneMoving);

        assert_eq!(session.phase(), SessionPhase::Stopping);
        assert_eq!(session.outcome(), Some(GameOutcome::Winner(0)));
        assert_eq!(
            out.received(A).last(),
            Some(&&ServerMessage::GameStopped {
                reason: StopReason::Won,
                detail: Some(WINNER_DETAIL.to_string())
            })
        );
        assert_eq!(
            out.received(B).last(),
            Some(&&ServerMessage::GameStopped {
                reason: StopReason::Lost,
                detail: Some("alice".to_string())
            })
        );

        session.on_message(&mut out, A, ClientMessage::GotResult);
        assert_eq!(session.phase(), SessionPhase::Stopping);
        session.on_message(&mut out, B, ClientMessage::GotResult);
        assert!(session.is_stopped());
        assert_eq!(session.stop_reason(), Some(StopReason::Won));
    }

    #[test]
    fn stuck_game_with_equal_counts_is_a_draw() {
        let (mut session, mut out) = started(drawn_game());
        both_done(&mut session, &mut out);

        assert_eq!(session.outcome(), Some(GameOutcome::Draw));
        let draw = ServerMessage::GameStopped {
            reason: StopReason::Draw,
            detail: None,
        };
        assert_eq!(out.received(A).last(), Some(&&draw));
        assert_eq!(out.received(B).last(), Some(&&draw));
        assert!(!out
            .sent
            .iter()
            .any(|(_, msg)| matches!(msg, ServerMessage::Flip { .. })));
    }

    #[test]
    fn leaving_while_stopping_only_drops_the_wait() {
        let (mut session, mut out) = started(drawn_game());
        both_done(&mut session, &mut out);
        out.sent.clear();

        session.on_message(&mut out, A, ClientMessage::GotResult);
        out.close(B);
        session.on_disconnect(&mut out, B);

        assert!(out.sent.is_empty());
        assert!(session.is_stopped());
        assert_eq!(session.stop_reason(), Some(StopReason::Draw));
    }

    #[test]
    fn shutdown_tells_everyone() {
        let (mut session, mut out) = started(movable_game());
        session.shutdown(&mut out);
        let killed = ServerMessage::GameStopped {
            reason: StopReason::ServerKilled,
            detail: None,
        };
        assert_eq!(out.sent, vec![(A, killed.clone()), (B, killed)]);
        assert!(session.is_stopped());

        out.sent.clear();
        session.shutdown(&mut out);
        assert!(out.sent.is_empty());
    }
}
