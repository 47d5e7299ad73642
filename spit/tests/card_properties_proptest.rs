/// Property-based tests for cards, decks, and plays using proptest
///
/// These tests check adjacency and dealing rules across randomly generated
/// cards and deal sizes.
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::BTreeSet;

use spit::game::{
    GameState,
    entities::{Card, Deck, Player, Suit},
};

// Strategy to generate a valid card (values 1-13, aces are value 1)
fn card_strategy() -> impl Strategy<Value = Card> {
    (1u8..=13, 0usize..4).prop_map(|(value, suit_idx)| Card(value, Suit::ALL[suit_idx]))
}

fn shuffled_deck(seed: u64) -> Deck {
    let mut deck = Deck::default();
    deck.shuffle_with(&mut StdRng::seed_from_u64(seed));
    deck
}

proptest! {
    #[test]
    fn test_adjacency_is_symmetric(a in card_strategy(), b in card_strategy()) {
        prop_assert_eq!(a.is_adjacent(&b), b.is_adjacent(&a));
    }

    #[test]
    fn test_ace_is_next_to_two_and_king_only(suit in 0usize..4, other in card_strategy()) {
        let ace = Card(1, Suit::ALL[suit]);
        let expected = other.rank() == 2 || other.rank() == 13;
        prop_assert_eq!(ace.is_adjacent(&other), expected);
    }

    #[test]
    fn test_adjacency_ignores_suit(value in 1u8..=13, a in 0usize..4, b in 0usize..4) {
        let other = if value == 13 { 1 } else { value + 1 };
        prop_assert!(Card(value, Suit::ALL[a]).is_adjacent(&Card(other, Suit::ALL[b])));
        prop_assert!(!Card(value, Suit::ALL[a]).is_adjacent(&Card(value, Suit::ALL[b])));
    }

    #[test]
    fn test_deal_then_deal_rest_loses_nothing(seed in any::<u64>(), n in 0usize..=52) {
        let mut deck = shuffled_deck(seed);
        let before: BTreeSet<Card> = deck.iter().copied().collect();

        let first = deck.deal(n).unwrap();
        let rest = deck.deal(deck.len()).unwrap();
        prop_assert!(deck.is_empty());

        let dealt: BTreeSet<Card> = first.iter().chain(&rest).copied().collect();
        prop_assert_eq!(dealt.len(), first.len() + rest.len());
        prop_assert_eq!(dealt, before);
    }

    #[test]
    fn test_over_dealing_fails_without_dealing(seed in any::<u64>(), extra in 1usize..10) {
        let mut deck = shuffled_deck(seed);
        prop_assert!(deck.deal(52 + extra).is_err());
        prop_assert_eq!(deck.len(), 52);
    }

    #[test]
    fn test_replayed_play_is_refused(seed in any::<u64>()) {
        let mut game = GameState::with_decks(vec![shuffled_deck(seed), shuffled_deck(!seed)], 2, 4).unwrap();
        let legal = (0..4)
            .flat_map(|slot| (0..2).map(move |pile| (slot, pile)))
            .find(|&(slot, pile)| game.is_legal(0, slot, pile));
        if let Some((slot, pile)) = legal {
            let played = game.play(0, slot, pile).unwrap();
            prop_assert_eq!(game.piles()[pile], played);
            // Whatever refilled the slot came from the same deck, so it can't
            // be the card that was just played.
            if let Ok(card) = game.play(0, slot, pile) {
                prop_assert_ne!(card, played);
            }
        }
    }

    #[test]
    fn test_flip_is_noop_when_moves_exist(seed in any::<u64>()) {
        let mut game = GameState::with_decks(vec![shuffled_deck(seed), shuffled_deck(!seed)], 2, 4).unwrap();
        if game.moves_available() {
            let before = game.clone();
            prop_assert!(game.flip().is_empty());
            prop_assert_eq!(game, before);
        }
    }

    #[test]
    fn test_player_refills_from_deck(seed in any::<u64>()) {
        let mut player = Player::new(shuffled_deck(seed), 4).unwrap();
        let next = player.layout().get(1);
        prop_assert!(next.is_some());
        prop_assert_eq!(player.play_card(1), next);
        prop_assert_eq!(player.cards_left(), 52 - 4 - 1);
        prop_assert_eq!(player.layout().count(), 4);
    }
}
