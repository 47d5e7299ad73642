use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};
use spit::{
    GameSettings, GameState,
    bot::choose_play,
    entities::{Card, Deck, Suit},
};

/// Helper to deal a reproducible game with `n_players` seats
fn setup_game(n_players: usize, seed: u64) -> GameState {
    let mut rng = StdRng::seed_from_u64(seed);
    let decks = (0..n_players)
        .map(|_| {
            let mut deck = Deck::default();
            deck.shuffle_with(&mut rng);
            deck
        })
        .collect();
    GameState::with_decks(decks, n_players, GameSettings::default().layout_size).unwrap()
}

/// Play the first legal move for anyone, flipping when stuck, until the
/// game ends. Returns how many cards were played.
fn play_out(mut game: GameState) -> usize {
    let mut plays = 0;
    while game.game_over().is_none() {
        let seats = game.num_players();
        let played = (0..seats).any(|seat| match choose_play(&game.view_for(seat)) {
            Some(action) => game.play(seat, action.slot, action.pile).is_ok(),
            None => false,
        });
        if played {
            plays += 1;
        } else if game.flip().is_empty() {
            break;
        }
    }
    plays
}

fn bench_adjacency(c: &mut Criterion) {
    let ace = Card(1, Suit::Spade);
    let king = Card(13, Suit::Heart);

    c.bench_function("card_adjacency", |b| {
        b.iter(|| ace.is_adjacent(&king));
    });
}

fn bench_moves_available(c: &mut Criterion) {
    let game = setup_game(2, 7);

    c.bench_function("moves_available", |b| {
        b.iter(|| game.moves_available());
    });
}

fn bench_view_for(c: &mut Criterion) {
    let game = setup_game(2, 7);

    c.bench_function("view_for", |b| {
        b.iter(|| game.view_for(0));
    });
}

/// Benchmark a whole game played by bots at different table sizes
fn bench_full_game(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_game");
    for n_players in [2, 3, 4] {
        group.bench_with_input(
            BenchmarkId::from_parameter(n_players),
            &n_players,
            |b, &n| {
                b.iter(|| play_out(setup_game(n, 42)));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_adjacency,
    bench_moves_available,
    bench_view_for,
    bench_full_game
);
criterion_main!(benches);
