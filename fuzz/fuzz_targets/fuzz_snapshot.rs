#![no_main]

//! Snapshot loader fuzzer.
//!
//! Arbitrary JSON must either fail to parse, be rejected by restore, or
//! produce a game whose board passes every invariant and renders.

use libfuzzer_sys::fuzz_target;
use mergedrop::board::check_invariants;
use mergedrop::{Game, GameSnapshot, render_ascii};

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = serde_json::from_slice::<GameSnapshot>(data) else {
        return;
    };
    let Ok(game) = Game::restore(snapshot) else {
        return;
    };
    assert!(check_invariants(game.board()).is_empty());
    assert_eq!(game.snapshot().collections, game.collections());
    let _ = render_ascii(&game);
});
