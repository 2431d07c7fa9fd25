use crate::color::Color;
use crate::config::Rules;
use crate::dice::{DicePool, Die};

use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

#[test]
fn leg_is_over_only_after_every_racing_color() {
    let rules = Rules::classic();
    let mut pool = DicePool::new(&rules);
    pool.take(Die::Racing(Color::White));
    pool.reset();
    assert_eq!(pool.remaining_dice(), 5);

    let colors = rules.racing_camels.clone();
    for (i, &c) in colors.iter().enumerate() {
        assert!(!pool.is_leg_over(), "leg over after {} draws", i);
        assert!(pool.take(Die::Racing(c)));
    }
    assert!(pool.is_leg_over());
    assert_eq!(pool.remaining_dice(), 0);
}

#[test]
fn take_twice_fails() {
    let rules = Rules::classic();
    let mut pool = DicePool::new(&rules);
    assert!(pool.take(Die::Racing(Color::Blue)));
    assert!(!pool.take(Die::Racing(Color::Blue)));
    assert!(!pool.is_available(Die::Racing(Color::Blue)));
    assert!(!pool.take(Die::Crazy));
}

#[test]
fn crazy_die_does_not_block_leg_end() {
    let rules = Rules::crazy();
    let mut pool = DicePool::new(&rules);
    assert!(pool.crazy_available());
    assert_eq!(pool.remaining_dice(), 6);
    assert_eq!(pool.available().last(), Some(&Die::Crazy));

    for &c in &rules.racing_camels {
        pool.take(Die::Racing(c));
    }
    assert!(pool.is_leg_over());
    assert!(pool.crazy_available());

    pool.reset();
    assert!(pool.take(Die::Crazy));
    assert!(!pool.crazy_available());
}

#[test]
fn draw_uses_configured_faces_and_each_die_once() {
    let rules = Rules::crazy();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..50 {
        let mut pool = DicePool::new(&rules);
        let mut crazy_draws = 0;
        let mut racing = Vec::new();
        while !pool.is_leg_over() {
            let draw = pool.draw(&rules, &mut rng);
            assert!(rules.faces_for(draw.color).contains(&draw.value));
            if rules.is_crazy(draw.color) {
                crazy_draws += 1;
            } else {
                assert!(!racing.contains(&draw.color), "{} drawn twice", draw.color);
                racing.push(draw.color);
            }
        }
        assert!(crazy_draws <= 1);
        assert_eq!(racing.len(), rules.racing_camels.len());
    }
}

#[test]
fn draw_is_deterministic_for_a_seed() {
    let rules = Rules::classic();
    let run = |seed: u64| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pool = DicePool::new(&rules);
        let mut out = Vec::new();
        while !pool.is_leg_over() {
            out.push(pool.draw(&rules, &mut rng));
        }
        out
    };
    assert_eq!(run(7), run(7));
}

#[test]
#[should_panic(expected = "exhausted")]
fn draw_from_exhausted_pool_panics() {
    let rules = Rules::classic();
    let mut pool = DicePool::new(&rules);
    for &c in &rules.racing_camels {
        pool.take(Die::Racing(c));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    pool.draw(&rules, &mut rng);
}
