use crate::action::Action;
use crate::chance::Chance;
use crate::color::Color::{self, Black, Blue, Green, Orange};
use crate::config::Rules;
use crate::dice::Draw;
use crate::engine::{advance, apply, settle, ApplyError};
use crate::state::{OverallSide, Phase, PlayerId, RaceState, Ticket};
use crate::track::{Space, TileEffect};

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

fn three_camels() -> Rules {
    Rules {
        racing_camels: vec![Blue, Green, Orange],
        ..Rules::default()
    }
}

fn race(rules: &Rules, start: &[(Color, Space)]) -> RaceState {
    RaceState::new(rules, 3, start).unwrap()
}

fn roll(color: Color, value: u8) -> Action {
    Action::DrawDice {
        color,
        value,
        roller: None,
    }
}

fn invalid(err: ApplyError) -> &'static str {
    match err {
        ApplyError::InvalidAction { reason, .. } => reason,
        other => panic!("expected InvalidAction, got {:?}", other),
    }
}

#[test]
fn stacked_camel_is_carried_and_roller_is_paid() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 5), (Green, 3), (Orange, 0)]);

    let a = Action::DrawDice {
        color: Green,
        value: 2,
        roller: Some(P0),
    };
    let s = apply(&s, a, &rules).unwrap();
    assert_eq!(s.track().stack_at(5), vec![Blue, Green]);
    assert_eq!(s.player(P0).unwrap().coins, 4);

    let s = apply(&s, roll(Blue, 2), &rules).unwrap();
    assert_eq!(s.track().stack_at(7), vec![Blue, Green]);
    assert_eq!(s.ranking().leader(), Some(Green));
    assert_eq!(s.leg(), 0);
}

#[test]
fn apply_never_mutates_its_input() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 0), (Green, 1), (Orange, 2)]);
    let before = s.clone();

    let _ = apply(&s, roll(Blue, 3), &rules).unwrap();
    let _ = apply(&s, Action::TakeTicket { color: Green, player: P1 }, &rules).unwrap();
    let _ = apply(&s, roll(Blue, 4), &rules).unwrap_err();
    assert_eq!(s, before);
}

#[test]
fn tickets_are_handed_out_highest_first() {
    let mut rules = three_camels();
    rules.tickets.values = vec![3, 5];
    let s = race(&rules, &[(Blue, 0), (Green, 1), (Orange, 2)]);

    let take = |player| Action::TakeTicket { color: Blue, player };
    let s = apply(&s, take(P0), &rules).unwrap();
    assert_eq!(s.player(P0).unwrap().tickets, vec![Ticket { color: Blue, value: 5 }]);
    let s = apply(&s, take(P1), &rules).unwrap();
    assert_eq!(s.player(P1).unwrap().tickets, vec![Ticket { color: Blue, value: 3 }]);
    assert!(s.tickets_left(Blue).is_empty());

    let err = apply(&s, take(P2), &rules).unwrap_err();
    assert_eq!(invalid(err), "no ticket left for this camel");
    assert_eq!(s.next_ticket(Green), Some(5));
}

#[test]
fn invalid_draws_are_rejected() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 0), (Green, 1), (Orange, 2)]);

    assert_eq!(invalid(apply(&s, roll(Blue, 4), &rules).unwrap_err()), "value is not a face of this die");
    assert_eq!(invalid(apply(&s, roll(Black, 1), &rules).unwrap_err()), "camel is not in this race");

    let s = apply(&s, roll(Blue, 1), &rules).unwrap();
    let err = apply(&s, roll(Blue, 2), &rules).unwrap_err();
    match err {
        ApplyError::InvalidAction { action, reason } => {
            assert_eq!(action, roll(Blue, 2));
            assert_eq!(reason, "die already drawn this leg");
        }
        other => panic!("unexpected {:?}", other),
    }

    let a = Action::TakeTicket {
        color: Blue,
        player: PlayerId(7),
    };
    assert_eq!(
        apply(&s, a, &rules).unwrap_err(),
        ApplyError::UnknownPlayer(PlayerId(7))
    );
}

#[test]
fn tile_fires_pays_owner_and_is_cleared_at_leg_end() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 0), (Green, 0), (Orange, 0)]);

    let place = |space, owner| Action::PlaceTile {
        space,
        effect: TileEffect::Oasis,
        owner,
    };
    let s = apply(&s, place(2, P1), &rules).unwrap();
    assert_eq!(s.player(P1).unwrap().placed_tile, Some(2));

    assert_eq!(
        invalid(apply(&s, place(5, P1), &rules).unwrap_err()),
        "player already placed a tile this leg"
    );
    assert_eq!(
        invalid(apply(&s, place(3, P0), &rules).unwrap_err()),
        "space is next to another tile"
    );
    assert_eq!(
        invalid(apply(&s, place(0, P0), &rules).unwrap_err()),
        "space is off the track"
    );

    let s = apply(&s, roll(Blue, 2), &rules).unwrap();
    assert_eq!(s.track().stack_at(3), vec![Blue, Green, Orange]);
    assert_eq!(s.player(P1).unwrap().coins, rules.starting_coins + rules.tiles.payout);

    let s = apply(&s, roll(Green, 1), &rules).unwrap();
    let s = apply(&s, roll(Orange, 1), &rules).unwrap();
    assert_eq!(s.leg(), 1);
    assert_eq!(s.track().tiles().count(), 0);
    assert_eq!(s.player(P1).unwrap().placed_tile, None);
    assert!(!s.pool().is_leg_over());
}

#[test]
fn tile_cannot_share_a_space_with_another_tile() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 0), (Green, 1), (Orange, 2)]);
    let place = |owner, effect| Action::PlaceTile {
        space: 6,
        effect,
        owner,
    };
    let s = apply(&s, place(P0, TileEffect::Oasis), &rules).unwrap();
    assert_eq!(
        invalid(apply(&s, place(P1, TileEffect::Mirage), &rules).unwrap_err()),
        "space already holds a tile"
    );
    assert_eq!(s.track().tile(6).map(|t| t.owner), Some(P0));
}

#[test]
fn tile_cannot_go_under_camels_or_next_to_the_leader() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 4), (Green, 8), (Orange, 2)]);
    let place = |space| Action::PlaceTile {
        space,
        effect: TileEffect::Mirage,
        owner: P0,
    };
    assert_eq!(invalid(apply(&s, place(4), &rules).unwrap_err()), "space holds camels");
    assert_eq!(
        invalid(apply(&s, place(9), &rules).unwrap_err()),
        "space is too close to the leading camel"
    );
    assert!(apply(&s, place(10), &rules).is_ok());
}

#[test]
fn leg_settlement_pays_tickets_and_restocks() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 10), (Green, 0), (Orange, 1)]);
    let s = apply(&s, Action::TakeTicket { color: Blue, player: P0 }, &rules).unwrap();
    let s = apply(&s, Action::TakeTicket { color: Green, player: P1 }, &rules).unwrap();
    let s = apply(&s, Action::TakeTicket { color: Green, player: P2 }, &rules).unwrap();
    let s = apply(&s, Action::TakeTicket { color: Orange, player: P2 }, &rules).unwrap();

    let s = apply(&s, roll(Green, 1), &rules).unwrap();
    let s = apply(&s, roll(Orange, 1), &rules).unwrap();
    assert_eq!(s.track().stack_at(2), vec![Orange, Green]);
    let s = apply(&s, roll(Blue, 1), &rules).unwrap();

    // Blue > Green > Orange
    assert_eq!(s.leg(), 1);
    assert_eq!(s.player(P0).unwrap().coins, 3 + 5);
    assert_eq!(s.player(P1).unwrap().coins, 3 + 1);
    assert_eq!(s.player(P2).unwrap().coins, 3 + 1 - 1);
    assert!(s.players().iter().all(|p| p.tickets.is_empty()));
    assert_eq!(s.tickets_left(Green), &[5, 3, 2]);
    assert_eq!(s.pool().remaining_dice(), 3);
    assert_eq!(s.phase(), &Phase::Running);
}

#[test]
fn finish_settles_overall_bets_and_ends_the_race() {
    let rules = Rules {
        finish_laps: Some(1),
        ..three_camels()
    };
    let s = race(&rules, &[(Blue, 15), (Green, 0), (Orange, 0)]);
    let bet = |color, side, player| Action::BetOverall {
        color,
        side,
        player,
    };
    let s = apply(&s, bet(Blue, OverallSide::Winner, P0), &rules).unwrap();
    let s = apply(&s, bet(Blue, OverallSide::Winner, P1), &rules).unwrap();
    let s = apply(&s, bet(Orange, OverallSide::Winner, P2), &rules).unwrap();
    let s = apply(&s, bet(Green, OverallSide::Loser, P0), &rules).unwrap();

    assert_eq!(
        invalid(apply(&s, bet(Blue, OverallSide::Loser, P0), &rules).unwrap_err()),
        "player already bet on this camel"
    );

    let s = apply(&s, roll(Blue, 1), &rules).unwrap();
    assert!(s.is_finished());
    assert_eq!(s.leg(), 1);
    assert_eq!(s.player(P0).unwrap().coins, 3 + 8 + 8);
    assert_eq!(s.player(P1).unwrap().coins, 3 + 5);
    assert_eq!(s.player(P2).unwrap().coins, 3 - 1);
    assert_eq!(s.winners(), Some(&[P0][..]));

    assert_eq!(
        apply(&s, roll(Green, 1), &rules).unwrap_err(),
        ApplyError::RaceFinished
    );
    assert!(Chance::new(0).roll(&s, &rules).is_none());
}

#[test]
fn overall_bets_need_a_finish_line() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 0), (Green, 1), (Orange, 2)]);
    let a = Action::BetOverall {
        color: Blue,
        side: OverallSide::Winner,
        player: P0,
    };
    assert_eq!(invalid(apply(&s, a, &rules).unwrap_err()), "the race has no finish line");
}

#[test]
fn advance_never_settles_the_leg() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 0), (Green, 1), (Orange, 2)]);
    let s = advance(&s, Draw::new(Blue, 3), &rules).unwrap();
    let s = advance(&s, Draw::new(Green, 1), &rules).unwrap();
    let s = advance(&s, Draw::new(Orange, 2), &rules).unwrap();

    assert!(s.pool().is_leg_over());
    assert!(s.is_leg_complete(&rules));
    assert_eq!(s.leg(), 0);
    assert_eq!(s.ranking().as_slice(), &[Green, Orange, Blue]);
    assert_eq!(
        advance(&s, Draw::new(Blue, 1), &rules).unwrap_err(),
        ApplyError::LegAlreadyOver
    );
}

#[test]
fn crazy_camel_carries_racers_backward() {
    let rules = Rules::crazy();
    let start = [
        (Color::Blue, 5),
        (Color::Green, 0),
        (Color::Yellow, 0),
        (Color::Red, 1),
        (Color::Purple, 2),
        (Color::White, 14),
        (Color::Black, 5),
    ];
    let s = RaceState::new(&rules, 2, &start).unwrap();
    assert_eq!(s.track().stack_at(5), vec![Blue, Black]);

    // Black sits on Blue, so only Black moves.
    let s = apply(&s, roll(Black, 2), &rules).unwrap();
    assert_eq!(s.track().stack_at(3), vec![Black]);
    assert_eq!(s.track().stack_at(5), vec![Blue]);

    // The crazy die is shared by both crazy camels.
    assert_eq!(
        invalid(apply(&s, roll(Color::White, 1), &rules).unwrap_err()),
        "die already drawn this leg"
    );

    let s = apply(&s, roll(Color::Red, 2), &rules).unwrap();
    assert_eq!(s.track().stack_at(3), vec![Black, Color::Red]);
    assert_eq!(s.ranking().leader(), Some(Blue));
    assert_eq!(s.ranking().len(), 5);
}

#[test]
fn crazy_camel_moving_under_a_racer_takes_it_back() {
    let rules = Rules::crazy();
    let start = [
        (Color::Green, 0),
        (Color::Yellow, 0),
        (Color::Red, 1),
        (Color::Purple, 2),
        (Color::White, 14),
        (Color::Black, 6),
        (Color::Blue, 6),
    ];
    let s = RaceState::new(&rules, 2, &start).unwrap();
    let s = apply(&s, roll(Black, 3), &rules).unwrap();
    assert_eq!(s.track().stack_at(3), vec![Black, Blue]);
    assert_eq!(s.track().camel(Blue).unwrap().displacement(), 3);
}

#[test]
fn leg_ends_with_the_crazy_die_still_in_the_pyramid() {
    let rules = Rules::crazy();
    let mut chance = Chance::new(5);
    let s = chance.setup(&rules, 3).unwrap();
    let mut s = s;
    for &c in &rules.racing_camels {
        s = apply(&s, roll(c, 1), &rules).unwrap();
    }
    assert_eq!(s.leg(), 1);
    assert!(s.pool().crazy_available());
}

#[test]
fn replaying_a_seed_gives_identical_states() {
    let rules = Rules::classic();
    let play = |seed: u64| {
        let mut chance = Chance::new(seed);
        let mut s = chance.setup(&rules, 4).unwrap();
        let mut turns = 0;
        while !s.is_finished() && turns < 500 {
            let draw = chance.roll(&s, &rules).unwrap();
            let player = PlayerId((turns % 4) as u8);
            s = apply(&s, Action::draw(draw, Some(player)), &rules).unwrap();
            s.validate(&rules).unwrap();
            turns += 1;
        }
        s
    };
    let a = play(11);
    assert!(a.is_finished());
    assert_eq!(a, play(11));
}

#[test]
fn setup_places_camels_by_rolled_face() {
    let rules = Rules::crazy();
    for seed in 0..20 {
        let s = Chance::new(seed).setup(&rules, 2).unwrap();
        s.validate(&rules).unwrap();
        for camel in s.track().camels() {
            let space = camel.space(rules.track_length);
            if rules.is_racing(camel.color) {
                assert!(space <= 2, "{} starts on {}", camel.color, space);
            } else {
                assert!((13..=15).contains(&space), "{} starts on {}", camel.color, space);
            }
        }
    }
}

#[test]
fn settle_pays_a_leg_left_open_by_advance() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 10), (Green, 0), (Orange, 1)]);
    let s = apply(&s, Action::TakeTicket { color: Blue, player: P0 }, &rules).unwrap();
    let open = [Draw::new(Green, 1), Draw::new(Orange, 1), Draw::new(Blue, 1)]
        .into_iter()
        .fold(s.clone(), |s, d| advance(&s, d, &rules).unwrap());
    assert_eq!(open.leg(), 0);

    let settled = settle(&open, &rules).unwrap();
    let applied = [roll(Green, 1), roll(Orange, 1), roll(Blue, 1)]
        .into_iter()
        .fold(s, |s, a| apply(&s, a, &rules).unwrap());
    assert_eq!(settled, applied);
    assert_eq!(settled.player(P0).unwrap().coins, 3 + 5);
    assert!(!settled.pool().is_leg_over());

    // Nothing due: unchanged.
    assert_eq!(settle(&settled, &rules).unwrap(), settled);
}

#[test]
fn settle_finishes_a_race_left_open_by_advance() {
    let rules = Rules {
        finish_laps: Some(1),
        ..three_camels()
    };
    let s = race(&rules, &[(Blue, 15), (Green, 0), (Orange, 0)]);
    let s = advance(&s, Draw::new(Blue, 1), &rules).unwrap();
    assert!(!s.is_finished());
    let s = settle(&s, &rules).unwrap();
    assert!(s.is_finished());
    assert_eq!(settle(&s, &rules).unwrap_err(), ApplyError::RaceFinished);
}

#[test]
fn lapping_camel_ranks_ahead_of_the_stack_on_top_of_it() {
    let rules = three_camels();
    let s = race(&rules, &[(Blue, 15), (Green, 0), (Orange, 5)]);
    let s = apply(&s, roll(Blue, 2), &rules).unwrap();
    let s = apply(&s, roll(Green, 1), &rules).unwrap();
    assert_eq!(s.track().stack_at(1), vec![Blue, Green]);
    assert_eq!(s.ranking().as_slice(), &[Blue, Orange, Green]);
}
