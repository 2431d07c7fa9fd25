use cu_core::Color::{Blue, Red, Yellow};
use cu_core::{
    apply, Action, CalcConfig, Chance, Color, OverallSide, PlayerId, RaceState, Rules, TileEffect,
};

use crate::{analyze, best_actions, distribution, Candidate, RankedAction};

const EPS: f64 = 1e-9;
const P0: PlayerId = PlayerId(0);

fn roll(color: Color, value: u8) -> Action {
    Action::DrawDice {
        color,
        value,
        roller: None,
    }
}

fn three_camels() -> Rules {
    Rules {
        racing_camels: vec![Red, Blue, Yellow],
        ..Rules::default()
    }
}

/// Red on 4, Blue on 2, Yellow on 0 with only Yellow's die left.
fn yellow_to_move(rules: &Rules) -> RaceState {
    let s = RaceState::new(rules, 2, &[(Yellow, 0), (Blue, 0), (Red, 1)]).unwrap();
    let s = apply(&s, roll(Red, 3), rules).unwrap();
    apply(&s, roll(Blue, 2), rules).unwrap()
}

fn find(actions: &[RankedAction], candidate: Candidate) -> &RankedAction {
    actions
        .iter()
        .find(|a| a.candidate == candidate)
        .unwrap_or_else(|| panic!("{} not ranked", candidate))
}

fn assert_sorted(actions: &[RankedAction]) {
    for w in actions.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        assert!(
            a.ev > b.ev
                || (a.ev == b.ev && a.variance < b.variance)
                || (a.ev == b.ev && a.variance == b.variance && a.candidate < b.candidate),
            "{:?} ranked before {:?}",
            a,
            b
        );
    }
}

#[test]
fn sure_leader_ticket_ranks_first() {
    let rules = three_camels();
    let s = yellow_to_move(&rules);
    let actions = best_actions(&s, P0, &rules, &CalcConfig::default()).unwrap();

    let best = actions[0];
    assert_eq!(best.candidate, Candidate::TakeTicket { color: Red });
    assert!((best.ev - 5.0).abs() < EPS);
    assert!(best.variance.abs() < EPS);
    assert_sorted(&actions);

    let roll = find(&actions, Candidate::Roll);
    assert_eq!(roll.ev, rules.roll_reward as f64);
    assert!(actions
        .iter()
        .all(|a| !matches!(a.candidate, Candidate::BetOverall { .. })));
}

#[test]
fn ticket_ev_matches_rank_probabilities() {
    let rules = Rules::classic();
    let mut s = Chance::new(21).setup(&rules, 4).unwrap();
    s = apply(&s, roll(Blue, 2), &rules).unwrap();
    let calc = CalcConfig::default();
    let dist = distribution(&s, &rules, &calc).unwrap();
    let actions = best_actions(&s, P0, &rules, &calc).unwrap();

    for &color in &rules.racing_camels {
        let face = s.next_ticket(color).unwrap();
        let expected: f64 = dist
            .rank_probabilities(color)
            .iter()
            .enumerate()
            .map(|(rank, p)| p * rules.tickets.payout.payout(rank, face) as f64)
            .sum();
        let got = find(&actions, Candidate::TakeTicket { color });
        assert!((got.ev - expected).abs() < 1e-9, "{}: {} vs {}", color, got.ev, expected);
    }
    assert_sorted(&actions);
}

#[test]
fn tile_value_includes_effect_on_held_tickets() {
    let rules = three_camels();
    let s = yellow_to_move(&rules);
    let s = apply(&s, Action::TakeTicket { color: Blue, player: P0 }, &rules).unwrap();
    let actions = best_actions(&s, P0, &rules, &CalcConfig::default()).unwrap();

    // Blue ticket now: 2nd with 1/3 (+1), 3rd with 2/3 (-1).
    // An oasis on 1 sends Yellow=1 onto Blue: Blue is always 3rd. One landing in three.
    let oasis = find(
        &actions,
        Candidate::PlaceTile {
            space: 1,
            effect: TileEffect::Oasis,
        },
    );
    assert!((oasis.ev - (1.0 / 3.0 - 2.0 / 3.0)).abs() < EPS);
    assert!((oasis.variance - 2.0 / 9.0).abs() < EPS);

    // A mirage on 1 drops Yellow=1 back to 0: the standings do not change.
    let mirage = find(
        &actions,
        Candidate::PlaceTile {
            space: 1,
            effect: TileEffect::Mirage,
        },
    );
    assert!((mirage.ev - 1.0 / 3.0).abs() < EPS);
}

#[test]
fn overall_bets_are_ranked_with_a_finish_line() {
    let rules = Rules::classic();
    let s = Chance::new(3).setup(&rules, 4).unwrap();
    let calc = CalcConfig {
        race_samples: 200,
        ..CalcConfig::default()
    };
    let analysis = analyze(&s, P0, &rules, &calc).unwrap();

    let bets: Vec<_> = analysis
        .actions
        .iter()
        .filter(|a| matches!(a.candidate, Candidate::BetOverall { .. }))
        .collect();
    assert_eq!(bets.len(), 10);
    for bet in bets {
        assert!(bet.ev >= rules.overall.wrong as f64 - EPS);
        assert!(bet.ev <= rules.overall.payouts[0] as f64 + EPS);
    }
    let race = analysis.race.as_ref().unwrap();
    let blue_winner = Candidate::BetOverall {
        color: Blue,
        side: OverallSide::Winner,
    };
    let p = race.winner_probability(Blue);
    let expected = p * 8.0 - (1.0 - p);
    assert!((find(&analysis.actions, blue_winner).ev - expected).abs() < EPS);
    assert_eq!(analysis.best(), analysis.actions.first());
    assert!(analysis.distribution.is_exact());
}

#[test]
fn parallel_and_sequential_rankings_agree() {
    let rules = Rules::classic();
    let mut s = Chance::new(17).setup(&rules, 3).unwrap();
    s = apply(&s, roll(Red, 1), &rules).unwrap();
    let calc = |parallel| CalcConfig {
        race_samples: 100,
        parallel,
        ..CalcConfig::default()
    };
    let a = best_actions(&s, PlayerId(1), &rules, &calc(true)).unwrap();
    let b = best_actions(&s, PlayerId(1), &rules, &calc(false)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn candidates_map_to_engine_actions() {
    let p = PlayerId(3);
    assert_eq!(
        Candidate::TakeTicket { color: Red }.to_action(p),
        Some(Action::TakeTicket {
            color: Red,
            player: p
        })
    );
    assert_eq!(
        Candidate::PlaceTile {
            space: 7,
            effect: TileEffect::Mirage
        }
        .to_action(p),
        Some(Action::PlaceTile {
            space: 7,
            effect: TileEffect::Mirage,
            owner: p
        })
    );
    assert_eq!(Candidate::Roll.to_action(p), None);
}

#[test]
fn finished_race_has_no_options() {
    let rules = Rules {
        finish_laps: Some(1),
        ..three_camels()
    };
    let s = RaceState::new(&rules, 2, &[(Yellow, 0), (Blue, 0), (Red, 15)]).unwrap();
    let s = apply(&s, roll(Red, 2), &rules).unwrap();
    assert!(best_actions(&s, P0, &rules, &CalcConfig::default())
        .unwrap()
        .is_empty());
}
