//! Payouts for leg tickets, overall bets and the final standings.

use crate::color::Color;
use crate::config::{OverallBetRules, Rules};
use crate::state::{OverallBet, PlayerId, PlayerState, Ticket};
use crate::track::Ranking;

/// Coins a ticket pays given the leg-end ranking. Camels missing from the ranking pay
/// the table's `otherwise` value.
pub fn ticket_payout(ticket: Ticket, ranking: &Ranking, rules: &Rules) -> i32 {
    let payout = &rules.tickets.payout;
    match ranking.rank_of(ticket.color) {
        Some(rank) => payout.payout(rank, ticket.value),
        None => payout.otherwise,
    }
}

/// Total coins each player's held tickets pay at the end of the leg.
pub fn leg_payouts(players: &[PlayerState], ranking: &Ranking, rules: &Rules) -> Vec<i32> {
    players
        .iter()
        .map(|p| {
            p.tickets
                .iter()
                .map(|&t| ticket_payout(t, ranking, rules))
                .sum()
        })
        .collect()
}

/// Settle one pile of overall bets against the color that actually won (or lost).
///
/// Correct bets are paid from `payouts` in placement order; once the table runs out, later
/// correct bets pay nothing. Wrong bets pay `wrong`.
pub fn overall_payouts(
    bets: &[OverallBet],
    actual: Option<Color>,
    rules: &OverallBetRules,
) -> Vec<(PlayerId, i32)> {
    let mut next = 0usize;
    bets.iter()
        .map(|bet| {
            if Some(bet.color) == actual {
                let coins = rules.payouts.get(next).copied().unwrap_or(0);
                next += 1;
                (bet.player, coins)
            } else {
                (bet.player, rules.wrong)
            }
        })
        .collect()
}

/// Payout the next correct bet on a pile would receive, given how many bets on that color
/// are already in it.
pub fn next_overall_payout(bets: &[OverallBet], color: Color, rules: &OverallBetRules) -> i32 {
    let ahead = bets.iter().filter(|b| b.color == color).count();
    rules.payouts.get(ahead).copied().unwrap_or(0)
}

/// Players holding the most coins.
pub fn winners(players: &[PlayerState]) -> Vec<PlayerId> {
    let Some(max) = players.iter().map(|p| p.coins).max() else {
        return Vec::new();
    };
    players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.coins == max)
        .map(|(i, _)| PlayerId(i as u8))
        .collect()
}
