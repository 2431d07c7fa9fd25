//! Exact leg enumeration.
//!
//! Walks every remaining (die, color, face) draw sequence of the current leg, weighting each
//! branch by `1 / (dice left * faces [* crazy colors])`, down to the end of the leg. Sub-results
//! are memoized on [`LegKey`], so sibling orders that reach the same positions are folded once.

use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashMap;

use cu_core::{move_on_board, Board, CalcConfig, Die, Draw, RaceState, Ranking, Rules, Space};

use crate::outcome::{LegDistribution, Precision, TileLandings};
use crate::key::LegKey;
use crate::CalcError;

/// Outcome of the rest of the leg from one node.
#[derive(Debug, Default)]
struct Partial {
    rankings: FxHashMap<Ranking, f64>,
    /// (mean, second moment) of landings, indexed like `Enumerator::tiles`.
    landings: Vec<(f64, f64)>,
    finish: f64,
    leaves: u64,
}

struct Enumerator<'a> {
    rules: &'a Rules,
    tiles: Vec<Space>,
    memo: FxHashMap<LegKey, Rc<Partial>>,
    nodes: u64,
    hits: u64,
}

impl<'a> Enumerator<'a> {
    fn visit(&mut self, board: &Board) -> Result<Rc<Partial>, CalcError> {
        let key = LegKey::of(board);
        if let Some(hit) = self.memo.get(&key) {
            self.hits += 1;
            return Ok(Rc::clone(hit));
        }
        self.nodes += 1;

        let partial = if board.is_leg_complete(self.rules) {
            self.leaf(board)
        } else {
            self.expand(board)?
        };
        let partial = Rc::new(partial);
        self.memo.insert(key, Rc::clone(&partial));
        Ok(partial)
    }

    fn leaf(&self, board: &Board) -> Partial {
        let mut rankings = FxHashMap::default();
        rankings.insert(board.track.ranking(), 1.0);
        let finished = board.track.finish_reached(self.rules.finish_displacement());
        Partial {
            rankings,
            landings: vec![(0.0, 0.0); self.tiles.len()],
            finish: if finished { 1.0 } else { 0.0 },
            leaves: 1,
        }
    }

    fn expand(&mut self, board: &Board) -> Result<Partial, CalcError> {
        let rules = self.rules;
        let dice = board.pool.available();
        let mut out = Partial {
            landings: vec![(0.0, 0.0); self.tiles.len()],
            ..Partial::default()
        };

        for die in &dice {
            let colors: Vec<_> = match *die {
                Die::Racing(color) => vec![color],
                Die::Crazy => rules.crazy_colors().to_vec(),
            };
            for &color in &colors {
                let faces = rules.faces_for(color);
                let w = 1.0 / (dice.len() * colors.len() * faces.len()) as f64;
                for &value in faces {
                    let mut child_board = board.clone();
                    let landing = move_on_board(&mut child_board, Draw::new(color, value), rules)?;
                    let hit = landing
                        .tile
                        .and_then(|(space, _)| self.tiles.iter().position(|&s| s == space));
                    let child = self.visit(&child_board)?;

                    for (ranking, p) in &child.rankings {
                        *out.rankings.entry(*ranking).or_insert(0.0) += w * p;
                    }
                    for (i, (mean, second)) in out.landings.iter_mut().enumerate() {
                        let (c_mean, c_second) = child.landings[i];
                        let l = if hit == Some(i) { 1.0 } else { 0.0 };
                        *mean += w * (l + c_mean);
                        *second += w * (l + 2.0 * l * c_mean + c_second);
                    }
                    out.finish += w * child.finish;
                    out.leaves += child.leaves;
                }
            }
        }
        Ok(out)
    }
}

/// Exact distribution of the current leg's outcome.
///
/// Fails with [`CalcError::EnumerationBudgetExceeded`] when more than `calc.max_exact_dice`
/// dice are left in the pyramid.
pub fn exact_distribution(
    state: &RaceState,
    rules: &Rules,
    calc: &CalcConfig,
) -> Result<LegDistribution, CalcError> {
    let board = state.board();
    let remaining = board.pool.remaining_dice();
    if state.is_finished() || board.is_leg_complete(rules) {
        return Ok(LegDistribution::certain(
            state.ranking(),
            board.track.finish_reached(rules.finish_displacement()),
        ));
    }
    if remaining > calc.max_exact_dice as usize {
        return Err(CalcError::EnumerationBudgetExceeded {
            remaining,
            ceiling: calc.max_exact_dice as usize,
        });
    }

    let tiles: Vec<_> = board.track.tiles().collect();
    let mut e = Enumerator {
        rules,
        tiles: tiles.iter().map(|&(s, _)| s).collect(),
        memo: FxHashMap::default(),
        nodes: 0,
        hits: 0,
    };
    let root = e.visit(board)?;
    debug!(
        "enumerated leg: {} dice, {} nodes, {} memo hits, {} terminal branches, {} rankings",
        remaining,
        e.nodes,
        e.hits,
        root.leaves,
        root.rankings.len()
    );

    let landings = tiles
        .iter()
        .zip(&root.landings)
        .map(|(&(space, tile), &(mean, second_moment))| TileLandings {
            space,
            owner: tile.owner,
            mean,
            second_moment,
        })
        .collect();
    Ok(LegDistribution::new(
        root.rankings.iter().map(|(r, p)| (*r, *p)),
        root.leaves,
        landings,
        root.finish,
        Precision::Exact,
    ))
}
