//! Outcome distribution over leg-end rankings.

use serde::Serialize;

use cu_core::{Color, PlayerId, Ranking, Space};

/// How a [`LegDistribution`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precision {
    /// Every draw sequence of the leg was enumerated.
    Exact,
    /// Monte Carlo estimate from `samples` simulated legs.
    Sampled { samples: u32 },
}

/// Landing statistics for one tile on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileLandings {
    pub space: Space,
    pub owner: PlayerId,
    /// Expected number of stacks landing on the tile before the leg ends.
    pub mean: f64,
    /// Expected square of that number.
    pub second_moment: f64,
}

impl TileLandings {
    pub fn variance(&self) -> f64 {
        (self.second_moment - self.mean * self.mean).max(0.0)
    }
}

/// Probability of each leg-end ranking, plus the per-leg statistics the optimizer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegDistribution {
    /// Most likely first; equal probabilities in ranking order.
    rankings: Vec<(Ranking, f64)>,
    terminal_branches: u64,
    tiles: Vec<TileLandings>,
    finish_probability: f64,
    precision: Precision,
}

impl LegDistribution {
    pub(crate) fn new(
        rankings: impl IntoIterator<Item = (Ranking, f64)>,
        terminal_branches: u64,
        tiles: Vec<TileLandings>,
        finish_probability: f64,
        precision: Precision,
    ) -> Self {
        let mut rankings: Vec<(Ranking, f64)> =
            rankings.into_iter().filter(|(_, p)| *p > 0.0).collect();
        rankings.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Self {
            rankings,
            terminal_branches,
            tiles,
            finish_probability,
            precision,
        }
    }

    /// Distribution of a leg that is already over.
    pub fn certain(ranking: Ranking, finished: bool) -> Self {
        Self::new(
            [(ranking, 1.0)],
            1,
            Vec::new(),
            if finished { 1.0 } else { 0.0 },
            Precision::Exact,
        )
    }

    pub fn rankings(&self) -> &[(Ranking, f64)] {
        &self.rankings
    }

    pub fn probability(&self, ranking: &Ranking) -> f64 {
        self.rankings
            .iter()
            .find(|(r, _)| r == ranking)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    /// `P(color finishes the leg at rank i)` for every rank, leader first.
    pub fn rank_probabilities(&self, color: Color) -> Vec<f64> {
        let n = self.rankings.first().map(|(r, _)| r.len()).unwrap_or(0);
        let mut out = vec![0.0; n];
        for (ranking, p) in &self.rankings {
            if let Some(rank) = ranking.rank_of(color) {
                out[rank] += p;
            }
        }
        out
    }

    pub fn leader_probability(&self, color: Color) -> f64 {
        self.rank_probabilities(color).first().copied().unwrap_or(0.0)
    }

    /// Expected value of `f` over leg-end rankings.
    pub fn expectation(&self, f: impl Fn(&Ranking) -> f64) -> f64 {
        self.rankings.iter().map(|(r, p)| p * f(r)).sum()
    }

    /// Sum of all probabilities; 1 up to rounding.
    pub fn total_probability(&self) -> f64 {
        self.rankings.iter().map(|(_, p)| p).sum()
    }

    /// Number of draw sequences (or samples) that reached the end of the leg.
    pub fn terminal_branches(&self) -> u64 {
        self.terminal_branches
    }

    pub fn tiles(&self) -> &[TileLandings] {
        &self.tiles
    }

    pub fn tile_landings(&self, space: Space) -> Option<&TileLandings> {
        self.tiles.iter().find(|t| t.space == space)
    }

    /// Probability that a racing camel crosses the finish during this leg.
    pub fn finish_probability(&self) -> f64 {
        self.finish_probability
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn is_exact(&self) -> bool {
        self.precision == Precision::Exact
    }
}
