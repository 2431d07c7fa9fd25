//! Saved races, board rendering and the NDJSON events the CLI writes.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cu_calc::{Analysis, Precision};
use cu_core::{Chance, Config, PlayerId, RaceState, Ranking, Rules};
use cu_logging::{
    hash_config_bytes, now_ms, read_json, write_json_atomic, DecisionEventV1, LegEventV1,
    RankedOptionV1, VersionInfoV1,
};

/// Snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a race: rules, state, whose turn it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_version: u32,
    pub session_id: String,
    pub config: Config,
    pub config_hash: Option<String>,
    pub to_move: PlayerId,
    /// Actions applied so far; reseeds the dice after a reload.
    pub turn: u64,
    pub state: RaceState,
}

impl Snapshot {
    pub fn start(config: Config, config_hash: Option<String>) -> Result<Snapshot, String> {
        let mut chance = Chance::new(config.session.seed);
        let state = chance
            .setup(&config.rules, config.session.players as usize)
            .map_err(|e| format!("cannot set up race: {}", e))?;
        Ok(Snapshot {
            snapshot_version: SNAPSHOT_VERSION,
            session_id: format!("{:016x}", config.session.seed ^ now_ms()),
            config,
            config_hash,
            to_move: PlayerId(0),
            turn: 0,
            state,
        })
    }

    /// Load and check a saved race. A snapshot whose state breaks an invariant is rejected.
    pub fn load(path: &Path) -> Result<Snapshot, String> {
        let snap: Snapshot =
            read_json(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        if snap.snapshot_version != SNAPSHOT_VERSION {
            return Err(format!(
                "unsupported snapshot version {} (expected {})",
                snap.snapshot_version, SNAPSHOT_VERSION
            ));
        }
        snap.config
            .validate()
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        snap.state
            .validate(&snap.config.rules)
            .map_err(|e| format!("{}: corrupt race state: {}", path.display(), e))?;
        if snap.state.player(snap.to_move).is_none() {
            return Err(format!("{}: no player {}", path.display(), snap.to_move));
        }
        Ok(snap)
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        write_json_atomic(path, self).map_err(|e| format!("cannot write {}: {}", path.display(), e))
    }

    pub fn rules(&self) -> &Rules {
        &self.config.rules
    }

    /// Dice stream for the current turn.
    pub fn chance(&self) -> Chance {
        Chance::new(self.config.session.seed.wrapping_add(self.turn))
    }

    pub fn version_info(&self) -> VersionInfoV1 {
        VersionInfoV1::new(cu_core::VERSION, self.config_hash.clone())
    }
}

/// Config from `path`, or the classic preset. The hash covers the file bytes.
pub fn load_config(path: Option<&str>) -> Result<(Config, Option<String>), String> {
    match path {
        None => Ok((Config::classic(), None)),
        Some(p) => {
            let yaml = std::fs::read_to_string(p).map_err(|e| format!("cannot read {}: {}", p, e))?;
            let config = Config::from_yaml(&yaml).map_err(|e| format!("{}: {}", p, e))?;
            Ok((config, Some(hash_config_bytes(yaml.as_bytes()))))
        }
    }
}

/// `A`..`H` or a 0-based index.
pub fn parse_player(s: &str) -> Option<PlayerId> {
    if let Ok(i) = s.parse::<u8>() {
        return Some(PlayerId(i));
    }
    let mut chars = s.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some(PlayerId(c.to_ascii_uppercase() as u8 - b'A'))
        }
        _ => None,
    }
}

fn names(ranking: &Ranking) -> Vec<String> {
    ranking
        .as_slice()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

/// Text board: one line per occupied or tiled space, stacks listed bottom to top.
pub fn render(state: &RaceState, rules: &Rules) -> String {
    let track = state.track();
    let mut out = String::new();
    let _ = writeln!(out, "leg {}  ranking: {}", state.leg() + 1, state.ranking());
    for space in 0..track.length() {
        let stack = track.stack_at(space);
        let tile = track.tile(space);
        if stack.is_empty() && tile.is_none() {
            continue;
        }
        let _ = write!(out, "  {:>2} |", space);
        for c in &stack {
            let _ = write!(out, " {}", c);
        }
        if let Some(t) = tile {
            let _ = write!(out, " [{} tile of {}]", t.effect, t.owner);
        }
        out.push('\n');
    }

    let pool = state.pool();
    let dice: Vec<String> = pool.remaining_colors().iter().map(|c| c.to_string()).collect();
    let crazy = if pool.crazy_available() { " + crazy" } else { "" };
    let _ = writeln!(out, "dice left: {}{}", dice.join(" "), crazy);

    let tickets: Vec<String> = rules
        .racing_camels
        .iter()
        .map(|&c| match state.next_ticket(c) {
            Some(v) => format!("{} {}", c, v),
            None => format!("{} -", c),
        })
        .collect();
    let _ = writeln!(out, "tickets: {}", tickets.join(", "));

    for (i, p) in state.players().iter().enumerate() {
        let held: Vec<String> = p
            .tickets
            .iter()
            .map(|t| format!("{}:{}", t.color, t.value))
            .collect();
        let _ = writeln!(
            out,
            "  {}: {} coins  tickets [{}]",
            PlayerId(i as u8),
            p.coins,
            held.join(" ")
        );
    }
    out
}

/// Ranked options, the leg distribution and the race outlook as text.
pub fn render_analysis(analysis: &Analysis, top: usize) -> String {
    let mut out = String::new();
    let d = &analysis.distribution;
    let precision = match d.precision() {
        Precision::Exact => format!("exact, {} branches", d.terminal_branches()),
        Precision::Sampled { samples } => format!("sampled, {} legs", samples),
    };
    let _ = writeln!(out, "leg outcome ({}):", precision);
    for (ranking, p) in d.rankings().iter().take(top) {
        let _ = writeln!(out, "  {:>6.2}%  {}", p * 100.0, ranking);
    }
    if d.finish_probability() > 0.0 {
        let _ = writeln!(out, "  race ends this leg: {:.2}%", d.finish_probability() * 100.0);
    }

    if let Some(race) = &analysis.race {
        let _ = writeln!(out, "race outlook ({} playouts):", race.samples);
        for (c, p) in &race.winner {
            let _ = writeln!(
                out,
                "  {:<8} wins {:>6.2}%  last {:>6.2}%",
                c.to_string(),
                p * 100.0,
                race.loser_probability(*c) * 100.0
            );
        }
    }

    let _ = writeln!(out, "best options for {}:", analysis.player);
    for a in analysis.actions.iter().take(top) {
        let _ = writeln!(
            out,
            "  {:>+7.3}  sd {:>6.3}  {}",
            a.ev,
            a.variance.sqrt(),
            a.candidate
        );
    }
    out
}

pub fn decision_event(snap: &Snapshot, analysis: &Analysis, chosen: Option<String>) -> DecisionEventV1 {
    let d = &analysis.distribution;
    let (precision, samples) = match d.precision() {
        Precision::Exact => ("exact", None),
        Precision::Sampled { samples } => ("sampled", Some(samples)),
    };
    DecisionEventV1 {
        event: "decision".to_string(),
        ts_ms: now_ms(),
        v: snap.version_info(),
        session_id: snap.session_id.clone(),
        leg: snap.state.leg(),
        player: analysis.player.0,
        ranking: names(&snap.state.ranking()),
        dice_left: snap.state.pool().remaining_dice() as u8,
        precision: precision.to_string(),
        samples,
        branches: d.terminal_branches(),
        options: analysis
            .actions
            .iter()
            .map(|a| RankedOptionV1 {
                action: a.candidate.to_string(),
                ev: a.ev,
                variance: a.variance,
            })
            .collect(),
        chosen,
    }
}

/// Settlement of leg `leg`, read off the state right after it.
pub fn leg_event(snap: &Snapshot, leg: u32, ranking: &Ranking) -> LegEventV1 {
    LegEventV1 {
        event: "leg".to_string(),
        ts_ms: now_ms(),
        v: snap.version_info(),
        session_id: snap.session_id.clone(),
        leg,
        ranking: names(ranking),
        coins: snap.state.players().iter().map(|p| p.coins).collect(),
        race_finished: snap.state.is_finished(),
    }
}
