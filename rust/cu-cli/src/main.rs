//! cu: command line front end for the Camel Up leg calculator.
//!
//! Subcommands:
//! - new   write a fresh race snapshot
//! - calc  rank the options of the player to move in a snapshot
//! - play  line-oriented session around one race
//! - sim   play whole races, optimizer against random opponents

mod play;
mod session;

use std::env;
use std::io::{self, BufReader};
use std::path::Path;
use std::process;

use log::info;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

use cu_calc::{analyze, best_actions};
use cu_core::{apply, legal_actions, Action, Chance, Config, PlayerId};
use cu_logging::NdjsonWriter;

use session::{load_config, parse_player, render, render_analysis, Snapshot};

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{}", msg);
    process::exit(1);
}

/// Value following a flag, parsed.
fn flag_value<T: std::str::FromStr>(args: &[String], i: usize) -> T {
    let Some(raw) = args.get(i + 1) else {
        fail(format!("Missing value for {}", args[i]));
    };
    raw.parse()
        .unwrap_or_else(|_| fail(format!("Invalid {} value: {}", args[i], raw)))
}

fn print_help() {
    eprintln!(
        r#"cu - Camel Up leg calculator

USAGE:
    cu <COMMAND> [OPTIONS]

COMMANDS:
    new      Write a fresh race snapshot
    calc     Rank the options of the player to move
    play     Play a race interactively
    sim      Simulate races: optimizer against random opponents

OPTIONS:
    -h, --help       Print this help message
    -V, --version    Print version

Run `cu <COMMAND> --help` for command options. RUST_LOG=debug shows enumeration stats.
"#
    );
}

fn print_version() {
    println!("cu {}", env!("CARGO_PKG_VERSION"));
}

/// Options shared by the commands that start a race.
#[derive(Default)]
struct StartOptions {
    config: Option<String>,
    players: Option<u8>,
    seed: Option<u64>,
}

impl StartOptions {
    /// Consume `args[i]` (and its value) if it is a start option.
    fn take(&mut self, args: &[String], i: usize) -> Option<usize> {
        match args[i].as_str() {
            "--config" => self.config = Some(flag_value(args, i)),
            "--players" => self.players = Some(flag_value(args, i)),
            "--seed" => self.seed = Some(flag_value(args, i)),
            _ => return None,
        }
        Some(i + 2)
    }

    fn config(&self) -> (Config, Option<String>) {
        let (mut config, hash) = load_config(self.config.as_deref()).unwrap_or_else(|e| fail(e));
        if let Some(p) = self.players {
            config.session.players = p;
        }
        if let Some(s) = self.seed {
            config.session.seed = s;
            config.calc.seed = s;
        }
        config.validate().unwrap_or_else(|e| fail(e));
        (config, hash)
    }
}

fn cmd_new(args: &[String]) {
    let mut start = StartOptions::default();
    let mut out: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        if let Some(next) = start.take(args, i) {
            i = next;
            continue;
        }
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"cu new

USAGE:
    cu new --out race.json [--config cfg.yaml] [--players N] [--seed S]

OPTIONS:
    --out PATH       Snapshot to write (required)
    --config PATH    YAML rules/calc/session config (default: classic rules)
    --players N      Number of players, 2..=8 (default: from config)
    --seed S         Seed for the starting positions and dice (default: from config)
"#
                );
                return;
            }
            "--out" => {
                out = Some(flag_value(args, i));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `cu new`: {}", other);
                fail("Run `cu new --help` for usage.");
            }
        }
    }
    let Some(out) = out else {
        fail("Missing --out (run `cu new --help`)");
    };

    let (config, hash) = start.config();
    let snap = Snapshot::start(config, hash).unwrap_or_else(|e| fail(e));
    snap.save(Path::new(&out)).unwrap_or_else(|e| fail(e));
    print!("{}", render(&snap.state, snap.rules()));
    println!("wrote {}", out);
}

fn cmd_calc(args: &[String]) {
    let mut path: Option<String> = None;
    let mut player: Option<PlayerId> = None;
    let mut top: usize = 8;
    let mut json = false;
    let mut log_path: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"cu calc

USAGE:
    cu calc race.json [--player P] [--top N] [--json] [--log events.ndjson]

OPTIONS:
    --player P    Player to advise, A..H or 0-based index (default: player to move)
    --top N       Show the N best options and leg outcomes (default: 8)
    --json        Print the full analysis as JSON
    --log PATH    Append a decision event to an NDJSON log
"#
                );
                return;
            }
            "--player" => {
                let raw: String = flag_value(args, i);
                let id = parse_player(&raw)
                    .unwrap_or_else(|| fail(format!("Invalid --player value: {}", raw)));
                player = Some(id);
                i += 2;
            }
            "--top" => {
                top = flag_value(args, i);
                i += 2;
            }
            "--json" => {
                json = true;
                i += 1;
            }
            "--log" => {
                log_path = Some(flag_value(args, i));
                i += 2;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option for `cu calc`: {}", other);
                fail("Run `cu calc --help` for usage.");
            }
            other => {
                path = Some(other.to_string());
                i += 1;
            }
        }
    }
    let Some(path) = path else {
        fail("Missing snapshot path (run `cu calc --help`)");
    };

    let snap = Snapshot::load(Path::new(&path)).unwrap_or_else(|e| fail(e));
    let player = player.unwrap_or(snap.to_move);
    if snap.state.player(player).is_none() {
        fail(format!("No player {} in this race", player));
    }
    let analysis = analyze(&snap.state, player, snap.rules(), &snap.config.calc)
        .unwrap_or_else(|e| fail(format!("Analysis failed: {}", e)));

    if let Some(p) = log_path {
        let mut w = NdjsonWriter::open_append(&p)
            .unwrap_or_else(|e| fail(format!("Cannot open {}: {}", p, e)));
        w.write_event(&session::decision_event(&snap, &analysis, None))
            .and_then(|_| w.flush())
            .unwrap_or_else(|e| fail(format!("Cannot write {}: {}", p, e)));
    }

    if json {
        let text = serde_json::to_string_pretty(&analysis).unwrap_or_else(|e| fail(e));
        println!("{}", text);
    } else {
        print!("{}", render(&snap.state, snap.rules()));
        print!("{}", render_analysis(&analysis, top));
    }
}

fn cmd_play(args: &[String]) {
    let mut start = StartOptions::default();
    let mut load: Option<String> = None;
    let mut log_path: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        if let Some(next) = start.take(args, i) {
            i = next;
            continue;
        }
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"cu play

USAGE:
    cu play [--load race.json | --config cfg.yaml --players N --seed S] [--log events.ndjson]

OPTIONS:
    --load PATH      Resume a saved race
    --config PATH    YAML config for a new race (default: classic rules)
    --players N      Number of players for a new race
    --seed S         Seed for a new race
    --log PATH       Append leg and decision events to an NDJSON log

Type `help` in the session for its commands.
"#
                );
                return;
            }
            "--load" => {
                load = Some(flag_value(args, i));
                i += 2;
            }
            "--log" => {
                log_path = Some(flag_value(args, i));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `cu play`: {}", other);
                fail("Run `cu play --help` for usage.");
            }
        }
    }

    let mut snap = match load {
        Some(p) => Snapshot::load(Path::new(&p)).unwrap_or_else(|e| fail(e)),
        None => {
            let (config, hash) = start.config();
            Snapshot::start(config, hash).unwrap_or_else(|e| fail(e))
        }
    };
    let log = log_path.map(|p| {
        NdjsonWriter::open_append_with_flush(&p, 1)
            .unwrap_or_else(|e| fail(format!("Cannot open {}: {}", p, e)))
    });
    info!("session {} with {} players", snap.session_id, snap.state.players().len());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    play::run(&mut snap, BufReader::new(stdin.lock()), &mut stdout, log)
        .unwrap_or_else(|e| fail(format!("I/O error: {}", e)));
}

/// One race: player 0 follows the optimizer, the others pick uniformly among their options.
/// Races without a finish line stop after `calc.max_race_legs` legs.
fn sim_race(config: &Config, seed: u64) -> (Vec<i32>, Vec<PlayerId>, u32) {
    let rules = &config.rules;
    let mut chance = Chance::new(seed);
    let mut opponents = ChaCha8Rng::seed_from_u64(seed ^ 0xA5A5_A5A5_A5A5_A5A5);
    let mut state = chance
        .setup(rules, config.session.players as usize)
        .unwrap_or_else(|e| fail(e));
    let mut turn = 0usize;

    while !state.is_finished() && state.leg() < config.calc.max_race_legs {
        let player = PlayerId((turn % state.players().len()) as u8);
        let action = if player.0 == 0 {
            let ranked = best_actions(&state, player, rules, &config.calc)
                .unwrap_or_else(|e| fail(format!("Analysis failed: {}", e)));
            ranked.first().and_then(|a| a.candidate.to_action(player))
        } else {
            let options = legal_actions(&state, player, rules);
            if options.is_empty() {
                None
            } else {
                let pick = options[opponents.next_u32() as usize % options.len()];
                match pick {
                    Action::DrawDice { .. } => None,
                    other => Some(other),
                }
            }
        };
        let action = match action {
            Some(a) => a,
            None => match chance.roll(&state, rules) {
                Some(draw) => Action::draw(draw, Some(player)),
                None => break,
            },
        };
        state = apply(&state, action, rules).unwrap_or_else(|e| fail(format!("{}: {}", action, e)));
        turn += 1;
    }

    let coins = state.players().iter().map(|p| p.coins).collect();
    let winners = state.winners().map(<[PlayerId]>::to_vec).unwrap_or_default();
    (coins, winners, state.leg())
}

fn cmd_sim(args: &[String]) {
    let mut start = StartOptions::default();
    let mut races: u32 = 10;
    let mut race_samples: u32 = 200;

    let mut i = 0usize;
    while i < args.len() {
        if let Some(next) = start.take(args, i) {
            i = next;
            continue;
        }
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"cu sim

USAGE:
    cu sim [--races N] [--config cfg.yaml] [--players N] [--seed S] [--race-samples N]

OPTIONS:
    --races N          Races to play (default: 10)
    --race-samples N   Playouts per overall-bet estimate (default: 200)
    --config PATH      YAML config (default: classic rules)
    --players N        Number of players
    --seed S           Base seed
"#
                );
                return;
            }
            "--races" => {
                races = flag_value(args, i);
                i += 2;
            }
            "--race-samples" => {
                race_samples = flag_value(args, i);
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `cu sim`: {}", other);
                fail("Run `cu sim --help` for usage.");
            }
        }
    }

    let (mut config, _) = start.config();
    config.calc.race_samples = race_samples;
    let players = config.session.players as usize;
    let mut coins = vec![0i64; players];
    let mut wins = vec![0.0f64; players];
    let mut legs = 0u64;

    for r in 0..races {
        let (c, winners, l) = sim_race(&config, config.session.seed.wrapping_add(r as u64));
        for (acc, v) in coins.iter_mut().zip(&c) {
            *acc += *v as i64;
        }
        for w in &winners {
            wins[w.index()] += 1.0 / winners.len() as f64;
        }
        legs += l as u64;
        info!("race {}: coins {:?} winners {:?}", r, c, winners);
    }

    let n = races.max(1) as f64;
    println!("Simulation:");
    println!("  - Races: {}", races);
    println!("  - Mean legs: {:.2}", legs as f64 / n);
    for p in 0..players {
        let who = if p == 0 { " (optimizer)" } else { "" };
        println!(
            "  - {}{}: mean coins {:.2}, wins {:.1}%",
            PlayerId(p as u8),
            who,
            coins[p] as f64 / n,
            wins[p] / n * 100.0
        );
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        process::exit(0);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_help();
        }
        "-V" | "--version" => {
            print_version();
        }
        "new" => cmd_new(&args[2..]),
        "calc" => cmd_calc(&args[2..]),
        "play" => cmd_play(&args[2..]),
        "sim" => cmd_sim(&args[2..]),
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Run `cu --help` for usage.");
            process::exit(1);
        }
    }
}
