//! `cu play`: a line-oriented session around one race.

use std::io::{self, BufRead, Write};
use std::path::Path;

use log::{debug, warn};

use cu_calc::analyze;
use cu_core::{apply, Action, Color, OverallSide, RaceState, TileEffect};
use cu_logging::NdjsonWriter;

use crate::session::{decision_event, leg_event, render, render_analysis, Snapshot};

const HELP: &str = "\
commands:
  bet <color>                 take the top leg ticket of a camel
  place <space> <oasis|mirage> put your desert tile on a space (+1 / -1 also work)
  overall <winner|loser> <color>
                              bet on the race winner or loser
  roll [<color> <value>]      roll the pyramid, or enter a die rolled at the table
  hint [n]                    show the n best options for the player to move (default 5)
  board                       show the track
  save <path>                 write the race to a JSON snapshot
  help                        this text
  quit                        leave";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Bet(Color),
    Place(u8, TileEffect),
    Overall(OverallSide, Color),
    Roll(Option<(Color, u8)>),
    Hint(usize),
    Board,
    Save(String),
    Help,
    Quit,
}

fn parse_side(s: &str) -> Result<OverallSide, String> {
    match s.to_ascii_lowercase().as_str() {
        "winner" | "win" | "w" => Ok(OverallSide::Winner),
        "loser" | "lose" | "l" => Ok(OverallSide::Loser),
        _ => Err(format!("expected winner or loser, got '{}'", s)),
    }
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Ok(None);
    };
    let color = |s: &str| s.parse::<Color>().map_err(|e| e.to_string());
    let number = |s: &str| s.parse::<u8>().map_err(|_| format!("not a number: '{}'", s));
    let cmd = match (head.to_ascii_lowercase().as_str(), rest) {
        ("bet" | "ticket", [c]) => Command::Bet(color(c)?),
        ("place" | "tile", [space, effect]) => Command::Place(
            number(space)?,
            effect.parse::<TileEffect>().map_err(|e| e.to_string())?,
        ),
        ("overall", [side, c]) => Command::Overall(parse_side(side)?, color(c)?),
        ("roll", []) => Command::Roll(None),
        ("roll", [c, v]) => Command::Roll(Some((color(c)?, number(v)?))),
        ("hint", []) => Command::Hint(5),
        ("hint", [n]) => Command::Hint(number(n)? as usize),
        ("board" | "show", []) => Command::Board,
        ("save", [path]) => Command::Save(path.to_string()),
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => return Err(format!("cannot parse '{}' (try help)", line.trim())),
    };
    Ok(Some(cmd))
}

/// Apply `action`, pass the turn on and log any leg that settled.
fn act<W: Write>(
    snap: &mut Snapshot,
    action: Action,
    out: &mut W,
    log: &mut Option<NdjsonWriter>,
) -> io::Result<()> {
    let leg = snap.state.leg();
    let next = match apply(&snap.state, action, snap.rules()) {
        Ok(s) => s,
        Err(e) => {
            writeln!(out, "rejected: {}", e)?;
            return Ok(());
        }
    };
    writeln!(out, "{}", action)?;
    snap.state = next;
    snap.turn += 1;
    snap.to_move.0 = (snap.to_move.0 + 1) % snap.state.players().len() as u8;

    if snap.state.leg() != leg {
        let ranking = snap.state.ranking();
        writeln!(out, "leg {} over: {}", leg + 1, ranking)?;
        if let Some(w) = log.as_mut() {
            if let Err(e) = w.write_event(&leg_event(snap, leg, &ranking)) {
                warn!("cannot write leg event: {}", e);
            }
        }
    }
    Ok(())
}

fn finish_message(state: &RaceState) -> String {
    let names: Vec<String> = state
        .winners()
        .unwrap_or_default()
        .iter()
        .map(|p| p.to_string())
        .collect();
    format!("race over, won by {}", names.join(" and "))
}

/// Run the session until `quit`, end of input or the end of the race.
pub fn run<R: BufRead, W: Write>(
    snap: &mut Snapshot,
    input: R,
    out: &mut W,
    mut log: Option<NdjsonWriter>,
) -> io::Result<()> {
    write!(out, "{}", render(&snap.state, snap.rules()))?;
    for line in input.lines() {
        let line = line?;
        if snap.state.is_finished() {
            break;
        }
        let cmd = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };
        debug!("{}: {:?}", snap.to_move, cmd);
        let player = snap.to_move;
        match cmd {
            Command::Bet(color) => {
                act(snap, Action::TakeTicket { color, player }, out, &mut log)?
            }
            Command::Place(space, effect) => act(
                snap,
                Action::PlaceTile {
                    space,
                    effect,
                    owner: player,
                },
                out,
                &mut log,
            )?,
            Command::Overall(side, color) => act(
                snap,
                Action::BetOverall {
                    color,
                    side,
                    player,
                },
                out,
                &mut log,
            )?,
            Command::Roll(explicit) => {
                let draw = match explicit {
                    Some((color, value)) => Some(cu_core::Draw::new(color, value)),
                    None => snap.chance().roll(&snap.state, snap.rules()),
                };
                match draw {
                    Some(d) => act(snap, Action::draw(d, Some(player)), out, &mut log)?,
                    None => writeln!(out, "nothing to roll")?,
                }
            }
            Command::Hint(n) => match analyze(&snap.state, player, snap.rules(), &snap.config.calc) {
                Ok(analysis) => {
                    write!(out, "{}", render_analysis(&analysis, n))?;
                    if let Some(w) = log.as_mut() {
                        if let Err(e) = w.write_event(&decision_event(snap, &analysis, None)) {
                            warn!("cannot write decision event: {}", e);
                        }
                    }
                }
                Err(e) => writeln!(out, "no hint: {}", e)?,
            },
            Command::Board => write!(out, "{}", render(&snap.state, snap.rules()))?,
            Command::Save(path) => match snap.save(Path::new(&path)) {
                Ok(()) => writeln!(out, "saved {}", path)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => break,
        }
        if snap.state.is_finished() {
            write!(out, "{}", render(&snap.state, snap.rules()))?;
            writeln!(out, "{}", finish_message(&snap.state))?;
            break;
        }
    }
    if let Some(w) = log.as_mut() {
        if let Err(e) = w.flush() {
            warn!("cannot flush event log: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cu_core::Color::{Blue, Red};

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("bet blue"), Ok(Some(Command::Bet(Blue))));
        assert_eq!(
            parse_command("place 7 -1"),
            Ok(Some(Command::Place(7, TileEffect::Mirage)))
        );
        assert_eq!(
            parse_command("overall loser red"),
            Ok(Some(Command::Overall(OverallSide::Loser, Red)))
        );
        assert_eq!(
            parse_command("roll red 3"),
            Ok(Some(Command::Roll(Some((Red, 3)))))
        );
        assert_eq!(parse_command("hint"), Ok(Some(Command::Hint(5))));
        assert_eq!(parse_command("   "), Ok(None));
        assert!(parse_command("bet").is_err());
        assert!(parse_command("bet mauve").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn session_applies_actions_in_turn() {
        let mut snap = Snapshot::start(cu_core::Config::classic(), None).unwrap();
        let first = snap.rules().racing_camels[0];
        let input = format!("bet {}\nroll\nboard\nquit\n", first.name());
        let mut out = Vec::new();
        run(&mut snap, input.as_bytes(), &mut out, None).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("takes a"));
        assert_eq!(snap.turn, 2);
        assert_eq!(snap.to_move.0, 2);
        assert_eq!(snap.state.players()[0].tickets.len(), 1);
        assert_eq!(snap.state.pool().remaining_dice(), 4);
    }

    #[test]
    fn rejected_action_keeps_the_turn() {
        let mut snap = Snapshot::start(cu_core::Config::classic(), None).unwrap();
        let before = snap.state.clone();
        let mut out = Vec::new();
        run(&mut snap, "roll red 9\n".as_bytes(), &mut out, None).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("rejected"));
        assert_eq!(snap.state, before);
        assert_eq!(snap.turn, 0);
    }
}
