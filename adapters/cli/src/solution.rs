//! Solution stream encoding, decoding and replay.
//!
//! One command-character sequence per robot, robots separated by `#`. A `C`
//! inside a stream marks the spawn of a clone, after which the next stream
//! runs in parallel, interleaved turn by turn with its siblings. Ticks render
//! as the empty string and therefore never appear in the text.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use gridwrap_core::{Command, Direction, Point, RobotId};
use gridwrap_world::{apply, query, World};

/// Renders the per-robot command streams in the judge format.
pub(crate) fn encode(streams: &[Vec<Command>]) -> String {
    streams
        .iter()
        .map(|stream| {
            stream
                .iter()
                .map(ToString::to_string)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("#")
}

/// Reasons a solution text fails to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SolutionError {
    /// A character matched no command code.
    #[error("unknown command code {code:?}")]
    UnknownCode {
        /// Offending character.
        code: char,
    },
    /// A `B(..)` or `T(..)` argument did not parse as a point.
    #[error("malformed command argument {text:?}")]
    MalformedArgument {
        /// Offending fragment.
        text: String,
    },
}

/// Parses a solution text back into per-robot command streams.
pub(crate) fn decode(text: &str) -> Result<Vec<Vec<Command>>, SolutionError> {
    text.trim().split('#').map(decode_stream).collect()
}

fn decode_stream(text: &str) -> Result<Vec<Command>, SolutionError> {
    let mut commands = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(code) = chars.next() {
        let command = match code {
            'W' => Command::Move {
                direction: Direction::Up,
            },
            'S' => Command::Move {
                direction: Direction::Down,
            },
            'A' => Command::Move {
                direction: Direction::Left,
            },
            'D' => Command::Move {
                direction: Direction::Right,
            },
            'E' => Command::TurnCw,
            'Q' => Command::TurnCcw,
            'Z' => Command::Noop,
            'F' => Command::UseFastWheels,
            'L' => Command::UseDrill,
            'R' => Command::ResetTeleportAnchor,
            'C' => Command::Clone,
            'B' => Command::AttachManipulator {
                offset: parenthesized_point(&mut chars)?,
            },
            'T' => Command::ShiftToAnchor {
                anchor: parenthesized_point(&mut chars)?,
            },
            code => return Err(SolutionError::UnknownCode { code }),
        };
        commands.push(command);
    }

    Ok(commands)
}

fn parenthesized_point(chars: &mut Peekable<Chars<'_>>) -> Result<Point, SolutionError> {
    let mut text = String::new();
    if chars.next_if_eq(&'(').is_none() {
        return Err(SolutionError::MalformedArgument { text });
    }
    while let Some(next) = chars.next() {
        if next == ')' {
            let mut parts = text.split(',').map(str::trim);
            let x = parts.next().and_then(|part| part.parse::<i32>().ok());
            let y = parts.next().and_then(|part| part.parse::<i32>().ok());
            return match (x, y) {
                (Some(x), Some(y)) => Ok(Point::new(x, y)),
                _ => Err(SolutionError::MalformedArgument { text }),
            };
        }
        text.push(next);
    }
    Err(SolutionError::MalformedArgument { text })
}

/// Replays decoded streams against a fresh world, interleaving one command
/// per active robot per round with a tick in between, exactly as a judge
/// would. Returns the final world.
pub(crate) fn replay(mut world: World, streams: &[Vec<Command>]) -> anyhow::Result<World> {
    use anyhow::Context;

    let mut cursors = vec![0usize; streams.len()];
    loop {
        let active = query::robot_count(&world).min(streams.len());
        let mut advanced = false;

        for robot in 0..active {
            let Some(command) = streams[robot].get(cursors[robot]).copied() else {
                continue;
            };
            cursors[robot] += 1;
            advanced = true;
            world = apply(&world, RobotId::new(robot), command)
                .with_context(|| format!("replaying {command:?} for robot {robot}"))?;
        }

        if !advanced {
            break;
        }
        world = apply(&world, RobotId::new(0), Command::Tick).context("replaying tick")?;
    }

    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, replay, SolutionError};
    use gridwrap_core::{Command, Direction, Point};
    use gridwrap_system_swarm::{solve, SolveOptions};
    use gridwrap_world::{query, Grid, World};

    #[test]
    fn encodes_a_single_stream() {
        let stream = vec![
            Command::Move {
                direction: Direction::Up,
            },
            Command::TurnCw,
            Command::AttachManipulator {
                offset: Point::new(1, 2),
            },
            Command::Move {
                direction: Direction::Right,
            },
        ];
        assert_eq!(encode(&[stream]), "WEB(1,2)D");
    }

    #[test]
    fn separates_robot_streams_with_hashes() {
        let first = vec![
            Command::Clone,
            Command::Move {
                direction: Direction::Down,
            },
        ];
        let second = vec![
            Command::Move {
                direction: Direction::Left,
            },
            Command::Noop,
        ];
        assert_eq!(encode(&[first, second]), "CS#AZ");
    }

    #[test]
    fn ticks_are_invisible() {
        let stream = vec![
            Command::Move {
                direction: Direction::Up,
            },
            Command::Tick,
            Command::Move {
                direction: Direction::Down,
            },
        ];
        assert_eq!(encode(&[stream]), "WS");
    }

    #[test]
    fn decode_inverts_encode() {
        let streams = vec![
            vec![
                Command::Move {
                    direction: Direction::Up,
                },
                Command::AttachManipulator {
                    offset: Point::new(1, -2),
                },
                Command::TurnCcw,
                Command::ShiftToAnchor {
                    anchor: Point::new(3, 4),
                },
            ],
            vec![Command::UseFastWheels, Command::Noop],
        ];
        let text = encode(&streams);
        assert_eq!(decode(&text), Ok(streams));
    }

    #[test]
    fn decode_rejects_unknown_codes() {
        assert_eq!(
            decode("WXD"),
            Err(SolutionError::UnknownCode { code: 'X' })
        );
        assert!(matches!(
            decode("B(1;2)"),
            Err(SolutionError::MalformedArgument { .. })
        ));
    }

    #[test]
    fn solver_output_replays_to_a_solved_world() {
        let outline = vec![
            Point::new(0, 0),
            Point::new(6, 0),
            Point::new(6, 6),
            Point::new(0, 6),
        ];
        let obstacle = vec![
            Point::new(2, 2),
            Point::new(4, 2),
            Point::new(4, 4),
            Point::new(2, 4),
        ];
        let build = || {
            World::new(
                Grid::from_outline(&outline, &[obstacle.clone()], &[]),
                Point::new(0, 0),
            )
        };

        let solution = solve(build(), SolveOptions::default());
        assert!(solution.is_solved());

        let decoded = decode(&encode(solution.streams())).expect("round trip");
        let replayed = replay(build(), &decoded).expect("legal replay");
        assert!(query::has_solved(&replayed));
    }
}
