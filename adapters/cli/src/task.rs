//! Task description parsing.
//!
//! A task file carries four `#`-separated fields: the outline polygon, the
//! start point, the `;`-separated obstacle polygons and the `;`-separated
//! booster placements, each booster prefixed by its one-letter kind code.

use thiserror::Error;

use gridwrap_core::{BoosterKind, Point};
use gridwrap_world::{Grid, World};

/// Reasons a task description fails to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TaskError {
    /// The description did not split into the four expected fields.
    #[error("task description needs 4 '#'-separated fields, found {found}")]
    FieldCount {
        /// Number of fields actually present.
        found: usize,
    },
    /// A coordinate pair did not parse.
    #[error("malformed point {text:?}")]
    BadPoint {
        /// Offending fragment.
        text: String,
    },
    /// A booster entry was empty or truncated.
    #[error("malformed booster entry {text:?}")]
    BadBooster {
        /// Offending fragment.
        text: String,
    },
    /// A booster entry used a code letter outside B/F/L/X/R/C.
    #[error("unknown booster code {code:?}")]
    UnknownBooster {
        /// Offending code letter.
        code: char,
    },
    /// The outline polygon had fewer than three corners.
    #[error("the outline polygon needs at least 3 corners")]
    DegenerateOutline,
}

/// An in-memory task: arena outline, start pose, obstacles and booster
/// placements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Task {
    pub(crate) name: String,
    pub(crate) outline: Vec<Point>,
    pub(crate) start: Point,
    pub(crate) obstacles: Vec<Vec<Point>>,
    pub(crate) boosters: Vec<(Point, BoosterKind)>,
}

impl Task {
    /// Parses a task description from its textual form.
    pub(crate) fn parse(name: &str, text: &str) -> Result<Self, TaskError> {
        let fields: Vec<&str> = text.trim().split('#').collect();
        if fields.len() != 4 {
            return Err(TaskError::FieldCount {
                found: fields.len(),
            });
        }

        let outline = parse_polygon(fields[0])?;
        if outline.len() < 3 {
            return Err(TaskError::DegenerateOutline);
        }
        let start = parse_point(fields[1])?;
        let obstacles = parse_polygon_list(fields[2])?;
        let boosters = parse_boosters(fields[3])?;

        Ok(Self {
            name: name.to_owned(),
            outline,
            start,
            obstacles,
            boosters,
        })
    }

    /// Rasterizes the task into a fresh world with one robot at the start
    /// pose.
    pub(crate) fn to_world(&self) -> World {
        let grid = Grid::from_outline(&self.outline, &self.obstacles, &self.boosters);
        World::new(grid, self.start)
    }
}

fn parse_point(text: &str) -> Result<Point, TaskError> {
    let cleaned = text.replace(['(', ')'], " ");
    let mut parts = cleaned.split(',').map(str::trim);
    let x = parts.next().and_then(|part| part.parse::<i32>().ok());
    let y = parts.next().and_then(|part| part.parse::<i32>().ok());
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point::new(x, y)),
        _ => Err(TaskError::BadPoint {
            text: text.to_owned(),
        }),
    }
}

fn parse_polygon(text: &str) -> Result<Vec<Point>, TaskError> {
    text.split("),(").map(parse_point).collect()
}

fn parse_polygon_list(text: &str) -> Result<Vec<Vec<Point>>, TaskError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(';').map(parse_polygon).collect()
}

fn parse_boosters(text: &str) -> Result<Vec<(Point, BoosterKind)>, TaskError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    text.split(';')
        .map(|entry| {
            let entry = entry.trim();
            let mut chars = entry.chars();
            let code = chars.next().ok_or_else(|| TaskError::BadBooster {
                text: entry.to_owned(),
            })?;
            let kind = BoosterKind::from_code(code)
                .ok_or(TaskError::UnknownBooster { code })?;
            let point = parse_point(chars.as_str())?;
            Ok((point, kind))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskError};
    use gridwrap_core::{BoosterKind, Point, Status};
    use gridwrap_world::query;

    const SAMPLE: &str =
        "(0,0),(8,0),(8,8),(0,8)#(0,0)#(2,2),(4,2),(4,4),(2,4)#B(1,1);X(6,6);C(3,6)";

    #[test]
    fn parses_the_sample_description() {
        let task = Task::parse("sample", SAMPLE).expect("well-formed task");
        assert_eq!(task.outline.len(), 4);
        assert_eq!(task.start, Point::new(0, 0));
        assert_eq!(task.obstacles.len(), 1);
        assert_eq!(
            task.boosters,
            vec![
                (Point::new(1, 1), BoosterKind::ManipulatorExtension),
                (Point::new(6, 6), BoosterKind::Mystery),
                (Point::new(3, 6), BoosterKind::Cloning),
            ]
        );
    }

    #[test]
    fn empty_obstacle_and_booster_fields_are_allowed() {
        let task =
            Task::parse("plain", "(0,0),(3,0),(3,3),(0,3)#(1,1)##").expect("minimal task");
        assert!(task.obstacles.is_empty());
        assert!(task.boosters.is_empty());
    }

    #[test]
    fn field_count_is_validated() {
        let error = Task::parse("broken", "(0,0),(3,0),(3,3),(0,3)#(1,1)#").unwrap_err();
        assert_eq!(error, TaskError::FieldCount { found: 3 });
    }

    #[test]
    fn bad_points_are_reported() {
        let error = Task::parse("broken", "(0,0),(x,0),(3,3),(0,3)#(1,1)##").unwrap_err();
        assert!(matches!(error, TaskError::BadPoint { .. }));
    }

    #[test]
    fn unknown_booster_codes_are_reported() {
        let error =
            Task::parse("broken", "(0,0),(3,0),(3,3),(0,3)#(1,1)##Q(1,1)").unwrap_err();
        assert_eq!(error, TaskError::UnknownBooster { code: 'Q' });
    }

    #[test]
    fn rasterized_world_reflects_the_description() {
        let task = Task::parse("sample", SAMPLE).expect("well-formed task");
        let world = task.to_world();
        let grid = query::grid(&world);

        assert_eq!(grid.get(Point::new(3, 3)).status(), Status::Wall);
        assert_eq!(grid.get(Point::new(0, 0)).status(), Status::Wrapped);
        assert_eq!(
            grid.get(Point::new(6, 6)).booster(),
            Some(BoosterKind::Mystery)
        );
    }
}
