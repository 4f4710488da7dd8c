//! Elevation grid: the unweighted shortest-path instantiation.
//!
//! The grid is letters `a` (lowest) to `z` (highest). `S` marks the start at
//! elevation `a`, `E` the summit at elevation `z`. A step moves to an
//! orthogonal neighbour that is at most one level higher.

use smallvec::SmallVec;

use crate::error::{ExploreError, ParseError};
use crate::explorer::generations_until;

/// Position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct Heightmap {
    /// Row-major elevations, 0 for `a` up to 25 for `z`
    elevations: Vec<u8>,
    width: usize,
    height: usize,
    start: Position,
    summit: Position,
}

impl Heightmap {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut elevations = Vec::new();
        let mut width = None;
        let mut height = 0;
        let mut start = None;
        let mut summit = None;

        for (i, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = i + 1;

            let row_width = line.chars().count();
            match width {
                None => width = Some(row_width),
                Some(w) if w != row_width => {
                    return Err(ParseError::new(
                        line_no,
                        format!("row has {row_width} squares, expected {w}"),
                    ));
                }
                Some(_) => {}
            }

            for (x, c) in line.chars().enumerate() {
                let here = Position::new(x, height);
                let elevation = match c {
                    'S' => {
                        if start.replace(here).is_some() {
                            return Err(ParseError::new(line_no, "more than one start"));
                        }
                        0
                    }
                    'E' => {
                        if summit.replace(here).is_some() {
                            return Err(ParseError::new(line_no, "more than one summit"));
                        }
                        25
                    }
                    'a'..='z' => c as u8 - b'a',
                    other => {
                        let reason = format!("unexpected square {other:?}");
                        return Err(ParseError::new(line_no, reason));
                    }
                };
                elevations.push(elevation);
            }
            height += 1;
        }

        let last_line = input.lines().count().max(1);
        let width = width.ok_or_else(|| ParseError::new(last_line, "empty grid"))?;
        let start = start.ok_or_else(|| ParseError::new(last_line, "no start marked"))?;
        let summit = summit.ok_or_else(|| ParseError::new(last_line, "no summit marked"))?;

        Ok(Self {
            elevations,
            width,
            height,
            start,
            summit,
        })
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn summit(&self) -> Position {
        self.summit
    }

    pub fn elevation(&self, p: Position) -> u8 {
        self.elevations[p.y * self.width + p.x]
    }

    fn neighbours(&self, p: Position) -> SmallVec<[Position; 4]> {
        let mut out = SmallVec::new();
        if p.x + 1 < self.width {
            out.push(Position::new(p.x + 1, p.y));
        }
        if p.y + 1 < self.height {
            out.push(Position::new(p.x, p.y + 1));
        }
        if p.y > 0 {
            out.push(Position::new(p.x, p.y - 1));
        }
        if p.x > 0 {
            out.push(Position::new(p.x - 1, p.y));
        }
        out
    }

    /// Squares reachable in one step going up.
    fn climbable_from(&self, p: Position) -> SmallVec<[Position; 4]> {
        let limit = self.elevation(p) + 1;
        let mut out = self.neighbours(p);
        out.retain(|n| self.elevation(*n) <= limit);
        out
    }

    /// Squares from which `p` is reachable in one step.
    fn descendable_from(&self, p: Position) -> SmallVec<[Position; 4]> {
        let here = self.elevation(p);
        let mut out = self.neighbours(p);
        out.retain(|n| self.elevation(*n) + 1 >= here);
        out
    }

    /// Fewest steps from the start to the summit.
    pub fn steps_to_summit(&self) -> Result<u32, ExploreError> {
        let summit = self.summit;
        generations_until(self.start, |p| self.climbable_from(*p), |p| *p == summit)
    }

    /// Fewest steps from any lowest square to the summit.
    pub fn shortest_trail(&self) -> Result<u32, ExploreError> {
        generations_until(
            self.summit,
            |p| self.descendable_from(*p),
            |p| self.elevation(*p) == 0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "
Sabqponm
abcryxxl
accszExk
acctuvwj
abdefghi
";

    #[test]
    fn test_parse_example() {
        let map = Heightmap::parse(EXAMPLE).unwrap();
        assert_eq!(map.start(), Position::new(0, 0));
        assert_eq!(map.summit(), Position::new(5, 2));
        assert_eq!(map.elevation(Position::new(0, 0)), 0);
        assert_eq!(map.elevation(Position::new(0, 1)), 0);
        assert_eq!(map.elevation(Position::new(2, 0)), 1);
        assert_eq!(map.elevation(Position::new(4, 1)), 24);
        assert_eq!(map.elevation(Position::new(5, 2)), 25);
    }

    #[test]
    fn test_steps_to_summit() {
        let map = Heightmap::parse(EXAMPLE).unwrap();
        assert_eq!(map.steps_to_summit(), Ok(31));
    }

    #[test]
    fn test_shortest_trail() {
        let map = Heightmap::parse(EXAMPLE).unwrap();
        assert_eq!(map.shortest_trail(), Ok(29));
    }

    #[test]
    fn test_corner_neighbours_stay_on_grid() {
        let map = Heightmap::parse(EXAMPLE).unwrap();
        let corner = map.neighbours(Position::new(7, 4));
        assert_eq!(corner.len(), 2);
        assert!(corner.contains(&Position::new(7, 3)));
        assert!(corner.contains(&Position::new(6, 4)));
    }

    #[test]
    fn test_walled_summit_is_unreachable() {
        let map = Heightmap::parse("Saz\nzzE").unwrap();
        assert!(matches!(
            map.steps_to_summit(),
            Err(ExploreError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        let ragged = Heightmap::parse("Sab\nabcd\nabE").unwrap_err();
        assert_eq!(ragged.line, 2);

        let bad = Heightmap::parse("Sa?E").unwrap_err();
        assert!(bad.reason.contains("'?'"));

        let no_summit = Heightmap::parse("Sabc\nabcd").unwrap_err();
        assert_eq!(no_summit.reason, "no summit marked");

        let twice = Heightmap::parse("SaS\nabE").unwrap_err();
        assert_eq!(twice.reason, "more than one start");
    }
}
