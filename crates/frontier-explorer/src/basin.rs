//! Blizzard basin: the fewest minutes across a valley whose obstacles move.
//!
//! The valley is walled by `#` except for one gap in the top wall (the
//! entrance) and one in the bottom wall (the exit). Each blizzard (`>`, `<`,
//! `^`, `v`) moves one square per minute and wraps around to the opposite
//! wall. Every minute the expedition steps to an orthogonal neighbour or
//! waits, and may never share a square with a blizzard.

use log::info;
use smallvec::SmallVec;

use crate::error::{ExploreError, ParseError};
use crate::explorer::first_arrival;
use crate::heightmap::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blizzard {
    Up,
    Right,
    Down,
    Left,
}

impl Blizzard {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '^' => Some(Blizzard::Up),
            '>' => Some(Blizzard::Right),
            'v' => Some(Blizzard::Down),
            '<' => Some(Blizzard::Left),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Basin {
    /// Row-major starting squares of the interior, walls excluded
    blizzards: Vec<Option<Blizzard>>,
    width: usize,
    height: usize,
    entrance: Position,
    exit: Position,
}

impl Basin {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let rows: Vec<(usize, &str)> = input
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        let last_line = input.lines().count().max(1);

        let (&(top_no, top), &(bottom_no, bottom)) = match (rows.first(), rows.last()) {
            (Some(top), Some(bottom)) if rows.len() >= 3 => (top, bottom),
            _ => return Err(ParseError::new(last_line, "basin needs at least three rows")),
        };
        let full_width = top.chars().count();
        if full_width < 3 {
            return Err(ParseError::new(top_no, "basin needs at least three columns"));
        }
        for &(line_no, row) in &rows {
            let row_width = row.chars().count();
            if row_width != full_width {
                return Err(ParseError::new(
                    line_no,
                    format!("row has {row_width} squares, expected {full_width}"),
                ));
            }
        }

        let entrance_x = wall_gap(top).map_err(|reason| ParseError::new(top_no, reason))?;
        let exit_x = wall_gap(bottom).map_err(|reason| ParseError::new(bottom_no, reason))?;

        let width = full_width - 2;
        let height = rows.len() - 2;
        let mut blizzards = Vec::with_capacity(width * height);
        for &(line_no, row) in &rows[1..rows.len() - 1] {
            let squares: Vec<char> = row.chars().collect();
            if squares[0] != '#' || squares[full_width - 1] != '#' {
                return Err(ParseError::new(line_no, "row must start and end with a wall"));
            }
            for &c in &squares[1..full_width - 1] {
                let square = match c {
                    '.' => None,
                    other => Some(Blizzard::from_char(other).ok_or_else(|| {
                        ParseError::new(line_no, format!("unexpected square {other:?}"))
                    })?),
                };
                blizzards.push(square);
            }
        }

        // A vertical blizzard under a gap would blow out of the valley.
        for gap in [entrance_x, exit_x] {
            for (y, &(line_no, _)) in rows[1..rows.len() - 1].iter().enumerate() {
                if matches!(
                    blizzards[y * width + gap - 1],
                    Some(Blizzard::Up | Blizzard::Down)
                ) {
                    return Err(ParseError::new(
                        line_no,
                        format!("vertical blizzard in gap column {gap}"),
                    ));
                }
            }
        }

        Ok(Self {
            blizzards,
            width,
            height,
            entrance: Position::new(entrance_x, 0),
            exit: Position::new(exit_x, height + 1),
        })
    }

    pub fn entrance(&self) -> Position {
        self.entrance
    }

    pub fn exit(&self) -> Position {
        self.exit
    }

    fn starting_blizzard(&self, x: usize, y: usize) -> Option<Blizzard> {
        self.blizzards[y * self.width + x]
    }

    /// Whether `p` is open ground free of blizzards at `minute`.
    pub fn is_clear(&self, p: Position, minute: u32) -> bool {
        if p == self.entrance || p == self.exit {
            return true;
        }
        if p.x == 0 || p.y == 0 || p.x > self.width || p.y > self.height {
            return false;
        }

        let (w, h) = (self.width, self.height);
        let (x, y) = (p.x - 1, p.y - 1);
        let t = minute as usize;
        // Squares a blizzard of each kind must have started from to be here now
        let from_left = (x + w - t % w) % w;
        let from_right = (x + t % w) % w;
        let from_above = (y + h - t % h) % h;
        let from_below = (y + t % h) % h;

        self.starting_blizzard(from_left, y) != Some(Blizzard::Right)
            && self.starting_blizzard(from_right, y) != Some(Blizzard::Left)
            && self.starting_blizzard(x, from_above) != Some(Blizzard::Down)
            && self.starting_blizzard(x, from_below) != Some(Blizzard::Up)
    }

    /// Squares the expedition can occupy at `minute` coming from `p`.
    fn moves(&self, p: Position, minute: u32) -> SmallVec<[Position; 5]> {
        let mut out = SmallVec::new();
        out.push(p);
        out.push(Position::new(p.x + 1, p.y));
        out.push(Position::new(p.x, p.y + 1));
        if p.y > 0 {
            out.push(Position::new(p.x, p.y - 1));
        }
        if p.x > 0 {
            out.push(Position::new(p.x - 1, p.y));
        }
        out.retain(|n| self.is_clear(*n, minute));
        out
    }

    /// Every open square at every blizzard phase; no crossing takes longer.
    fn patience(&self) -> u32 {
        let phases = self.width * self.height;
        u32::try_from((phases + 2) * phases).unwrap_or(u32::MAX)
    }

    /// Minute of arrival at `to` for an expedition leaving `from` at `depart`.
    pub fn crossing(&self, from: Position, to: Position, depart: u32) -> Result<u32, ExploreError> {
        let deadline = depart.saturating_add(self.patience());
        first_arrival(
            from,
            depart,
            deadline,
            |p, minute| self.moves(*p, minute),
            |p| *p == to,
        )
    }

    /// Fewest minutes from the entrance to the exit.
    pub fn fastest_crossing(&self) -> Result<u32, ExploreError> {
        let arrival = self.crossing(self.entrance, self.exit, 0)?;
        info!("crossed the basin in {} minutes", arrival);
        Ok(arrival)
    }

    /// Arrival minutes of entrance to exit, back to the entrance, and out to
    /// the exit again, each leg leaving as soon as the previous one arrives.
    pub fn round_trip(&self) -> Result<[u32; 3], ExploreError> {
        let there = self.crossing(self.entrance, self.exit, 0)?;
        let back = self.crossing(self.exit, self.entrance, there)?;
        let again = self.crossing(self.entrance, self.exit, back)?;
        info!("round trip legs arrive at {}, {}, {}", there, back, again);
        Ok([there, back, again])
    }
}

/// Column of the single gap in a wall row.
fn wall_gap(row: &str) -> Result<usize, String> {
    let mut gap = None;
    for (x, c) in row.chars().enumerate() {
        match c {
            '#' => {}
            '.' if gap.is_none() => gap = Some(x),
            '.' => return Err("more than one gap in the wall".to_string()),
            other => return Err(format!("unexpected square {other:?} in the wall")),
        }
    }
    let gap = gap.ok_or("no gap in the wall")?;
    if gap == 0 || gap + 1 == row.chars().count() {
        return Err("gap must not be in a corner".to_string());
    }
    Ok(gap)
}
