//! Sensor coverage: interval merging and the racing gap scan.
//!
//! Each sensor reports its closest beacon by Manhattan distance, so no other
//! beacon can sit within that distance. A row's coverage is the union of
//! every sensor's span on that row.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use serde::Serialize;

use crate::error::ParseError;
use crate::scan::first_success;

const TUNING_MULTIPLIER: i64 = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn tuning_frequency(self) -> i64 {
        self.x * TUNING_MULTIPLIER + self.y
    }
}

/// Half-open span `start..end` of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Merge overlapping or touching spans into a sorted, disjoint list.
pub fn merge_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_unstable_by_key(|s| s.start);
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(current) if span.start <= current.end => {
                current.end = current.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sensor {
    pub position: Point,
    pub beacon: Point,
    radius: i64,
}

impl Sensor {
    pub fn new(position: Point, beacon: Point) -> Self {
        Self {
            position,
            beacon,
            radius: position.distance(beacon),
        }
    }

    /// Squares of `row` within range of this sensor.
    pub fn coverage_at(&self, row: i64) -> Option<Span> {
        let reach = self.radius - (self.position.y - row).abs();
        (reach >= 0).then(|| Span::new(self.position.x - reach, self.position.x + reach + 1))
    }
}

#[derive(Debug, Clone)]
pub struct SensorField {
    sensors: Vec<Sensor>,
}

impl SensorField {
    /// Parse `Sensor at x=X, y=Y: closest beacon is at x=X, y=Y` lines.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut sensors = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let sensor = parse_sensor(line).map_err(|reason| ParseError::new(i + 1, reason))?;
            sensors.push(sensor);
        }
        Ok(Self { sensors })
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn row_coverage(&self, row: i64) -> Vec<Span> {
        merge_spans(self.sensors.iter().filter_map(|s| s.coverage_at(row)).collect())
    }

    /// Squares of `row` where a beacon cannot be.
    pub fn covered_positions(&self, row: i64) -> i64 {
        let covered: i64 = self.row_coverage(row).iter().map(Span::len).sum();
        let beacons = self
            .sensors
            .iter()
            .map(|s| s.beacon)
            .filter(|b| b.y == row)
            .collect::<HashSet<_>>()
            .len();
        covered - beacons as i64
    }

    /// First uncovered square of `row` with `0 <= x <= max_x`.
    fn gap_in_row(&self, row: i64, max_x: i64) -> Option<i64> {
        let mut x = 0;
        for span in self.row_coverage(row) {
            if x > max_x {
                return None;
            }
            if span.start > x {
                return Some(x);
            }
            x = x.max(span.end);
        }
        (x <= max_x).then_some(x)
    }

    fn scan_rows(&self, rows: RangeInclusive<i64>, max_x: i64, stop: &AtomicBool) -> Option<Point> {
        for y in rows {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(x) = self.gap_in_row(y, max_x) {
                return Some(Point::new(x, y));
            }
        }
        None
    }

    /// First uncovered square in the square `0..=max` scanning row by row.
    pub fn find_gap(&self, max: i64) -> Option<Point> {
        self.scan_rows(0..=max, max, &AtomicBool::new(false))
    }

    /// Same search with the rows split over `jobs` threads.
    ///
    /// Returns whichever part reports a gap first; with a single gap in the
    /// square this equals [`find_gap`](Self::find_gap).
    pub fn find_gap_parallel(&self, max: i64, jobs: usize) -> Option<Point> {
        let found = first_success(0..=max, jobs, |rows, stop| self.scan_rows(rows, max, stop));
        debug!("parallel gap scan over {} jobs found {:?}", jobs, found);
        found
    }
}

fn parse_point(text: &str) -> Result<Point, String> {
    let (_, coords) = text
        .split_once("x=")
        .ok_or_else(|| format!("expected \"x=\" in {text:?}"))?;
    let (x, y) = coords
        .split_once(", y=")
        .ok_or_else(|| format!("expected \", y=\" in {text:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x {x:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y {y:?}: {e}"))?;
    Ok(Point::new(x, y))
}

fn parse_sensor(line: &str) -> Result<Sensor, String> {
    let (sensor, beacon) = line
        .split_once(':')
        .ok_or("missing ':' between sensor and beacon")?;
    if !sensor.starts_with("Sensor at") {
        return Err("line must start with \"Sensor at\"".to_string());
    }
    let beacon = beacon
        .trim()
        .strip_prefix("closest beacon is at")
        .ok_or("expected \"closest beacon is at\"")?;
    Ok(Sensor::new(parse_point(sensor)?, parse_point(beacon)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "
Sensor at x=2, y=18: closest beacon is at x=-2, y=15
Sensor at x=9, y=16: closest beacon is at x=10, y=16
Sensor at x=13, y=2: closest beacon is at x=15, y=3
Sensor at x=12, y=14: closest beacon is at x=10, y=16
Sensor at x=10, y=20: closest beacon is at x=10, y=16
Sensor at x=14, y=17: closest beacon is at x=10, y=16
Sensor at x=8, y=7: closest beacon is at x=2, y=10
Sensor at x=2, y=0: closest beacon is at x=2, y=10
Sensor at x=0, y=11: closest beacon is at x=2, y=10
Sensor at x=20, y=14: closest beacon is at x=25, y=17
Sensor at x=17, y=20: closest beacon is at x=21, y=22
Sensor at x=16, y=7: closest beacon is at x=15, y=3
Sensor at x=14, y=3: closest beacon is at x=15, y=3
Sensor at x=20, y=1: closest beacon is at x=15, y=3
";

    #[test]
    fn test_parse_sensor() {
        let field =
            SensorField::parse("Sensor at x=2, y=18: closest beacon is at x=-2, y=15").unwrap();
        assert_eq!(
            field.sensors()[0],
            Sensor::new(Point::new(2, 18), Point::new(-2, 15))
        );
    }

    #[test]
    fn test_parse_error_line() {
        let input = "Sensor at x=2, y=18: closest beacon is at x=-2, y=15\nSensor at x=1";
        let err = SensorField::parse(input).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_coverage_at_row() {
        let sensor = Sensor::new(Point::new(8, 7), Point::new(2, 10));
        assert_eq!(sensor.coverage_at(10), Some(Span::new(2, 15)));
        assert_eq!(sensor.coverage_at(16), Some(Span::new(8, 9)));
        assert_eq!(sensor.coverage_at(17), None);
    }

    #[test]
    fn test_merge_spans() {
        assert_eq!(
            merge_spans(vec![Span::new(2, 5), Span::new(6, 8)]),
            vec![Span::new(2, 5), Span::new(6, 8)]
        );
        assert_eq!(
            merge_spans(vec![Span::new(4, 8), Span::new(2, 5)]),
            vec![Span::new(2, 8)]
        );
        assert_eq!(
            merge_spans(vec![Span::new(2, 5), Span::new(5, 8)]),
            vec![Span::new(2, 8)]
        );
        assert_eq!(
            merge_spans(vec![Span::new(1, 9), Span::new(3, 4)]),
            vec![Span::new(1, 9)]
        );
    }

    #[test]
    fn test_covered_positions() {
        let field = SensorField::parse(EXAMPLE).unwrap();
        assert_eq!(field.covered_positions(10), 26);
    }

    #[test]
    fn test_find_gap() {
        let field = SensorField::parse(EXAMPLE).unwrap();
        let gap = field.find_gap(20).unwrap();
        assert_eq!(gap, Point::new(14, 11));
        assert_eq!(gap.tuning_frequency(), 56_000_011);
    }

    #[test]
    fn test_find_gap_parallel_matches_sequential() {
        let field = SensorField::parse(EXAMPLE).unwrap();
        for jobs in [1, 3, 4, 25] {
            assert_eq!(field.find_gap_parallel(20, jobs), Some(Point::new(14, 11)));
        }
    }

    #[test]
    fn test_fully_covered_square_has_no_gap() {
        let field =
            SensorField::parse("Sensor at x=5, y=5: closest beacon is at x=5, y=15").unwrap();
        assert_eq!(field.find_gap(10), None);
        assert_eq!(field.find_gap_parallel(10, 4), None);
    }
}
