//! Partitioned parallel scan that stops at the first success.
//!
//! A range is split into contiguous parts, one scoped thread per part.
//! Each thread publishes exactly one result over a channel; the first
//! `Some` received wins and a shared flag asks the other threads to stop.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use log::trace;

/// Split `range` into at most `jobs` contiguous, non-overlapping parts.
pub fn partition(range: RangeInclusive<i64>, jobs: usize) -> Vec<RangeInclusive<i64>> {
    let (start, end) = range.into_inner();
    if start > end {
        return Vec::new();
    }
    let len = end - start + 1;
    let jobs = i64::try_from(jobs.max(1)).unwrap_or(i64::MAX).min(len);
    let step = (len + jobs - 1) / jobs;

    let mut parts = Vec::with_capacity(jobs as usize);
    let mut lo = start;
    while lo <= end {
        let hi = lo.saturating_add(step - 1).min(end);
        parts.push(lo..=hi);
        lo = hi + 1;
    }
    parts
}

/// Run `search` over every part of `range` concurrently and return the first
/// `Some` that any part produces.
///
/// `search` should poll the stop flag and give up early once it is set;
/// results arriving after the first success are ignored.
pub fn first_success<T, F>(range: RangeInclusive<i64>, jobs: usize, search: F) -> Option<T>
where
    T: Send,
    F: Fn(RangeInclusive<i64>, &AtomicBool) -> Option<T> + Sync,
{
    let parts = partition(range, jobs);
    let stop = AtomicBool::new(false);
    let (sender, receiver) = mpsc::channel();

    thread::scope(|scope| {
        for part in parts {
            let sender = sender.clone();
            let search = &search;
            let stop = &stop;
            scope.spawn(move || {
                trace!("scanning {}..={}", part.start(), part.end());
                let found = search(part, stop);
                sender.send(found).ok();
            });
        }
        drop(sender);

        for found in &receiver {
            if found.is_some() {
                stop.store(true, Ordering::Relaxed);
                return found;
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_range() {
        let parts = partition(0..=20, 4);
        assert_eq!(parts, vec![0..=5, 6..=11, 12..=17, 18..=20]);

        let parts = partition(0..=2, 8);
        assert_eq!(parts, vec![0..=0, 1..=1, 2..=2]);

        assert!(partition(5..=4, 3).is_empty());
        assert_eq!(partition(-3..=3, 1), vec![-3..=3]);
    }

    #[test]
    fn test_first_success_finds_the_only_hit() {
        let found = first_success(0..=999, 7, |part, stop| {
            for n in part {
                if stop.load(Ordering::Relaxed) {
                    return None;
                }
                if n * n == 582_169 {
                    return Some(n);
                }
            }
            None
        });
        assert_eq!(found, Some(763));
    }

    #[test]
    fn test_first_success_none_when_every_part_fails() {
        let found: Option<i64> = first_success(0..=99, 4, |_, _| None);
        assert_eq!(found, None);
    }
}
