//! Generation-by-generation state-space explorer.
//!
//! The explorer keeps a deduplicated frontier of states that all share the
//! same time step. Each generation it folds states that reached the horizon
//! into a best-objective accumulator, expands the rest through the problem's
//! transition function, and lets the problem prune the resulting candidate
//! set before it becomes the next frontier.
//!
//! A plain breadth-first walk ([`generations_until`], [`distances_from`])
//! shares the same shape for problems without an objective.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::panic;
use std::thread;

use log::{debug, info};

use crate::error::ExploreError;

/// The set of states reachable at the current time step.
pub type Frontier<S> = HashSet<S>;

/// A member of the frontier. Equality is value equality over every field.
pub trait SearchState: Clone + Eq + Hash + Send + Sync {
    /// Discrete time step of this state.
    fn time(&self) -> u32;
}

/// Static problem parameters plus the operations the explorer needs.
///
/// `successors` must be a pure function of the state and `self`; the
/// explorer may call it from several threads at once.
pub trait Problem: Sync {
    type State: SearchState;
    type Successors: IntoIterator<Item = Self::State>;

    /// Every state reachable after exactly one time step.
    fn successors(&self, state: &Self::State) -> Self::Successors;

    /// Value read off a state once it reaches the horizon.
    fn objective(&self, state: &Self::State) -> u64;

    /// Reduce a candidate generation to an equivalent or smaller set.
    fn prune(&self, candidates: Frontier<Self::State>) -> Frontier<Self::State> {
        candidates
    }
}

/// Configuration for an exploration run
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Time step at which states stop being expanded
    pub horizon: u32,
    /// Threads used to expand a generation (1 = sequential)
    pub workers: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            horizon: 24,
            workers: 1,
        }
    }
}

impl ExplorerConfig {
    pub fn with_horizon(horizon: u32) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }
}

/// Snapshot handed to the observer after every generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    pub generation: u32,
    /// States that were expanded this generation
    pub expanded: usize,
    /// States folded into the accumulator this generation
    pub terminal: usize,
    /// Distinct successors before pruning
    pub candidates: usize,
    /// Size of the next frontier
    pub frontier: usize,
    pub best: Option<u64>,
}

/// Result of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub best: u64,
    /// Number of generations in which at least one state was expanded
    pub generations: u32,
    pub peak_frontier: usize,
}

pub struct Explorer<'p, P: Problem> {
    problem: &'p P,
    config: ExplorerConfig,
}

impl<'p, P: Problem> Explorer<'p, P> {
    pub fn new(problem: &'p P, config: ExplorerConfig) -> Self {
        Self { problem, config }
    }

    /// Run to completion, logging each generation at debug level.
    pub fn run(&self, initial: P::State) -> Result<Outcome, ExploreError> {
        self.run_observed(initial, |stats| {
            debug!(
                "generation {}: expanded {}, {} candidates pruned to {}, best {:?}",
                stats.generation, stats.expanded, stats.candidates, stats.frontier, stats.best
            );
        })
    }

    /// Run to completion, calling `observer` once per generation.
    pub fn run_observed<F>(
        &self,
        initial: P::State,
        mut observer: F,
    ) -> Result<Outcome, ExploreError>
    where
        F: FnMut(&GenerationStats),
    {
        let horizon = self.config.horizon;
        let mut frontier: Frontier<P::State> = Frontier::from([initial]);
        let mut best: Option<u64> = None;
        let mut generation: u32 = 0;
        let mut expansions: u32 = 0;
        let mut peak_frontier = frontier.len();

        while !frontier.is_empty() {
            let mut live = Vec::with_capacity(frontier.len());
            let mut terminal = 0;

            for state in frontier {
                if state.time() >= horizon {
                    let value = self.problem.objective(&state);
                    best = Some(best.map_or(value, |b| b.max(value)));
                    terminal += 1;
                } else {
                    live.push(state);
                }
            }

            let candidates = self.expand(&live)?;
            let candidate_count = candidates.len();
            frontier = if candidates.is_empty() {
                candidates
            } else {
                self.problem.prune(candidates)
            };

            if !live.is_empty() {
                expansions += 1;
            }
            peak_frontier = peak_frontier.max(frontier.len());

            observer(&GenerationStats {
                generation,
                expanded: live.len(),
                terminal,
                candidates: candidate_count,
                frontier: frontier.len(),
                best,
            });
            generation += 1;
        }

        match best {
            Some(best) => {
                info!(
                    "exploration finished: best {} after {} generations (peak frontier {})",
                    best, expansions, peak_frontier
                );
                Ok(Outcome {
                    best,
                    generations: expansions,
                    peak_frontier,
                })
            }
            None => Err(ExploreError::Exhausted {
                horizon,
                generations: expansions,
            }),
        }
    }

    fn expand(&self, live: &[P::State]) -> Result<Frontier<P::State>, ExploreError> {
        let workers = self.config.workers.max(1);
        if workers == 1 || live.len() < 2 {
            return expand_states(self.problem, live);
        }

        let chunk_size = live.len().div_ceil(workers);
        let problem = self.problem;

        thread::scope(|scope| -> Result<Frontier<P::State>, ExploreError> {
            let handles: Vec<_> = live
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || expand_states(problem, chunk)))
                .collect();

            let mut merged = Frontier::new();
            for handle in handles {
                let part = handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))?;
                merged.extend(part);
            }
            Ok(merged)
        })
    }
}

fn expand_states<P: Problem>(
    problem: &P,
    states: &[P::State],
) -> Result<Frontier<P::State>, ExploreError> {
    let mut next = Frontier::new();
    for state in states {
        let from = state.time();
        for successor in problem.successors(state) {
            let to = successor.time();
            if to != from + 1 {
                return Err(ExploreError::TimeSkew { from, to });
            }
            next.insert(successor);
        }
    }
    Ok(next)
}

/// Positions reachable from `frontier` that have not been seen yet.
fn advance<S, N, I>(
    frontier: &Frontier<S>,
    seen: &mut HashSet<S>,
    neighbours: &mut N,
) -> Frontier<S>
where
    S: Clone + Eq + Hash,
    N: FnMut(&S) -> I,
    I: IntoIterator<Item = S>,
{
    let mut next = Frontier::new();
    for position in frontier {
        for neighbour in neighbours(position) {
            if !seen.contains(&neighbour) {
                next.insert(neighbour);
            }
        }
    }
    seen.extend(next.iter().cloned());
    next
}

/// Number of generations until a goal position first appears in the frontier.
pub fn generations_until<S, N, I, G>(
    start: S,
    mut neighbours: N,
    mut is_goal: G,
) -> Result<u32, ExploreError>
where
    S: Clone + Eq + Hash,
    N: FnMut(&S) -> I,
    I: IntoIterator<Item = S>,
    G: FnMut(&S) -> bool,
{
    let mut seen = HashSet::from([start.clone()]);
    let mut frontier = Frontier::from([start]);
    let mut generation = 0;

    while !frontier.is_empty() {
        if frontier.iter().any(|position| is_goal(position)) {
            return Ok(generation);
        }
        frontier = advance(&frontier, &mut seen, &mut neighbours);
        generation += 1;
    }

    Err(ExploreError::Unreachable {
        generations: generation,
    })
}

/// Generation at which every reachable position first appears.
pub fn distances_from<S, N, I>(start: S, mut neighbours: N) -> HashMap<S, u32>
where
    S: Clone + Eq + Hash,
    N: FnMut(&S) -> I,
    I: IntoIterator<Item = S>,
{
    let mut seen = HashSet::from([start.clone()]);
    let mut frontier = Frontier::from([start]);
    let mut distances = HashMap::new();
    let mut generation = 0;

    while !frontier.is_empty() {
        distances.extend(frontier.iter().map(|position| (position.clone(), generation)));
        frontier = advance(&frontier, &mut seen, &mut neighbours);
        generation += 1;
    }

    distances
}

/// Generation at which a goal first appears when positions may be revisited.
///
/// Unlike [`generations_until`] there is no memory across generations, so a
/// walker may stay put or double back. `neighbours` is told the generation
/// being entered and may offer different moves at different times. The walk
/// starts at generation `depart` and gives up once `deadline` passes.
pub fn first_arrival<S, N, I, G>(
    start: S,
    depart: u32,
    deadline: u32,
    mut neighbours: N,
    mut is_goal: G,
) -> Result<u32, ExploreError>
where
    S: Clone + Eq + Hash,
    N: FnMut(&S, u32) -> I,
    I: IntoIterator<Item = S>,
    G: FnMut(&S) -> bool,
{
    let mut frontier = Frontier::from([start]);
    let mut generation = depart;

    loop {
        if frontier.iter().any(|position| is_goal(position)) {
            return Ok(generation);
        }
        if frontier.is_empty() || generation >= deadline {
            return Err(ExploreError::Unreachable {
                generations: generation - depart,
            });
        }

        generation += 1;
        let mut next = Frontier::new();
        for position in &frontier {
            next.extend(neighbours(position, generation));
        }
        frontier = next;
    }
}
