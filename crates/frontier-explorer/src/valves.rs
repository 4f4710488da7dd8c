//! Valve network: pressure release over a tunnel graph.
//!
//! Every minute each agent walks one tunnel, opens the valve it stands at,
//! or waits. An open valve releases its flow rate every following minute.
//! Two searches are offered: a minute-by-minute frontier search (one agent
//! or two cooperating agents) and a permutation search over the order in
//! which the useful valves are opened.

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use crate::error::{ExploreError, ParseError};
use crate::explorer::{distances_from, Explorer, ExplorerConfig, Frontier, Problem, SearchState};
use crate::pruning::{remove_dominated, Dominance};

/// Valve every agent starts at
pub const START_VALVE: &str = "AA";

/// Valves with a non-zero flow get one bit each in a `u64` mask.
const MAX_USEFUL_VALVES: usize = 64;

#[derive(Debug, Clone)]
pub struct ValveNetwork {
    names: Vec<String>,
    flows: Vec<u32>,
    tunnels: Vec<Vec<usize>>,
    /// Bit in the opened mask, for valves with a non-zero flow
    bits: Vec<Option<u64>>,
    start: usize,
}

impl ValveNetwork {
    /// Parse `Valve XX has flow rate=N; tunnels lead to valves A, B` lines.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut raw = Vec::new();
        for (i, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let valve = parse_valve(line).map_err(|reason| ParseError::new(i + 1, reason))?;
            raw.push((i + 1, valve));
        }

        let index: HashMap<&str, usize> = raw
            .iter()
            .enumerate()
            .map(|(idx, (_, valve))| (valve.name.as_str(), idx))
            .collect();
        if index.len() != raw.len() {
            return Err(ParseError::new(raw.len(), "duplicate valve name"));
        }

        let mut tunnels = Vec::with_capacity(raw.len());
        for (line_no, valve) in &raw {
            let targets = valve
                .tunnels
                .iter()
                .map(|name| {
                    index
                        .get(name.as_str())
                        .copied()
                        .ok_or_else(|| ParseError::new(*line_no, format!("unknown valve {name:?}")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            tunnels.push(targets);
        }

        let start = *index.get(START_VALVE).ok_or_else(|| {
            ParseError::new(raw.len().max(1), format!("no {START_VALVE} valve"))
        })?;

        let mut next_bit = 0;
        let mut bits = Vec::with_capacity(raw.len());
        for (line_no, valve) in &raw {
            if valve.flow == 0 {
                bits.push(None);
                continue;
            }
            if next_bit == MAX_USEFUL_VALVES {
                return Err(ParseError::new(
                    *line_no,
                    format!("more than {MAX_USEFUL_VALVES} valves with a flow rate"),
                ));
            }
            bits.push(Some(1 << next_bit));
            next_bit += 1;
        }

        let (names, flows) = raw.into_iter().map(|(_, v)| (v.name, v.flow)).unzip();
        Ok(Self {
            names,
            flows,
            tunnels,
            bits,
            start,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Combined flow of every valve in the opened mask.
    fn flow_of(&self, opened: u64) -> u32 {
        self.bits
            .iter()
            .zip(&self.flows)
            .filter_map(|(bit, flow)| bit.filter(|b| opened & b != 0).map(|_| *flow))
            .sum()
    }

    /// Valves worth opening, in network order.
    fn useful_valves(&self) -> Vec<usize> {
        (0..self.len()).filter(|&v| self.flows[v] > 0).collect()
    }

    /// The start valve followed by every other valve with a flow rate.
    fn key_valves(&self) -> Vec<usize> {
        let mut keys = vec![self.start];
        keys.extend(self.useful_valves().into_iter().filter(|&v| v != self.start));
        keys
    }

    /// Tunnel distances between key valves, keyed by network index.
    pub fn distance_table(&self) -> HashMap<(usize, usize), u32> {
        let mut table = HashMap::new();
        let keys = self.key_valves();
        for &from in &keys {
            let reached = distances_from(from, |v: &usize| self.tunnels[*v].iter().copied());
            for &to in &keys {
                if let Some(&d) = reached.get(&to) {
                    table.insert((from, to), d);
                }
            }
        }
        table
    }

    /// Most pressure one agent can release in `config.horizon` minutes.
    pub fn max_pressure(&self, config: &ExplorerConfig) -> Result<u64, ExploreError> {
        self.explore::<1>(config)
    }

    /// Most pressure two cooperating agents can release.
    pub fn max_pressure_with_elephant(&self, config: &ExplorerConfig) -> Result<u64, ExploreError> {
        self.explore::<2>(config)
    }

    fn explore<const N: usize>(&self, config: &ExplorerConfig) -> Result<u64, ExploreError> {
        let problem = TunnelProblem::<N> { network: self };
        let initial = TunnelState {
            positions: [self.start as u16; N],
            opened: 0,
            released: 0,
            time: 0,
        };
        let outcome = Explorer::new(&problem, config.clone()).run(initial)?;
        info!(
            "{} agent(s), {} minutes: {} pressure (peak frontier {})",
            N, config.horizon, outcome.best, outcome.peak_frontier
        );
        Ok(outcome.best)
    }

    /// Pressure released by opening valves in route order.
    ///
    /// The route starts at its first valve; walking to the next valve and
    /// opening it takes the tunnel distance plus one minute. Returns `None`
    /// if a name is unknown or a valve is unreachable.
    pub fn route_pressure(&self, route: &[&str], minutes: u32) -> Option<u64> {
        let (first, rest) = route.split_first()?;
        let mut here = self.index_of(first)?;
        let mut clock = 0;
        let mut total = 0;

        for name in rest {
            let next = self.index_of(name)?;
            let distance = distances_from(here, |v: &usize| self.tunnels[*v].iter().copied())
                .get(&next)
                .copied()?;
            clock += distance + 1;
            if clock < minutes {
                total += u64::from(self.flows[next]) * u64::from(minutes - clock);
            }
            here = next;
        }
        Some(total)
    }

    /// Best opening order found by enumerating permutations of the useful
    /// valves, starting from [`START_VALVE`].
    ///
    /// A start valve with a flow rate is a candidate like any other; opening
    /// it shows up as a second [`START_VALVE`] in the route.
    pub fn best_route(&self, minutes: u32, cutoff: RouteCutoff) -> RouteSearch {
        let table = self.distance_table();
        let mut search = PermutationSearch {
            network: self,
            table: &table,
            minutes,
            cutoff,
            route: vec![self.start],
            best: RouteSearch::default(),
        };
        let mut remaining = self.useful_valves();
        search.extend(&mut remaining, 0, 0);

        let mut result = search.best;
        result.route = result.route_indices.iter().map(|&v| self.names[v].clone()).collect();
        debug!(
            "route search ({:?}) scored {} routes, best {}",
            cutoff, result.routes_scored, result.pressure
        );
        result
    }
}

struct RawValve {
    name: String,
    flow: u32,
    tunnels: Vec<String>,
}

fn parse_valve(line: &str) -> Result<RawValve, String> {
    let (valve, tunnels) = line
        .split_once(';')
        .ok_or("missing ';' between valve and tunnels")?;

    let rest = valve.strip_prefix("Valve ").ok_or("line must start with \"Valve\"")?;
    let (name, rate) = rest
        .split_once(" has flow rate=")
        .ok_or("expected \"has flow rate=\"")?;
    let flow = rate
        .trim()
        .parse()
        .map_err(|e| format!("bad flow rate {rate:?}: {e}"))?;

    // "tunnels lead to valves A, B" or "tunnel leads to valve A"
    let targets = tunnels
        .trim()
        .splitn(5, ' ')
        .nth(4)
        .ok_or("expected a tunnel list")?;
    let tunnels = targets
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    Ok(RawValve {
        name: name.trim().to_string(),
        flow,
        tunnels,
    })
}

/// Agent positions, opened valves and pressure released so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TunnelState<const N: usize> {
    /// Sorted, so that interchangeable agents share one state
    positions: [u16; N],
    opened: u64,
    released: u64,
    time: u32,
}

impl<const N: usize> SearchState for TunnelState<N> {
    fn time(&self) -> u32 {
        self.time
    }
}

impl<const N: usize> Dominance for TunnelState<N> {
    type Bucket = [u16; N];

    fn bucket(&self) -> [u16; N] {
        self.positions
    }

    /// A superset of open valves never hurts: already-open valves keep
    /// releasing and the agent can wait instead of reopening them.
    fn dominates(&self, other: &Self) -> bool {
        self.opened & other.opened == other.opened && self.released >= other.released
    }
}

struct TunnelProblem<'n, const N: usize> {
    network: &'n ValveNetwork,
}

impl<const N: usize> Problem for TunnelProblem<'_, N> {
    type State = TunnelState<N>;
    type Successors = Vec<TunnelState<N>>;

    fn successors(&self, state: &TunnelState<N>) -> Vec<TunnelState<N>> {
        let network = self.network;
        let mut partial = vec![TunnelState {
            released: state.released + u64::from(network.flow_of(state.opened)),
            time: state.time + 1,
            ..*state
        }];

        for agent in 0..N {
            let here = usize::from(state.positions[agent]);
            let mut next = Vec::with_capacity(partial.len() * (network.tunnels[here].len() + 2));
            for p in &partial {
                next.push(*p);
                if let Some(bit) = network.bits[here] {
                    if p.opened & bit == 0 {
                        next.push(TunnelState {
                            opened: p.opened | bit,
                            ..*p
                        });
                    }
                }
                for &to in &network.tunnels[here] {
                    let mut moved = *p;
                    moved.positions[agent] = to as u16;
                    next.push(moved);
                }
            }
            partial = next;
        }

        for p in &mut partial {
            p.positions.sort_unstable();
        }
        partial
    }

    fn objective(&self, state: &TunnelState<N>) -> u64 {
        state.released
    }

    fn prune(&self, candidates: Frontier<TunnelState<N>>) -> Frontier<TunnelState<N>> {
        remove_dominated(candidates)
    }
}

/// When the permutation search stops extending a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteCutoff {
    /// Visit every permutation of the useful valves
    Exhaustive,
    /// Stop once the route has used up the time budget; later valves
    /// could no longer release anything
    #[default]
    OverBudget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSearch {
    pub pressure: u64,
    /// Valve names, starting with the start valve
    pub route: Vec<String>,
    /// Number of route prefixes scored
    pub routes_scored: u64,
    #[serde(skip)]
    route_indices: Vec<usize>,
}

struct PermutationSearch<'a> {
    network: &'a ValveNetwork,
    table: &'a HashMap<(usize, usize), u32>,
    minutes: u32,
    cutoff: RouteCutoff,
    route: Vec<usize>,
    best: RouteSearch,
}

impl PermutationSearch<'_> {
    /// Score the current route, then try every remaining valve next.
    fn extend(&mut self, remaining: &mut Vec<usize>, clock: u32, pressure: u64) {
        self.best.routes_scored += 1;
        if pressure > self.best.pressure || self.best.route_indices.is_empty() {
            self.best.pressure = pressure;
            self.best.route_indices = self.route.clone();
        }

        if self.cutoff == RouteCutoff::OverBudget && clock >= self.minutes {
            return;
        }

        let here = self.route[self.route.len() - 1];
        for i in 0..remaining.len() {
            let next = remaining.swap_remove(i);
            if let Some(&distance) = self.table.get(&(here, next)) {
                let arrival = clock + distance + 1;
                let gained = if arrival < self.minutes {
                    u64::from(self.network.flows[next]) * u64::from(self.minutes - arrival)
                } else {
                    0
                };
                self.route.push(next);
                self.extend(remaining, arrival, pressure + gained);
                self.route.pop();
            }
            remaining.push(next);
            let last = remaining.len() - 1;
            remaining.swap(i, last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "
Valve AA has flow rate=0; tunnels lead to valves DD, II, BB
Valve BB has flow rate=13; tunnels lead to valves CC, AA
Valve CC has flow rate=2; tunnels lead to valves DD, BB
Valve DD has flow rate=20; tunnels lead to valves CC, AA, EE
Valve EE has flow rate=3; tunnels lead to valves FF, DD
Valve FF has flow rate=0; tunnels lead to valves EE, GG
Valve GG has flow rate=0; tunnels lead to valves FF, HH
Valve HH has flow rate=22; tunnel leads to valve GG
Valve II has flow rate=0; tunnels lead to valves AA, JJ
Valve JJ has flow rate=21; tunnel leads to valve II
";

    fn network() -> ValveNetwork {
        ValveNetwork::parse(EXAMPLE).unwrap()
    }

    /// The minute-by-minute search with pruning switched off.
    struct Unpruned<'n, const N: usize>(TunnelProblem<'n, N>);

    impl<const N: usize> Problem for Unpruned<'_, N> {
        type State = TunnelState<N>;
        type Successors = Vec<TunnelState<N>>;

        fn successors(&self, state: &TunnelState<N>) -> Vec<TunnelState<N>> {
            self.0.successors(state)
        }

        fn objective(&self, state: &TunnelState<N>) -> u64 {
            self.0.objective(state)
        }
    }

    fn pressure_both_ways<const N: usize>(network: &ValveNetwork, horizon: u32) -> (u64, u64) {
        let initial = TunnelState {
            positions: [network.start as u16; N],
            opened: 0,
            released: 0,
            time: 0,
        };
        let config = ExplorerConfig::with_horizon(horizon);
        let pruned = TunnelProblem::<N> { network };
        let brute = Unpruned(TunnelProblem::<N> { network });
        let a = Explorer::new(&pruned, config.clone()).run(initial).unwrap();
        let b = Explorer::new(&brute, config).run(initial).unwrap();
        (a.best, b.best)
    }

    #[test]
    fn test_parse_example() {
        let network = network();
        assert_eq!(network.len(), 10);
        assert_eq!(network.names[network.start], "AA");
        let hh = network.index_of("HH").unwrap();
        assert_eq!(network.flows[hh], 22);
        assert_eq!(network.tunnels[hh], vec![network.index_of("GG").unwrap()]);
        assert_eq!(network.bits.iter().flatten().count(), 6);
    }

    #[test]
    fn test_parse_rejects_unknown_tunnel() {
        let err = ValveNetwork::parse(
            "Valve AA has flow rate=0; tunnels lead to valves BB, ZZ\n\
             Valve BB has flow rate=1; tunnel leads to valve AA",
        )
        .unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.contains("ZZ"));
    }

    #[test]
    fn test_parse_rejects_missing_start() {
        let err = ValveNetwork::parse("Valve BB has flow rate=1; tunnel leads to valve BB")
            .unwrap_err();
        assert!(err.reason.contains("AA"));
    }

    #[test]
    fn test_distance_table() {
        let network = network();
        let table = network.distance_table();
        let id = |name| network.index_of(name).unwrap();
        assert_eq!(table[&(id("AA"), id("HH"))], 5);
        assert_eq!(table[&(id("JJ"), id("HH"))], 7);
        assert_eq!(table[&(id("BB"), id("BB"))], 0);
        assert!(!table.contains_key(&(id("AA"), id("GG"))));
    }

    #[test]
    fn test_route_pressure() {
        let network = network();
        assert_eq!(
            network.route_pressure(&["AA", "DD", "BB", "JJ", "HH", "EE", "CC"], 30),
            Some(1651)
        );

        let me = network.route_pressure(&["AA", "JJ", "BB", "CC"], 26).unwrap();
        let elephant = network.route_pressure(&["AA", "DD", "HH", "EE"], 26).unwrap();
        assert_eq!(me + elephant, 1707);

        assert_eq!(network.route_pressure(&["AA", "QQ"], 30), None);
    }

    #[test]
    fn test_max_pressure() {
        let network = network();
        let config = ExplorerConfig::with_horizon(30);
        assert_eq!(network.max_pressure(&config), Ok(1651));
    }

    #[test]
    fn test_max_pressure_with_elephant() {
        let network = network();
        let config = ExplorerConfig::with_horizon(26);
        assert_eq!(network.max_pressure_with_elephant(&config), Ok(1707));
    }

    #[test]
    fn test_dominance_pruning_preserves_optimum() {
        let network = network();
        for horizon in 1..=10 {
            let (pruned, brute) = pressure_both_ways::<1>(&network, horizon);
            assert_eq!(pruned, brute, "one agent, horizon {horizon}");
        }
        for horizon in 1..=6 {
            let (pruned, brute) = pressure_both_ways::<2>(&network, horizon);
            assert_eq!(pruned, brute, "two agents, horizon {horizon}");
        }
    }

    #[test]
    fn test_flowing_start_valve_is_opened() {
        let input = EXAMPLE.replace("Valve AA has flow rate=0", "Valve AA has flow rate=50");
        let network = ValveNetwork::parse(&input).unwrap();
        let expected = network.max_pressure(&ExplorerConfig::with_horizon(30)).unwrap();
        assert_eq!(expected, 3020);

        for cutoff in [RouteCutoff::Exhaustive, RouteCutoff::OverBudget] {
            let search = network.best_route(30, cutoff);
            assert_eq!(search.pressure, expected, "{cutoff:?}");
            assert_eq!(&search.route[..2], ["AA", "AA"]);
            let route: Vec<&str> = search.route.iter().map(String::as_str).collect();
            assert_eq!(network.route_pressure(&route, 30), Some(expected));
        }
    }

    #[test]
    fn test_route_cutoff_policies_agree() {
        let network = network();
        let exhaustive = network.best_route(30, RouteCutoff::Exhaustive);
        let cut = network.best_route(30, RouteCutoff::OverBudget);

        assert_eq!(exhaustive.pressure, 1651);
        assert_eq!(cut.pressure, 1651);
        let route: Vec<&str> = exhaustive.route.iter().map(String::as_str).collect();
        assert_eq!(network.route_pressure(&route, 30), Some(1651));
        // 1 + 6 + 6*5 + 6*5*4 + ... + 6!
        assert_eq!(exhaustive.routes_scored, 1957);
        assert!(cut.routes_scored <= exhaustive.routes_scored);
    }

    #[test]
    fn test_short_budget_cuts_routes() {
        let network = network();
        let search = network.best_route(3, RouteCutoff::OverBudget);
        // Valves opened at minute 3 or later release nothing.
        assert_eq!(search.pressure, 20);
        assert_eq!(search.route, vec!["AA", "DD"]);
    }
}
