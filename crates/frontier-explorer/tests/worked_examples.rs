//! Reference answers for the worked examples, through the public API.

use frontier_explorer::blueprint::{max_geodes, quality_level_sum, GeodeProblem};
use frontier_explorer::{
    parse_blueprints, Basin, Explorer, ExplorerConfig, Frontier, Heightmap, Inventory, Problem,
    RouteCutoff, SensorField, ValveNetwork,
};

const BLUEPRINTS: &str = "
Blueprint 1: Each ore robot costs 4 ore. Each clay robot costs 2 ore. Each obsidian robot costs 3 ore and 14 clay. Each geode robot costs 2 ore and 7 obsidian.
Blueprint 2: Each ore robot costs 2 ore. Each clay robot costs 3 ore. Each obsidian robot costs 3 ore and 8 clay. Each geode robot costs 3 ore and 12 obsidian
";

const HEIGHTMAP: &str = "
Sabqponm
abcryxxl
accszExk
acctuvwj
abdefghi
";

const BASIN: &str = "
#.######
#>>.<^<#
#.<..<<#
#>v.><>#
#<^v^^>#
######.#
";

const VALVES: &str = "
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

const SENSORS: &str = "
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
fn test_blueprint_geodes_with_parallel_expansion() {
    let blueprints = parse_blueprints(BLUEPRINTS).unwrap();
    let config = ExplorerConfig {
        horizon: 24,
        workers: 4,
    };
    assert_eq!(max_geodes(&blueprints[0], &config), Ok(9));
    assert_eq!(max_geodes(&blueprints[1], &config), Ok(12));
    assert_eq!(quality_level_sum(&blueprints, &config), Ok(33));
}

#[test]
fn test_observer_sees_every_generation() {
    let blueprints = parse_blueprints(BLUEPRINTS).unwrap();
    let config = ExplorerConfig::with_horizon(24);
    let problem = GeodeProblem::new(&blueprints[0], &config);
    let explorer = Explorer::new(&problem, config.clone());

    let mut stats = Vec::new();
    let outcome = explorer
        .run_observed(Inventory::start(), |s| stats.push(*s))
        .unwrap();

    assert_eq!(outcome.best, 9);
    assert_eq!(outcome.generations, 24);
    // 24 expansions plus the final fold into the accumulator
    assert_eq!(stats.len(), 25);
    assert!(stats.iter().all(|s| s.frontier <= s.candidates));
    assert!(stats.windows(2).all(|w| w[0].best <= w[1].best));
    assert_eq!(stats.last().and_then(|s| s.best), Some(9));
}

#[test]
fn test_pruning_twice_changes_nothing() {
    let blueprints = parse_blueprints(BLUEPRINTS).unwrap();
    let problem = GeodeProblem::new(&blueprints[1], &ExplorerConfig::with_horizon(24));

    let mut frontier: Frontier<Inventory> = Frontier::from([Inventory::start()]);
    for _ in 0..12 {
        frontier = frontier
            .iter()
            .flat_map(|state| problem.successors(state))
            .collect();
    }

    let once = problem.prune(frontier.clone());
    let twice = problem.prune(once.clone());
    assert!(once.len() < frontier.len());
    assert_eq!(once, twice);
}

#[test]
fn test_heightmap_climb() {
    let map = Heightmap::parse(HEIGHTMAP).unwrap();
    assert_eq!(map.steps_to_summit(), Ok(31));
    assert_eq!(map.shortest_trail(), Ok(29));
}

#[test]
fn test_basin_crossings() {
    let basin = Basin::parse(BASIN).unwrap();
    assert_eq!(basin.fastest_crossing(), Ok(18));
    assert_eq!(basin.round_trip(), Ok([18, 41, 54]));
    assert_eq!(basin.crossing(basin.exit(), basin.entrance(), 18), Ok(41));
}

#[test]
fn test_valve_pressure() {
    let network = ValveNetwork::parse(VALVES).unwrap();
    assert_eq!(
        network.max_pressure(&ExplorerConfig::with_horizon(30)),
        Ok(1651)
    );
    assert_eq!(
        network.max_pressure_with_elephant(&ExplorerConfig {
            horizon: 26,
            workers: 2,
        }),
        Ok(1707)
    );
    assert_eq!(network.best_route(30, RouteCutoff::OverBudget).pressure, 1651);
}

#[test]
fn test_sensor_coverage() {
    let field = SensorField::parse(SENSORS).unwrap();
    assert_eq!(field.covered_positions(10), 26);
    let gap = field.find_gap_parallel(20, 25).unwrap();
    assert_eq!(gap.tuning_frequency(), 56_000_011);
}
