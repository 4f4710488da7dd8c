//! Robot factory blueprints: the resource-accumulation instantiation.
//!
//! A factory starts with one ore robot. Every minute each robot collects one
//! unit of its material, and the factory may spend materials it held at the
//! start of the minute to build one more robot, which is ready the minute
//! after. The objective is the number of geodes held at the horizon.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use log::info;
use smallvec::SmallVec;

use crate::error::{ExploreError, ParseError};
use crate::explorer::{Explorer, ExplorerConfig, Frontier, Problem, SearchState};
use crate::pruning::{clamp_all, remove_dominated, Dominance};

pub const MATERIAL_COUNT: usize = 4;

/// Materials, in the order they appear in a blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Ore,
    Clay,
    Obsidian,
    Geode,
}

impl Material {
    pub const ALL: [Material; MATERIAL_COUNT] = [
        Material::Ore,
        Material::Clay,
        Material::Obsidian,
        Material::Geode,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ore" => Ok(Material::Ore),
            "clay" => Ok(Material::Clay),
            "obsidian" => Ok(Material::Obsidian),
            "geode" => Ok(Material::Geode),
            other => Err(format!("unknown material {other:?}")),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Material::Ore => "ore",
            Material::Clay => "clay",
            Material::Obsidian => "obsidian",
            Material::Geode => "geode",
        };
        f.write_str(name)
    }
}

pub type Amounts = [u32; MATERIAL_COUNT];

/// Build costs for every robot kind, indexed by the material it collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    pub id: u32,
    costs: [Amounts; MATERIAL_COUNT],
    /// Most of each material any single recipe needs
    max_spend: Amounts,
}

impl Blueprint {
    pub fn new(id: u32, costs: [Amounts; MATERIAL_COUNT]) -> Self {
        let mut max_spend = [0; MATERIAL_COUNT];
        for cost in &costs {
            for (max, &amount) in max_spend.iter_mut().zip(cost) {
                *max = (*max).max(amount);
            }
        }
        Self {
            id,
            costs,
            max_spend,
        }
    }

    pub fn cost(&self, robot: Material) -> &Amounts {
        &self.costs[robot.index()]
    }

    /// Largest amount of `material` that can be spent in one minute.
    pub fn max_spend(&self, material: Material) -> u32 {
        self.max_spend[material.index()]
    }

    /// Whether another robot of this kind could ever be useful.
    fn worth_building(&self, robot: Material, inventory: &Inventory) -> bool {
        robot == Material::Geode || inventory.robots(robot) < self.max_spend(robot)
    }
}

/// Parse one blueprint per non-empty line.
pub fn parse_blueprints(input: &str) -> Result<Vec<Blueprint>, ParseError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_blueprint(line).map_err(|reason| ParseError::new(i + 1, reason)))
        .collect()
}

fn parse_blueprint(line: &str) -> Result<Blueprint, String> {
    let (header, body) = line
        .trim()
        .split_once(':')
        .ok_or("missing ':' after blueprint id")?;
    let id = header
        .strip_prefix("Blueprint ")
        .ok_or("line must start with \"Blueprint\"")?
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad blueprint id: {e}"))?;

    let mut costs: [Option<Amounts>; MATERIAL_COUNT] = [None; MATERIAL_COUNT];
    for sentence in body.split('.').map(str::trim).filter(|s| !s.is_empty()) {
        let (robot, cost) = parse_recipe(sentence)?;
        if costs[robot.index()].replace(cost).is_some() {
            return Err(format!("duplicate recipe for {robot} robot"));
        }
    }

    let mut resolved = [[0; MATERIAL_COUNT]; MATERIAL_COUNT];
    for robot in Material::ALL {
        resolved[robot.index()] =
            costs[robot.index()].ok_or_else(|| format!("missing recipe for {robot} robot"))?;
    }
    Ok(Blueprint::new(id, resolved))
}

/// `Each <material> robot costs <n> <material>[ and <n> <material>]*`
fn parse_recipe(sentence: &str) -> Result<(Material, Amounts), String> {
    let rest = sentence
        .strip_prefix("Each ")
        .ok_or_else(|| format!("expected \"Each\" in {sentence:?}"))?;
    let (robot, ingredients) = rest
        .split_once(" robot costs ")
        .ok_or_else(|| format!("expected \"robot costs\" in {sentence:?}"))?;
    let robot: Material = robot.trim().parse()?;

    let mut cost = [0; MATERIAL_COUNT];
    for ingredient in ingredients.split(" and ") {
        let (amount, material) = ingredient
            .split_whitespace()
            .collect_tuple()
            .ok_or_else(|| format!("bad ingredient {ingredient:?}"))?;
        let amount: u32 = amount
            .parse()
            .map_err(|e| format!("bad amount {amount:?}: {e}"))?;
        let material: Material = material.parse()?;
        cost[material.index()] += amount;
    }
    Ok((robot, cost))
}

/// Materials and robots held after `time` minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inventory {
    resources: Amounts,
    robots: Amounts,
    time: u32,
}

impl Inventory {
    /// One ore robot, nothing else, at minute zero.
    pub fn start() -> Self {
        let mut robots = [0; MATERIAL_COUNT];
        robots[Material::Ore.index()] = 1;
        Self {
            resources: [0; MATERIAL_COUNT],
            robots,
            time: 0,
        }
    }

    pub fn resource(&self, material: Material) -> u32 {
        self.resources[material.index()]
    }

    pub fn robots(&self, material: Material) -> u32 {
        self.robots[material.index()]
    }

    pub fn can_afford(&self, cost: &Amounts) -> bool {
        self.resources.iter().zip(cost).all(|(have, need)| have >= need)
    }

    /// One minute of collection with nothing built.
    pub fn with_production(&self) -> Self {
        let mut next = *self;
        for (resource, robots) in next.resources.iter_mut().zip(&self.robots) {
            *resource += robots;
        }
        next.time += 1;
        next
    }

    /// One minute of collection while a robot is built.
    ///
    /// The cost must be affordable from the resources held now.
    pub fn with_robot(&self, robot: Material, cost: &Amounts) -> Self {
        debug_assert!(self.can_afford(cost));
        let mut next = self.with_production();
        for (resource, amount) in next.resources.iter_mut().zip(cost) {
            *resource -= amount;
        }
        next.robots[robot.index()] += 1;
        next
    }

    /// Resources clamped down to per-material ceilings.
    pub fn with_ceilings(&self, ceilings: &Amounts) -> Self {
        let mut next = *self;
        for (resource, &ceiling) in next.resources.iter_mut().zip(ceilings) {
            *resource = (*resource).min(ceiling);
        }
        next
    }
}

impl SearchState for Inventory {
    fn time(&self) -> u32 {
        self.time
    }
}

impl Dominance for Inventory {
    type Bucket = u32;

    fn bucket(&self) -> u32 {
        self.time
    }

    fn dominates(&self, other: &Self) -> bool {
        self.resources
            .iter()
            .chain(&self.robots)
            .zip(other.resources.iter().chain(&other.robots))
            .all(|(mine, theirs)| mine >= theirs)
    }
}

/// Geode maximisation for one blueprint
pub struct GeodeProblem<'b> {
    blueprint: &'b Blueprint,
    /// Ceilings are computed against this horizon, so it must match the run's
    horizon: u32,
}

impl<'b> GeodeProblem<'b> {
    pub fn new(blueprint: &'b Blueprint, config: &ExplorerConfig) -> Self {
        Self {
            blueprint,
            horizon: config.horizon,
        }
    }

    /// Surplus beyond what the remaining minutes could ever spend is useless.
    fn ceilings(&self, time: u32) -> Amounts {
        let remaining = self.horizon.saturating_sub(time);
        let mut ceilings = [u32::MAX; MATERIAL_COUNT];
        for material in [Material::Ore, Material::Clay, Material::Obsidian] {
            ceilings[material.index()] = self
                .blueprint
                .max_spend(material)
                .saturating_mul(remaining);
        }
        ceilings
    }
}

impl Problem for GeodeProblem<'_> {
    type State = Inventory;
    type Successors = SmallVec<[Inventory; 5]>;

    fn successors(&self, state: &Inventory) -> Self::Successors {
        let mut next = SmallVec::new();
        next.push(state.with_production());

        for robot in Material::ALL {
            let cost = self.blueprint.cost(robot);
            if state.can_afford(cost) && self.blueprint.worth_building(robot, state) {
                next.push(state.with_robot(robot, cost));
            }
        }
        next
    }

    fn objective(&self, state: &Inventory) -> u64 {
        u64::from(state.resource(Material::Geode))
    }

    fn prune(&self, candidates: Frontier<Inventory>) -> Frontier<Inventory> {
        debug_assert!(
            candidates.iter().all(|state| state.time <= self.horizon),
            "candidate past the problem horizon {}",
            self.horizon
        );
        let clamped = clamp_all(candidates, |state| {
            let ceilings = self.ceilings(state.time);
            state.with_ceilings(&ceilings)
        });
        remove_dominated(clamped)
    }
}

/// Most geodes the blueprint can open within `config.horizon` minutes.
pub fn max_geodes(blueprint: &Blueprint, config: &ExplorerConfig) -> Result<u64, ExploreError> {
    let problem = GeodeProblem::new(blueprint, config);
    let outcome = Explorer::new(&problem, config.clone()).run(Inventory::start())?;
    info!(
        "blueprint {}: {} geodes (peak frontier {})",
        blueprint.id,
        outcome.best,
        outcome.peak_frontier
    );
    Ok(outcome.best)
}

/// Sum of `id * max_geodes` over every blueprint.
pub fn quality_level_sum(
    blueprints: &[Blueprint],
    config: &ExplorerConfig,
) -> Result<u64, ExploreError> {
    let mut sum = 0;
    for blueprint in blueprints {
        sum += u64::from(blueprint.id) * max_geodes(blueprint, config)?;
    }
    Ok(sum)
}

/// Product of `max_geodes` over the first three blueprints.
pub fn first_three_product(
    blueprints: &[Blueprint],
    config: &ExplorerConfig,
) -> Result<u64, ExploreError> {
    let mut product = 1;
    for blueprint in blueprints.iter().take(3) {
        product *= max_geodes(blueprint, config)?;
    }
    Ok(product)
}
