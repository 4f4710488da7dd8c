//! Generation-by-generation state-space exploration with dominance pruning.
//!
//! The [`explorer`] module holds the engine: a deduplicated frontier that is
//! advanced one time step at a time, pruned by the problem, and folded into
//! a best-objective accumulator once states reach the horizon. The puzzle
//! modules are thin instantiations of it:
//!
//! - [`blueprint`]: robot factories, maximising geodes (resource accumulation)
//! - [`valves`]: pressure release over a tunnel graph, one or two agents
//! - [`heightmap`]: fewest steps up an elevation grid (shortest path)
//! - [`basin`]: fewest minutes through blizzards that move every minute
//! - [`sensors`]: row coverage and a parallel gap scan racing over row ranges

pub mod basin;
pub mod blueprint;
pub mod error;
pub mod explorer;
pub mod heightmap;
pub mod pruning;
pub mod scan;
pub mod sensors;
pub mod valves;

// Re-export main types
pub use basin::Basin;
pub use blueprint::{parse_blueprints, Blueprint, Inventory, Material};
pub use error::{ExploreError, ParseError};
pub use explorer::{
    distances_from, first_arrival, generations_until, Explorer, ExplorerConfig, Frontier,
    GenerationStats, Outcome, Problem, SearchState,
};
pub use heightmap::{Heightmap, Position};
pub use pruning::{clamp_all, remove_dominated, Dominance};
pub use sensors::{Point, SensorField, Span};
pub use valves::{RouteCutoff, RouteSearch, ValveNetwork};
