use oorandom::Rand64;

use crate::graph::{DirectedGraph, Node};
use crate::metaheuristic::Route;
use crate::rng::rng64;

/// `allowed` value of a node the ant already visited.
pub const VISITED: i32 = -1;

/// Per round state of a single ant.
///
/// `allowed[node]` is `-1` once the ant visited the node, `0` if it may be visited next
/// and otherwise the number of its predecessors that are still unvisited.
#[derive(Debug, Clone)]
pub struct Ant {
    current: Option<Node>,
    allowed: Vec<i32>,
    route: Route,
    rng: Rand64,
}

/// Counts the predecessors of every node. `dependencies` holds an edge (a, b) if a has to
/// be visited before b.
pub fn unlock_counts(dependencies: &DirectedGraph) -> Vec<i32> {
    let inverted = dependencies.inverted();
    (0..inverted.node_count())
        .map(|node| inverted.successors(node).count() as i32)
        .collect()
}

impl Ant {
    /// Places a new ant on `start`, with `allowed` as returned by [`unlock_counts`].
    /// The start node counts as visited.
    pub fn new(start: Node, allowed: Vec<i32>, dependencies: &DirectedGraph) -> Self {
        let mut ant = Ant {
            current: None,
            allowed,
            route: Route::new(),
            rng: rng64(0),
        };
        ant.visit(start, dependencies);

        ant
    }

    /// Returns the node the ant is standing on, or `None` once it got stuck.
    pub fn current(&self) -> Option<Node> {
        self.current
    }

    pub fn is_stuck(&self) -> bool {
        self.current.is_none()
    }

    pub fn allowed(&self) -> &[i32] {
        &self.allowed
    }

    pub fn is_visitable(&self, node: Node) -> bool {
        self.allowed.get(node) == Some(&0)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub(crate) fn route_mut(&mut self) -> &mut Route {
        &mut self.route
    }

    pub fn reseed(&mut self, seed: u128) {
        self.rng = rng64(seed);
    }

    /// Draws a float from `[0, 1)` from the ant's own stream.
    pub(crate) fn draw(&mut self) -> f64 {
        self.rng.rand_float()
    }

    /// Moves the ant to `node` and unlocks the nodes depending on it.
    pub(crate) fn visit(&mut self, node: Node, dependencies: &DirectedGraph) {
        self.route.push_node(node);
        self.current = Some(node);
        if let Some(state) = self.allowed.get_mut(node) {
            *state = VISITED;
        }
        for dependant in dependencies.successors(node) {
            if let Some(state) = self.allowed.get_mut(dependant) {
                *state -= 1;
            }
        }
    }

    pub(crate) fn get_stuck(&mut self) {
        self.current = None;
    }
}
