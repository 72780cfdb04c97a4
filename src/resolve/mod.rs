//! Dependency resolution module
//!
//! Orders the endpoint table so every endpoint runs after the endpoints it
//! declares as dependencies.
//!
//! # Overview
//!
//! - `resolve_order` - Kahn's algorithm, one total order
//! - `dependency_levels` - the same graph grouped into levels whose members
//!   share no ancestor/descendant relation and may run in parallel
//!
//! Dependencies naming an endpoint that is not configured are ignored.
//! A cycle fails the whole resolution with `Error::CycleDetected`; no partial
//! order is ever returned.

use crate::config::EndpointSpec;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Edges of the endpoint dependency graph (`dependency -> dependent`)
struct DependencyGraph<'a> {
    nodes: Vec<&'a str>,
    in_degree: HashMap<&'a str, usize>,
    dependents: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> DependencyGraph<'a> {
    fn build(endpoints: &'a BTreeMap<String, EndpointSpec>) -> Self {
        let nodes: Vec<&str> = endpoints.keys().map(String::as_str).collect();
        let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (*n, 0)).collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, spec) in endpoints {
            for dep in &spec.dependencies {
                let Some((dep, _)) = endpoints.get_key_value(dep) else {
                    continue;
                };
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(name.as_str());
                *in_degree.entry(name.as_str()).or_default() += 1;
            }
        }

        Self {
            nodes,
            in_degree,
            dependents,
        }
    }

    fn cycle_error(&self, in_degree: &HashMap<&str, usize>) -> Error {
        let mut remaining: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(node, _)| (*node).to_string())
            .collect();
        remaining.sort();
        Error::CycleDetected { remaining }
    }
}

/// Resolve the endpoint table into a single execution order
pub fn resolve_order(endpoints: &BTreeMap<String, EndpointSpec>) -> Result<Vec<String>> {
    let graph = DependencyGraph::build(endpoints);
    let mut in_degree = graph.in_degree.clone();

    let mut queue: VecDeque<&str> = graph
        .nodes
        .iter()
        .copied()
        .filter(|n| in_degree[n] == 0)
        .collect();
    let mut order = Vec::with_capacity(graph.nodes.len());

    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());

        for next in graph.dependents.get(current).into_iter().flatten() {
            let degree = in_degree.entry(*next).or_default();
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(*next);
            }
        }
    }

    if order.len() < graph.nodes.len() {
        return Err(graph.cycle_error(&in_degree));
    }

    Ok(order)
}

/// Group the endpoint table into dependency levels
///
/// Level `n` holds every endpoint whose dependencies all sit in levels `< n`.
pub fn dependency_levels(endpoints: &BTreeMap<String, EndpointSpec>) -> Result<Vec<Vec<String>>> {
    let graph = DependencyGraph::build(endpoints);
    let mut in_degree = graph.in_degree.clone();

    let mut frontier: Vec<&str> = graph
        .nodes
        .iter()
        .copied()
        .filter(|n| in_degree[n] == 0)
        .collect();
    let mut levels = Vec::new();
    let mut emitted = 0;

    while !frontier.is_empty() {
        let mut next_frontier = Vec::new();
        for node in &frontier {
            for next in graph.dependents.get(node).into_iter().flatten() {
                let degree = in_degree.entry(*next).or_default();
                *degree -= 1;
                if *degree == 0 {
                    next_frontier.push(*next);
                }
            }
        }

        emitted += frontier.len();
        levels.push(frontier.iter().map(ToString::to_string).collect());
        frontier = next_frontier;
    }

    if emitted < graph.nodes.len() {
        return Err(graph.cycle_error(&in_degree));
    }

    Ok(levels)
}
