use std::collections::HashMap;

use crate::error::ExecutorError;
use crate::executor::types::Unit;

/// Ordered batches of mutually independent units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub batches: Vec<Vec<Unit>>,

    /// Cycles found while batching, written as closed paths (`a, b, a`).
    /// Non-empty only when cycles were broken instead of rejected.
    pub broken_cycles: Vec<Vec<String>>,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn unit_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// Batch membership by name
    pub fn names(&self) -> Vec<Vec<String>> {
        self.batches
            .iter()
            .map(|batch| batch.iter().map(|u| u.name.clone()).collect())
            .collect()
    }
}

/// Unit dependency graph (index based)
///
/// Edges point from a unit to the in-graph units it depends on. Dependency
/// names that are not members of the unit set are dropped as external.
#[derive(Debug)]
pub struct UnitGraph<'a> {
    units: &'a [Unit],

    /// Unit index -> indices of its dependencies
    deps: Vec<Vec<usize>>,

    /// Unit index -> indices of units that depend on it
    dependents: Vec<Vec<usize>>,
}

impl<'a> UnitGraph<'a> {
    /// Construct the graph, rejecting duplicate names.
    pub fn new(units: &'a [Unit]) -> Result<Self, ExecutorError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if index.insert(unit.name.as_str(), i).is_some() {
                return Err(ExecutorError::DuplicateUnit(unit.name.clone()));
            }
        }

        let mut deps = vec![Vec::new(); units.len()];
        let mut dependents = vec![Vec::new(); units.len()];

        for (i, unit) in units.iter().enumerate() {
            for dep in &unit.dependencies {
                let Some(&j) = index.get(dep.as_str()) else {
                    continue;
                };
                if deps[i].contains(&j) {
                    continue;
                }
                deps[i].push(j);
                dependents[j].push(i);
            }
        }

        Ok(Self {
            units,
            deps,
            dependents,
        })
    }

    /// Kahn layering into batches.
    ///
    /// Each round collects every unit whose remaining in-degree is zero. When
    /// a round finds none while units remain, the remainder contains a cycle:
    /// it is either rejected or placed, as a whole, into one final batch.
    ///
    /// O(V + E) apart from cycle reporting.
    pub fn batches(&self, reject_cycles: bool) -> Result<BatchPlan, ExecutorError> {
        let n = self.units.len();
        let mut in_degree: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut batched = vec![false; n];
        let mut plan = BatchPlan::default();
        let mut processed = 0;

        let mut current: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();

        while processed < n {
            if current.is_empty() {
                let remaining: Vec<bool> = batched.iter().map(|done| !done).collect();
                let cycles = self.find_cycles(&remaining);

                if reject_cycles {
                    let cycle = cycles
                        .first()
                        .map(|c| c.join(" -> "))
                        .unwrap_or_else(|| "unable to complete batching".to_string());
                    return Err(ExecutorError::CyclicDependency { cycle });
                }

                for cycle in &cycles {
                    tracing::warn!(
                        cycle = %cycle.join(" -> "),
                        "breaking dependency cycle, ordering inside it is not honored"
                    );
                }

                let rest: Vec<usize> = (0..n).filter(|&i| remaining[i]).collect();
                plan.batches.push(self.collect(&rest));
                plan.broken_cycles = cycles;
                break;
            }

            let mut next = Vec::new();
            for &i in &current {
                batched[i] = true;
                for &dependent in &self.dependents[i] {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }

            // Preserve input order
            next.sort_unstable();

            processed += current.len();
            plan.batches.push(self.collect(&current));
            current = next;
        }

        Ok(plan)
    }

    fn collect(&self, indices: &[usize]) -> Vec<Unit> {
        indices.iter().map(|&i| self.units[i].clone()).collect()
    }

    /// Cycles among `remaining` units, found by DFS over dependency edges.
    fn find_cycles(&self, remaining: &[bool]) -> Vec<Vec<String>> {
        let n = self.units.len();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];
        let mut stack = Vec::new();
        let mut cycles = Vec::new();

        for start in 0..n {
            if remaining[start] && !visited[start] {
                self.dfs_cycles(
                    start,
                    remaining,
                    &mut visited,
                    &mut on_stack,
                    &mut stack,
                    &mut cycles,
                );
            }
        }

        cycles
    }

    fn dfs_cycles(
        &self,
        node: usize,
        remaining: &[bool],
        visited: &mut [bool],
        on_stack: &mut [bool],
        stack: &mut Vec<usize>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited[node] = true;
        on_stack[node] = true;
        stack.push(node);

        for &dep in &self.deps[node] {
            if !remaining[dep] {
                continue;
            }

            if on_stack[dep] {
                if let Some(pos) = stack.iter().position(|&x| x == dep) {
                    let cycle = stack[pos..]
                        .iter()
                        .chain(std::iter::once(&dep))
                        .map(|&i| self.units[i].name.clone())
                        .collect();
                    cycles.push(cycle);
                }
            } else if !visited[dep] {
                self.dfs_cycles(dep, remaining, visited, on_stack, stack, cycles);
            }
        }

        stack.pop();
        on_stack[node] = false;
    }
}

/// Partition `units` into dependency-ordered batches.
pub fn compute_batches(units: &[Unit], reject_cycles: bool) -> Result<BatchPlan, ExecutorError> {
    UnitGraph::new(units)?.batches(reject_cycles)
}

/// Every unit in a single batch, dependency order ignored.
pub fn single_batch(units: &[Unit]) -> BatchPlan {
    if units.is_empty() {
        return BatchPlan::default();
    }
    BatchPlan {
        batches: vec![units.to_vec()],
        broken_cycles: Vec::new(),
    }
}
