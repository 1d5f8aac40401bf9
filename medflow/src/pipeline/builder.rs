//! Flow builder with validation.

use super::graph::{FlowGraph, DEFAULT_MAX_STEPS};
use crate::core::Outcome;
use crate::errors::{FlowBuildError, FlowBuildErrorKind};
use crate::stages::Node;
use std::collections::{HashMap, HashSet, VecDeque};

/// Builder for creating validated flow graphs.
///
/// Stages, edges and terminal markers can be declared in any order; all
/// checks run in [`build`](Self::build).
pub struct FlowBuilder<C> {
    /// The flow name.
    name: String,
    /// Stages in insertion order.
    stages: Vec<Box<dyn Node<C>>>,
    /// Name of the entry stage.
    entry: Option<String>,
    /// `(from, outcome, to)` in insertion order.
    edges: Vec<(String, Outcome, String)>,
    /// `(stage, outcome)` pairs that end the run.
    terminals: Vec<(String, Outcome)>,
    /// Whether cycles are rejected.
    acyclic: bool,
    /// Step limit for the built graph.
    max_steps: usize,
}

impl<C> FlowBuilder<C> {
    /// Creates a new flow builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            entry: None,
            edges: Vec::new(),
            terminals: Vec::new(),
            acyclic: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Adds a stage.
    #[must_use]
    pub fn stage<N>(mut self, stage: N) -> Self
    where
        N: Node<C> + 'static,
    {
        self.stages.push(Box::new(stage));
        self
    }

    /// Sets the entry stage.
    #[must_use]
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Routes `outcome` returned by `from` to `to`.
    #[must_use]
    pub fn edge(
        mut self,
        from: impl Into<String>,
        outcome: impl Into<Outcome>,
        to: impl Into<String>,
    ) -> Self {
        self.edges.push((from.into(), outcome.into(), to.into()));
        self
    }

    /// Declares that `outcome` returned by `stage` ends the run.
    #[must_use]
    pub fn terminal(mut self, stage: impl Into<String>, outcome: impl Into<Outcome>) -> Self {
        self.terminals.push((stage.into(), outcome.into()));
        self
    }

    /// Rejects graphs containing a cycle.
    #[must_use]
    pub const fn acyclic(mut self) -> Self {
        self.acyclic = true;
        self
    }

    /// Sets the maximum number of stage invocations per run.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Returns the flow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the flow graph.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowBuildError`] when the graph is empty, has no valid
    /// entry, repeats a stage or edge, refers to an unknown stage, routes a
    /// label its stage does not declare, leaves a declared label unrouted,
    /// has stages unreachable from the entry, has a zero step limit, or (with
    /// [`acyclic`](Self::acyclic)) contains a cycle or a path longer than
    /// the step limit.
    pub fn build(self) -> Result<FlowGraph<C>, FlowBuildError> {
        if self.stages.is_empty() {
            return Err(FlowBuildError::new(
                FlowBuildErrorKind::Empty,
                format!("Flow '{}' has no stages", self.name),
            ));
        }

        let mut index = HashMap::with_capacity(self.stages.len());
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name().to_string(), i).is_some() {
                return Err(FlowBuildError::new(
                    FlowBuildErrorKind::DuplicateStage,
                    format!("Stage '{}' is defined more than once", stage.name()),
                )
                .with_stages(vec![stage.name().to_string()]));
            }
        }

        let Some(entry_name) = self.entry.as_deref() else {
            return Err(FlowBuildError::new(
                FlowBuildErrorKind::MissingEntry,
                format!("Flow '{}' has no entry stage", self.name),
            ));
        };
        let entry = lookup(&index, entry_name, "entry")?;

        let mut edges = HashMap::with_capacity(self.edges.len());
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); self.stages.len()];
        for (from, outcome, to) in &self.edges {
            let from_idx = lookup(&index, from, "edge source")?;
            let to_idx = lookup(&index, to, "edge target")?;
            ensure_declared(&*self.stages[from_idx], outcome)?;
            if edges.insert((from_idx, outcome.clone()), to_idx).is_some() {
                return Err(duplicate_edge(from, outcome));
            }
            adjacency[from_idx].push(to_idx);
        }

        let mut terminals = HashSet::with_capacity(self.terminals.len());
        for (stage, outcome) in &self.terminals {
            let idx = lookup(&index, stage, "terminal")?;
            ensure_declared(&*self.stages[idx], outcome)?;
            let key = (idx, outcome.clone());
            if edges.contains_key(&key) || !terminals.insert(key) {
                return Err(duplicate_edge(stage, outcome));
            }
        }

        let reachable = reachable_from(entry, &adjacency);
        let unreachable: Vec<String> = self
            .stages
            .iter()
            .enumerate()
            .filter(|(i, _)| !reachable[*i])
            .map(|(_, s)| s.name().to_string())
            .collect();
        if !unreachable.is_empty() {
            return Err(FlowBuildError::new(
                FlowBuildErrorKind::Unreachable,
                format!(
                    "Stages not reachable from '{}': {}",
                    entry_name,
                    unreachable.join(", ")
                ),
            )
            .with_stages(unreachable));
        }

        for (i, stage) in self.stages.iter().enumerate() {
            for outcome in stage.outcomes() {
                let key = (i, outcome.clone());
                if !edges.contains_key(&key) && !terminals.contains(&key) {
                    return Err(FlowBuildError::new(
                        FlowBuildErrorKind::DanglingOutcome,
                        format!(
                            "Outcome '{}' of stage '{}' has no edge and is not marked terminal",
                            outcome,
                            stage.name()
                        ),
                    )
                    .with_stages(vec![stage.name().to_string()]));
                }
            }
        }

        if self.max_steps == 0 {
            return Err(FlowBuildError::new(
                FlowBuildErrorKind::StepLimit,
                format!("Flow '{}' has a step limit of zero", self.name),
            ));
        }

        if self.acyclic {
            if let Some(cycle) = find_cycle(&adjacency) {
                let path: Vec<String> = cycle
                    .iter()
                    .map(|&i| self.stages[i].name().to_string())
                    .collect();
                return Err(FlowBuildError::new(
                    FlowBuildErrorKind::Cycle,
                    format!("Cycle detected in flow: {}", path.join(" -> ")),
                )
                .with_stages(path));
            }

            let path = longest_path(entry, &adjacency);
            if path.len() > self.max_steps {
                let names: Vec<String> = path
                    .iter()
                    .map(|&i| self.stages[i].name().to_string())
                    .collect();
                return Err(FlowBuildError::new(
                    FlowBuildErrorKind::StepLimit,
                    format!(
                        "Step limit {} is shorter than the longest path ({} stages): {}",
                        self.max_steps,
                        names.len(),
                        names.join(" -> ")
                    ),
                )
                .with_stages(names));
            }
        }

        Ok(FlowGraph::new(
            self.name,
            self.stages,
            index,
            edges,
            terminals,
            entry,
            self.max_steps,
        ))
    }
}

impl<C> std::fmt::Debug for FlowBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("entry", &self.entry)
            .field("edges", &self.edges)
            .field("terminals", &self.terminals)
            .field("acyclic", &self.acyclic)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

fn lookup(index: &HashMap<String, usize>, name: &str, role: &str) -> Result<usize, FlowBuildError> {
    index.get(name).copied().ok_or_else(|| {
        FlowBuildError::new(
            FlowBuildErrorKind::UnknownStage,
            format!("Unknown stage '{name}' used as {role}"),
        )
        .with_stages(vec![name.to_string()])
    })
}

fn ensure_declared<C>(stage: &dyn Node<C>, outcome: &Outcome) -> Result<(), FlowBuildError> {
    if stage.outcomes().contains(outcome) {
        return Ok(());
    }
    Err(FlowBuildError::new(
        FlowBuildErrorKind::UndeclaredOutcome,
        format!(
            "Stage '{}' never returns outcome '{}'",
            stage.name(),
            outcome
        ),
    )
    .with_stages(vec![stage.name().to_string()]))
}

fn duplicate_edge(stage: &str, outcome: &Outcome) -> FlowBuildError {
    FlowBuildError::new(
        FlowBuildErrorKind::DuplicateEdge,
        format!("Outcome '{outcome}' of stage '{stage}' is mapped more than once"),
    )
    .with_stages(vec![stage.to_string()])
}

fn reachable_from(entry: usize, adjacency: &[Vec<usize>]) -> Vec<bool> {
    let mut seen = vec![false; adjacency.len()];
    let mut queue = VecDeque::from([entry]);
    seen[entry] = true;

    while let Some(node) = queue.pop_front() {
        for &next in &adjacency[node] {
            if !seen[next] {
                seen[next] = true;
                queue.push_back(next);
            }
        }
    }

    seen
}

/// Returns the first cycle found, as a path that starts and ends on the
/// same stage.
fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut visited = vec![false; adjacency.len()];
    let mut on_stack = vec![false; adjacency.len()];
    let mut path = Vec::new();

    for start in 0..adjacency.len() {
        if !visited[start] {
            if let Some(cycle) = dfs_cycle(start, adjacency, &mut visited, &mut on_stack, &mut path) {
                return Some(cycle);
            }
        }
    }

    None
}

fn dfs_cycle(
    node: usize,
    adjacency: &[Vec<usize>],
    visited: &mut [bool],
    on_stack: &mut [bool],
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    visited[node] = true;
    on_stack[node] = true;
    path.push(node);

    for &next in &adjacency[node] {
        if !visited[next] {
            if let Some(cycle) = dfs_cycle(next, adjacency, visited, on_stack, path) {
                return Some(cycle);
            }
        } else if on_stack[next] {
            if let Some(start) = path.iter().position(|&n| n == next) {
                let mut cycle = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
        }
    }

    path.pop();
    on_stack[node] = false;
    None
}

/// Returns the longest stage path starting at `entry`. The graph must be
/// acyclic.
fn longest_path(entry: usize, adjacency: &[Vec<usize>]) -> Vec<usize> {
    fn walk(node: usize, adjacency: &[Vec<usize>], memo: &mut [Option<Vec<usize>>]) -> Vec<usize> {
        if let Some(path) = &memo[node] {
            return path.clone();
        }
        let mut best: Vec<usize> = Vec::new();
        for &next in &adjacency[node] {
            let tail = walk(next, adjacency, memo);
            if tail.len() > best.len() {
                best = tail;
            }
        }
        best.insert(0, node);
        memo[node] = Some(best.clone());
        best
    }

    let mut memo = vec![None; adjacency.len()];
    walk(entry, adjacency, &mut memo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FlowParams;
    use crate::stages::FnStage;

    type Ctx = Vec<String>;

    fn step(name: &'static str, outcomes: &[&'static str], returns: &'static str) -> impl Node<Ctx> {
        FnStage::new(
            name,
            outcomes.to_vec(),
            move |ctx: &mut Ctx, _params: &FlowParams| {
                ctx.push(name.to_string());
                Outcome::new(returns)
            },
        )
    }

    fn linear() -> FlowBuilder<Ctx> {
        FlowBuilder::new("linear")
            .stage(step("a", &["next"], "next"))
            .stage(step("b", &["done"], "done"))
            .entry("a")
            .edge("a", "next", "b")
            .terminal("b", "done")
    }

    fn kind_of(builder: FlowBuilder<Ctx>) -> FlowBuildErrorKind {
        builder.build().unwrap_err().kind
    }

    #[test]
    fn test_builder_creation() {
        let builder: FlowBuilder<Ctx> = FlowBuilder::new("test");
        assert_eq!(builder.name(), "test");
        assert_eq!(builder.stage_count(), 0);
    }

    #[test]
    fn test_build_success() {
        let graph = linear().build().unwrap();
        assert_eq!(graph.name(), "linear");
        assert_eq!(graph.entry(), "a");
        assert_eq!(graph.next("a", &Outcome::new("next")), Some("b"));
        assert!(graph.is_terminal("b", &Outcome::DONE));
    }

    #[test]
    fn test_empty_build() {
        let builder: FlowBuilder<Ctx> = FlowBuilder::new("test");
        assert_eq!(kind_of(builder), FlowBuildErrorKind::Empty);
    }

    #[test]
    fn test_missing_entry() {
        let builder = FlowBuilder::new("test")
            .stage(step("a", &["done"], "done"))
            .terminal("a", "done");
        assert_eq!(kind_of(builder), FlowBuildErrorKind::MissingEntry);
    }

    #[test]
    fn test_unknown_entry() {
        let builder = linear().entry("nope");
        assert_eq!(kind_of(builder), FlowBuildErrorKind::UnknownStage);
    }

    #[test]
    fn test_duplicate_stage() {
        let builder = linear().stage(step("a", &["next"], "next"));
        assert_eq!(kind_of(builder), FlowBuildErrorKind::DuplicateStage);
    }

    #[test]
    fn test_edge_to_unknown_stage() {
        let builder = FlowBuilder::new("test")
            .stage(step("a", &["next"], "next"))
            .entry("a")
            .edge("a", "next", "missing");
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind, FlowBuildErrorKind::UnknownStage);
        assert_eq!(err.stages, vec!["missing".to_string()]);
    }

    #[test]
    fn test_undeclared_outcome_edge() {
        let builder = linear().edge("a", "sideways", "b");
        assert_eq!(kind_of(builder), FlowBuildErrorKind::UndeclaredOutcome);
    }

    #[test]
    fn test_dangling_outcome() {
        let builder = FlowBuilder::new("test")
            .stage(step("a", &["next", "error"], "next"))
            .stage(step("b", &["done"], "done"))
            .entry("a")
            .edge("a", "next", "b")
            .terminal("b", "done");
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind, FlowBuildErrorKind::DanglingOutcome);
        assert!(err.message.contains("'error'"));
    }

    #[test]
    fn test_duplicate_edge() {
        let builder = linear().edge("a", "next", "b");
        assert_eq!(kind_of(builder), FlowBuildErrorKind::DuplicateEdge);
    }

    #[test]
    fn test_edge_and_terminal_on_same_label() {
        let builder = linear().terminal("a", "next");
        assert_eq!(kind_of(builder), FlowBuildErrorKind::DuplicateEdge);
    }

    #[test]
    fn test_unreachable_stage() {
        let builder = linear().stage(step("island", &["done"], "done")).terminal("island", "done");
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind, FlowBuildErrorKind::Unreachable);
        assert_eq!(err.stages, vec!["island".to_string()]);
    }

    #[test]
    fn test_cycles_allowed_by_default() {
        let builder = FlowBuilder::new("loop")
            .stage(step("a", &["again"], "again"))
            .entry("a")
            .edge("a", "again", "a");
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_acyclic_rejects_cycle() {
        let builder = FlowBuilder::new("loop")
            .stage(step("a", &["next"], "next"))
            .stage(step("b", &["back", "done"], "done"))
            .entry("a")
            .edge("a", "next", "b")
            .edge("b", "back", "a")
            .terminal("b", "done")
            .acyclic();
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind, FlowBuildErrorKind::Cycle);
        assert_eq!(err.stages, vec!["a", "b", "a"]);
        assert!(err.message.contains("a -> b -> a"));
    }

    #[test]
    fn test_acyclic_accepts_dag() {
        assert!(linear().acyclic().build().is_ok());
    }

    #[test]
    fn test_zero_step_limit_rejected() {
        assert_eq!(kind_of(linear().max_steps(0)), FlowBuildErrorKind::StepLimit);
    }

    #[test]
    fn test_step_limit_shorter_than_longest_path() {
        let builder = FlowBuilder::new("branchy")
            .stage(step("a", &["short", "long"], "long"))
            .stage(step("b", &["next"], "next"))
            .stage(step("c", &["done"], "done"))
            .entry("a")
            .edge("a", "short", "c")
            .edge("a", "long", "b")
            .edge("b", "next", "c")
            .terminal("c", "done")
            .acyclic();

        let err = builder.max_steps(2).build().unwrap_err();
        assert_eq!(err.kind, FlowBuildErrorKind::StepLimit);
        assert_eq!(err.stages, vec!["a", "b", "c"]);
        assert!(err.message.contains("a -> b -> c"));
    }

    #[test]
    fn test_step_limit_equal_to_longest_path() {
        let graph = linear().acyclic().max_steps(2).build().unwrap();
        let mut ctx = Ctx::new();
        graph.run(&mut ctx, &FlowParams::new());
        assert_eq!(ctx, vec!["a", "b"]);
    }

    #[test]
    fn test_small_step_limit_allowed_with_cycles() {
        let builder = FlowBuilder::new("loop")
            .stage(step("a", &["again"], "again"))
            .entry("a")
            .edge("a", "again", "a")
            .max_steps(1);
        assert!(builder.build().is_ok());
    }
}
