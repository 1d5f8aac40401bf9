//! Validated flow graphs and the run loop.

use super::params::FlowParams;
use super::trace::{FlowStep, FlowTrace, Termination};
use crate::core::Outcome;
use crate::stages::Node;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Default cap on stage invocations per run.
pub const DEFAULT_MAX_STEPS: usize = 64;

/// A validated graph of stages connected by outcome labels.
///
/// Built with [`FlowBuilder`](super::FlowBuilder). A graph holds no per-run
/// state, so one instance can serve any number of runs, each over its own
/// context.
pub struct FlowGraph<C> {
    name: String,
    stages: Vec<Box<dyn Node<C>>>,
    index: HashMap<String, usize>,
    edges: HashMap<(usize, Outcome), usize>,
    terminals: HashSet<(usize, Outcome)>,
    entry: usize,
    max_steps: usize,
}

impl<C> FlowGraph<C> {
    pub(super) fn new(
        name: String,
        stages: Vec<Box<dyn Node<C>>>,
        index: HashMap<String, usize>,
        edges: HashMap<(usize, Outcome), usize>,
        terminals: HashSet<(usize, Outcome)>,
        entry: usize,
        max_steps: usize,
    ) -> Self {
        Self {
            name,
            stages,
            index,
            edges,
            terminals,
            entry,
            max_steps,
        }
    }

    /// Returns the flow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry stage name.
    #[must_use]
    pub fn entry(&self) -> &str {
        self.stages[self.entry].name()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns stage names in declaration order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns true if the graph has a stage with this name.
    #[must_use]
    pub fn contains_stage(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the step limit.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Returns where `outcome` from `stage` leads, if anywhere.
    #[must_use]
    pub fn next(&self, stage: &str, outcome: &Outcome) -> Option<&str> {
        let from = *self.index.get(stage)?;
        self.edges
            .get(&(from, outcome.clone()))
            .map(|&to| self.stages[to].name())
    }

    /// Returns true if `outcome` from `stage` was marked terminal.
    #[must_use]
    pub fn is_terminal(&self, stage: &str, outcome: &Outcome) -> bool {
        self.index
            .get(stage)
            .is_some_and(|&from| self.terminals.contains(&(from, outcome.clone())))
    }

    /// Returns every edge as `(from, outcome, to)`, sorted for stable output.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &Outcome, &str)> {
        let mut edges: Vec<_> = self
            .edges
            .iter()
            .map(|((from, outcome), to)| {
                (self.stages[*from].name(), outcome, self.stages[*to].name())
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Runs the flow from the entry stage over `ctx`.
    ///
    /// Each stage's outcome selects the next stage. The run stops when an
    /// outcome has no edge, when a stage returns a label it never declared,
    /// or when the step limit is reached. Stage failures are routed by the
    /// stages themselves, so a run always produces a trace.
    pub fn run(&self, ctx: &mut C, params: &FlowParams) -> FlowTrace {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut steps = Vec::new();
        let mut current = self.entry;

        let termination = loop {
            if steps.len() >= self.max_steps {
                warn!(
                    flow = %self.name,
                    limit = self.max_steps,
                    "Flow stopped at step limit"
                );
                break Termination::StepLimit {
                    limit: self.max_steps,
                };
            }

            let node = &self.stages[current];
            let span = info_span!(
                "flow.stage",
                flow = %self.name,
                stage = node.name(),
                outcome = tracing::field::Empty,
            );
            let _guard = span.enter();

            let stage_start = Instant::now();
            let outcome = node.invoke(ctx, params);
            let duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0;

            span.record("outcome", outcome.as_str());
            debug!(duration_ms, "Stage finished");

            steps.push(FlowStep {
                stage: node.name().to_string(),
                outcome: outcome.clone(),
                duration_ms,
            });

            if !node.outcomes().contains(&outcome) {
                warn!(
                    outcome = %outcome,
                    "Stage returned an undeclared outcome; stopping"
                );
                break Termination::UndeclaredOutcome {
                    stage: node.name().to_string(),
                    outcome,
                };
            }

            match self.edges.get(&(current, outcome)) {
                Some(&next) => current = next,
                None => break Termination::Completed,
            }
        };

        FlowTrace {
            flow: self.name.clone(),
            started_at,
            steps,
            termination,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

impl<C> std::fmt::Debug for FlowGraph<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowGraph")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("entry", &self.entry())
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FlowBuilder;
    use crate::stages::FnStage;

    type Ctx = Vec<String>;

    fn push(name: &'static str, outcomes: &[&'static str], returns: &'static str) -> impl Node<Ctx> {
        FnStage::new(
            name,
            outcomes.to_vec(),
            move |ctx: &mut Ctx, _params: &FlowParams| {
                ctx.push(name.to_string());
                Outcome::new(returns)
            },
        )
    }

    #[test]
    fn test_run_follows_edges() {
        let graph = FlowBuilder::new("chain")
            .stage(push("a", &["next"], "next"))
            .stage(push("b", &["next"], "next"))
            .stage(push("c", &["done"], "done"))
            .entry("a")
            .edge("a", "next", "b")
            .edge("b", "next", "c")
            .terminal("c", "done")
            .build()
            .unwrap();

        let mut ctx = Ctx::new();
        let trace = graph.run(&mut ctx, &FlowParams::new());

        assert_eq!(ctx, vec!["a", "b", "c"]);
        assert_eq!(trace.visited(), vec!["a", "b", "c"]);
        assert_eq!(trace.termination, Termination::Completed);
        assert_eq!(trace.last_outcome(), Some(&Outcome::DONE));
        assert_eq!(trace.flow, "chain");
    }

    #[test]
    fn test_undeclared_outcome_stops_run() {
        let graph = FlowBuilder::new("rogue")
            .stage(push("a", &["next"], "surprise"))
            .stage(push("b", &["done"], "done"))
            .entry("a")
            .edge("a", "next", "b")
            .terminal("b", "done")
            .build()
            .unwrap();

        let mut ctx = Ctx::new();
        let trace = graph.run(&mut ctx, &FlowParams::new());

        assert_eq!(ctx, vec!["a"]);
        assert_eq!(
            trace.termination,
            Termination::UndeclaredOutcome {
                stage: "a".to_string(),
                outcome: Outcome::new("surprise"),
            }
        );
    }

    #[test]
    fn test_step_limit_on_cycle() {
        let graph = FlowBuilder::new("spin")
            .stage(push("a", &["again"], "again"))
            .entry("a")
            .edge("a", "again", "a")
            .max_steps(5)
            .build()
            .unwrap();

        let mut ctx = Ctx::new();
        let trace = graph.run(&mut ctx, &FlowParams::new());

        assert_eq!(ctx.len(), 5);
        assert_eq!(trace.steps.len(), 5);
        assert_eq!(trace.termination, Termination::StepLimit { limit: 5 });
    }

    #[test]
    fn test_graph_inspection() {
        let graph = FlowBuilder::new("inspect")
            .stage(push("a", &["left", "right"], "left"))
            .stage(push("b", &["done"], "done"))
            .stage(push("c", &["done"], "done"))
            .entry("a")
            .edge("a", "left", "b")
            .edge("a", "right", "c")
            .terminal("b", "done")
            .terminal("c", "done")
            .build()
            .unwrap();

        assert_eq!(graph.stage_count(), 3);
        assert_eq!(graph.stage_names(), vec!["a", "b", "c"]);
        assert!(graph.contains_stage("b"));
        assert!(!graph.contains_stage("z"));
        assert_eq!(graph.max_steps(), DEFAULT_MAX_STEPS);
        assert_eq!(
            graph.edges(),
            vec![
                ("a", &Outcome::new("left"), "b"),
                ("a", &Outcome::new("right"), "c"),
            ]
        );
        assert!(graph.is_terminal("c", &Outcome::DONE));
        assert!(!graph.is_terminal("a", &Outcome::new("left")));
        assert_eq!(graph.next("b", &Outcome::DONE), None);
    }

    #[test]
    fn test_graph_is_reusable() {
        let graph = FlowBuilder::new("reuse")
            .stage(push("only", &["done"], "done"))
            .entry("only")
            .terminal("only", "done")
            .build()
            .unwrap();

        let mut first = Ctx::new();
        let mut second = Ctx::new();
        graph.run(&mut first, &FlowParams::new());
        graph.run(&mut second, &FlowParams::new());
        assert_eq!(first, second);
    }
}
