//! Stage traits and implementations.
//!
//! Stages are the fundamental units of work in a medflow pipeline. Each one
//! runs in three phases:
//!
//! 1. `prepare` reads what it needs from the context and the run parameters
//! 2. `compute` does the work without touching the context
//! 3. `finalize` writes results back and picks an outcome label
//!
//! The graph stores stages behind the object-safe [`Node`] trait, which every
//! [`Stage`] implements automatically.

use crate::core::{Outcome, StageResult};
use crate::pipeline::FlowParams;
use std::fmt::Debug;

/// Trait for pipeline stages operating on a context of type `C`.
pub trait Stage<C>: Send + Sync + Debug {
    /// What `prepare` hands to `compute`.
    type Input;
    /// What `compute` produces on success.
    type Output;

    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Every label `finalize` may return.
    ///
    /// The flow builder rejects edges using other labels and requires each
    /// of these to be routed or marked terminal.
    fn outcomes(&self) -> &[Outcome];

    /// Reads the stage input from the context and run parameters.
    fn prepare(&self, ctx: &C, params: &FlowParams) -> Self::Input;

    /// Does the stage's work.
    ///
    /// Failures are returned as data, never raised.
    fn compute(&self, input: &Self::Input) -> StageResult<Self::Output>;

    /// Persists results into the context and returns the outcome label.
    fn finalize(
        &self,
        ctx: &mut C,
        input: Self::Input,
        output: StageResult<Self::Output>,
    ) -> Outcome;
}

/// Object-safe view of a stage, as stored in a flow graph.
pub trait Node<C>: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Every label this node may return.
    fn outcomes(&self) -> &[Outcome];

    /// Runs prepare, compute and finalize in order.
    fn invoke(&self, ctx: &mut C, params: &FlowParams) -> Outcome;
}

impl<C, S> Node<C> for S
where
    S: Stage<C>,
{
    fn name(&self) -> &str {
        <S as Stage<C>>::name(self)
    }

    fn outcomes(&self) -> &[Outcome] {
        <S as Stage<C>>::outcomes(self)
    }

    fn invoke(&self, ctx: &mut C, params: &FlowParams) -> Outcome {
        let input = self.prepare(ctx, params);
        let output = self.compute(&input);
        self.finalize(ctx, input, output)
    }
}

/// A simple function-based stage.
///
/// The closure does all the work in the finalize phase, receiving the run
/// parameters captured by prepare. Handy for wiring tests and glue steps.
pub struct FnStage<F> {
    name: String,
    outcomes: Vec<Outcome>,
    func: F,
}

impl<F> FnStage<F> {
    /// Creates a new function-based stage.
    pub fn new<C, I>(name: impl Into<String>, outcomes: I, func: F) -> Self
    where
        F: Fn(&mut C, &FlowParams) -> Outcome + Send + Sync,
        I: IntoIterator,
        I::Item: Into<Outcome>,
    {
        Self {
            name: name.into(),
            outcomes: outcomes.into_iter().map(Into::into).collect(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("outcomes", &self.outcomes)
            .finish_non_exhaustive()
    }
}

impl<C, F> Stage<C> for FnStage<F>
where
    F: Fn(&mut C, &FlowParams) -> Outcome + Send + Sync,
{
    type Input = FlowParams;
    type Output = ();

    fn name(&self) -> &str {
        &self.name
    }

    fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    fn prepare(&self, _ctx: &C, params: &FlowParams) -> Self::Input {
        params.clone()
    }

    fn compute(&self, _input: &Self::Input) -> StageResult<Self::Output> {
        Ok(())
    }

    fn finalize(
        &self,
        ctx: &mut C,
        input: Self::Input,
        _output: StageResult<Self::Output>,
    ) -> Outcome {
        (self.func)(ctx, &input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageFailure;

    #[derive(Debug)]
    struct Doubler;

    impl Stage<Vec<i64>> for Doubler {
        type Input = Option<i64>;
        type Output = i64;

        fn name(&self) -> &str {
            "doubler"
        }

        fn outcomes(&self) -> &[Outcome] {
            const OUTCOMES: &[Outcome] = &[Outcome::DONE, Outcome::ERROR];
            OUTCOMES
        }

        fn prepare(&self, ctx: &Vec<i64>, _params: &FlowParams) -> Self::Input {
            ctx.last().copied()
        }

        fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
            input
                .map(|v| v * 2)
                .ok_or_else(|| StageFailure::missing_input("doubler", "last value"))
        }

        fn finalize(
            &self,
            ctx: &mut Vec<i64>,
            _input: Self::Input,
            output: StageResult<Self::Output>,
        ) -> Outcome {
            match output {
                Ok(v) => {
                    ctx.push(v);
                    Outcome::DONE
                }
                Err(_) => Outcome::ERROR,
            }
        }
    }

    #[test]
    fn test_node_runs_phases_in_order() {
        let mut ctx = vec![3];
        let outcome = Doubler.invoke(&mut ctx, &FlowParams::new());
        assert_eq!(outcome, Outcome::DONE);
        assert_eq!(ctx, vec![3, 6]);
    }

    #[test]
    fn test_node_failure_becomes_outcome() {
        let mut ctx: Vec<i64> = Vec::new();
        let outcome = Doubler.invoke(&mut ctx, &FlowParams::new());
        assert_eq!(outcome, Outcome::ERROR);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_fn_stage() {
        let stage = FnStage::new("push", ["next"], |ctx: &mut Vec<i64>, params: &FlowParams| {
            ctx.push(params.get("step").and_then(serde_json::Value::as_i64).unwrap_or(1));
            Outcome::new("next")
        });

        assert_eq!(Node::<Vec<i64>>::name(&stage), "push");
        assert_eq!(Node::<Vec<i64>>::outcomes(&stage), &[Outcome::new("next")]);

        let mut ctx: Vec<i64> = Vec::new();
        let params = FlowParams::new().with("step", serde_json::json!(7));
        assert_eq!(stage.invoke(&mut ctx, &params), "next");
        assert_eq!(ctx, vec![7]);
    }
}
