//! Integration tests for flow execution.

#[cfg(test)]
mod tests {
    use crate::core::{Outcome, StageFailure, StageResult};
    use crate::pipeline::{FlowBuilder, FlowParams, Termination};
    use crate::stages::Stage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Ledger {
        entries: Vec<i64>,
        error: Option<String>,
        report: Option<String>,
    }

    const READ_OUTCOMES: &[Outcome] = &[Outcome::new("sum"), Outcome::ERROR];
    const SUM_OUTCOMES: &[Outcome] = &[Outcome::new("report"), Outcome::ERROR];
    const REPORT_OUTCOMES: &[Outcome] = &[Outcome::DONE];

    #[derive(Debug)]
    struct ReadStage;

    impl Stage<Ledger> for ReadStage {
        type Input = Option<String>;
        type Output = Vec<i64>;

        fn name(&self) -> &str {
            "read"
        }

        fn outcomes(&self) -> &[Outcome] {
            READ_OUTCOMES
        }

        fn prepare(&self, _ctx: &Ledger, params: &FlowParams) -> Self::Input {
            params.get_str("data").map(str::to_string)
        }

        fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
            let raw = input
                .as_deref()
                .ok_or_else(|| StageFailure::missing_input("read", "data"))?;
            raw.split(',')
                .map(|part| {
                    part.trim()
                        .parse::<i64>()
                        .map_err(|e| StageFailure::new("read", e.to_string()))
                })
                .collect()
        }

        fn finalize(
            &self,
            ctx: &mut Ledger,
            _input: Self::Input,
            output: StageResult<Self::Output>,
        ) -> Outcome {
            match output {
                Ok(entries) => {
                    ctx.entries = entries;
                    Outcome::new("sum")
                }
                Err(failure) => {
                    ctx.error = Some(failure.message);
                    Outcome::ERROR
                }
            }
        }
    }

    #[derive(Debug)]
    struct SumStage {
        calls: Arc<AtomicUsize>,
    }

    impl Stage<Ledger> for SumStage {
        type Input = Vec<i64>;
        type Output = i64;

        fn name(&self) -> &str {
            "sum"
        }

        fn outcomes(&self) -> &[Outcome] {
            SUM_OUTCOMES
        }

        fn prepare(&self, ctx: &Ledger, _params: &FlowParams) -> Self::Input {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.entries.clone()
        }

        fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
            input
                .iter()
                .try_fold(0_i64, |acc, v| acc.checked_add(*v))
                .ok_or_else(|| StageFailure::new("sum", "overflow"))
        }

        fn finalize(
            &self,
            ctx: &mut Ledger,
            _input: Self::Input,
            output: StageResult<Self::Output>,
        ) -> Outcome {
            match output {
                Ok(total) => {
                    ctx.report = Some(format!("total={total}"));
                    Outcome::new("report")
                }
                Err(failure) => {
                    ctx.error = Some(failure.message);
                    Outcome::ERROR
                }
            }
        }
    }

    #[derive(Debug)]
    struct ReportStage;

    impl Stage<Ledger> for ReportStage {
        type Input = (Option<String>, Option<String>);
        type Output = String;

        fn name(&self) -> &str {
            "report"
        }

        fn outcomes(&self) -> &[Outcome] {
            REPORT_OUTCOMES
        }

        fn prepare(&self, ctx: &Ledger, _params: &FlowParams) -> Self::Input {
            (ctx.error.clone(), ctx.report.clone())
        }

        fn compute(&self, input: &Self::Input) -> StageResult<Self::Output> {
            Ok(match input {
                (Some(error), _) => format!("error: {error}"),
                (None, Some(report)) => report.clone(),
                (None, None) => "empty".to_string(),
            })
        }

        fn finalize(
            &self,
            ctx: &mut Ledger,
            _input: Self::Input,
            output: StageResult<Self::Output>,
        ) -> Outcome {
            ctx.report = output.ok();
            ctx.error = None;
            Outcome::DONE
        }
    }

    fn ledger_flow(calls: Arc<AtomicUsize>) -> crate::pipeline::FlowGraph<Ledger> {
        FlowBuilder::new("ledger")
            .stage(ReadStage)
            .stage(SumStage { calls })
            .stage(ReportStage)
            .entry("read")
            .edge("read", "sum", "sum")
            .edge("read", Outcome::ERROR, "report")
            .edge("sum", "report", "report")
            .edge("sum", Outcome::ERROR, "report")
            .terminal("report", Outcome::DONE)
            .acyclic()
            .build()
            .unwrap()
    }

    #[test]
    fn test_happy_path_visits_every_stage() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flow = ledger_flow(calls.clone());

        let mut ctx = Ledger::default();
        let params = FlowParams::new().with("data", serde_json::json!("1, 2, 3"));
        let trace = flow.run(&mut ctx, &params);

        assert_eq!(trace.visited(), vec!["read", "sum", "report"]);
        assert_eq!(trace.termination, Termination::Completed);
        assert_eq!(ctx.report.as_deref(), Some("total=6"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_is_routed_not_raised() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flow = ledger_flow(calls.clone());

        let mut ctx = Ledger::default();
        let params = FlowParams::new().with("data", serde_json::json!("1, two"));
        let trace = flow.run(&mut ctx, &params);

        assert_eq!(trace.visited(), vec!["read", "report"]);
        assert_eq!(trace.steps[0].outcome, Outcome::ERROR);
        assert!(ctx.report.as_deref().unwrap().starts_with("error: "));
        assert!(ctx.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_param_becomes_error_outcome() {
        let flow = ledger_flow(Arc::new(AtomicUsize::new(0)));

        let mut ctx = Ledger::default();
        let trace = flow.run(&mut ctx, &FlowParams::new());

        assert_eq!(trace.visited(), vec!["read", "report"]);
        assert_eq!(
            ctx.report.as_deref(),
            Some("error: missing pipeline input: data")
        );
    }

    #[test]
    fn test_compute_failure_in_middle_stage() {
        let flow = ledger_flow(Arc::new(AtomicUsize::new(0)));

        let mut ctx = Ledger::default();
        let data = format!("{}, 1", i64::MAX);
        let params = FlowParams::new().with("data", serde_json::json!(data));
        let trace = flow.run(&mut ctx, &params);

        assert_eq!(trace.visited(), vec!["read", "sum", "report"]);
        assert_eq!(ctx.report.as_deref(), Some("error: overflow"));
    }

    #[test]
    fn test_shared_graph_runs_concurrently() {
        let flow = Arc::new(ledger_flow(Arc::new(AtomicUsize::new(0))));

        let handles: Vec<_> = (1..=4_i64)
            .map(|n| {
                let flow = Arc::clone(&flow);
                std::thread::spawn(move || {
                    let mut ctx = Ledger::default();
                    let params = FlowParams::new().with("data", serde_json::json!(format!("{n}, {n}")));
                    flow.run(&mut ctx, &params);
                    ctx.report
                })
            })
            .collect();

        let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            reports,
            vec![
                Some("total=2".to_string()),
                Some("total=4".to_string()),
                Some("total=6".to_string()),
                Some("total=8".to_string()),
            ]
        );
    }
}
