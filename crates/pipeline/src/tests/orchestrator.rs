use super::*;
use crate::batch::{completed_questions, read_jsonl, run_batch, BatchRecord};
use crate::orchestrator::Orchestrator;
use crate::strategies::{all_strategies, StrategyKind};
use tempfile::TempDir;

const QUESTION: &str = "What are the forced heirship rules in Italy?";

fn orchestrator(fixture: &Fixture, generator: Arc<ScriptedGenerator>, parallel: bool) -> Orchestrator {
    Orchestrator::new(all_strategies(&fixture.deps(generator)), parallel)
}

/// Fails every decomposition prompt, answers the rest.
fn decomposition_down(prompt: &str) -> AppResult<String> {
    if prompt.contains("breaks an input question") {
        Err(AppError::Llm("model crashed".to_string()))
    } else {
        legal_model(prompt)
    }
}

#[tokio::test]
async fn test_end_to_end_forced_heirship() {
    for parallel in [false, true] {
        let fixture = Fixture::legal();
        let generator = ScriptedGenerator::new(legal_model);
        let orchestrator = orchestrator(&fixture, generator, parallel);

        assert_eq!(
            fixture.router.classify(QUESTION).await.unwrap(),
            Domain::Inheritance
        );

        let results = orchestrator.run_all(QUESTION).await;
        assert_eq!(results.question, QUESTION);
        assert_eq!(results.results.len(), 3);
        assert_eq!(results.failures(), 0);

        for kind in StrategyKind::ALL {
            let result = results.get(kind).unwrap();
            assert_eq!(result.strategy, kind);
            assert!(!result.answer.is_empty(), "{} answered nothing", kind);
            assert!(result.is_success());
        }

        // Every query in this scenario belongs to the inheritance index
        assert_eq!(fixture.divorce.calls(), 0);
        assert_eq!(fixture.inheritance.calls(), 5 + 3 + 2);
    }
}

#[tokio::test]
async fn test_failure_is_isolated() {
    for parallel in [false, true] {
        let fixture = Fixture::legal();
        let generator = ScriptedGenerator::new(decomposition_down);
        let results = orchestrator(&fixture, generator, parallel)
            .run_all(QUESTION)
            .await;

        let failed = results.get(StrategyKind::Decomposition).unwrap();
        assert!(failed.answer.is_empty());
        assert!(failed.error.as_deref().unwrap().contains("model crashed"));

        assert!(results.get(StrategyKind::MultiQuery).unwrap().is_success());
        assert!(results.get(StrategyKind::StepBack).unwrap().is_success());
        assert_eq!(results.failures(), 1);
    }
}

#[tokio::test]
async fn test_run_selected() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(legal_model);
    let orchestrator = orchestrator(&fixture, generator.clone(), false);

    let results = orchestrator
        .run_selected(QUESTION, &[StrategyKind::StepBack])
        .await;

    assert_eq!(results.results.len(), 1);
    assert!(results.get(StrategyKind::StepBack).is_some());
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_batch_persists_rows_with_failures_and_resumes() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("questions.jsonl");
    let output = temp.path().join("evaluation/qa.jsonl");
    std::fs::write(
        &input,
        format!(
            "{{\"question\": \"{}\"}}\n{{\"question\": \"How is alimony decided after divorce?\"}}\n",
            QUESTION
        ),
    )
    .unwrap();

    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(decomposition_down);
    let orchestrator = orchestrator(&fixture, generator, false);

    let summary = run_batch(&orchestrator, &input, &output).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.strategy_failures, 2);

    let rows: Vec<BatchRecord> = read_jsonl(&output).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].question, QUESTION);
    for row in &rows {
        assert!(!row.multiquery_answer.is_empty());
        assert!(!row.stepback_answer.is_empty());
        assert!(row.decomposition_answer.is_empty());
        assert!(row.decomposition_error.is_some());
        assert!(row.multiquery_time >= 0.0);
    }

    // A second run finds everything done
    let summary = run_batch(&orchestrator, &input, &output).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(completed_questions(&output).unwrap().len(), 2);
    assert_eq!(read_jsonl::<BatchRecord>(&output).unwrap().len(), 2);
}
