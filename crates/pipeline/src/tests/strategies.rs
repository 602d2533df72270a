use super::*;
use crate::strategies::{
    DecompositionStrategy, MultiQueryStrategy, StepBackStrategy, Strategy,
};

const QUESTION: &str = "What are the forced heirship rules in Italy?";

#[tokio::test]
async fn test_multiquery_call_budget_and_dedup() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(legal_model);
    let strategy = MultiQueryStrategy::new(fixture.deps(generator.clone()));

    let answer = strategy.run(QUESTION).await.unwrap();
    assert_eq!(answer, "The spouse and children are forced heirs.");

    // Five non-blank paraphrases, one duplicated
    assert_eq!(generator.calls(), 2);
    assert_eq!(fixture.router_generator.calls(), 5);
    assert_eq!(fixture.inheritance.calls(), 5);
    assert_eq!(fixture.divorce.calls(), 0);

    let synthesis = &generator.prompts()[1];
    assert_eq!(synthesis.matches("Art. 536").count(), 1);
    assert_eq!(synthesis.matches("Art. 537").count(), 1);
    assert!(synthesis.contains("Art. 536: forced heirs are the spouse and the children.\n\nArt. 537"));
    assert!(synthesis.contains(&format!("Question: {}", QUESTION)));
}

#[tokio::test]
async fn test_multiquery_routes_each_paraphrase() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(|prompt| {
        if prompt.contains("different versions") {
            Ok("Who inherits the family home?\nDoes divorce affect inheritance rights?\nWhat about alimony?".to_string())
        } else {
            Ok("answer".to_string())
        }
    });
    let strategy = MultiQueryStrategy::new(fixture.deps(generator.clone()));

    strategy.run("Family home after a death").await.unwrap();

    assert_eq!(fixture.inheritance.queries(), vec!["Who inherits the family home?"]);
    let mut divorce_queries = fixture.divorce.queries();
    divorce_queries.sort();
    assert_eq!(
        divorce_queries,
        vec!["Does divorce affect inheritance rights?", "What about alimony?"]
    );

    // Evidence from both domains reaches the synthesis prompt
    let synthesis = generator.prompts().pop().unwrap();
    assert!(synthesis.contains("Art. 536"));
    assert!(synthesis.contains("Law 898/1970"));
}

#[tokio::test]
async fn test_multiquery_empty_expansion_still_synthesizes() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(|prompt| {
        if prompt.contains("different versions") {
            Ok("\n   \n".to_string())
        } else {
            Ok("best effort".to_string())
        }
    });
    let strategy = MultiQueryStrategy::new(fixture.deps(generator.clone()));

    assert_eq!(strategy.run(QUESTION).await.unwrap(), "best effort");
    assert_eq!(generator.calls(), 2);
    assert_eq!(fixture.router_generator.calls(), 0);
    assert_eq!(fixture.inheritance.calls() + fixture.divorce.calls(), 0);
}

#[tokio::test]
async fn test_multiquery_custom_perspectives_in_prompt() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(legal_model);
    let strategy = MultiQueryStrategy::new(fixture.deps(generator.clone())).with_perspectives(3);

    strategy.run(QUESTION).await.unwrap();
    assert!(generator.prompts()[0].contains("write 3 different versions"));
}

#[tokio::test]
async fn test_multiquery_retrieval_failure_propagates() {
    let fixture = Fixture::new(
        StaticRetriever::failing(),
        StaticRetriever::new(vec![]),
        ScriptedGenerator::constant("INHERITANCE"),
        Domain::Inheritance,
    );
    let generator = ScriptedGenerator::new(legal_model);
    let strategy = MultiQueryStrategy::new(fixture.deps(generator.clone()));

    let err = strategy.run(QUESTION).await.unwrap_err();
    assert!(matches!(err, AppError::Retrieval(_)));
    // No synthesis after a failed fan-out
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_decomposition_call_budget_and_history() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(legal_model);
    let strategy = DecompositionStrategy::new(fixture.deps(generator.clone()));

    let answer = strategy.run(QUESTION).await.unwrap();
    assert_eq!(answer, "Spouse and children are forced heirs with reserved shares.");

    assert_eq!(generator.calls(), 2 + 3);
    assert_eq!(fixture.router_generator.calls(), 3);
    assert_eq!(fixture.inheritance.calls() + fixture.divorce.calls(), 3);

    let prompts = generator.prompts();

    // First sub-question sees no history, later ones see every earlier pair
    assert!(!prompts[1].contains("already answered"));
    assert!(prompts[2].contains("Question: Who are the forced heirs in Italy?\nAnswer: Answer to: Who are the forced heirs in Italy?"));
    assert!(prompts[3].contains("Question: What share is reserved to each heir?"));
    assert!(prompts[3].contains("\n---\n"));

    let synthesis = &prompts[4];
    let first = synthesis.find("Who are the forced heirs in Italy?").unwrap();
    let second = synthesis.find("What share is reserved to each heir?").unwrap();
    let third = synthesis.find("Can a will reduce the reserved shares?").unwrap();
    assert!(first < second && second < third);
    assert!(synthesis.contains(QUESTION));
}

#[tokio::test]
async fn test_decomposition_history_is_append_only() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(legal_model);
    let strategy = DecompositionStrategy::new(fixture.deps(generator));

    let sub_questions = vec![
        "Who inherits?".to_string(),
        "Who inherits?".to_string(),
        "How much?".to_string(),
    ];
    let history = strategy.answer_sub_questions(&sub_questions).await.unwrap();

    assert_eq!(history.len(), 3);
    let questions: Vec<_> = history.pairs().iter().map(|p| p.question.clone()).collect();
    assert_eq!(questions, sub_questions);
    assert_eq!(history.pairs()[2].answer, "Answer to: How much?");
}

#[tokio::test]
async fn test_decomposition_generation_failure_propagates() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(|prompt| {
        if prompt.contains("retrieved context") {
            Err(AppError::Timeout {
                operation: "completion".to_string(),
                elapsed: std::time::Duration::from_secs(120),
            })
        } else {
            legal_model(prompt)
        }
    });
    let strategy = DecompositionStrategy::new(fixture.deps(generator.clone()));

    let err = strategy.run(QUESTION).await.unwrap_err();
    assert!(matches!(err, AppError::Timeout { .. }));
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_stepback_call_budget_and_contexts() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(legal_model);
    let strategy = StepBackStrategy::new(fixture.deps(generator.clone()));

    let answer = strategy.run(QUESTION).await.unwrap();
    assert_eq!(answer, "Forced heirs keep their reserved share whatever the will says.");

    assert_eq!(generator.calls(), 2);
    assert_eq!(fixture.router_generator.calls(), 2);
    assert_eq!(fixture.inheritance.calls(), 2);

    let mut queries = fixture.inheritance.queries();
    queries.sort();
    assert_eq!(
        queries,
        vec![
            "What are the forced heirship rules in Italy?",
            "What are the general principles of Italian inheritance law?",
        ]
    );

    let synthesis = &generator.prompts()[1];
    assert!(synthesis.contains("# Normal Context:\nArt. 536"));
    assert!(synthesis.contains("# Step-Back Context:\nArt. 536"));
    assert!(synthesis.contains(&format!("Original Question: {}", QUESTION)));
}

#[tokio::test]
async fn test_stepback_routes_forms_independently() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(|prompt| {
        if prompt.contains("step back and rephrase") {
            Ok("  How does Italian divorce law treat property?\n".to_string())
        } else {
            Ok("answer".to_string())
        }
    });
    let strategy = StepBackStrategy::new(fixture.deps(generator.clone()));

    strategy.run("Who inherits the house?").await.unwrap();

    assert_eq!(fixture.inheritance.queries(), vec!["Who inherits the house?"]);
    assert_eq!(
        fixture.divorce.queries(),
        vec!["How does Italian divorce law treat property?"]
    );

    let synthesis = &generator.prompts()[1];
    assert!(synthesis.contains("# Normal Context:\nArt. 536"));
    assert!(synthesis.contains("# Step-Back Context:\nLaw 898/1970"));
}

#[tokio::test]
async fn test_stepback_empty_generalization_uses_question_only() {
    let fixture = Fixture::legal();
    let generator = ScriptedGenerator::new(|prompt| {
        if prompt.contains("step back and rephrase") {
            Ok("\n".to_string())
        } else {
            Ok("answer".to_string())
        }
    });
    let strategy = StepBackStrategy::new(fixture.deps(generator.clone()));

    assert_eq!(strategy.run(QUESTION).await.unwrap(), "answer");
    assert_eq!(fixture.router_generator.calls(), 1);
    assert_eq!(fixture.inheritance.calls(), 1);
}
