//! Built-in prompt templates.
//!
//! Every template can be replaced per workspace by dropping a YAML file with
//! the same id into `.lexrag/prompts/`.

use crate::types::PromptDefinition;

/// Identifiers of the built-in prompts.
pub mod ids {
    pub const ROUTING: &str = "routing.classify";
    pub const MULTIQUERY: &str = "multiquery.perspectives";
    pub const RAG_ANSWER: &str = "rag.answer";
    pub const DECOMPOSITION: &str = "decomposition.subquestions";
    pub const DECOMPOSITION_ANSWER: &str = "decomposition.answer";
    pub const DECOMPOSITION_SYNTHESIS: &str = "decomposition.synthesis";
    pub const STEPBACK: &str = "stepback.generalize";
    pub const STEPBACK_ANSWER: &str = "stepback.answer";
    pub const JUDGE_FORWARD: &str = "eval.judge.forward";
    pub const JUDGE_REVERSE: &str = "eval.judge.reverse";
}

const ROUTING_TEMPLATE: &str = "\
You are a classifier that decides which area of Italian law a legal question belongs to.
Answer with JUST one of the following category labels and nothing else:
{{categories}}
Question: {{question}}
Category:";

const MULTIQUERY_TEMPLATE: &str = "\
You are an AI language model assistant. Your task is to write {{count}} different versions \
of the user question below, to retrieve relevant documents from a vector database. \
Looking at the question from several perspectives helps overcome the limits of \
distance-based similarity search.
Write one alternative question per line, with no numbering and no extra text.
Original question: {{question}}";

const RAG_ANSWER_TEMPLATE: &str = "\
Answer the following question using this context (do not say \"based on the context provided\"):

{{context}}

Question: {{question}}
";

const DECOMPOSITION_TEMPLATE: &str = "\
You are a helpful assistant that breaks an input question into sub-questions.
Each sub-question must be answerable on its own; together they should cover the input question.
Write {{count}} search queries related to: {{question}}
One query per line, with no numbering and no extra text.
Output ({{count}} queries):";

const DECOMPOSITION_ANSWER_TEMPLATE: &str = "\
Answer the question below using the retrieved context (do not say \"based on the context provided\").
{{#if history}}
Questions already answered, for background:

{{history}}
{{/if}}
Retrieved context:

{{context}}

Question: {{question}}
";

const DECOMPOSITION_SYNTHESIS_TEMPLATE: &str = "\
Here is a set of question and answer pairs:

{{history}}

Use them to write a complete answer to the question: {{question}}
";

const STEPBACK_TEMPLATE: &str = "\
You are an expert in Italian law. Your task is to step back and rephrase a legal question \
into a more generic form that is easier to answer. Reply with the rephrased question only.
Examples:
Input: What are the rules for inheritance in Italy?
Output: What are the general principles of Italian inheritance law?

Input: How does divorce work in Italy?
Output: What are the main aspects of Italian divorce law?

Input: Can a spouse be excluded from a will in Italy?
Output: How does Italian law protect family members in succession?

Now step back the following question:
{{question}}";

const STEPBACK_ANSWER_TEMPLATE: &str = "\
You are an expert in Italian law. Your answer must be comprehensive and consistent with the \
following contexts where they are relevant.

# Normal Context:
{{normal_context}}

# Step-Back Context:
{{step_back_context}}

Original Question: {{question}}
Answer (do not say \"based on the context provided\"):";

const JUDGE_FORWARD_TEMPLATE: &str = "\
You rate how well a User Answer matches a Reference Answer for a Question.
The Reference Answer fully answers the Question.
Reply 4 if the User Answer is fully contained in and equivalent to the Reference Answer in all terms, topics, numbers, dates and units.
Reply 2 if the User Answer is only partially contained and equivalent to the Reference Answer.
Reply 0 if the User Answer is not contained in the Reference Answer, is inaccurate, or does not answer the Question.
Reply with the number only: 0, 2 or 4.

Question: {{question}}
User Answer: {{response}}
Reference Answer: {{reference}}
Rating:";

const JUDGE_REVERSE_TEMPLATE: &str = "\
You rate how well a Reference Answer is supported by a User Answer for a Question.
Reply 4 if the Reference Answer is fully contained in and equivalent to the User Answer in all terms, topics, numbers, dates and units.
Reply 2 if the Reference Answer is only partially contained in the User Answer.
Reply 0 if the Reference Answer is not contained in the User Answer at all.
Reply with the number only: 0, 2 or 4.

Question: {{question}}
Reference Answer: {{reference}}
User Answer: {{response}}
Rating:";

/// All built-in prompt definitions.
pub fn definitions() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition::new(
            ids::ROUTING,
            "Route a question to a legal domain",
            &["question", "categories"],
            ROUTING_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::MULTIQUERY,
            "Alternative phrasings of a question",
            &["question", "count"],
            MULTIQUERY_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::RAG_ANSWER,
            "Answer from retrieved context",
            &["context", "question"],
            RAG_ANSWER_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::DECOMPOSITION,
            "Split a question into sub-questions",
            &["question", "count"],
            DECOMPOSITION_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::DECOMPOSITION_ANSWER,
            "Answer a sub-question with prior answers as background",
            &["context", "question", "history"],
            DECOMPOSITION_ANSWER_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::DECOMPOSITION_SYNTHESIS,
            "Synthesize an answer from sub-question answers",
            &["history", "question"],
            DECOMPOSITION_SYNTHESIS_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::STEPBACK,
            "Generalize a question",
            &["question"],
            STEPBACK_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::STEPBACK_ANSWER,
            "Answer from specific and general context",
            &["normal_context", "step_back_context", "question"],
            STEPBACK_ANSWER_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::JUDGE_FORWARD,
            "Rate an answer against a reference",
            &["question", "response", "reference"],
            JUDGE_FORWARD_TEMPLATE,
        ),
        PromptDefinition::new(
            ids::JUDGE_REVERSE,
            "Rate a reference against an answer",
            &["question", "response", "reference"],
            JUDGE_REVERSE_TEMPLATE,
        ),
    ]
}
