//! Question/answer history carried through a decomposition run.

use serde::{Deserialize, Serialize};

/// Delimiter between rendered pairs.
const PAIR_DELIMITER: &str = "\n---\n";

/// One answered sub-question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    /// `Question: …\nAnswer: …\n`
    pub fn render(&self) -> String {
        format!("Question: {}\nAnswer: {}\n", self.question, self.answer)
    }
}

/// Append-only sequence of answered sub-questions, in generation order.
#[derive(Debug, Clone, Default)]
pub struct QaHistory {
    pairs: Vec<QaPair>,
}

impl QaHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answered sub-question.
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.pairs.push(QaPair {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    /// Prompt form: rendered pairs joined by `---`, trimmed.
    pub fn render(&self) -> String {
        self.pairs
            .iter()
            .map(QaPair::render)
            .collect::<Vec<_>>()
            .join(PAIR_DELIMITER)
            .trim()
            .to_string()
    }
}
