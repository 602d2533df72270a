//! Batch driver: questions in, one result row per question out (JSON Lines).
//!
//! Rows are appended and flushed after each question, so an interrupted run
//! resumes by skipping questions already present in the output file.

use crate::orchestrator::{Orchestrator, QuestionResults};
use crate::strategies::StrategyKind;
use lexrag_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{info, info_span, warn, Instrument};

/// Input record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchQuestion {
    pub question: String,
}

/// Output row for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub question: String,

    pub multiquery_answer: String,
    /// Seconds
    pub multiquery_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiquery_error: Option<String>,

    pub decomposition_answer: String,
    pub decomposition_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposition_error: Option<String>,

    pub stepback_answer: String,
    pub stepback_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepback_error: Option<String>,
}

impl BatchRecord {
    /// Answer column for `kind`.
    pub fn answer(&self, kind: StrategyKind) -> &str {
        match kind {
            StrategyKind::MultiQuery => &self.multiquery_answer,
            StrategyKind::Decomposition => &self.decomposition_answer,
            StrategyKind::StepBack => &self.stepback_answer,
        }
    }

    /// Error column for `kind`.
    pub fn error(&self, kind: StrategyKind) -> Option<&str> {
        match kind {
            StrategyKind::MultiQuery => self.multiquery_error.as_deref(),
            StrategyKind::Decomposition => self.decomposition_error.as_deref(),
            StrategyKind::StepBack => self.stepback_error.as_deref(),
        }
    }
}

impl From<&QuestionResults> for BatchRecord {
    fn from(results: &QuestionResults) -> Self {
        let mut record = BatchRecord {
            question: results.question.clone(),
            ..Default::default()
        };

        for result in results.results.values() {
            let answer = result.answer.clone();
            let time = result.latency.as_secs_f64();
            let error = result.error.clone();

            match result.strategy {
                StrategyKind::MultiQuery => {
                    record.multiquery_answer = answer;
                    record.multiquery_time = time;
                    record.multiquery_error = error;
                }
                StrategyKind::Decomposition => {
                    record.decomposition_answer = answer;
                    record.decomposition_time = time;
                    record.decomposition_error = error;
                }
                StrategyKind::StepBack => {
                    record.stepback_answer = answer;
                    record.stepback_time = time;
                    record.stepback_error = error;
                }
            }
        }

        record
    }
}

/// Counts from a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Questions in the input
    pub total: usize,

    /// Questions already answered in the output
    pub skipped: usize,

    /// Questions answered by this run
    pub processed: usize,

    /// Strategy failures across processed questions
    pub strategy_failures: usize,
}

/// Read every record of a JSON Lines file, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let file = File::open(path)
        .map_err(|e| AppError::Config(format!("Failed to open {:?}: {}", path, e)))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            AppError::Serialization(format!("{:?} line {}: {}", path, index + 1, e))
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Questions already present in an output file.
///
/// A truncated trailing row from an interrupted run is ignored.
pub fn completed_questions(output: &Path) -> AppResult<HashSet<String>> {
    if !output.exists() {
        return Ok(HashSet::new());
    }

    let file = File::open(output)?;
    let mut done = HashSet::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<BatchRecord>(&line) {
            Ok(record) => {
                done.insert(record.question);
            }
            Err(e) => warn!("Ignoring unreadable row {} in {:?}: {}", index + 1, output, e),
        }
    }

    Ok(done)
}

/// Appends rows to a JSON Lines file, flushing after each.
pub struct BatchWriter {
    file: File,
}

impl BatchWriter {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        // Terminate a row cut short by an interrupted run
        if ends_mid_line(&mut file)? {
            file.write_all(b"\n")?;
        }

        Ok(Self { file })
    }

    pub fn append<T: Serialize>(&mut self, row: &T) -> AppResult<()> {
        let mut line = serde_json::to_string(row)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

fn ends_mid_line(file: &mut File) -> AppResult<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Run every strategy on each question in `input`, appending rows to `output`.
///
/// Questions already in `output` are skipped. Strategy failures are recorded
/// in the row and never stop the batch; only I/O errors do.
pub async fn run_batch(
    orchestrator: &Orchestrator,
    input: &Path,
    output: &Path,
) -> AppResult<BatchSummary> {
    let questions: Vec<BatchQuestion> = read_jsonl(input)?;
    let done = completed_questions(output)?;
    let mut writer = BatchWriter::open(output)?;

    let mut summary = BatchSummary {
        total: questions.len(),
        ..Default::default()
    };

    for (index, entry) in questions.iter().enumerate() {
        if done.contains(&entry.question) {
            summary.skipped += 1;
            continue;
        }

        let span = info_span!("question", index = index + 1, total = questions.len());
        let results = async {
            info!(question = %entry.question, "Processing question");
            orchestrator.run_all(&entry.question).await
        }
        .instrument(span)
        .await;

        summary.strategy_failures += results.failures();
        writer.append(&BatchRecord::from(&results))?;
        summary.processed += 1;
    }

    info!(
        total = summary.total,
        processed = summary.processed,
        skipped = summary.skipped,
        failures = summary.strategy_failures,
        "Batch finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::StrategyResult;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_record_from_results() {
        let mut results = BTreeMap::new();
        results.insert(
            StrategyKind::MultiQuery,
            StrategyResult {
                strategy: StrategyKind::MultiQuery,
                answer: "mq".to_string(),
                latency: Duration::from_millis(1500),
                error: None,
            },
        );
        results.insert(
            StrategyKind::Decomposition,
            StrategyResult {
                strategy: StrategyKind::Decomposition,
                answer: String::new(),
                latency: Duration::from_millis(10),
                error: Some("LLM error: down".to_string()),
            },
        );

        let record = BatchRecord::from(&QuestionResults {
            question: "q".to_string(),
            results,
        });

        assert_eq!(record.answer(StrategyKind::MultiQuery), "mq");
        assert!((record.multiquery_time - 1.5).abs() < 1e-9);
        assert_eq!(record.error(StrategyKind::Decomposition), Some("LLM error: down"));
        assert_eq!(record.answer(StrategyKind::StepBack), "");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("multiquery_error").is_none());
        assert_eq!(json["decomposition_error"], "LLM error: down");
        assert_eq!(json["stepback_time"], 0.0);
    }

    #[test]
    fn test_writer_appends_and_completed_questions_tolerates_truncation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/qa.jsonl");

        let mut writer = BatchWriter::open(&path).unwrap();
        writer
            .append(&BatchRecord {
                question: "first".to_string(),
                ..Default::default()
            })
            .unwrap();
        drop(writer);

        let mut writer = BatchWriter::open(&path).unwrap();
        writer
            .append(&BatchRecord {
                question: "second".to_string(),
                ..Default::default()
            })
            .unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"question\": \"thi").unwrap();

        let done = completed_questions(&path).unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.contains("first") && done.contains("second"));

        let mut writer = BatchWriter::open(&path).unwrap();
        writer
            .append(&BatchRecord {
                question: "third".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(completed_questions(&path).unwrap().contains("third"));
    }

    #[test]
    fn test_read_jsonl_reports_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("in.jsonl");
        std::fs::write(&path, "{\"question\": \"a\"}\n\n{oops}\n").unwrap();

        let err = read_jsonl::<BatchQuestion>(&path).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_output_means_nothing_done() {
        let temp = TempDir::new().unwrap();
        assert!(completed_questions(&temp.path().join("none.jsonl"))
            .unwrap()
            .is_empty());
    }
}
