//! Question → domain classification and retriever binding.

use crate::parse;
use lexrag_core::{AppError, AppResult, Domain};
use lexrag_llm::TextGenerator;
use lexrag_prompt::{ids, PromptLibrary};
use lexrag_retrieval::{Document, DocumentRetriever, RetrieverTable};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Documents retrieved for one query, with the domain it was routed to.
#[derive(Debug, Clone)]
pub struct Routed {
    pub domain: Domain,
    pub documents: Vec<Document>,
}

/// Routes queries to the retriever of their legal domain.
pub struct Router {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLibrary>,
    table: RetrieverTable,
    default_domain: Domain,
}

impl Router {
    /// Create a router. Every domain must have a retriever bound.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<PromptLibrary>,
        table: RetrieverTable,
        default_domain: Domain,
    ) -> AppResult<Self> {
        table.ensure_complete()?;

        Ok(Self {
            generator,
            prompts,
            table,
            default_domain,
        })
    }

    /// Domain used when the classifier reply names no known domain.
    pub fn default_domain(&self) -> Domain {
        self.default_domain
    }

    /// Classify `question` with one generation call.
    ///
    /// Unrecognized replies fall back to the default domain; only a failed
    /// generation call is an error.
    pub async fn classify(&self, question: &str) -> AppResult<Domain> {
        let categories = Domain::ALL
            .iter()
            .map(|d| format!("{} ({})", d.label(), d.description()))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = self.prompts.render(
            ids::ROUTING,
            &json!({ "question": question, "categories": categories }),
        )?;
        let reply = self.generator.complete(&prompt).await?;

        match parse::parse_domain(&reply) {
            Some(domain) => {
                debug!(%domain, "Routed query");
                Ok(domain)
            }
            None => {
                debug!(
                    reply = %reply.trim(),
                    fallback = %self.default_domain,
                    "Unrecognized classification, using default domain"
                );
                Ok(self.default_domain)
            }
        }
    }

    /// Classify `question` and return the bound retriever.
    pub async fn resolve_retriever(
        &self,
        question: &str,
    ) -> AppResult<(Domain, Arc<dyn DocumentRetriever>)> {
        let domain = self.classify(question).await?;
        let retriever = self.table.get(domain).ok_or_else(|| {
            AppError::Config(format!("No retriever bound for {}", domain))
        })?;
        Ok((domain, retriever))
    }

    /// Route `query` and retrieve its documents.
    pub async fn retrieve(&self, query: &str) -> AppResult<Routed> {
        let (domain, retriever) = self.resolve_retriever(query).await?;
        let documents = retriever.retrieve(query).await?;
        Ok(Routed { domain, documents })
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("table", &self.table)
            .field("default_domain", &self.default_domain)
            .finish()
    }
}
