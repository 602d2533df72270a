//! Evidence merging and formatting.

use lexrag_retrieval::Document;
use std::collections::HashSet;

/// Document contents joined by a blank line, in the given order.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Unique union of `documents`, keeping first-occurrence order.
pub fn unique_union<I>(documents: I) -> Vec<Document>
where
    I: IntoIterator<Item = Document>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for doc in documents {
        if seen.insert(doc.clone()) {
            unique.push(doc);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_documents() {
        let docs = vec![Document::new("Art. 536"), Document::new("Art. 537")];
        assert_eq!(format_documents(&docs), "Art. 536\n\nArt. 537");
        assert_eq!(format_documents(&[]), "");
    }

    #[test]
    fn test_unique_union_first_occurrence_order() {
        let a = Document::new("a");
        let b = Document::new("b");
        let a_other = Document::new("a").with_metadata("article", "2");

        let merged = unique_union(vec![
            b.clone(),
            a.clone(),
            b.clone(),
            a_other.clone(),
            a.clone(),
        ]);
        assert_eq!(merged, vec![b, a, a_other]);
    }
}
