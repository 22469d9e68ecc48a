//! Final ordering and context rendering.

use std::cmp::Ordering;

use rag_core::{Document, Result, RetrievalResult};

use crate::aggregate::PendingDocument;

/// Order documents by descending score, then ascending id.
pub fn sort_documents(documents: &mut [Document]) {
    documents.sort_by(compare_documents);
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// Render documents into the context blob handed to the generator.
///
/// Layout per document:
///
/// ```text
/// Document Title: <title>
/// Document Metadata: <metadata as JSON>    (only when non-empty)
/// Chunk: <ordinal + 1>
/// High Relevancy: <score, 2 decimals>      (only for matched chunks)
/// <content>
/// ```
///
/// Each document is followed by a blank line.
pub fn render_context(documents: &[Document]) -> Result<String> {
    let mut context = String::new();

    for document in documents {
        context.push_str(&format!("Document Title: {}\n", document.title));
        if !document.metadata.is_empty() {
            let metadata = serde_json::to_string(&document.metadata)?;
            context.push_str(&format!("Document Metadata: {}\n", metadata));
        }
        for chunk in &document.chunks {
            context.push_str(&format!("Chunk: {}\n", u64::from(chunk.ordinal) + 1));
            if chunk.is_match() {
                context.push_str(&format!("High Relevancy: {:.2}\n", chunk.score));
            }
            context.push_str(&chunk.content);
            context.push('\n');
        }
        context.push_str("\n\n");
    }

    Ok(context)
}

/// Build the final result from the expanded documents.
pub(crate) fn assemble(documents: Vec<PendingDocument>) -> Result<RetrievalResult> {
    let mut documents: Vec<Document> = documents
        .into_iter()
        .map(PendingDocument::into_document)
        .collect();
    sort_documents(&mut documents);

    let context = render_context(&documents)?;
    Ok(RetrievalResult { documents, context })
}
