//! Context block assembly from retrieved snippets

use ragrade_core::VectorDocument;

/// Context sent to the model when retrieval found nothing
pub const NO_CONTEXT_MARKER: &str = "ไม่พบข้อมูลที่เกี่ยวข้อง";

/// Join retrieved snippets into one numbered context block
///
/// Sections are numbered from 1 in retrieval order.
pub fn format_context(documents: &[VectorDocument]) -> String {
    if documents.is_empty() {
        return NO_CONTEXT_MARKER.to_string();
    }

    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[เอกสาร {}]\n{}\n", i + 1, doc.content))
        .collect::<Vec<_>>()
        .join("\n")
}
