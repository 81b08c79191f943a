use crate::collect::types::Document;
use crate::session::{Session, Stage};
use crate::summarize::Summary;

/// Split text into pieces of at most `limit` bytes, preferring newline and
/// then space boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= limit {
            chunks.push(remaining);
            break;
        }
        let mut end = limit;
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let split_at = remaining[..end]
            .rfind('\n')
            .or_else(|| remaining[..end].rfind(' '))
            .map(|i| i + 1)
            .unwrap_or(end);
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}

pub fn summaries(summaries: &[Summary]) -> String {
    if summaries.is_empty() {
        return "_No summaries yet._".to_string();
    }
    let mut out = String::new();
    for (i, s) in summaries.iter().enumerate() {
        out.push_str(&format!(
            "**[{}]** <{}>\n{}\n*Style:* {}\n*Themes:* {}\n",
            i + 1,
            s.source_url,
            s.content.concise_summary,
            s.content.writing_style,
            s.content.key_themes.join(", ")
        ));
        for fact in &s.content.interesting_facts {
            out.push_str(&format!("- {}\n", fact));
        }
        out.push('\n');
    }
    out
}

pub fn documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "_No documents yet._".to_string();
    }
    let mut out = String::new();
    for (i, d) in documents.iter().enumerate() {
        out.push_str(&format!(
            "**[{}]** {} ({} KB) `{}`\n  <{}>\n",
            i + 1,
            d.title,
            d.content.len() / 1024,
            &d.id[..d.id.len().min(12)],
            d.url
        ));
    }
    out
}

pub fn stage(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "idle",
        Stage::Summarizing => "summarizing",
        Stage::Summarized => "summarized",
        Stage::Generating => "generating",
        Stage::Generated => "generated",
    }
}

pub fn overview(session: &Session) -> String {
    let topic = if session.topic.is_empty() {
        "_none_"
    } else {
        session.topic.as_str()
    };
    let mut out = format!(
        "**Topic:** {}\n**Stage:** {}\n**Documents:** {} | **Summaries:** {}\n\
         **Questions:** {} | **Answers:** {} | **Content:** {} chars",
        topic,
        stage(session.stage),
        session.documents.len(),
        session.summaries.len(),
        if session.interview_questions.is_empty() { "no" } else { "yes" },
        if session.interview_answers.is_empty() { "no" } else { "yes" },
        session.generated_content.len()
    );
    if let Some(error) = &session.last_error {
        out.push_str(&format!("\n**Last error:** {}", error));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::DocumentSummary;
    use crate::testing::documents as sample_documents;

    #[test]
    fn short_messages_are_untouched() {
        assert_eq!(split_message("hello", 1990), vec!["hello"]);
        assert!(split_message("", 1990).is_empty());
    }

    #[test]
    fn long_messages_split_on_newlines() {
        let text = format!("{}\n{}", "a".repeat(15), "b".repeat(15));
        let chunks = split_message(&text, 20);
        assert_eq!(chunks, vec![format!("{}\n", "a".repeat(15)), "b".repeat(15)]);
    }

    #[test]
    fn unbroken_text_is_hard_split_on_char_boundaries() {
        let text = "é".repeat(15); // 30 bytes
        let chunks = split_message(&text, 7);
        assert!(chunks.iter().all(|c| c.len() <= 7));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn summaries_list_sources_in_order() {
        let docs = sample_documents("Memetics", 2);
        let rendered = summaries(
            &docs
                .iter()
                .map(|d| Summary {
                    document_id: d.id.clone(),
                    source_url: d.url.clone(),
                    content: DocumentSummary {
                        concise_summary: format!("About {}", d.title),
                        writing_style: "plain".to_string(),
                        key_themes: vec!["ideas".to_string()],
                        interesting_facts: vec![],
                    },
                })
                .collect::<Vec<_>>(),
        );
        let first = rendered.find("https://example.com/memetics/0").unwrap();
        let second = rendered.find("https://example.com/memetics/1").unwrap();
        assert!(first < second);
    }

    #[test]
    fn overview_reports_errors() {
        let mut session = Session::default();
        session.last_error = Some("retrieval failed: timeout".to_string());
        let text = overview(&session);
        assert!(text.contains("**Stage:** idle"));
        assert!(text.contains("retrieval failed: timeout"));
    }
}
