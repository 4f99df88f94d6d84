use crate::index::SearchHit;
use crate::llm::ChatMessage;
use crate::session::{ConversationTurn, Role};

/// Composes the grounded prompt: one system message carrying the retrieved
/// passages tagged with their source links, prior turns verbatim in order,
/// then the new question.
pub fn compose_messages(
    company: &str,
    history: &[ConversationTurn],
    hits: &[SearchHit],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt(company, hits)));

    for turn in history {
        messages.push(match turn.role {
            Role::User => ChatMessage::user(turn.text.clone()),
            Role::Assistant => ChatMessage::assistant(turn.text.clone()),
        });
    }

    messages.push(ChatMessage::user(question.to_string()));
    messages
}

fn system_prompt(company: &str, hits: &[SearchHit]) -> String {
    let mut prompt = format!(
        "You are a financial analyst answering questions about {company}. \
         Ground every answer in the news excerpts below and mention which \
         sources you relied on. If the excerpts do not cover the question, \
         say so instead of guessing.\n\n"
    );

    if hits.is_empty() {
        prompt.push_str("No news excerpts are available for this question.");
        return prompt;
    }

    prompt.push_str("News excerpts:\n\n");
    for hit in hits {
        prompt.push_str(&format!(
            "[source: {}]\n{}\n\n",
            hit.passage.source, hit.passage.text
        ));
    }
    prompt.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::Passage;
    use url::Url;

    fn hit(text: &str, link: &str) -> SearchHit {
        SearchHit {
            passage: Passage {
                text: text.to_string(),
                source: Url::parse(link).unwrap(),
            },
            score: 0.9,
        }
    }

    #[test]
    fn grounding_history_and_question_in_order() {
        let history = vec![
            ConversationTurn {
                role: Role::User,
                text: "earlier question".to_string(),
                sources: Vec::new(),
            },
            ConversationTurn {
                role: Role::Assistant,
                text: "earlier answer".to_string(),
                sources: Vec::new(),
            },
        ];
        let hits = vec![hit("Revenue grew 12%.", "https://news.example.com/rev")];

        let messages = compose_messages("Sample Corp", &history, &hits, "What changed?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Sample Corp"));
        assert!(messages[0]
            .content
            .contains("[source: https://news.example.com/rev]"));
        assert!(messages[0].content.contains("Revenue grew 12%."));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[2].content, "earlier answer");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "What changed?");
    }

    #[test]
    fn empty_grounding_is_stated_explicitly() {
        let messages = compose_messages("Sample Corp", &[], &[], "Anything?");
        assert!(messages[0].content.contains("No news excerpts are available"));
    }
}
