//! Prompt builders for the three model calls a turn can make.

use medassist_core::conversation::Turn;
use medassist_core::dialogue::ClassificationInput;

/// Turns shown to the model on the follow-up branch.
pub const FOLLOWUP_WINDOW: usize = 3;

/// Turns shown to the classifier.
pub const CLASSIFIER_WINDOW: usize = 2;

const NO_PREVIOUS_MESSAGE: &str = "No previous message";
const NO_PREVIOUS_TOPIC: &str = "None";

const ASSISTANT_RULES: &str = "\
You are the medical assistant of a chatbot that helps users understand their medical reports, \
medical images and prescriptions. Answer only from the uploaded documents (reports, images, \
prescriptions) provided in the context; never rely on internal knowledge.

Key rules:
1. Using the user's data:
    - If a medical report summary is in the context, use it for questions about diagnostics and observations.
    - If medical imaging predictions exist (X-ray, MRI, lung CT), reference the model's findings for related questions.
    - If prescription data was processed, use the medicine details (side effects, alternatives, precautions) \
and the buying links, prices and quantities for questions about medicines. Prices are in Rs.
    - If the user asks about data that was never uploaded (e.g. \"What does my X-ray show?\" with no image), \
reply: \"I don't have your X-ray data. Could you upload it for analysis?\"
2. Resolving queries:
    - Answer strictly from the retrieved context.
    - If the query is ambiguous, ask for clarification.
    - Suggest 2-3 specific follow-up questions tied to the user's data.
3. Conversation flow:
    - Review previous messages to detect follow-up questions.
    - If the user refers to an earlier answer, prioritize the chat history.
4. Tone and formatting:
    - Use emojis to convey reassurance (✅, ⚠️, 💊, 🩺).
    - Structure answers with bold headings, bullet points and clear sections.
    - Avoid medical jargon; explain terms simply.
Edge cases:
    - No data uploaded: \"Please upload a report, image, or prescription for me to assist! 📄\"
    - Unclear query: \"Could you clarify? For example, are you asking about your MRI results or prescription?\"
    - Conflicting data: \"I found conflicting details in your reports. Let me highlight these for you.\"

Look at the previous conversation, the context and the query, and answer accordingly.";

fn render_turns(turns: &[Turn]) -> String {
    turns.iter().map(Turn::render).collect::<Vec<_>>().join("\n")
}

/// Prompt for the retrieval branch: rules, full history, query, fresh context.
pub fn rag_prompt(query: &str, context: &str, history: &[Turn]) -> String {
    let history = if history.is_empty() {
        "(no previous conversation)".to_string()
    } else {
        render_turns(history)
    };

    format!(
        "{ASSISTANT_RULES}\n\n\
         # Previous Conversation:\n{history}\n\n\
         # The user query is:\n{query}\n\n\
         # Context:\n{context}\n\n\
         # Response:\n"
    )
}

/// Prompt for the follow-up branch: last topic, recent turns, query.
pub fn followup_prompt(last_topic: Option<&str>, recent: &[Turn], query: &str) -> String {
    let topic = last_topic.unwrap_or(NO_PREVIOUS_TOPIC);
    let history = render_turns(recent);

    format!(
        "The last topic on which conversation was held was: {topic}.\n\n\
         Previous conversation:\n{history}\n\n\
         Current question: {query}\n\n\
         Please answer the current question in the context of our conversation.\n\
         Be clear and expressive (use emojis) and answer in a conversational tone.\n\
         You may use formatting like bullet points and tables to make the answer more readable.\n"
    )
}

/// Prompt for the follow-up classifier.
pub fn classification_prompt(input: &ClassificationInput<'_>) -> String {
    let topic = input.last_topic.unwrap_or(NO_PREVIOUS_TOPIC);
    let turns = input.last_turns;
    let n = turns.len();
    let older = if n >= 2 { turns[n - 2].content() } else { NO_PREVIOUS_MESSAGE };
    let latest = if n >= 1 { turns[n - 1].content() } else { NO_PREVIOUS_MESSAGE };
    let query = input.query;

    format!(
        "You are part of an AI medical chatbot and determine the intent of user queries.\n\
         The database the chatbot answers from contains:\n\
         \x20   - Medical reports (text) and their summaries\n\
         \x20   - Findings from medical images (MRIs, chest X-rays, lung CTs)\n\
         \x20   - Medicine data for prescribed medicines (side effects, dosage, usage)\n\
         \x20   - Buying links for the medicines\n\n\
         Classify the user query into one of these categories:\n\
         1. Follow-up query: continues the previous conversation and can be answered with the existing context.\n\
         2. New query: not a follow-up, or needs new data fetched.\n\n\
         Analyze the query in the context of the current conversation.\n\n\
         last topic: {topic}\n\n\
         Latest conversation:\n{older}\n{latest}\n\n\
         New query: {query}\n\n\
         Reply with a JSON object with boolean fields \"is_followup\" and \"requires_new_context\".\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<Turn> {
        vec![
            Turn::user("What does my report show?"),
            Turn::assistant("✅ Hemoglobin is normal."),
            Turn::user("And vitamin D?"),
            Turn::assistant("⚠️ Vitamin D is low."),
        ]
    }

    #[test]
    fn rag_prompt_sections_in_order() {
        let prompt = rag_prompt("Is it serious?", "Vitamin D 18 ng/mL", &history());
        let conv = prompt.find("# Previous Conversation:").unwrap();
        let query = prompt.find("# The user query is:").unwrap();
        let ctx = prompt.find("# Context:").unwrap();
        let resp = prompt.find("# Response:").unwrap();
        assert!(conv < query && query < ctx && ctx < resp);
        assert!(prompt.contains("User: What does my report show?"));
        assert!(prompt.contains("Assistant: ⚠️ Vitamin D is low."));
        assert!(prompt.contains("Vitamin D 18 ng/mL"));
    }

    #[test]
    fn rag_prompt_with_empty_history() {
        let prompt = rag_prompt("hi", "ctx", &[]);
        assert!(prompt.contains("(no previous conversation)"));
    }

    #[test]
    fn followup_prompt_uses_topic_and_turns() {
        let turns = history();
        let prompt = followup_prompt(Some("And vitamin D?"), &turns[1..], "Should I take supplements?");
        assert!(prompt.contains("was: And vitamin D?."));
        assert!(prompt.contains("Assistant: ✅ Hemoglobin is normal."));
        assert!(!prompt.contains("What does my report show?"));
        assert!(prompt.contains("Current question: Should I take supplements?"));
    }

    #[test]
    fn classification_prompt_with_two_turns() {
        let turns = history();
        let input = ClassificationInput {
            last_topic: Some("And vitamin D?"),
            last_turns: &turns[2..],
            query: "What dose should I take?",
        };
        let prompt = classification_prompt(&input);
        assert!(prompt.contains("last topic: And vitamin D?"));
        assert!(prompt.contains("And vitamin D?\n⚠️ Vitamin D is low."));
        assert!(prompt.contains("New query: What dose should I take?"));
        assert!(!prompt.contains(NO_PREVIOUS_MESSAGE));
    }

    #[test]
    fn classification_prompt_pads_missing_turns() {
        let turns = vec![Turn::assistant("only one")];
        let input = ClassificationInput { last_topic: None, last_turns: &turns, query: "q" };
        let prompt = classification_prompt(&input);
        assert!(prompt.contains(&format!("{NO_PREVIOUS_MESSAGE}\nonly one")));
        assert!(prompt.contains("last topic: None"));
    }
}
