//! Instruction prompt assembly
//!
//! The prompt has four fixed parts in order: the assistant's role, the
//! retrieved school information as bullets, the student's question verbatim,
//! and a numbered list of answering instructions, closed by an `Answer:` cue.

use crate::knowledge::SENTINEL_FACT;

const ROLE_STATEMENT: &str =
    "CONTEXT: You are a helpful school assistant answering a student's question.";

const INSTRUCTIONS: [&str; 4] = [
    "Give a direct answer first (Yes/No/Maybe)",
    "Then explain using the school information",
    "Be friendly and helpful",
    "If you don't know, say so",
];

/// Question plus the fact texts it is grounded on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest<'a> {
    pub question: &'a str,
    pub facts: Vec<&'a str>,
}

impl<'a> PromptRequest<'a> {
    pub fn new<S: AsRef<str>>(question: &'a str, facts: &'a [S]) -> Self {
        Self {
            question,
            facts: facts.iter().map(|fact| fact.as_ref()).collect(),
        }
    }

    /// Render the instruction text
    pub fn render(&self) -> String {
        let facts = if self.facts.is_empty() {
            format!("- {}", SENTINEL_FACT)
        } else {
            self.facts
                .iter()
                .map(|fact| format!("- {}", fact))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let instructions = INSTRUCTIONS
            .iter()
            .enumerate()
            .map(|(i, instruction)| format!("{}. {}", i + 1, instruction))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\nSCHOOL INFORMATION:\n{}\n\nSTUDENT'S QUESTION: {}\n\nINSTRUCTIONS:\n{}\n\nAnswer:",
            ROLE_STATEMENT, facts, self.question, instructions
        )
    }
}

/// Compose the grounded instruction prompt for a question
pub fn compose<S: AsRef<str>>(question: &str, retrieved_facts: &[S]) -> String {
    PromptRequest::new(question, retrieved_facts).render()
}
