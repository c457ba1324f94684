//! Fixed single-shot prompt templates. Each is one placeholder substitution;
//! the classification prompt constrains output to two literal tokens.

pub const UNIVERSAL_TOKEN: &str = "UNIVERSAL";
pub const TIME_SENSITIVE_TOKEN: &str = "TIME_SENSITIVE";

pub fn classify(question: &str) -> String {
    format!(
        "Classify the following question as either UNIVERSAL (stable, timeless \
         knowledge) or TIME_SENSITIVE (requires current information such as \
         versions, pricing, documentation, or library specifics). Reply with \
         exactly one of the strings \"UNIVERSAL\" or \"TIME_SENSITIVE\" and \
         nothing else.\n\nQuestion: {question}"
    )
}

pub fn integrate(chat_answer: &str, research_answer: &str) -> String {
    format!(
        "Merge the following two answers into a single response that is more \
         accurate and comprehensive than either alone.\n\
         Generated answer: {chat_answer}\n\
         Research answer: {research_answer}"
    )
}

pub fn check_items(question: &str) -> String {
    format!(
        "For the following question, list up to 3 concrete items that should \
         be verified against current information (versions, pricing, recent \
         constraints, and so on).\n\nQuestion: {question}"
    )
}

pub fn title(question: &str) -> String {
    format!("Generate a short title, a few words at most, summarizing this question:\n{question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_embeds_question_and_both_tokens() {
        let p = classify("is water wet?");
        assert!(p.contains("is water wet?"));
        assert!(p.contains(UNIVERSAL_TOKEN));
        assert!(p.contains(TIME_SENSITIVE_TOKEN));
    }

    #[test]
    fn integrate_embeds_both_answers_verbatim() {
        let p = integrate("answer one", "answer two");
        assert!(p.contains("answer one"));
        assert!(p.contains("answer two"));
    }
}
