use crate::classify::QuestionKind;
use crate::error::SyncError;
use crate::llm::{ChatClient, ChatMessage};
use crate::prompts;

pub const NOTICE_RESEARCH_FAILED: &str =
    "Research failed; showing the generated answer only";
pub const NOTICE_GENERATION_FAILED: &str =
    "Answer generation failed; showing the research result instead";

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub final_answer: String,
    pub notices: Vec<String>,
}

/// Fail-soft merge of the two backend outputs.
///
/// | chat    | kind           | research | outcome                           |
/// |---------|----------------|----------|-----------------------------------|
/// | ok      | universal      | skipped  | chat answer                       |
/// | ok      | time-sensitive | ok       | integration call, fallback + note |
/// | ok      | time-sensitive | failed   | chat answer + research notice     |
/// | failed  | time-sensitive | ok       | research answer + generation note |
/// | failed  | any            | failed   | total failure                     |
pub struct Synthesizer;

impl Synthesizer {
    pub async fn merge(
        chat_client: &dyn ChatClient,
        kind: QuestionKind,
        chat_answer: Option<String>,
        research_answer: Option<String>,
    ) -> Result<Synthesis, SyncError> {
        match (chat_answer, research_answer) {
            (Some(chat), Some(research)) => {
                debug_assert_eq!(kind, QuestionKind::TimeSensitive);
                // Integration runs on the selected generation model, not the
                // utility model, so the combined answer matches the quality of
                // the generation it rewrites.
                let prompt = [ChatMessage::user(prompts::integrate(&chat, &research))];
                match chat_client.chat(&prompt).await {
                    Ok(combined) => Ok(Synthesis {
                        final_answer: combined,
                        notices: Vec::new(),
                    }),
                    Err(err) => {
                        tracing::warn!(error = %err, "integration call failed, falling back");
                        Ok(Synthesis {
                            final_answer: chat,
                            notices: vec![NOTICE_RESEARCH_FAILED.to_string()],
                        })
                    }
                }
            }
            (Some(chat), None) => {
                let notices = match kind {
                    QuestionKind::Universal => Vec::new(),
                    QuestionKind::TimeSensitive => vec![NOTICE_RESEARCH_FAILED.to_string()],
                };
                Ok(Synthesis {
                    final_answer: chat,
                    notices,
                })
            }
            (None, Some(research)) => Ok(Synthesis {
                final_answer: research,
                notices: vec![NOTICE_GENERATION_FAILED.to_string()],
            }),
            (None, None) => Err(SyncError::api(
                0,
                "all backends failed; please try again later",
            )),
        }
    }
}
