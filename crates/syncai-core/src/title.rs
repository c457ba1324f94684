use crate::llm::ChatClient;
use crate::prompts;

/// Auto-generated titles are clipped to this many characters.
pub const MAX_TITLE_CHARS: usize = 20;

/// Best-effort short-label generation for a thread's first exchange.
/// Failure leaves the placeholder title in place and never surfaces.
pub struct TitleGenerator;

impl TitleGenerator {
    pub async fn generate(chat: &dyn ChatClient, question: &str) -> Option<String> {
        match chat.complete(&prompts::title(question)).await {
            Ok(raw) => {
                let title: String = raw.trim().chars().take(MAX_TITLE_CHARS).collect();
                if title.is_empty() {
                    None
                } else {
                    Some(title)
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "title generation failed, keeping placeholder");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::llm::ChatMessage;

    struct TitleStub(Result<&'static str, ()>);

    #[async_trait::async_trait]
    impl ChatClient for TitleStub {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, SyncError> {
            unreachable!()
        }

        async fn complete(&self, _prompt: &str) -> Result<String, SyncError> {
            self.0
                .map(str::to_string)
                .map_err(|_| SyncError::api(500, "down"))
        }
    }

    #[tokio::test]
    async fn short_title_passes_through_trimmed() {
        let client = TitleStub(Ok("  Rust lifetimes \n"));
        assert_eq!(
            TitleGenerator::generate(&client, "q").await.as_deref(),
            Some("Rust lifetimes")
        );
    }

    #[tokio::test]
    async fn long_title_is_clipped_to_twenty_chars() {
        let client = TitleStub(Ok("an extremely verbose thread title nobody asked for"));
        let title = TitleGenerator::generate(&client, "q").await.unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[tokio::test]
    async fn failure_yields_none() {
        let client = TitleStub(Err(()));
        assert!(TitleGenerator::generate(&client, "q").await.is_none());
    }

    #[tokio::test]
    async fn clipping_counts_characters_not_bytes() {
        let client = TitleStub(Ok("ライフタイムと借用検査器の詳しい説明タイトル"));
        let title = TitleGenerator::generate(&client, "q").await.unwrap();
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
    }
}
