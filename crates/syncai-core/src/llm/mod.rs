mod openai;
mod perplexity;
mod traits;

pub use openai::{OpenAiChat, UTILITY_MODEL};
pub use perplexity::{PerplexityResearch, RESEARCH_MODEL};
pub use traits::{ChatClient, ChatMessage, ResearchClient, Role};
