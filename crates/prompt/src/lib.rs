//! Prompt system for KorQA.
//!
//! - YAML prompt definitions (`.korqa/prompts/<id>.yml`)
//! - Built-in defaults for prompts the pipeline depends on
//! - Handlebars rendering of system and user messages

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::QA_ANSWER_PROMPT_ID;
pub use loader::{list_prompts, load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
