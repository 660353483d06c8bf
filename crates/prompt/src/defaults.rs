//! Built-in prompt definitions.
//!
//! Used when the workspace does not override them under `.korqa/prompts/`.

use crate::types::PromptDefinition;
use korqa_core::AppResult;

/// Prompt used to draft an answer from retrieved passages.
pub const QA_ANSWER_PROMPT_ID: &str = "qa.answer";

const QA_ANSWER_YAML: &str = r#"
id: qa.answer
title: "Document-grounded answer"
apiVersion: "1.0"
behavior:
  temperature: 0.1
  maxTokens: 256
system: |
  당신은 제공된 위키피디아 문서만을 근거로 답하는 한국어 질의응답 도우미입니다.
  - 문서에 있는 내용만 사용하고 추측하지 마세요.
  - 답은 한 문장으로 짧고 정확하게 작성하세요.
  - 문서에서 답을 찾을 수 없으면 "제공된 문서에서 해당 정보를 찾을 수 없습니다."라고 답하세요.
template: |
  다음 문서를 참고하여 질문에 답하세요.

  {{context}}

  질문: {{question}}
  답변:
output:
  format: text
"#;

/// Look up a built-in prompt by id.
pub fn builtin(prompt_id: &str) -> AppResult<Option<PromptDefinition>> {
    match prompt_id {
        QA_ANSWER_PROMPT_ID => Ok(Some(serde_yaml::from_str(QA_ANSWER_YAML)?)),
        _ => Ok(None),
    }
}
