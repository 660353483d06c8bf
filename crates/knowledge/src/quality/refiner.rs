//! Final answer post-processing.

use serde::Serialize;

use super::types::RefineConfig;
use super::validator::AnswerValidator;

pub const EMPTY_ANSWER_MESSAGE: &str = "답변을 생성할 수 없습니다.";
pub const UNSUPPORTED_ANSWER_MESSAGE: &str = "제공된 문서에서 해당 정보를 찾을 수 없습니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineStatus {
    /// The trimmed answer was returned as is.
    Kept,
    /// The answer was cut down to its first sentence.
    Truncated,
    /// The generator produced nothing usable.
    Empty,
    /// The answer is not backed by the context and was replaced.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinedAnswer {
    pub text: String,
    pub status: RefineStatus,
}

impl RefinedAnswer {
    pub fn is_replaced(&self) -> bool {
        matches!(self.status, RefineStatus::Empty | RefineStatus::Unsupported)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnswerRefiner {
    config: RefineConfig,
}

impl AnswerRefiner {
    pub fn new(config: RefineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    pub fn refine(
        &self,
        answer: &str,
        question: &str,
        context: &str,
        validator: &AnswerValidator,
    ) -> String {
        self.refine_detailed(answer, question, context, validator).text
    }

    /// Trim, truncate overlong answers, then gate on context support.
    ///
    /// The final gate validates with a blank question so that only the
    /// answer/context match counts.
    pub fn refine_detailed(
        &self,
        answer: &str,
        question: &str,
        context: &str,
        validator: &AnswerValidator,
    ) -> RefinedAnswer {
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return RefinedAnswer {
                text: EMPTY_ANSWER_MESSAGE.to_string(),
                status: RefineStatus::Empty,
            };
        }

        let (text, status) = if trimmed.chars().count() > self.config.max_answer_chars {
            (self.first_sentence(trimmed), RefineStatus::Truncated)
        } else {
            (trimmed.to_string(), RefineStatus::Kept)
        };

        let verdict = validator.validate("", &text, context);
        if !verdict.is_valid {
            tracing::debug!(
                question,
                confidence = verdict.confidence,
                reason = %verdict.reason,
                "Answer not supported by context"
            );
            return RefinedAnswer {
                text: UNSUPPORTED_ANSWER_MESSAGE.to_string(),
                status: RefineStatus::Unsupported,
            };
        }

        RefinedAnswer { text, status }
    }

    /// Text up to the first sentence terminator, with that terminator
    /// re-appended.
    ///
    /// Without any terminator the whole text is kept and `.` is appended, so
    /// the result can still exceed `max_answer_chars`.
    pub fn first_sentence(&self, text: &str) -> String {
        let found = text
            .char_indices()
            .find(|(_, c)| self.config.sentence_terminators.contains(c));

        match found {
            Some((idx, terminator)) => format!("{}{}", text[..idx].trim(), terminator),
            None => format!("{}.", text.trim()),
        }
    }
}
