//! Comment contract

use ps_core::error::ValidationErrors;
use ps_models::NewRecord;

use crate::base::{require_present, Contract, ValidationResult};

pub const CONTENT_REQUIRED: &str = "댓글 내용을 입력해주세요.";
pub const MAX_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Default)]
pub struct CommentContract;

impl Contract<NewRecord> for CommentContract {
    fn validate(&self, record: &NewRecord) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "content", &record.content, CONTENT_REQUIRED);
        if record.content.chars().count() > MAX_COMMENT_CHARS {
            errors.add("content", format!("댓글은 {}자 이하로 입력해주세요.", MAX_COMMENT_CHARS));
        }
        if record.task_key.trim().is_empty() {
            errors.add_base("작업을 찾을 수 없습니다.");
        }
        errors.into_result()
    }
}
