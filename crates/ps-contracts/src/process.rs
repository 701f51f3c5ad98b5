//! Process step selection contract

use once_cell::sync::Lazy;
use ps_core::error::ValidationErrors;
use ps_models::ProcessStep;
use regex::Regex;

use crate::base::{require_present, Contract, ValidationResult};

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9\- ]{6,18}[0-9]$").expect("phone pattern compiles"));

/// A step needs category, type and vendor; a vendor phone, when given, must
/// look like a phone number.
#[derive(Debug, Default)]
pub struct ProcessStepContract;

impl Contract<ProcessStep> for ProcessStepContract {
    fn validate(&self, step: &ProcessStep) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_present(&mut errors, "category", &step.category, "공정 분류를 선택해주세요.");
        require_present(&mut errors, "type", &step.step_type, "공정 종류를 선택해주세요.");
        require_present(&mut errors, "company", &step.company, "업체를 선택해주세요.");

        if let Some(phone) = step.company_phone.as_deref() {
            if !PHONE.is_match(phone.trim()) {
                errors.add("companyPhone", "업체 연락처 형식이 올바르지 않습니다.");
            }
        }

        errors.into_result()
    }
}
