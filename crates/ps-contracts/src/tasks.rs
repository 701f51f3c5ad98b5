//! Create contract for tasks

use ps_core::error::ValidationErrors;
use ps_models::CreateTask;
use validator::Validate;

use crate::base::{merge_validator_errors, require_present, Contract, ValidationResult};
use crate::process::ProcessStepContract;

pub const TITLE_REQUIRED: &str = "작업명을 입력해주세요.";
pub const COMPANY_REQUIRED: &str = "발주처를 입력해주세요.";
pub const DATES_OUT_OF_ORDER: &str = "납품일은 발주일 이후여야 합니다.";

/// Contract for creating a new task.
///
/// Title and client company are required; every other field is optional.
#[derive(Debug, Default)]
pub struct CreateTaskContract {
    steps: ProcessStepContract,
}

impl CreateTaskContract {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_required(&self, task: &CreateTask, errors: &mut ValidationErrors) {
        require_present(errors, "taskTitle", &task.task_title, TITLE_REQUIRED);
        require_present(errors, "taskCompany", &task.task_company, COMPANY_REQUIRED);
    }

    /// `YYYY-MM-DD` strings compare chronologically
    fn validate_dates(&self, task: &CreateTask, errors: &mut ValidationErrors) {
        if let (Some(order), Some(delivery)) = (&task.task_order_date, &task.task_delivery_date) {
            if !order.is_empty() && !delivery.is_empty() && delivery < order {
                errors.add("taskDeliveryDate", DATES_OUT_OF_ORDER);
            }
        }
    }

    fn validate_steps(&self, task: &CreateTask, errors: &mut ValidationErrors) {
        for step in &task.task_detail.processes {
            if let Err(step_errors) = self.steps.validate(step) {
                errors.merge(step_errors);
            }
        }
    }
}

impl Contract<CreateTask> for CreateTaskContract {
    fn validate(&self, entity: &CreateTask) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_required(entity, &mut errors);

        if let Err(length_errors) = entity.validate() {
            merge_validator_errors(&mut errors, length_errors);
        }

        self.validate_dates(entity, &mut errors);
        self.validate_steps(entity, &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_models::{ProcessStep, TaskDetail, TaskPriority, TaskProgress};

    fn create_task(title: &str, company: &str) -> CreateTask {
        CreateTask {
            admin_key: Some("7".into()),
            task_title: title.into(),
            task_company: company.into(),
            task_priority: TaskPriority::Normal,
            task_progressing: TaskProgress::Waiting,
            task_order_date: Some("2025-07-28".into()),
            task_delivery_date: Some("2025-07-30".into()),
            task_detail: TaskDetail::default(),
        }
    }

    #[test]
    fn test_valid_task_passes() {
        let contract = CreateTaskContract::new();
        assert!(contract.validate(&create_task("명함", "피앤제이")).is_ok());
    }

    #[test]
    fn test_blank_required_fields_fail_after_trim() {
        let contract = CreateTaskContract::new();
        let errors = contract.validate(&create_task("  ", "\t")).unwrap_err();
        assert_eq!(errors.get("taskTitle").unwrap()[0], TITLE_REQUIRED);
        assert_eq!(errors.get("taskCompany").unwrap()[0], COMPANY_REQUIRED);
    }

    #[test]
    fn test_overlong_title_fails() {
        let contract = CreateTaskContract::new();
        let errors = contract
            .validate(&create_task(&"가".repeat(201), "피앤제이"))
            .unwrap_err();
        assert!(!errors.is_empty());
        assert!(!errors.has_error("taskCompany"));
    }

    #[test]
    fn test_delivery_before_order_fails() {
        let contract = CreateTaskContract::new();
        let mut task = create_task("명함", "피앤제이");
        task.task_delivery_date = Some("2025-07-01".into());
        assert!(contract.validate(&task).unwrap_err().has_error("taskDeliveryDate"));
    }

    #[test]
    fn test_incomplete_step_fails() {
        let contract = CreateTaskContract::new();
        let mut task = create_task("명함", "피앤제이");
        task.task_detail.processes = vec![ProcessStep::new("코팅", "코팅", "")];
        assert!(contract.validate(&task).is_err());
    }
}
