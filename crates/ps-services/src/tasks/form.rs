//! Task creation form
//!
//! Printing and post-processing selections go through the same process list
//! operations as the detail view, so a created task's detail has the shape
//! the detail view later edits.

use chrono::NaiveDate;
use ps_contracts::{Contract, CreateTaskContract};
use ps_core::error::ValidationErrors;
use ps_core::types::{format_form_date, format_wire_date};
use ps_models::process::{self, compose_type, renumber};
use ps_models::{CreateTask, OptionCatalog, ProcessStep, TaskDetail, TaskPriority, TaskProgress};

/// Summary shown while no post-processing is selected
pub const NO_POST_PROCESSING: &str = "후가공을 선택하세요";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskForm {
    pub title: String,
    pub company: String,
    pub priority: TaskPriority,
    /// Status the task is created with
    pub progress: TaskProgress,
    pub order_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_method: String,
    pub description: String,
    pub original_size: String,
    pub individual_size: String,
    pub paper: String,
    processes: Vec<ProcessStep>,
}

impl TaskForm {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    /// Quick-create variant: the task starts as 진행중
    pub fn quick_create(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            progress: TaskProgress::InProgress,
            ..Self::new(title, company)
        }
    }

    pub fn processes(&self) -> &[ProcessStep] {
        &self.processes
    }

    /// Fill the single printing slot from a printing method and one of its
    /// vendor options
    pub fn select_printing(&mut self, method: &str, option: &str, catalog: &OptionCatalog) {
        let phone = catalog
            .printing_group(method)
            .and_then(|g| g.vendor(option))
            .and_then(|v| v.phone.clone());
        let step = ProcessStep::printing(method, option).with_phone(phone);
        self.processes = process::select_printing(&self.processes, step);
    }

    /// Select a post-processing vendor; the same vendor again deselects it
    pub fn toggle_post_processing(
        &mut self,
        category: &str,
        subtype: &str,
        vendor: &str,
        catalog: &OptionCatalog,
    ) {
        let step = ProcessStep::new(category, compose_type(category, subtype), vendor)
            .with_phone(catalog.vendor_phone(category, vendor));
        self.processes = process::toggle_post_processing(&self.processes, step);
    }

    pub fn remove_step(&mut self, index: usize) {
        self.processes = renumber(process::remove_step(&self.processes, index));
    }

    pub fn printing_step(&self) -> Option<&ProcessStep> {
        self.processes.iter().find(|s| s.is_printing())
    }

    /// `"[코팅] 자체코팅, [박] 외부박"`
    pub fn post_processing_summary(&self) -> String {
        let selected: Vec<String> = self
            .processes
            .iter()
            .filter(|s| !s.is_printing())
            .map(|s| format!("[{}] {}", s.category, s.company))
            .collect();
        if selected.is_empty() {
            NO_POST_PROCESSING.to_string()
        } else {
            selected.join(", ")
        }
    }

    pub fn order_date_label(&self) -> Option<String> {
        self.order_date.map(format_form_date)
    }

    pub fn delivery_date_label(&self) -> Option<String> {
        self.delivery_date.map(format_form_date)
    }

    pub fn detail(&self) -> TaskDetail {
        TaskDetail {
            delivery_method: self.delivery_method.trim().to_string(),
            description: self.description.trim().to_string(),
            original_size: self.original_size.trim().to_string(),
            individual_size: self.individual_size.trim().to_string(),
            paper: self.paper.trim().to_string(),
            processes: renumber(self.processes.clone()),
        }
    }

    /// `POST /tasks` body, unvalidated
    pub fn to_create(&self, admin_key: Option<String>) -> CreateTask {
        CreateTask {
            admin_key,
            task_title: self.title.trim().to_string(),
            task_company: self.company.trim().to_string(),
            task_priority: self.priority,
            task_progressing: self.progress,
            task_order_date: self.order_date.map(format_wire_date),
            task_delivery_date: self.delivery_date.map(format_wire_date),
            task_detail: self.detail(),
        }
    }

    /// Validated `POST /tasks` body
    pub fn build(&self, admin_key: Option<String>) -> Result<CreateTask, ValidationErrors> {
        let task = self.to_create(admin_key);
        CreateTaskContract::new().validate(&task)?;
        Ok(task)
    }

    /// Empty form, as after a successful submit
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
