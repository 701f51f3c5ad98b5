//! Process steps and the ordered step list
//!
//! The array order inside a task's detail payload is the order of record.
//! Every operation here is pure: it returns a new list and never touches its
//! input, so callers can keep the input as a rollback snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Category of the singular printing slot
pub const PRINTING_CATEGORY: &str = "인쇄";

/// Completion status of one process step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Option<String>")]
pub enum ProcessStatus {
    #[serde(rename = "완료")]
    Done,
    #[serde(rename = "진행중")]
    InProgress,
    #[default]
    #[serde(rename = "미완료")]
    NotDone,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "완료",
            Self::InProgress => "진행중",
            Self::NotDone => "미완료",
        }
    }

    /// Status reached by the toggle control. `진행중` is only ever set
    /// explicitly, and toggles to `완료`.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Done => Self::NotDone,
            Self::InProgress | Self::NotDone => Self::Done,
        }
    }
}

impl From<Option<String>> for ProcessStatus {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some("완료") => Self::Done,
            Some("진행중") => Self::InProgress,
            _ => Self::NotDone,
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One production step (printing, coating, foil stamping, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcessStep {
    #[serde(default)]
    pub category: String,

    /// Usually `<category>(<subtype>)`
    #[serde(rename = "type", default)]
    pub step_type: String,

    /// Vendor company
    #[serde(default)]
    pub company: String,

    #[serde(rename = "companyPhone", default, skip_serializing_if = "Option::is_none")]
    pub company_phone: Option<String>,

    #[serde(rename = "process_status", alias = "process_stauts", default)]
    pub status: ProcessStatus,

    #[serde(default)]
    pub memo: String,

    /// Zero-based position within the task's list
    #[serde(default)]
    pub order: usize,
}

impl ProcessStep {
    pub fn new(
        category: impl Into<String>,
        step_type: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            step_type: step_type.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    /// Printing step for a printing method and vendor option,
    /// e.g. `("디지털인쇄", "내부인쇄")` -> `인쇄` / `인쇄(디지털인쇄)` / `내부인쇄`
    pub fn printing(method: &str, vendor: impl Into<String>) -> Self {
        Self::new(
            PRINTING_CATEGORY,
            compose_type(PRINTING_CATEGORY, method),
            vendor,
        )
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.company_phone = phone.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_status(mut self, status: ProcessStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_printing(&self) -> bool {
        self.category == PRINTING_CATEGORY
    }

    pub fn is_done(&self) -> bool {
        self.status == ProcessStatus::Done
    }

    /// Category, type and vendor are all present
    pub fn is_complete(&self) -> bool {
        !self.category.trim().is_empty()
            && !self.step_type.trim().is_empty()
            && !self.company.trim().is_empty()
    }

    /// Slot identity for post-processing selection
    fn same_slot(&self, other: &ProcessStep) -> bool {
        self.category == other.category && self.step_type == other.step_type
    }
}

/// `<category>(<subtype>)`, or the bare category when there is no subtype
/// or the subtype repeats the category
pub fn compose_type(category: &str, subtype: &str) -> String {
    let subtype = subtype.trim();
    if subtype.is_empty() || subtype == category {
        category.to_string()
    } else {
        format!("{}({})", category, subtype)
    }
}

/// Reassign every step's order to its position
pub fn renumber(mut list: Vec<ProcessStep>) -> Vec<ProcessStep> {
    for (index, step) in list.iter_mut().enumerate() {
        step.order = index;
    }
    list
}

/// Whether orders read 0..n-1 in list order
pub fn is_dense(list: &[ProcessStep]) -> bool {
    list.iter().enumerate().all(|(i, step)| step.order == i)
}

/// Append a step at order `len`. Incomplete steps are ignored; callers
/// validate before adding.
pub fn add_step(list: &[ProcessStep], step: ProcessStep) -> Vec<ProcessStep> {
    let mut next = list.to_vec();
    if !step.is_complete() {
        debug!(category = %step.category, "ignoring incomplete process step");
        return next;
    }
    let order = next.len();
    next.push(ProcessStep { order, ..step });
    next
}

/// Remove the step at `index`. Orders are left as they were; use
/// [`renumber`] when dense orders are needed.
pub fn remove_step(list: &[ProcessStep], index: usize) -> Vec<ProcessStep> {
    let mut next = list.to_vec();
    if index < next.len() {
        next.remove(index);
    }
    next
}

/// Move the step at `from` to `to` and renumber the whole list.
/// Out-of-range indices leave the list as it was.
pub fn reorder_step(list: &[ProcessStep], from: usize, to: usize) -> Vec<ProcessStep> {
    let mut next = list.to_vec();
    if from >= next.len() || to >= next.len() {
        return next;
    }
    let step = next.remove(from);
    next.insert(to, step);
    renumber(next)
}

/// Flip one step between `완료` and `미완료`
pub fn toggle_step_status(list: &[ProcessStep], index: usize) -> Vec<ProcessStep> {
    let mut next = list.to_vec();
    if let Some(step) = next.get_mut(index) {
        step.status = step.status.toggled();
    }
    next
}

/// Set one step's status explicitly (the only way to reach `진행중`)
pub fn set_step_status(list: &[ProcessStep], index: usize, status: ProcessStatus) -> Vec<ProcessStep> {
    let mut next = list.to_vec();
    if let Some(step) = next.get_mut(index) {
        step.status = status;
    }
    next
}

/// Put a printing selection into the single printing slot.
///
/// An existing printing step is replaced in place (keeping its status and
/// memo); otherwise the step leads the list.
pub fn select_printing(list: &[ProcessStep], step: ProcessStep) -> Vec<ProcessStep> {
    if !step.is_complete() {
        return list.to_vec();
    }
    let mut next = list.to_vec();
    match next.iter().position(ProcessStep::is_printing) {
        Some(index) => {
            let existing = &mut next[index];
            existing.step_type = step.step_type;
            existing.company = step.company;
            existing.company_phone = step.company_phone;
        }
        None => next.insert(0, ProcessStep { category: PRINTING_CATEGORY.to_string(), ..step }),
    }
    renumber(next)
}

/// Apply a post-processing selection keyed by `(category, type)`.
///
/// Same vendor again removes the slot, a different vendor replaces it, a new
/// slot is appended.
pub fn toggle_post_processing(list: &[ProcessStep], step: ProcessStep) -> Vec<ProcessStep> {
    if !step.is_complete() {
        return list.to_vec();
    }
    let mut next = list.to_vec();
    match next.iter().position(|s| !s.is_printing() && s.same_slot(&step)) {
        Some(index) if next[index].company == step.company => {
            next.remove(index);
        }
        Some(index) => {
            let existing = &mut next[index];
            existing.company = step.company;
            existing.company_phone = step.company_phone;
        }
        None => next.push(step),
    }
    renumber(next)
}
