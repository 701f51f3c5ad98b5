//! History entries
//!
//! The log text is what the backend stores and the history tab shows, so the
//! formats are fixed: `"[인쇄] 완료"`, `"대기 -> 진행중"`, `"[코팅] 추가"`.

use std::fmt;

use ps_models::{ProcessStatus, ProcessStep, TaskProgress};

/// One change to a task, as written to its history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEntry {
    /// A step's completion status changed
    StepStatus {
        category: String,
        status: ProcessStatus,
    },
    /// The whole task moved between 대기/진행중/완료
    TaskStatus { from: TaskProgress, to: TaskProgress },
    StepAdded { category: String },
    StepRemoved { category: String },
    Reordered,
    /// Step fields other than status and position changed
    DetailEdited,
    Deleted,
    Created { title: String },
    Custom(String),
}

impl ChangeEntry {
    pub fn step_status(step: &ProcessStep) -> Self {
        ChangeEntry::StepStatus {
            category: step.category.clone(),
            status: step.status,
        }
    }

    /// Describe the difference between two step lists.
    ///
    /// Length changes read as add/remove, the same steps in another order as
    /// a reorder, a status flip on an otherwise unchanged step as a status
    /// change.
    pub fn between(before: &[ProcessStep], after: &[ProcessStep]) -> Self {
        use std::cmp::Ordering;

        match after.len().cmp(&before.len()) {
            Ordering::Greater => {
                let added = after
                    .iter()
                    .find(|s| !before.iter().any(|b| same_step(b, s)))
                    .or_else(|| after.last());
                ChangeEntry::StepAdded {
                    category: added.map(|s| s.category.clone()).unwrap_or_default(),
                }
            }
            Ordering::Less => {
                let removed = before
                    .iter()
                    .find(|b| !after.iter().any(|s| same_step(b, s)))
                    .or_else(|| before.last());
                ChangeEntry::StepRemoved {
                    category: removed.map(|s| s.category.clone()).unwrap_or_default(),
                }
            }
            Ordering::Equal => {
                let same_positions = before.iter().zip(after).all(|(b, a)| same_step(b, a));
                if !same_positions {
                    return if is_permutation(before, after) {
                        ChangeEntry::Reordered
                    } else {
                        ChangeEntry::DetailEdited
                    };
                }
                before
                    .iter()
                    .zip(after)
                    .find(|(b, a)| b.status != a.status)
                    .map(|(_, a)| ChangeEntry::step_status(a))
                    .unwrap_or(ChangeEntry::DetailEdited)
            }
        }
    }

    /// Text stored by `POST /logs`
    pub fn to_log_text(&self) -> String {
        self.to_string()
    }

    /// Title of the push notification announcing this change
    pub fn push_title(&self) -> &'static str {
        match self {
            ChangeEntry::StepStatus { .. } => "공정 상태 변경",
            ChangeEntry::TaskStatus { .. } => "작업 상태 변경",
            ChangeEntry::StepAdded { .. }
            | ChangeEntry::StepRemoved { .. }
            | ChangeEntry::Reordered
            | ChangeEntry::DetailEdited => "공정 변경",
            ChangeEntry::Deleted => "작업 삭제",
            ChangeEntry::Created { .. } => "새 작업 등록",
            ChangeEntry::Custom(_) => "작업 알림",
        }
    }

    /// Push body for a task title, e.g. `"명함: [인쇄] 완료"`
    pub fn push_body(&self, task_title: &str) -> String {
        if task_title.is_empty() {
            self.to_string()
        } else {
            format!("{}: {}", task_title, self)
        }
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEntry::StepStatus { category, status } => write!(f, "[{}] {}", category, status),
            ChangeEntry::TaskStatus { from, to } => write!(f, "{} -> {}", from, to),
            ChangeEntry::StepAdded { category } => write!(f, "[{}] 추가", category),
            ChangeEntry::StepRemoved { category } => write!(f, "[{}] 삭제", category),
            ChangeEntry::Reordered => f.write_str("공정 순서 변경"),
            ChangeEntry::DetailEdited => f.write_str("공정 정보 변경"),
            ChangeEntry::Deleted => f.write_str("작업 삭제"),
            ChangeEntry::Created { title } => write!(f, "작업 등록: {}", title),
            ChangeEntry::Custom(text) => f.write_str(text),
        }
    }
}

fn same_step(a: &ProcessStep, b: &ProcessStep) -> bool {
    a.category == b.category && a.step_type == b.step_type && a.company == b.company
}

fn is_permutation(before: &[ProcessStep], after: &[ProcessStep]) -> bool {
    let mut unmatched: Vec<&ProcessStep> = after.iter().collect();
    for step in before {
        match unmatched.iter().position(|s| same_step(s, step)) {
            Some(index) => {
                unmatched.swap_remove(index);
            }
            None => return false,
        }
    }
    unmatched.is_empty()
}
