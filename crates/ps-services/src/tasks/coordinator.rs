//! Optimistic Mutation Coordinator
//!
//! Drives edits of one task through `Idle -> Pending -> Committed | RolledBack`.
//!
//! On dispatch the new state is applied to the local view at once and the
//! previous task is kept as a snapshot. The backend always receives the
//! whole detail payload, never a diff. On success the list, count and detail
//! cache entries are invalidated, one history line is written and one push
//! is sent. On failure the snapshot is restored and the error returned; there
//! is no retry. While a mutation is pending, further requests are ignored.

use parking_lot::Mutex;
use ps_contracts::{Contract, ProcessStepContract};
use ps_core::{PsError, PsResult};
use ps_journals::ChangeEntry;
use ps_models::process::{self, renumber};
use ps_models::{ProcessStatus, ProcessStep, Task, TaskDetail, TaskProgress, UpdateTask};
use tracing::{debug, info, warn};

use crate::base::ServiceContext;
use crate::cache::{Cached, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The backend accepted the change; the committed task
    Committed(Task),
    /// Another mutation was pending
    Ignored,
    /// The request would not change anything
    Unchanged,
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed(_))
    }
}

/// A change ready to dispatch
struct Planned {
    next: Task,
    update: UpdateTask,
    entry: ChangeEntry,
}

impl Planned {
    fn detail(task: &Task, processes: Vec<ProcessStep>, entry: ChangeEntry) -> Self {
        let mut next = task.clone();
        next.task_detail.processes = processes;
        Self {
            update: UpdateTask::detail(&next.task_detail),
            next,
            entry,
        }
    }
}

struct Inner {
    view: Task,
    state: MutationState,
    last_error: Option<PsError>,
}

/// Coordinator for one task's detail view
pub struct MutationCoordinator {
    ctx: ServiceContext,
    key: String,
    steps: ProcessStepContract,
    inner: Mutex<Inner>,
}

impl MutationCoordinator {
    pub fn new(ctx: ServiceContext, task: Task) -> PsResult<Self> {
        let key = task
            .task_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PsError::not_found("task", "key", ""))?;

        Ok(Self {
            ctx,
            key,
            steps: ProcessStepContract,
            inner: Mutex::new(Inner {
                view: task,
                state: MutationState::Idle,
                last_error: None,
            }),
        })
    }

    /// Coordinator for a task key, from a fresh cache entry or the backend
    pub async fn open(ctx: ServiceContext, key: &str) -> PsResult<Self> {
        let cached = match ctx.cache.get_fresh(&QueryKey::TaskDetail(key.to_string())) {
            Some(Cached::Task(task)) => Some(task),
            _ => None,
        };
        let task = match cached {
            Some(task) => task,
            None => {
                let task = ctx.api.get_task(key).await?;
                ctx.cache.put_task(&task);
                task
            }
        };
        Self::new(ctx, task)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// What the view shows right now, optimistic changes included
    pub fn task(&self) -> Task {
        self.inner.lock().view.clone()
    }

    pub fn detail(&self) -> TaskDetail {
        self.inner.lock().view.task_detail.clone()
    }

    pub fn state(&self) -> MutationState {
        self.inner.lock().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == MutationState::Pending
    }

    /// Error of the last rolled-back mutation
    pub fn last_error(&self) -> Option<PsError> {
        self.inner.lock().last_error.clone()
    }

    /// Replace the whole detail payload, logging `entry` on commit
    pub async fn update_detail(
        &self,
        detail: TaskDetail,
        entry: ChangeEntry,
    ) -> PsResult<MutationOutcome> {
        self.mutate(move |task| {
            let mut next = task.clone();
            next.task_detail = TaskDetail {
                processes: renumber(detail.processes),
                ..detail
            };
            if next.task_detail == task.task_detail {
                return Ok(None);
            }
            Ok(Some(Planned {
                update: UpdateTask::detail(&next.task_detail),
                next,
                entry,
            }))
        })
        .await
    }

    /// Replace the detail payload; the history line is derived from the
    /// step list difference
    pub async fn edit_detail(&self, detail: TaskDetail) -> PsResult<MutationOutcome> {
        let current = self.detail();
        let entry = ChangeEntry::between(&current.processes, &detail.processes);
        self.update_detail(detail, entry).await
    }

    /// Flip one step between 완료 and 미완료
    pub async fn toggle_step(&self, index: usize) -> PsResult<MutationOutcome> {
        self.mutate(|task| {
            let steps = &task.task_detail.processes;
            if index >= steps.len() {
                return Err(step_not_found(index));
            }
            let processes = process::toggle_step_status(steps, index);
            let entry = ChangeEntry::step_status(&processes[index]);
            Ok(Some(Planned::detail(task, processes, entry)))
        })
        .await
    }

    /// Set one step's status, the only way to reach 진행중
    pub async fn set_step_status(
        &self,
        index: usize,
        status: ProcessStatus,
    ) -> PsResult<MutationOutcome> {
        self.mutate(|task| {
            let steps = &task.task_detail.processes;
            let step = steps.get(index).ok_or_else(|| step_not_found(index))?;
            if step.status == status {
                return Ok(None);
            }
            let processes = process::set_step_status(steps, index, status);
            let entry = ChangeEntry::step_status(&processes[index]);
            Ok(Some(Planned::detail(task, processes, entry)))
        })
        .await
    }

    pub async fn add_step(&self, step: ProcessStep) -> PsResult<MutationOutcome> {
        self.steps.validate(&step)?;
        self.mutate(|task| {
            let entry = ChangeEntry::StepAdded {
                category: step.category.clone(),
            };
            let processes = process::add_step(&task.task_detail.processes, step);
            Ok(Some(Planned::detail(task, processes, entry)))
        })
        .await
    }

    pub async fn remove_step(&self, index: usize) -> PsResult<MutationOutcome> {
        self.mutate(|task| {
            let steps = &task.task_detail.processes;
            let removed = steps.get(index).ok_or_else(|| step_not_found(index))?;
            let entry = ChangeEntry::StepRemoved {
                category: removed.category.clone(),
            };
            let processes = renumber(process::remove_step(steps, index));
            Ok(Some(Planned::detail(task, processes, entry)))
        })
        .await
    }

    pub async fn reorder_steps(&self, from: usize, to: usize) -> PsResult<MutationOutcome> {
        self.mutate(|task| {
            let steps = &task.task_detail.processes;
            if from >= steps.len() {
                return Err(step_not_found(from));
            }
            if to >= steps.len() {
                return Err(step_not_found(to));
            }
            if from == to {
                return Ok(None);
            }
            let processes = process::reorder_step(steps, from, to);
            Ok(Some(Planned::detail(task, processes, ChangeEntry::Reordered)))
        })
        .await
    }

    /// Move the whole task between 대기/진행중/완료
    pub async fn change_status(&self, progress: TaskProgress) -> PsResult<MutationOutcome> {
        self.mutate(|task| {
            if task.task_progressing == progress {
                return Ok(None);
            }
            let entry = ChangeEntry::TaskStatus {
                from: task.task_progressing,
                to: progress,
            };
            let next = task.clone().with_progress(progress);
            Ok(Some(Planned {
                next,
                update: UpdateTask::progress(progress),
                entry,
            }))
        })
        .await
    }

    /// Soft delete: the task is flagged, not removed
    pub async fn delete(&self) -> PsResult<MutationOutcome> {
        self.mutate(|task| {
            if task.task_del {
                return Ok(None);
            }
            let mut next = task.clone();
            next.task_del = true;
            Ok(Some(Planned {
                next,
                update: UpdateTask::soft_delete(),
                entry: ChangeEntry::Deleted,
            }))
        })
        .await
    }

    /// Refetch the task so the view reconverges on server state
    pub async fn refresh(&self) -> PsResult<Task> {
        if self.is_pending() {
            return Err(PsError::Busy {
                key: self.key.clone(),
            });
        }
        let task = self.ctx.api.get_task(&self.key).await?;
        self.ctx.cache.put_task(&task);

        let mut inner = self.inner.lock();
        if inner.state != MutationState::Pending {
            inner.view = task.clone();
        }
        Ok(task)
    }

    async fn mutate<F>(&self, plan: F) -> PsResult<MutationOutcome>
    where
        F: FnOnce(&Task) -> PsResult<Option<Planned>>,
    {
        // Idle -> Pending
        let (pending, update, entry) = {
            let mut inner = self.inner.lock();
            if inner.state == MutationState::Pending {
                debug!(task_key = %self.key, "mutation already pending, ignoring request");
                return Ok(MutationOutcome::Ignored);
            }
            let Some(planned) = plan(&inner.view)? else {
                return Ok(MutationOutcome::Unchanged);
            };
            let snapshot = std::mem::replace(&mut inner.view, planned.next);
            inner.state = MutationState::Pending;
            inner.last_error = None;
            let pending = PendingGuard {
                inner: &self.inner,
                key: &self.key,
                snapshot: Some(snapshot),
            };
            (pending, planned.update, planned.entry)
        };
        debug!(task_key = %self.key, entry = %entry, "mutation pending");

        match self.ctx.api.update_task(&self.key, &update).await {
            Ok(()) => {
                // Pending -> Committed
                let committed = pending.commit();
                self.ctx.cache.put_task(&committed);
                self.ctx.cache.invalidate_task(&self.key);
                info!(task_key = %self.key, entry = %entry, "mutation committed");

                self.ctx.journal(&self.key, &entry).await;
                self.ctx
                    .announce(Some(&self.key), &committed.task_title, &entry)
                    .await;

                Ok(MutationOutcome::Committed(committed))
            }
            Err(e) => {
                // Pending -> RolledBack
                pending.roll_back(Some(e.clone()));
                warn!(task_key = %self.key, entry = %entry, error = %e, "mutation rolled back");
                Err(e)
            }
        }
    }
}

/// Holds the snapshot of a pending mutation. Dropping it before the
/// mutation settles restores the snapshot, so a cancelled request never
/// leaves the view stuck in `Pending`.
struct PendingGuard<'a> {
    inner: &'a Mutex<Inner>,
    key: &'a str,
    snapshot: Option<Task>,
}

impl PendingGuard<'_> {
    fn commit(mut self) -> Task {
        self.snapshot = None;
        let mut inner = self.inner.lock();
        inner.state = MutationState::Committed;
        inner.view.clone()
    }

    fn roll_back(mut self, error: Option<PsError>) {
        self.restore(error);
    }

    fn restore(&mut self, error: Option<PsError>) {
        if let Some(snapshot) = self.snapshot.take() {
            let mut inner = self.inner.lock();
            inner.view = snapshot;
            inner.state = MutationState::RolledBack;
            inner.last_error = error;
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            warn!(task_key = %self.key, "mutation dropped while pending, restoring snapshot");
            self.restore(None);
        }
    }
}

fn step_not_found(index: usize) -> PsError {
    PsError::not_found("process step", "index", index.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use ps_client::{MockTaskApi, TaskApi};
    use ps_core::{Page, PageParams};
    use ps_models::{
        decode, CreateTask, NewRecord, OptionCatalog, PushRecipient, PushSettings, TaskCounts,
        UserRecord,
    };
    use ps_notifications::{MockNotifier, PushOutcome, TaskNotice};
    use tokio::sync::Semaphore;

    use super::*;
    use crate::cache::QueryCache;

    fn three_step_task() -> Task {
        let processes = renumber(vec![
            ProcessStep::printing("디지털인쇄", "내부인쇄").with_status(ProcessStatus::Done),
            ProcessStep::new("코팅", "코팅(무광)", "자체코팅"),
            ProcessStep::new("박", "박(금박)", "외부박"),
        ]);
        Task::new("T1", "명함", "피앤제이").with_detail(TaskDetail::default().with_processes(processes))
    }

    fn notifier(times: usize) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice: &TaskNotice| notice.task_key.as_deref() == Some("T1"))
            .times(times)
            .returning(|_| PushOutcome::Sent {
                messages: 1,
                batches: 1,
            });
        notifier
    }

    fn context(api: impl TaskApi + 'static, notifier: MockNotifier) -> (ServiceContext, Arc<QueryCache>) {
        let cache = Arc::new(QueryCache::new());
        let ctx = ServiceContext::new(Arc::new(api), Arc::clone(&cache), Arc::new(notifier))
            .with_admin_key(Some("7".into()));
        (ctx, cache)
    }

    #[tokio::test]
    async fn test_toggle_commits_logs_and_pushes_once() {
        let mut api = MockTaskApi::new();
        api.expect_update_task()
            .withf(|key: &str, update: &UpdateTask| {
                let detail = decode(update.task_detail.as_deref().unwrap_or(""));
                key == "T1"
                    && detail.processes.len() == 3
                    && detail.processes[1].status == ProcessStatus::Done
                    && update.task_progressing.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_create_log()
            .withf(|record: &NewRecord| {
                record.task_key == "T1"
                    && record.content == "[코팅] 완료"
                    && record.admin_key.as_deref() == Some("7")
            })
            .times(1)
            .returning(|_| Ok(()));

        let (ctx, cache) = context(api, notifier(1));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        let outcome = coordinator.toggle_step(1).await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(coordinator.state(), MutationState::Committed);

        let cached = cache.task("T1").unwrap();
        assert_eq!(cached.task_detail.processes[1].status, ProcessStatus::Done);
        assert!(cache.is_stale(&QueryKey::TaskDetail("T1".into())));
    }

    #[tokio::test]
    async fn test_network_failure_restores_snapshot() {
        let mut api = MockTaskApi::new();
        api.expect_update_task()
            .times(1)
            .returning(|_, _| Err(PsError::network("connection reset")));
        api.expect_create_log().times(0);

        let (ctx, cache) = context(api, notifier(0));
        let before = three_step_task();
        let coordinator = MutationCoordinator::new(ctx, before.clone()).unwrap();

        let err = coordinator.toggle_step(1).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(coordinator.task(), before);
        assert_eq!(
            coordinator.detail().processes[1].status,
            ProcessStatus::NotDone
        );
        assert_eq!(coordinator.state(), MutationState::RolledBack);
        assert!(coordinator.last_error().is_some());
        assert!(cache.task("T1").is_none());
    }

    #[tokio::test]
    async fn test_log_failure_keeps_commit() {
        let mut api = MockTaskApi::new();
        api.expect_update_task().times(1).returning(|_, _| Ok(()));
        api.expect_create_log()
            .times(1)
            .returning(|_| Err(PsError::Timeout { seconds: 15 }));

        let (ctx, _) = context(api, notifier(1));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        assert!(coordinator.toggle_step(2).await.unwrap().is_committed());
        assert_eq!(coordinator.detail().processes[2].status, ProcessStatus::Done);
    }

    #[tokio::test]
    async fn test_change_status_logs_transition() {
        let mut api = MockTaskApi::new();
        api.expect_update_task()
            .withf(|_, update: &UpdateTask| {
                update.task_progressing == Some(TaskProgress::InProgress) && update.task_detail.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_create_log()
            .withf(|record: &NewRecord| record.content == "대기 -> 진행중")
            .times(1)
            .returning(|_| Ok(()));

        let (ctx, _) = context(api, notifier(1));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        coordinator.change_status(TaskProgress::InProgress).await.unwrap();
        assert_eq!(coordinator.task().task_progressing, TaskProgress::InProgress);

        // same status again: nothing to send
        assert_eq!(
            coordinator.change_status(TaskProgress::InProgress).await.unwrap(),
            MutationOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn test_delete_flags_task_and_invalidates_lists() {
        let mut api = MockTaskApi::new();
        api.expect_update_task()
            .withf(|_, update: &UpdateTask| update.task_del == Some(1))
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_create_log()
            .withf(|record: &NewRecord| record.content == "작업 삭제")
            .times(1)
            .returning(|_| Ok(()));

        let (ctx, cache) = context(api, notifier(1));
        cache.put(QueryKey::TaskList, Cached::TaskPages(vec![]));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        coordinator.delete().await.unwrap();
        assert!(coordinator.task().task_del);
        assert!(cache.is_stale(&QueryKey::TaskList));
    }

    #[tokio::test]
    async fn test_step_edits_keep_orders_dense() {
        let mut api = MockTaskApi::new();
        api.expect_update_task().times(3).returning(|_, _| Ok(()));
        let logged = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&logged);
        api.expect_create_log().times(3).returning(move |record| {
            sink.lock().push(record.content.clone());
            Ok(())
        });

        let (ctx, _) = context(api, notifier(3));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        coordinator
            .add_step(ProcessStep::new("목형", "목형(V컷)", "자체목형"))
            .await
            .unwrap();
        coordinator.reorder_steps(0, 3).await.unwrap();
        coordinator.remove_step(1).await.unwrap();

        let orders: Vec<usize> = coordinator.detail().processes.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(
            *logged.lock(),
            vec!["[목형] 추가", "공정 순서 변경", "[박] 삭제"]
        );
    }

    #[tokio::test]
    async fn test_invalid_step_rejected_before_dispatch() {
        let mut api = MockTaskApi::new();
        api.expect_update_task().times(0);

        let (ctx, _) = context(api, notifier(0));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        let err = coordinator
            .add_step(ProcessStep::new("코팅", "코팅", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, PsError::Validation(_)));
        assert!(matches!(
            coordinator.toggle_step(9).await,
            Err(PsError::NotFound { .. })
        ));
        assert_eq!(coordinator.state(), MutationState::Idle);
    }

    /// Backend whose task updates wait until the test opens the gate
    struct GatedApi {
        gate: Arc<Semaphore>,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl TaskApi for GatedApi {
        async fn list_tasks(&self, _params: PageParams) -> PsResult<Page<Task>> {
            Err(PsError::Internal("unused".into()))
        }
        async fn task_counts(&self) -> PsResult<TaskCounts> {
            Err(PsError::Internal("unused".into()))
        }
        async fn get_task(&self, _key: &str) -> PsResult<Task> {
            Err(PsError::Internal("unused".into()))
        }
        async fn create_task(&self, _task: &CreateTask) -> PsResult<Task> {
            Err(PsError::Internal("unused".into()))
        }
        async fn update_task(&self, _key: &str, _update: &UpdateTask) -> PsResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| PsError::Internal(e.to_string()))?;
            Ok(())
        }
        async fn create_comment(&self, _record: &NewRecord) -> PsResult<()> {
            Ok(())
        }
        async fn create_log(&self, _record: &NewRecord) -> PsResult<()> {
            Ok(())
        }
        async fn get_options(&self) -> PsResult<OptionCatalog> {
            Ok(OptionCatalog::default())
        }
        async fn get_user(&self, _id: &str) -> PsResult<Option<UserRecord>> {
            Ok(None)
        }
        async fn update_push_settings(&self, _key: &str, _settings: &PushSettings) -> PsResult<()> {
            Ok(())
        }
        async fn list_push_recipients(&self) -> PsResult<Vec<PushRecipient>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_second_request_while_pending_is_ignored() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(GatedApi {
            gate: Arc::clone(&gate),
            updates: AtomicUsize::new(0),
        });
        let cache = Arc::new(QueryCache::new());
        let ctx = ServiceContext::new(api.clone(), cache, Arc::new(notifier(1)));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        let first = coordinator.toggle_step(1);
        futures::pin_mut!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(coordinator.is_pending());
        // optimistic value is visible while pending
        assert_eq!(coordinator.detail().processes[1].status, ProcessStatus::Done);

        let second = coordinator.change_status(TaskProgress::Done).await.unwrap();
        assert_eq!(second, MutationOutcome::Ignored);
        assert_eq!(api.updates.load(Ordering::SeqCst), 1);

        gate.add_permits(1);
        assert!(first.await.unwrap().is_committed());
        assert_eq!(api.updates.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.task().task_progressing, TaskProgress::Waiting);
    }

    #[tokio::test]
    async fn test_dropped_mutation_restores_snapshot() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(GatedApi {
            gate: Arc::clone(&gate),
            updates: AtomicUsize::new(0),
        });
        let cache = Arc::new(QueryCache::new());
        let ctx = ServiceContext::new(api.clone(), cache, Arc::new(notifier(1)));
        let coordinator = MutationCoordinator::new(ctx, three_step_task()).unwrap();

        {
            let first = coordinator.toggle_step(1);
            futures::pin_mut!(first);
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert_eq!(coordinator.detail().processes[1].status, ProcessStatus::Done);
        }
        gate.add_permits(1);

        assert_eq!(coordinator.state(), MutationState::RolledBack);
        assert!(!coordinator.is_pending());
        assert_eq!(coordinator.detail().processes[1].status, ProcessStatus::NotDone);

        // the coordinator accepts new work afterwards
        let again = coordinator.toggle_step(1).await.unwrap();
        assert!(again.is_committed());
        assert_eq!(api.updates.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.state(), MutationState::Committed);
    }
}
