//! Create Task Service

use ps_core::ServiceResult;
use ps_journals::ChangeEntry;
use ps_models::{default_catalog, OptionCatalog, Task};
use tracing::{info, warn};

use crate::base::ServiceContext;
use crate::cache::{Cached, QueryKey};
use crate::tasks::form::TaskForm;

/// Service for submitting the task creation form
pub struct CreateTaskService {
    ctx: ServiceContext,
}

impl CreateTaskService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Submit the form.
    ///
    /// Invalid forms fail without a request. On failure the form is left as
    /// it was so the caller can retry.
    pub async fn call(&self, form: &TaskForm) -> ServiceResult<Task> {
        let request = match form.build(self.ctx.admin_key.clone()) {
            Ok(request) => request,
            Err(errors) => return ServiceResult::failure(errors),
        };

        let task = match self.ctx.api.create_task(&request).await {
            Ok(task) => task,
            Err(e) => {
                warn!(title = %request.task_title, error = %e, "task creation failed");
                return ServiceResult::failure_with_message(e.user_message());
            }
        };

        self.ctx.cache.invalidate_lists();
        self.ctx.cache.put_task(&task);
        info!(task_key = %task.key_or_empty(), title = %task.task_title, "task created");

        let entry = ChangeEntry::Created {
            title: task.task_title.clone(),
        };
        self.ctx
            .announce(task.task_key.as_deref(), &task.task_title, &entry)
            .await;

        ServiceResult::success(task)
    }
}

/// Option catalog for the form: a fresh cache entry, the backend, or the
/// built-in default when the backend fails
pub async fn load_catalog(ctx: &ServiceContext) -> OptionCatalog {
    if let Some(catalog) = ctx.cache.options() {
        return catalog;
    }
    match ctx.api.get_options().await {
        Ok(catalog) if !catalog.is_empty() => {
            ctx.cache.put(QueryKey::Options, Cached::Options(catalog.clone()));
            catalog
        }
        Ok(_) => default_catalog().clone(),
        Err(e) => {
            warn!(error = %e, "option catalog unavailable, using built-in catalog");
            default_catalog().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ps_client::MockTaskApi;
    use ps_contracts::tasks::TITLE_REQUIRED;
    use ps_core::PsError;
    use ps_models::{CreateTask, TaskProgress};
    use ps_notifications::{MockNotifier, PushOutcome, TaskNotice};

    use super::*;
    use crate::cache::QueryCache;

    fn context(api: MockTaskApi, notifier: MockNotifier) -> (ServiceContext, Arc<QueryCache>) {
        let cache = Arc::new(QueryCache::new());
        let ctx = ServiceContext::new(Arc::new(api), Arc::clone(&cache), Arc::new(notifier))
            .with_admin_key(Some("7".into()));
        (ctx, cache)
    }

    #[tokio::test]
    async fn test_create_invalidates_lists_and_pushes() {
        let mut api = MockTaskApi::new();
        api.expect_create_task()
            .withf(|task: &CreateTask| {
                task.task_title == "명함"
                    && task.admin_key.as_deref() == Some("7")
                    && task.task_detail.processes.len() == 1
            })
            .times(1)
            .returning(|request| {
                Ok(Task::new("T100", request.task_title.clone(), request.task_company.clone()))
            });
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice: &TaskNotice| {
                notice.task_key.as_deref() == Some("T100") && notice.body == "명함: 작업 등록: 명함"
            })
            .times(1)
            .returning(|_| PushOutcome::NoRecipients);

        let (ctx, cache) = context(api, notifier);
        cache.put(QueryKey::TaskList, Cached::TaskPages(vec![]));

        let mut form = TaskForm::new("명함", "피앤제이");
        form.select_printing("디지털인쇄", "내부인쇄", default_catalog());

        let result = CreateTaskService::new(ctx).call(&form).await;
        assert!(result.is_success());
        assert_eq!(result.result().unwrap().key_or_empty(), "T100");
        assert!(cache.is_stale(&QueryKey::TaskList));
        assert!(cache.task("T100").is_some());
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let mut api = MockTaskApi::new();
        api.expect_create_task().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let (ctx, _) = context(api, notifier);
        let result = CreateTaskService::new(ctx).call(&TaskForm::new("", "피앤제이")).await;

        assert!(result.is_failure());
        assert_eq!(result.errors().full_messages(), vec![TITLE_REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_form() {
        let mut api = MockTaskApi::new();
        api.expect_create_task()
            .times(1)
            .returning(|_| Err(PsError::network("connection refused")));
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let (ctx, cache) = context(api, notifier);
        let form = TaskForm::quick_create("명함", "피앤제이");
        let before = form.clone();

        let result = CreateTaskService::new(ctx).call(&form).await;
        assert!(result.is_failure());
        assert_eq!(form, before);
        assert_eq!(form.progress, TaskProgress::InProgress);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_falls_back_to_default() {
        let mut api = MockTaskApi::new();
        api.expect_get_options()
            .times(1)
            .returning(|| Err(PsError::Http { status: 500, message: "boom".into() }));

        let (ctx, cache) = context(api, MockNotifier::new());
        let catalog = load_catalog(&ctx).await;

        assert_eq!(&catalog, default_catalog());
        assert!(cache.options().is_none());
    }
}
