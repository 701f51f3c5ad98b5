//! Subcommand handlers

use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use ps_core::types::{display_offset, format_display_date_in};
use ps_models::{Task, TaskPriority, TaskProgress};
use ps_services::{
    load_catalog, CommentService, CreateTaskService, HistoryPager, MutationCoordinator,
    MutationOutcome, StatusFilter, TaskForm, TaskListView,
};

use crate::App;

pub(crate) struct CreateArgs {
    pub title: String,
    pub company: String,
    pub priority: Option<String>,
    pub printing: Option<String>,
    pub post: Vec<String>,
    pub order_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub paper: Option<String>,
    pub description: Option<String>,
    pub quick: bool,
}

pub(crate) async fn login(app: &App, id: &str, password: &str) -> anyhow::Result<()> {
    let user = app.session.login(app.api.as_ref(), id, password).await?;
    println!("{}님, 로그인되었습니다.", user.display_name());
    Ok(())
}

pub(crate) async fn logout(app: &App) -> anyhow::Result<()> {
    app.session.logout().await?;
    println!("로그아웃되었습니다.");
    Ok(())
}

pub(crate) async fn list(app: &App, tab: StatusFilter, pages: u32) -> anyhow::Result<()> {
    let view = TaskListView::new(app.ctx.clone(), &app.config.list);
    view.set_filter(tab);

    for _ in 0..pages.max(1) {
        if !view.load_next().await? {
            break;
        }
    }

    // tab totals are informational; the list prints without them
    if let Err(e) = view.load_counts().await {
        tracing::warn!(error = %e, "task counts unavailable");
    }
    let tabs: Vec<String> = StatusFilter::ALL
        .iter()
        .map(|f| match view.tab_count(*f) {
            Some(count) => format!("{} {}", f, count),
            None => f.to_string(),
        })
        .collect();
    println!("{}", tabs.join(" | "));

    let visible = view.visible();
    if visible.is_empty() {
        println!("작업이 없습니다.");
    }
    for task in &visible {
        println!("{}", task_row(app, task));
    }
    if view.has_next_page() {
        println!("... 다음 페이지가 있습니다 (--pages {})", view.pages_loaded() + 1);
    }
    Ok(())
}

pub(crate) async fn show(app: &App, key: &str) -> anyhow::Result<()> {
    let coordinator = MutationCoordinator::open(app.ctx.clone(), key).await?;
    let task = coordinator.task();
    let detail = &task.task_detail;

    println!("{}", task_row(app, &task));
    println!("발주일: {}", display_date(app, task.task_order_date.as_deref()));
    println!("납품일: {}", display_date(app, task.task_delivery_date.as_deref()));
    if !detail.paper.is_empty() {
        println!("용지: {}", detail.paper);
    }
    if !detail.original_size.is_empty() || !detail.individual_size.is_empty() {
        println!("사이즈: {} / {}", detail.original_size, detail.individual_size);
    }
    if !detail.delivery_method.is_empty() {
        println!("납품 방법: {}", detail.delivery_method);
    }
    if !detail.description.is_empty() {
        println!("메모: {}", detail.description);
    }

    println!("공정 ({}/{} 완료)", detail.done_count(), detail.processes.len());
    for (index, step) in detail.processes.iter().enumerate() {
        let phone = step.company_phone.as_deref().unwrap_or("");
        println!(
            "  {}. [{}] {} {} {} {}",
            index, step.status, step.step_type, step.company, phone, step.memo
        );
    }
    if let Some((index, step)) = detail.next_pending_step() {
        println!("다음 공정: {}. {}", index, step.step_type);
    }

    let comments = HistoryPager::new(task.comments.clone());
    println!("댓글 ({})", comments.total());
    for comment in comments.visible() {
        println!(
            "  {} {}: {}",
            display_date(app, comment.created_at.as_deref()),
            comment.admin_name.as_deref().unwrap_or("-"),
            comment.content
        );
    }

    let logs = HistoryPager::new(task.logs.clone());
    println!("기록 ({})", logs.total());
    for log in logs.visible() {
        println!("  {} {}", display_date(app, log.created_at.as_deref()), log.content);
    }
    Ok(())
}

pub(crate) async fn toggle(app: &App, key: &str, index: usize) -> anyhow::Result<()> {
    require_login(app)?;
    let coordinator = MutationCoordinator::open(app.ctx.clone(), key).await?;
    let outcome = coordinator.toggle_step(index).await?;
    if let MutationOutcome::Committed(task) = &outcome {
        if let Some(step) = task.task_detail.processes.get(index) {
            println!("[{}] {}", step.category, step.status);
        }
    }
    report(&outcome);
    Ok(())
}

pub(crate) async fn status(app: &App, key: &str, status: &str) -> anyhow::Result<()> {
    require_login(app)?;
    let progress =
        TaskProgress::parse(status).ok_or_else(|| anyhow!("알 수 없는 상태입니다: {}", status))?;
    let coordinator = MutationCoordinator::open(app.ctx.clone(), key).await?;
    let before = coordinator.task().task_progressing;
    let outcome = coordinator.change_status(progress).await?;
    if outcome.is_committed() {
        println!("{} -> {}", before, progress);
    }
    report(&outcome);
    Ok(())
}

pub(crate) async fn delete(app: &App, key: &str) -> anyhow::Result<()> {
    require_login(app)?;
    let coordinator = MutationCoordinator::open(app.ctx.clone(), key).await?;
    let outcome = coordinator.delete().await?;
    if outcome.is_committed() {
        println!("작업이 삭제되었습니다.");
    }
    report(&outcome);
    Ok(())
}

pub(crate) async fn comment(app: &App, key: &str, content: &str) -> anyhow::Result<()> {
    require_login(app)?;
    CommentService::new(app.ctx.clone())
        .submit(key, content)
        .await
        .into_result()?;
    println!("댓글이 등록되었습니다.");
    Ok(())
}

pub(crate) async fn create(app: &App, args: CreateArgs) -> anyhow::Result<()> {
    require_login(app)?;
    let catalog = load_catalog(&app.ctx).await;

    let mut form = if args.quick {
        TaskForm::quick_create(args.title, args.company)
    } else {
        TaskForm::new(args.title, args.company)
    };
    if let Some(priority) = args.priority.as_deref() {
        form.priority = TaskPriority::parse(priority)
            .ok_or_else(|| anyhow!("알 수 없는 우선순위입니다: {}", priority))?;
    }
    form.order_date = args.order_date;
    form.delivery_date = args.delivery_date;
    form.paper = args.paper.unwrap_or_default();
    form.description = args.description.unwrap_or_default();

    if let Some(printing) = args.printing.as_deref() {
        let (method, option) = parse_printing(printing)?;
        form.select_printing(method, option, &catalog);
    }
    for post in &args.post {
        let (category, subtype, vendor) = parse_post(post)?;
        form.toggle_post_processing(category, subtype, vendor, &catalog);
    }

    let task = CreateTaskService::new(app.ctx.clone()).call(&form).await.into_result()?;
    println!("작업이 등록되었습니다: {} ({})", task.task_title, task.key_or_empty());
    println!("후가공: {}", form.post_processing_summary());
    Ok(())
}

pub(crate) async fn push(app: &App, enabled: bool, token: Option<String>) -> anyhow::Result<()> {
    require_login(app)?;
    app.session
        .set_push_enabled(app.api.as_ref(), enabled, token)
        .await?;
    println!("푸시 알림을 {}.", if enabled { "켰습니다" } else { "껐습니다" });
    Ok(())
}

fn require_login(app: &App) -> anyhow::Result<()> {
    if app.session.is_logged_in() {
        Ok(())
    } else {
        bail!("로그인이 필요합니다. printshop login <아이디> 로 로그인해주세요.")
    }
}

fn report(outcome: &MutationOutcome) {
    match outcome {
        MutationOutcome::Committed(_) => {}
        MutationOutcome::Ignored => println!("이전 요청을 처리 중입니다."),
        MutationOutcome::Unchanged => println!("변경 사항이 없습니다."),
    }
}

fn display_date(app: &App, date: Option<&str>) -> String {
    match date {
        Some(date) if !date.is_empty() => {
            format_display_date_in(date, display_offset(app.config.display.utc_offset_hours))
        }
        _ => "-".to_string(),
    }
}

fn task_row(app: &App, task: &Task) -> String {
    format!(
        "{} [{}] ({}) {} / {} 납품 {} 공정 {}/{}",
        task.key_or_empty(),
        task.task_progressing,
        task.task_priority,
        task.task_title,
        task.task_company,
        display_date(app, task.task_delivery_date.as_deref()),
        task.task_detail.done_count(),
        task.task_detail.processes.len()
    )
}

/// `METHOD:OPTION`
fn parse_printing(value: &str) -> anyhow::Result<(&str, &str)> {
    match value.split_once(':') {
        Some((method, option)) if !method.trim().is_empty() && !option.trim().is_empty() => {
            Ok((method.trim(), option.trim()))
        }
        _ => bail!("인쇄는 방식:업체 형식으로 입력해주세요: {}", value),
    }
}

/// `CATEGORY:TYPE:VENDOR`; the type may be empty
fn parse_post(value: &str) -> anyhow::Result<(&str, &str, &str)> {
    let parts: Vec<&str> = value.splitn(3, ':').map(str::trim).collect();
    match parts.as_slice() {
        [category, subtype, vendor] if !category.is_empty() && !vendor.is_empty() => {
            Ok((*category, *subtype, *vendor))
        }
        _ => bail!("후가공은 종류:세부:업체 형식으로 입력해주세요: {}", value),
    }
}
