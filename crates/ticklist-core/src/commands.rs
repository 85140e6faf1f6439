use std::io::{self, IsTerminal};

use anyhow::anyhow;
use ticklist_shared::{Filter, Icon, TaskDraft, TaskId, ThemeColor, ThemeMode};
use tracing::{debug, instrument};

use crate::app::{Notice, TodoApp};
use crate::cli::Command;
use crate::config::Config;
use crate::error::TodoError;
use crate::persistence::Persistence;
use crate::render::Renderer;
use crate::shell;
use crate::store::TaskStore;

#[instrument(skip_all, fields(command = ?command))]
pub async fn dispatch<P: Persistence>(
    app: &mut TodoApp<P>,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::List { filter } => cmd_list(app, renderer, Some(&filter)),
        Command::Add { name, icon } => cmd_add(app, renderer, &name.join(" "), icon.as_deref()).await,
        Command::Edit { id, name, icon } => {
            cmd_edit(app, renderer, &id, &name.join(" "), icon.as_deref()).await
        }
        Command::Toggle { id } => cmd_toggle(app, renderer, &id).await,
        Command::Delete { id } => cmd_delete(app, renderer, &id).await,
        Command::Info { id } => cmd_info(app, renderer, &id),
        Command::Theme { mode } => cmd_theme(app, renderer, mode.as_deref()),
        Command::Color { color } => cmd_color(app, renderer, color.as_deref()),
        Command::Icons => renderer.print_palette(),
        Command::Config => renderer.print_pairs(cfg.iter()),
        Command::Shell => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            shell::run_shell(app, cfg, renderer, stdin.lock(), interactive).await
        }
    }
}

/// Resolves an exact id or a unique id prefix.
pub fn resolve_id(store: &TaskStore, raw: &str) -> anyhow::Result<TaskId> {
    let raw = raw.trim();
    let exact = TaskId::new(raw);
    if store.get(&exact).is_some() {
        return Ok(exact);
    }

    let mut matches = store
        .list()
        .iter()
        .filter(|task| !raw.is_empty() && task.id.as_str().starts_with(raw));
    let Some(first) = matches.next() else {
        return Err(TodoError::NotFound(exact).into());
    };
    let rest = matches.count();
    if rest > 0 {
        return Err(anyhow!("ambiguous id prefix {raw}: matches {} tasks", rest + 1));
    }
    debug!(prefix = raw, id = %first.id, "resolved id prefix");
    Ok(first.id.clone())
}

pub fn parse_icon(raw: Option<&str>) -> anyhow::Result<Option<Icon>> {
    raw.map(|raw| {
        Icon::parse(raw).ok_or_else(|| anyhow!("unknown icon {raw} (run `ticklist icons` for the palette)"))
    })
    .transpose()
}

pub fn cmd_list<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &Renderer,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(name) = filter {
        app.set_filter(Filter::from_name(name));
    }
    renderer.print_task_list(&app.visible(), app.filter(), app.counts())
}

pub async fn cmd_add<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &Renderer,
    name: &str,
    icon: Option<&str>,
) -> anyhow::Result<()> {
    let icon = parse_icon(icon)?;
    let task = app.create(TaskDraft::new(name, icon)).await?;
    debug!(id = %task.id, "task added");
    renderer.print_notice(&Notice::added())
}

/// One-shot edit: stages the task and submits the new values in one go.
pub async fn cmd_edit<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &Renderer,
    raw_id: &str,
    name: &str,
    icon: Option<&str>,
) -> anyhow::Result<()> {
    let id = resolve_id(app.store(), raw_id)?;
    let icon = parse_icon(icon)?;
    app.start_edit(&id)?;
    let result = app.submit(TaskDraft::new(name, icon)).await;
    if result.is_err() {
        app.cancel_edit();
    }
    result?;
    renderer.print_notice(&Notice::updated())
}

pub async fn cmd_toggle<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &Renderer,
    raw_id: &str,
) -> anyhow::Result<()> {
    let id = resolve_id(app.store(), raw_id)?;
    let task = app.toggle(&id).await?;
    renderer.print_notice(&Notice::toggled(&task))
}

pub async fn cmd_delete<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &Renderer,
    raw_id: &str,
) -> anyhow::Result<()> {
    let id = resolve_id(app.store(), raw_id)?;
    app.delete(&id).await?;
    renderer.print_notice(&Notice::deleted())
}

pub fn cmd_info<P: Persistence>(app: &TodoApp<P>, renderer: &Renderer, raw_id: &str) -> anyhow::Result<()> {
    let id = resolve_id(app.store(), raw_id)?;
    let task = app.store().get(&id).ok_or_else(|| TodoError::NotFound(id.clone()))?;
    renderer.print_task_info(task)
}

pub fn cmd_theme<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &mut Renderer,
    mode: Option<&str>,
) -> anyhow::Result<()> {
    match mode.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
        None => {}
        Some("toggle") => {
            app.toggle_theme()?;
        }
        Some("dark") => app.set_theme(ThemeMode::Dark)?,
        Some("light") => app.set_theme(ThemeMode::Light)?,
        Some(other) => return Err(anyhow!("unknown theme {other} (expected dark, light, or toggle)")),
    }
    renderer.set_preferences(app.preferences());
    renderer.print_preferences()
}

pub fn cmd_color<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &mut Renderer,
    color: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(raw) = color {
        let color = ThemeColor::parse(raw).ok_or_else(|| {
            let known: Vec<_> = ThemeColor::ALL.iter().map(|c| c.storage_value()).collect();
            anyhow!("unknown color {raw} (expected one of {})", known.join(", "))
        })?;
        app.set_color(color)?;
    }
    renderer.set_preferences(app.preferences());
    renderer.print_preferences()
}
