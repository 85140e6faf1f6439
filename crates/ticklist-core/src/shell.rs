//! Line-oriented front end. Each input line is one user action; the list is
//! re-rendered whenever the store reports a change.

use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use anyhow::anyhow;
use ticklist_shared::{Icon, TaskDraft};
use tracing::{debug, info};

use crate::app::{Notice, TodoApp};
use crate::commands::{self, parse_icon, resolve_id};
use crate::config::Config;
use crate::error::TodoError;
use crate::persistence::Persistence;
use crate::render::Renderer;

const HELP: &str = "\
commands:
  list [all|completed|pending]   show tasks
  filter all|completed|pending   change the filter
  add NAME... [@icon]            add a task
  edit ID NAME... [@icon]        rename a pending task
  start ID                       stage a task in the form
  submit NAME... [@icon]         submit the form (adds when nothing is staged)
  cancel                         clear the form
  toggle ID                      flip completed
  delete ID                      remove a task
  info ID                        show one task
  theme [dark|light|toggle]      show or set the theme
  color [blue|red|green|yellow]  show or set the accent color
  icons                          list the icon palette
  help                           this text
  quit                           leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(Option<String>),
    Filter(String),
    Add { name: String, icon: Option<String> },
    Edit { id: String, name: String, icon: Option<String> },
    Start(String),
    Submit { name: String, icon: Option<String> },
    Cancel,
    Toggle(String),
    Delete(String),
    Info(String),
    Theme(Option<String>),
    Color(Option<String>),
    Icons,
    Help,
    Quit,
}

/// Splits a line into a command. Words starting with `@` name an icon; the
/// last one wins.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let mut icon = None;
    let mut name_words = Vec::new();
    for word in &rest {
        match word.strip_prefix('@') {
            Some(raw) if !raw.is_empty() => icon = Some(raw.to_string()),
            _ => name_words.push(*word),
        }
    }

    let first = |what: &str| {
        rest.first()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("{verb} needs {what}"))
    };
    let optional = || rest.first().map(|s| s.to_string());

    let command = match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShellCommand::List(optional()),
        "filter" => ShellCommand::Filter(first("a filter name")?),
        "add" => ShellCommand::Add {
            name: name_words.join(" "),
            icon,
        },
        "edit" => {
            let Some((id, name)) = name_words.split_first() else {
                return Err(anyhow!("{verb} needs a task id"));
            };
            ShellCommand::Edit {
                id: id.to_string(),
                name: name.join(" "),
                icon,
            }
        }
        "start" => ShellCommand::Start(first("a task id")?),
        "submit" => ShellCommand::Submit {
            name: name_words.join(" "),
            icon,
        },
        "cancel" => ShellCommand::Cancel,
        "toggle" | "done" => ShellCommand::Toggle(first("a task id")?),
        "delete" | "rm" => ShellCommand::Delete(first("a task id")?),
        "info" => ShellCommand::Info(first("a task id")?),
        "theme" => ShellCommand::Theme(optional()),
        "color" => ShellCommand::Color(optional()),
        "icons" => ShellCommand::Icons,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(anyhow!("unknown command {other} (try `help`)")),
    };
    Ok(Some(command))
}

#[tracing::instrument(skip_all, fields(interactive = interactive))]
pub async fn run_shell<P, R>(
    app: &mut TodoApp<P>,
    cfg: &Config,
    renderer: &mut Renderer,
    input: R,
    interactive: bool,
) -> anyhow::Result<()>
where
    P: Persistence,
    R: BufRead,
{
    let dirty = Rc::new(Cell::new(false));
    let subscription = {
        let dirty = Rc::clone(&dirty);
        app.subscribe(move |event| {
            debug!(?event, "store changed");
            dirty.set(true);
        })
    };
    debug!(config_files = cfg.loaded_files.len(), "shell started");

    commands::cmd_list(app, renderer, None)?;
    let mut lines = input.lines();
    loop {
        if interactive {
            let mut out = io::stdout().lock();
            write!(out, "> ")?;
            out.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                renderer.print_notice(&Notice::error(err.to_string()))?;
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }

        if let Err(err) = run_one(app, renderer, command).await {
            renderer.print_notice(&notice_for(&err))?;
        }

        if dirty.replace(false) {
            commands::cmd_list(app, renderer, None)?;
        }
    }

    app.unsubscribe(subscription);
    info!("shell finished");
    Ok(())
}

fn notice_for(err: &anyhow::Error) -> Notice {
    match err.downcast_ref::<TodoError>() {
        Some(err) => Notice::from_error(err),
        None => Notice::error(format!("{err:#}")),
    }
}

async fn run_one<P: Persistence>(
    app: &mut TodoApp<P>,
    renderer: &mut Renderer,
    command: ShellCommand,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::List(filter) => commands::cmd_list(app, renderer, filter.as_deref()),
        ShellCommand::Filter(filter) => commands::cmd_list(app, renderer, Some(&filter)),
        ShellCommand::Add { name, icon } => commands::cmd_add(app, renderer, &name, icon.as_deref()).await,
        ShellCommand::Edit { id, name, icon } => {
            commands::cmd_edit(app, renderer, &id, &name, icon.as_deref()).await
        }
        ShellCommand::Start(raw_id) => {
            let id = resolve_id(app.store(), &raw_id)?;
            app.start_edit(&id)?;
            renderer.print_session(app.session())
        }
        ShellCommand::Submit { name, icon } => {
            let icon: Option<Icon> = parse_icon(icon.as_deref())?;
            let creating = app.session().is_idle();
            app.submit(TaskDraft::new(name, icon)).await?;
            let notice = if creating { Notice::added() } else { Notice::updated() };
            renderer.print_notice(&notice)
        }
        ShellCommand::Cancel => {
            app.cancel_edit();
            renderer.print_session(app.session())
        }
        ShellCommand::Toggle(id) => commands::cmd_toggle(app, renderer, &id).await,
        ShellCommand::Delete(id) => commands::cmd_delete(app, renderer, &id).await,
        ShellCommand::Info(id) => commands::cmd_info(app, renderer, &id),
        ShellCommand::Theme(mode) => commands::cmd_theme(app, renderer, mode.as_deref()),
        ShellCommand::Color(color) => commands::cmd_color(app, renderer, color.as_deref()),
        ShellCommand::Icons => renderer.print_palette(),
        ShellCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}
