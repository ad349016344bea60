//! Command dispatch: one function per subcommand, plus the interactive loop.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};

use curator_catalog::Upload;
use curator_export::ExportSummary;
use curator_session::{InMemorySessionStore, Session, SessionStore};

use crate::config::{Command, Inputs};
use crate::presenter::TextPresenter;

const HELP: &str = "commands: list | select HANDLE | deselect HANDLE | selected | clear | reload | export | help | quit";

pub fn run<R: BufRead, W: Write>(command: Command, input: R, mut out: W) -> anyhow::Result<()> {
    tracing::debug!(?command, "running command");
    match command {
        Command::Browse { inputs, json } => browse(&inputs, json, out),
        Command::Export {
            inputs,
            select,
            output,
        } => {
            export_selected(&inputs, &select, &output.output_dir, local_now(), &mut out)?;
            Ok(())
        }
        Command::Interactive { inputs, output } => {
            interactive(&inputs, &output.output_dir, input, out, local_now)
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn read_products(inputs: &Inputs) -> anyhow::Result<Vec<Upload>> {
    inputs
        .products
        .iter()
        .map(|path| Upload::from_path(path).with_context(|| format!("reading {}", path.display())))
        .collect()
}

fn read_inventory(inputs: &Inputs) -> anyhow::Result<Upload> {
    Upload::from_path(&inputs.inventory)
        .with_context(|| format!("reading {}", inputs.inventory.display()))
}

/// Read every input file from disk and hand the uploads to the session.
pub fn upload<S: SessionStore>(session: &mut Session<S>, inputs: &Inputs) -> anyhow::Result<()> {
    let products = read_products(inputs)?;
    session
        .on_products_uploaded(&products)
        .context("loading product files")?;

    let inventory = read_inventory(inputs)?;
    session
        .on_inventory_uploaded(&inventory)
        .context("loading inventory file")?;
    Ok(())
}

/// Upload for the interactive loop, where the session keeps running.
///
/// Files that cannot be read are reported here. Uploads the session rejects
/// are queued as notices, which the next render shows.
fn upload_reporting<S, W>(session: &mut Session<S>, inputs: &Inputs, presenter: &mut TextPresenter<W>)
where
    S: SessionStore,
    W: Write,
{
    match read_products(inputs) {
        Ok(products) => {
            let _ = session.on_products_uploaded(&products);
        }
        Err(err) => presenter.line(format!("error: {err:#}")),
    }
    match read_inventory(inputs) {
        Ok(inventory) => {
            let _ = session.on_inventory_uploaded(&inventory);
        }
        Err(err) => presenter.line(format!("error: {err:#}")),
    }
}

pub fn open_session(inputs: &Inputs) -> anyhow::Result<Session<InMemorySessionStore>> {
    let mut session = Session::new(InMemorySessionStore::new())?;
    upload(&mut session, inputs)?;
    Ok(session)
}

pub fn browse<W: Write>(inputs: &Inputs, json: bool, mut out: W) -> anyhow::Result<()> {
    let mut session = open_session(inputs)?;

    if json {
        let view = session.view()?;
        tracing::info!(
            groups = view.groups().len(),
            merged_rows = view.merged_rows(),
            duplicate_skus = view.duplicate_skus().len(),
            "writing catalog as JSON"
        );
        serde_json::to_writer_pretty(&mut out, view.groups()).context("writing groups as JSON")?;
        writeln!(out)?;
        return Ok(());
    }

    let mut presenter = TextPresenter::new(out);
    session.render(&mut presenter)?;
    presenter.finish().context("writing to stdout")?;
    Ok(())
}

/// Select `handles`, export, and write both files into `output_dir`.
pub fn export_selected<W: Write>(
    inputs: &Inputs,
    handles: &[String],
    output_dir: &Path,
    now: NaiveDateTime,
    out: &mut W,
) -> anyhow::Result<ExportSummary> {
    let mut session = open_session(inputs)?;
    for handle in handles {
        session
            .on_toggle(handle.as_str(), true)
            .with_context(|| format!("selecting '{handle}'"))?;
    }

    let bundle = session.on_export(now)?;
    let (products_path, inventory_path) = bundle
        .write_to_dir(output_dir)
        .with_context(|| format!("writing exports to {}", output_dir.display()))?;

    if handles.is_empty() {
        writeln!(out, "no products selected; export files contain headers only")?;
    }
    writeln!(out, "wrote {} ({} rows)", products_path.display(), bundle.products.rows)?;
    writeln!(out, "wrote {} ({} rows)", inventory_path.display(), bundle.inventory.rows)?;

    Ok(bundle.summary())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    List,
    Select(String),
    Deselect(String),
    Selected,
    Clear,
    Reload,
    Export,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Action {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match (verb, arg) {
            ("", _) => Action::Empty,
            ("list" | "ls", _) => Action::List,
            ("select" | "sel", h) if !h.is_empty() => Action::Select(h.to_string()),
            ("deselect" | "unsel", h) if !h.is_empty() => Action::Deselect(h.to_string()),
            ("selected", _) => Action::Selected,
            ("clear", _) => Action::Clear,
            ("reload", _) => Action::Reload,
            ("export", _) => Action::Export,
            ("help" | "?", _) => Action::Help,
            ("quit" | "exit" | "q", _) => Action::Quit,
            _ => Action::Unknown(line.to_string()),
        }
    }
}

/// Interactive curation loop: one stdin line is one operator action.
///
/// Handler errors are reported and the loop continues; only IO failures on
/// stdin/stdout end it.
pub fn interactive<R, W, C>(
    inputs: &Inputs,
    output_dir: &Path,
    input: R,
    out: W,
    clock: C,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
    C: Fn() -> NaiveDateTime,
{
    let mut session = Session::new(InMemorySessionStore::new())?;
    let mut presenter = TextPresenter::new(out);

    upload_reporting(&mut session, inputs, &mut presenter);
    session.render(&mut presenter)?;
    presenter.line(HELP);
    presenter.finish().context("writing to stdout")?;

    for line in input.lines() {
        let line = line.context("reading stdin")?;

        match Action::parse(&line) {
            Action::Empty => {}
            Action::Quit => break,
            Action::Help => presenter.line(HELP),
            Action::List => session.render(&mut presenter)?,
            Action::Select(handle) => match session.on_toggle(handle.as_str(), true) {
                Ok(true) => presenter.line(format!("selected {handle}")),
                Ok(false) => presenter.line(format!("{handle} was already selected")),
                Err(err) => presenter.line(format!("error: {err}")),
            },
            Action::Deselect(handle) => match session.on_toggle(handle.as_str(), false) {
                Ok(true) => presenter.line(format!("deselected {handle}")),
                Ok(false) => presenter.line(format!("{handle} was not selected")),
                Err(err) => presenter.line(format!("error: {err}")),
            },
            Action::Selected => {
                let all = session.selection().all();
                if all.is_empty() {
                    presenter.line("nothing selected");
                } else {
                    let list: Vec<_> = all.iter().map(|h| h.as_str()).collect();
                    presenter.line(list.join(", "));
                }
                let stale = session.stale_selections();
                if !stale.is_empty() {
                    let list: Vec<_> = stale.iter().map(|h| h.as_str()).collect();
                    presenter.line(format!("not in current products: {}", list.join(", ")));
                }
            }
            Action::Clear => match session.clear_selection() {
                Ok(()) => presenter.line("selection cleared"),
                Err(err) => presenter.line(format!("error: {err}")),
            },
            Action::Reload => {
                upload_reporting(&mut session, inputs, &mut presenter);
                session.render(&mut presenter)?;
            }
            Action::Export => {
                let result = session
                    .on_export(clock())
                    .and_then(|bundle| bundle.write_to_dir(output_dir).map(|paths| (bundle, paths)));
                match result {
                    Ok((bundle, (products_path, inventory_path))) => {
                        if bundle.products.rows == 0 {
                            presenter.line("no products selected; export files contain headers only");
                        }
                        presenter.line(format!(
                            "wrote {} ({} rows)",
                            products_path.display(),
                            bundle.products.rows
                        ));
                        presenter.line(format!(
                            "wrote {} ({} rows)",
                            inventory_path.display(),
                            bundle.inventory.rows
                        ));
                    }
                    Err(err) => presenter.line(format!("error: {err}")),
                }
            }
            Action::Unknown(text) => presenter.line(format!("unknown command '{text}'; {HELP}")),
        }

        presenter.finish().context("writing to stdout")?;
    }

    Ok(())
}
