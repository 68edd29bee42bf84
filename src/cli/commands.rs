//! Command dispatch: the CLI acts as host application for filter documents.
//!
//! Edits load the document, hand it to a [`FilterControl`] as props and
//! persist whatever replacement tree the control reports.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::{FilterControl, FilterControlProps, LatestValue};
use crate::cli::args::{CatalogCommands, Cli, Commands, ConfigCommands, EditCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{render, validate, Catalog, Edit, FilterValue, NodeKey, Target};
use crate::infrastructure::{filter_to_json, DocumentStore, InfraError};

/// Shared state for one command invocation.
struct Context {
    settings: Settings,
    store: DocumentStore,
    catalog_override: Option<PathBuf>,
    dry_run: bool,
}

impl Context {
    fn catalog_path(&self) -> CliResult<&Path> {
        self.catalog_override
            .as_deref()
            .or(self.settings.catalog.as_deref())
            .ok_or_else(|| {
                CliError::Usage(
                    "no catalog: pass --catalog or set `catalog` in .filterctl.toml".to_string(),
                )
            })
    }

    fn load_catalog(&self) -> CliResult<Catalog> {
        let path = self.catalog_path()?;
        Ok(self.store.load_catalog(path)?)
    }

    /// Persist `tree`, or print it on --dry-run.
    fn write_filter(&self, file: &Path, tree: &FilterValue) -> CliResult<()> {
        if self.dry_run {
            output::info(&filter_to_json(tree, self.settings.pretty)?);
        } else {
            self.store.save_filter(file, tree)?;
        }
        Ok(())
    }
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let settings = Settings::load(Some(cwd.as_path()))?;
    debug!("effective settings: {:?}", settings);

    let ctx = Context {
        store: DocumentStore::default().with_pretty(settings.pretty),
        settings,
        catalog_override: cli.catalog.clone(),
        dry_run: cli.dry_run,
    };

    match &cli.command {
        Some(Commands::New { file, group, force }) => cmd_new(&ctx, file, group, *force),
        Some(Commands::Show { file, captions }) => cmd_show(&ctx, file, *captions),
        Some(Commands::Conditions { file }) => cmd_conditions(&ctx, file),
        Some(Commands::Validate { file }) => cmd_validate(&ctx, file),
        Some(Commands::Catalog { command }) => match command {
            CatalogCommands::Check => cmd_catalog_check(&ctx),
            CatalogCommands::Show => cmd_catalog_show(&ctx),
        },
        Some(Commands::Edit { file, command }) => cmd_edit(&ctx, file, command),
        Some(Commands::Config { command }) => cmd_config(&ctx, command, &cwd),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see `filterctl --help`".to_string(),
        )),
    }
}

#[instrument(skip(ctx))]
fn cmd_new(ctx: &Context, file: &Path, group: &str, force: bool) -> CliResult<()> {
    if ctx.store.exists(file) && !force {
        return Err(CliError::InvalidArgs(format!(
            "{} already exists (use --force to overwrite)",
            file.display()
        )));
    }
    // Without a catalog the group cannot be checked yet; `validate` will.
    if let Ok(path) = ctx.catalog_path() {
        let catalog = ctx.store.load_catalog(path)?;
        if catalog.group(group).is_none() {
            return Err(CliError::InvalidArgs(format!("unknown group: {group}")));
        }
    }

    let tree = FilterValue::new(group);
    ctx.write_filter(file, &tree)?;
    if !ctx.dry_run {
        output::action("Created", &file.display());
    }
    Ok(())
}

#[instrument(skip(ctx))]
fn cmd_show(ctx: &Context, file: &Path, captions: bool) -> CliResult<()> {
    let tree = ctx.store.load_filter(file)?;
    let catalog = if captions {
        Some(ctx.load_catalog()?)
    } else {
        None
    };
    output::info(&render(&tree, catalog.as_ref()));
    Ok(())
}

#[instrument(skip(ctx))]
fn cmd_conditions(ctx: &Context, file: &Path) -> CliResult<()> {
    let tree = ctx.store.load_filter(file)?;
    for (path, condition) in tree.conditions() {
        output::info(&format!(
            "{}\t{}\t{} {} {}",
            path, condition.key, condition.field, condition.operator, condition.value
        ));
    }
    Ok(())
}

#[instrument(skip(ctx))]
fn cmd_validate(ctx: &Context, file: &Path) -> CliResult<()> {
    let catalog = ctx.load_catalog()?;
    let tree = ctx.store.load_filter(file)?;
    let report = validate(&tree, &catalog, &ctx.settings.limits());

    if report.is_valid() {
        output::success(&format!(
            "{}: valid ({} condition(s), depth {})",
            file.display(),
            tree.conditions().len(),
            tree.depth()
        ));
        return Ok(());
    }

    output::header(&format!("{}: {} violation(s)", file.display(), report.len()));
    for violation in report.iter() {
        output::failure(violation);
    }
    Err(CliError::Validation(report))
}

#[instrument(skip(ctx))]
fn cmd_catalog_check(ctx: &Context) -> CliResult<()> {
    let path = ctx.catalog_path()?;
    // load_catalog rejects duplicate names
    let catalog = ctx.store.load_catalog(path)?;
    output::success(&format!(
        "{}: {} field(s), {} group(s)",
        path.display(),
        catalog.fields.len(),
        catalog.effective_groups().len()
    ));
    Ok(())
}

#[instrument(skip(ctx))]
fn cmd_catalog_show(ctx: &Context) -> CliResult<()> {
    let catalog = ctx.load_catalog()?;
    output::header("Fields");
    for field in &catalog.fields {
        output::info(&format!("{} ({})", field.name, field.caption));
        for operator in &field.operators {
            output::detail(&format!(
                "{} ({}) value: {}",
                operator.name, operator.caption, operator.value
            ));
        }
    }
    output::header("Groups");
    for group in catalog.effective_groups().iter() {
        output::info(&format!("{} ({})", group.name, group.caption));
    }
    Ok(())
}

#[instrument(skip(ctx, command))]
fn cmd_edit(ctx: &Context, file: &Path, command: &EditCommands) -> CliResult<()> {
    let props = FilterControlProps {
        catalog: ctx.load_catalog()?,
        filter_value: ctx.store.load_filter(file)?,
    };
    let mut control = FilterControl::new(props, LatestValue::default())
        .with_policy(ctx.settings.validation)
        .with_key_style(ctx.settings.key_style)
        .with_limits(ctx.settings.limits());

    let mut added: Option<NodeKey> = None;
    let report = match command {
        EditCommands::AddCondition {
            parent,
            field,
            operator,
            value,
        } => {
            let key = control.add_condition_with(
                Target::from(parent.clone()),
                field,
                operator.as_deref(),
                value.clone(),
            )?;
            added = Some(key);
            None
        }
        EditCommands::AddGroup { parent, group } => {
            let key = control.add_group(Target::from(parent.clone()), group.as_deref())?;
            added = Some(key);
            None
        }
        EditCommands::Remove { key } => Some(control.remove(key)?),
        EditCommands::SetField { key, field } => Some(control.dispatch(Edit::SetField {
            key: key.clone(),
            field: field.clone(),
        })?),
        EditCommands::SetOperator { key, operator } => {
            Some(control.dispatch(Edit::SetOperator {
                key: key.clone(),
                operator: operator.clone(),
            })?)
        }
        EditCommands::SetValue { key, value } => Some(control.dispatch(Edit::SetValue {
            key: key.clone(),
            value: value.clone(),
        })?),
        EditCommands::SetGroup { key, group } => Some(control.dispatch(Edit::SetGroupName {
            target: Target::from(key.clone()),
            group_name: group.clone(),
        })?),
    };

    if let Some(report) = report {
        for violation in report.iter() {
            output::warning(violation);
        }
    }

    let Some(next) = control.into_listener().take() else {
        return Ok(());
    };
    ctx.write_filter(file, &next)?;
    if !ctx.dry_run {
        match added {
            Some(key) => output::action("Added", &format!("{key} to {}", file.display())),
            None => output::action("Updated", &file.display()),
        }
    }
    Ok(())
}

fn cmd_config(ctx: &Context, command: &ConfigCommands, cwd: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&ctx.settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path(cwd).display());
        }
    }
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
