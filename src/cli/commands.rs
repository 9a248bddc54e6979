//! Command handlers: build the service container and dispatch subcommands.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::SourceFormat;
use crate::cli::args::{Cli, Commands, ConfigCommands, FormatArg, RenderArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{OpKind, CATALOG};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::outline::NodeOutline;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match (&cli.json, &cli.command) {
        (Some(_), Some(_)) => Err(CliError::Usage(
            "`-j` cannot be combined with a subcommand".to_string(),
        )),
        (Some(file), None) => {
            let container = create_container(cli, &RenderArgs::default())?;
            cmd_render(&container, file, None, false, Some(SourceFormat::Json))
        }
        (None, Some(command)) => dispatch(cli, command),
        (None, None) => Err(CliError::Usage(
            "no formula given; use `-j <file>` or a subcommand (see --help)".to_string(),
        )),
    }
}

fn dispatch(cli: &Cli, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Render {
            file,
            output,
            params,
            options,
        } => {
            let container = create_container(cli, options)?;
            let format = options.format.map(SourceFormat::from);
            cmd_render(&container, file, output.as_deref(), *params, format)
        }
        Commands::Batch { files, options } => {
            let container = create_container(cli, options)?;
            let format = options.format.map(SourceFormat::from);
            cmd_batch(&container, files, format, cli.quiet)
        }
        Commands::Ops { name } => cmd_ops(name.as_deref()),
        Commands::Tree { file, format } => {
            let container = create_container(cli, &RenderArgs::default())?;
            cmd_tree(&container, file, *format)
        }
        Commands::Config { command } => {
            let container = create_container(cli, &RenderArgs::default())?;
            cmd_config(&container, &config_dir(cli)?, command)
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "prog2math", &mut io::stdout());
            Ok(())
        }
    }
}

/// Directory searched for the local config: `-C` or the working directory.
fn config_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("resolve current directory", e))),
    }
}

fn create_container(cli: &Cli, options: &RenderArgs) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(&config_dir(cli)?))?;
    let settings = apply_overrides(settings, options);
    debug!("effective settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

/// CLI flags override every config layer; `--external` adds to the configured symbols.
pub fn apply_overrides(mut settings: Settings, options: &RenderArgs) -> Settings {
    let evaluation = &mut settings.evaluation;
    if options.strict {
        evaluation.strict = true;
    }
    if options.labeled {
        evaluation.require_labeled_root = true;
    }
    if let Some(max_depth) = options.max_depth {
        evaluation.max_depth = max_depth;
    }
    for symbol in &options.external {
        if !evaluation.external_symbols.contains(symbol) {
            evaluation.external_symbols.push(symbol.clone());
        }
    }
    if let Some(delimiters) = options.delimiters {
        settings.output.delimiters = delimiters.into();
    }
    settings
}

#[instrument(skip(container))]
fn cmd_render(
    container: &ServiceContainer,
    file: &Path,
    output_path: Option<&Path>,
    params: bool,
    format: Option<SourceFormat>,
) -> CliResult<()> {
    let service = container.render_service();
    let rendering = service.render_file(file, format)?;
    let text = container.settings.output.delimiters.wrap(&rendering.latex);

    match output_path {
        Some(path) => {
            service.write(path, &format!("{text}\n"))?;
            output::action("Wrote", &path.display());
        }
        None => output::info(&text),
    }

    if params {
        output::header("Parameters");
        if rendering.free_symbols.is_empty() {
            output::detail("(none)");
        }
        for symbol in &rendering.free_symbols {
            output::detail(symbol);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_batch(
    container: &ServiceContainer,
    files: &[PathBuf],
    format: Option<SourceFormat>,
    quiet: bool,
) -> CliResult<()> {
    let delimiters = container.settings.output.delimiters;
    let entries = container.render_service().render_many(files, format);

    let mut failed = 0;
    for entry in &entries {
        match &entry.result {
            Ok(rendering) => output::info(&format!(
                "{}: {}",
                entry.path.display(),
                delimiters.wrap(&rendering.latex)
            )),
            Err(e) => {
                failed += 1;
                if !quiet {
                    output::failure(&format!("{}: {}", entry.path.display(), e));
                }
            }
        }
    }

    if failed > 0 {
        return Err(CliError::BatchFailed {
            failed,
            total: entries.len(),
        });
    }
    Ok(())
}

#[instrument]
fn cmd_ops(name: Option<&str>) -> CliResult<()> {
    let Some(name) = name else {
        output::header("Operations");
        for entry in CATALOG {
            output::entry(entry.name, entry.summary);
        }
        return Ok(());
    };

    let entry = OpKind::lookup(name)
        .ok_or_else(|| CliError::InvalidArgs(format!("unknown operation `{name}`")))?;
    output::header(entry.name);
    output::detail(entry.summary);
    if !entry.aliases.is_empty() {
        output::detail(&format!("aliases: {}", entry.aliases.join(", ")));
    }
    output::header("Parameters");
    for param in entry.params {
        let mut line = format!(
            "{} ({}{})",
            param.name,
            param.kind,
            if param.required { "" } else { ", optional" }
        );
        if !param.aliases.is_empty() {
            line.push_str(&format!(", alias {}", param.aliases.join(", ")));
        }
        output::detail(&line);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path, format: Option<FormatArg>) -> CliResult<()> {
    let node = container
        .render_service()
        .load(file, format.map(SourceFormat::from))?;
    output::info(&node.to_outline());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_config(container: &ServiceContainer, dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("Global", &path_status(container, &path)),
                None => output::action("Global", &"(no config directory)"),
            }
            output::action("Local", &path_status(container, &local_config_path(dir)));
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine the global config directory".to_string())
                })?
            } else {
                local_config_path(dir)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .and_then(|()| container.fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("Created {}", path.display()));
            Ok(())
        }
    }
}

fn path_status(container: &ServiceContainer, path: &Path) -> String {
    let status = if container.fs.exists(path) {
        "exists"
    } else {
        "not found"
    };
    format!("{} ({status})", path.display())
}
