use std::io::{self, Read};
use std::path::Path;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::BatchRunner;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{parse_tree, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Run { input }) => _run(cli, input.as_deref()),
        Some(Commands::Tree { notation }) => _tree(notation),
        Some(Commands::Check { notation }) => _check(notation),
        Some(Commands::Count {
            notation,
            category,
            prefix,
            items,
            list,
        }) => _count(cli, notation, category, prefix, items, *list),
        Some(Commands::Leaves { notation }) => _leaves(notation),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "qtree", &mut io::stdout());
            Ok(())
        }
        None => Cli::command()
            .print_help()
            .map_err(|e| CliError::io("print help", e)),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    Ok(Settings::load(cli.config.as_deref())?)
}

#[instrument(skip(cli))]
fn _run(cli: &Cli, input: Option<&Path>) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let runner = BatchRunner::new(&settings);
    let answers = match input {
        Some(path) => runner.run_file(path)?,
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| CliError::io("read stdin", e))?;
            runner.run_str(&content)?
        }
    };
    debug!(answers = answers.len(), "batch complete");
    for answer in answers {
        output::info(&answer);
    }
    Ok(())
}

#[instrument]
fn _tree(notation: &str) -> CliResult<()> {
    let tree = parse_tree(notation)?;
    output::info(&tree.to_tree_string());
    Ok(())
}

#[instrument]
fn _check(notation: &str) -> CliResult<()> {
    let tree = parse_tree(notation)?;
    output::success(&format!(
        "{} categories, depth {}",
        tree.len(),
        tree.depth()
    ));
    output::info(&tree);
    Ok(())
}

#[instrument(skip(cli))]
fn _count(
    cli: &Cli,
    notation: &str,
    category: &str,
    prefix: &str,
    items: &[String],
    list: bool,
) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let mut tree = parse_tree(notation)?;
    for item in items {
        let (name, text) = item
            .split_once(settings.item_separator.as_str())
            .ok_or_else(|| {
                CliError::InvalidArgs(format!(
                    "item '{}' is not of the form '<category>{}<text>'",
                    item, settings.item_separator
                ))
            })?;
        tree.add_item(name, text)?;
    }

    output::info(&tree.count_with_prefix(category, prefix)?);
    if list {
        for text in tree.matching_items(category, prefix)? {
            output::detail(text);
        }
    }
    Ok(())
}

#[instrument]
fn _leaves(notation: &str) -> CliResult<()> {
    let tree = parse_tree(notation)?;
    for leaf in tree.leaf_names() {
        let path = tree.path_to(leaf)?;
        output::info(&path.iter().rev().join(" <- "));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::header("Effective configuration");
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
    }
    Ok(())
}
