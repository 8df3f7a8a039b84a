//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Category trees from parenthesized notation, with prefix counting of questions
#[derive(Parser, Debug)]
#[command(name = "qtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, env = "QTREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer the queries of a batch document (stdin if no file given)
    Run {
        /// Batch document
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Show a category tree
    Tree {
        /// Tree notation, e.g. "Animals ( Birds Mammals )"
        notation: String,
    },

    /// Validate notation and print its canonical form
    Check {
        /// Tree notation
        notation: String,
    },

    /// Count questions in a category's subtree starting with a prefix
    Count {
        /// Tree notation
        notation: String,
        /// Category whose subtree is searched
        category: String,
        /// Prefix the questions must start with
        #[arg(default_value = "")]
        prefix: String,
        /// Question to attach, as "<category>: <text>" (repeatable)
        #[arg(short, long = "item", value_name = "CATEGORY: TEXT")]
        items: Vec<String>,
        /// Also print the matching questions
        #[arg(short, long)]
        list: bool,
    },

    /// List leaf categories with their path from the root
    Leaves {
        /// Tree notation
        notation: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented template config
    Template,
    /// Show the global config file location
    Path,
}
