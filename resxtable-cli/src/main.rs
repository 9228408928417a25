mod edit;
mod rules;
mod validation;
mod view;

use clap::{Parser, Subcommand};
use resxtable::Configuration;
use tracing_subscriber::EnvFilter;

use crate::{
    edit::{
        run_dedupe_command, run_remove_command, run_rename_command, run_set_command,
        run_sort_command,
    },
    rules::print_rules,
    validation::validate_file_path,
    view::run_view_command,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (duplicate key handling, sorting, code reference rules)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the string entries of a resource file.
    View {
        /// The resource file to view
        #[arg(short, long)]
        input: String,

        /// Display full values without truncation
        #[arg(long)]
        full: bool,
    },

    /// Set the value and/or comment of a key, adding the key if needed.
    Set {
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        value: Option<String>,

        #[arg(short, long)]
        comment: Option<String>,

        /// Treat the file as the neutral language (emptied entries are kept)
        #[arg(long)]
        neutral: bool,
    },

    /// Rename a key.
    Rename {
        #[arg(short, long)]
        input: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,
    },

    /// Remove a key.
    Remove {
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        key: String,
    },

    /// Sort the entries of a resource file by key and save it.
    Sort {
        #[arg(short, long)]
        input: String,

        /// ordinal, ordinalIgnoreCase, culture, cultureIgnoreCase,
        /// invariantCulture or invariantCultureIgnoreCase
        #[arg(long)]
        comparison: Option<String>,
    },

    /// Rename duplicate keys to `<key>_Duplicate[n]` and save.
    Dedupe {
        #[arg(short, long)]
        input: String,
    },

    /// Print the code reference rules.
    Rules {
        /// Print the rules as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_configuration(path: &Option<String>) -> Result<Configuration, String> {
    match path {
        Some(path) => {
            validate_file_path(path)?;
            Configuration::read_from(path)
                .map_err(|e| format!("Failed to read configuration {}: {}", path, e))
        }
        None => Ok(Configuration::default()),
    }
}

fn run(args: Args) -> Result<(), String> {
    let config = load_configuration(&args.config)?;

    match args.commands {
        Commands::View { input, full } => run_view_command(&input, config, full),
        Commands::Set {
            input,
            key,
            value,
            comment,
            neutral,
        } => run_set_command(&input, config, &key, value, comment, neutral),
        Commands::Rename { input, from, to } => run_rename_command(&input, config, &from, &to),
        Commands::Remove { input, key } => run_remove_command(&input, config, &key),
        Commands::Sort { input, comparison } => run_sort_command(&input, config, comparison),
        Commands::Dedupe { input } => run_dedupe_command(&input, config),
        Commands::Rules { json } => print_rules(&config.code_references, json),
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
