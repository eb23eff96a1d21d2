use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use csfkit_cli::{
    CsfOptions, Mode, Role,
    convert::{run_convert_command, run_view_command},
    label_check::run_label_check_command,
    translate::{OutputPaths, run_translate_command},
    watch::{run_watch_command, run_watch_set_command, run_watch_show_command},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,

    #[command(flatten)]
    csf: CsfArgs,
}

/// Windows-1252 switches applied whenever a .csf file is read or written.
#[derive(ClapArgs, Debug, Clone, Copy)]
struct CsfArgs {
    /// Keep C1 control characters in .csf values instead of reading them as Windows-1252
    #[arg(long, global = true)]
    no_cp1252_read_workaround: bool,

    /// Store Windows-1252 characters as C1 control characters when writing .csf
    #[arg(long, global = true)]
    cp1252_write_workaround: bool,
}

impl CsfArgs {
    fn options(self) -> CsfOptions {
        CsfOptions {
            read_1252_workaround: !self.no_cp1252_read_workaround,
            write_1252_workaround: self.cp1252_write_workaround,
        }
    }
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert string tables between .csf, .ini, .yaml and .json.
    Convert {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// The output file to write the results to
        #[arg(short, long)]
        output: String,
    },

    /// View a string table.
    View {
        /// The input file to view
        #[arg(short, long)]
        input: String,

        /// Only show labels containing this text
        #[arg(short, long)]
        label: Option<String>,

        /// Display full value without truncation
        #[arg(long)]
        full: bool,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start a translation package from an upstream table.
    New {
        #[arg(short, long)]
        upstream: String,
        /// The work file to write (.ini)
        #[arg(short, long)]
        output: String,
    },

    /// Align a translation with the upstream label set.
    Tile {
        #[arg(short, long)]
        upstream: String,
        #[arg(short, long)]
        translated: String,
        /// The work file to write (.ini)
        #[arg(short, long)]
        output: String,
    },

    /// Carry a translation over to a new upstream release.
    Update {
        #[arg(long)]
        old_upstream: String,
        #[arg(long)]
        new_upstream: String,
        #[arg(long)]
        old_translated: String,
        /// The work file to write (.ini)
        #[arg(short, long)]
        output: String,
    },

    /// Compile a deployable table: translated values win over upstream ones.
    Override {
        #[arg(short, long)]
        upstream: String,
        #[arg(short, long)]
        translated: String,
        /// The table to write, in any format
        #[arg(short, long)]
        output: String,
    },

    /// Check an updated translation against both upstream releases.
    UpdateCheck {
        #[arg(long)]
        old_upstream: String,
        #[arg(long)]
        new_upstream: String,
        #[arg(long)]
        old_translated: String,
        #[arg(long)]
        new_translated: String,
        /// The annotated work file to write (.ini)
        #[arg(short, long)]
        output: String,
        /// Also write the checked table here
        #[arg(long)]
        table_output: Option<String>,
    },

    /// Add placeholders for labels used by map files but missing from a table.
    LabelCheck {
        #[arg(short, long)]
        input: String,
        /// Folder searched recursively for .map and .ypr files
        #[arg(short, long)]
        maps: String,
        #[arg(short, long)]
        output: String,
    },

    /// Recompile .csf files whenever their sources change.
    Watch {
        /// Use this configuration file instead of the one in the user config directory
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: WatchCommands,
    },
}

#[derive(Subcommand, Debug)]
enum WatchCommands {
    /// Watch every configured source until interrupted.
    Run,
    /// Replace the configuration with `source,target` lines.
    Set {
        /// Configuration text; one `source,target` pair per line
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the configuration text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the saved configuration.
    Show,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn output(path: String) -> OutputPaths {
    OutputPaths {
        output: path,
        table_output: None,
    }
}

fn run_watch_set(
    config: Option<PathBuf>,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), String> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(file)) => std::fs::read_to_string(&file)
            .map_err(|e| format!("Failed to read {}: {e}", file.display()))?,
        (None, None) => return Err("Provide the configuration with --text or --file".to_string()),
    };
    run_watch_set_command(config, &text)
}

fn main() {
    init_tracing();
    let args = Args::parse();
    let options = args.csf.options();

    let result = match args.commands {
        Commands::Convert { input, output } => run_convert_command(&input, &output, &options),
        Commands::View {
            input,
            label,
            full,
            json,
        } => run_view_command(&input, label.as_deref(), full, json, &options),
        Commands::New {
            upstream,
            output: out,
        } => run_translate_command(
            Mode::New,
            &[(Role::NewUpstream, upstream.as_str())],
            &output(out),
            &options,
        ),
        Commands::Tile {
            upstream,
            translated,
            output: out,
        } => run_translate_command(
            Mode::Tile,
            &[
                (Role::NewUpstream, upstream.as_str()),
                (Role::OldTranslated, translated.as_str()),
            ],
            &output(out),
            &options,
        ),
        Commands::Update {
            old_upstream,
            new_upstream,
            old_translated,
            output: out,
        } => run_translate_command(
            Mode::Update,
            &[
                (Role::OldUpstream, old_upstream.as_str()),
                (Role::NewUpstream, new_upstream.as_str()),
                (Role::OldTranslated, old_translated.as_str()),
            ],
            &output(out),
            &options,
        ),
        Commands::Override {
            upstream,
            translated,
            output: out,
        } => run_translate_command(
            Mode::Override,
            &[
                (Role::NewUpstream, upstream.as_str()),
                (Role::OldTranslated, translated.as_str()),
            ],
            &output(out),
            &options,
        ),
        Commands::UpdateCheck {
            old_upstream,
            new_upstream,
            old_translated,
            new_translated,
            output: out,
            table_output,
        } => run_translate_command(
            Mode::UpdateCheck,
            &[
                (Role::OldUpstream, old_upstream.as_str()),
                (Role::NewUpstream, new_upstream.as_str()),
                (Role::OldTranslated, old_translated.as_str()),
                (Role::NewTranslated, new_translated.as_str()),
            ],
            &OutputPaths {
                output: out,
                table_output,
            },
            &options,
        ),
        Commands::LabelCheck {
            input,
            maps,
            output: out,
        } => run_label_check_command(&input, &maps, &out, &options),
        Commands::Watch { config, command } => match command {
            WatchCommands::Run => run_watch_command(config, options),
            WatchCommands::Set { text, file } => run_watch_set(config, text, file),
            WatchCommands::Show => run_watch_show_command(config),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
