//! Test File Generator CLI
//!
//! Usage:
//!   testgen [OPTIONS] <COMMAND>
//!
//! Commands:
//!   generate <SOURCE>   Write the test file for a component source file
//!   resolve <SOURCE>    Print the exported component name
//!   render              Render the template for a given name and path
//!   config              Show, initialise or locate the settings file
//!   panel               Serve the settings panel protocol on stdin/stdout

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::{Parser, Subcommand};
use tracing::{debug, warn, Level};

use test_file_generator::config::{Overrides, DEFAULT_CONFIG_FILE};
use test_file_generator::panel::run_json_lines;
use test_file_generator::{
    generate, render, render_for, resolve_with_rules, ConfigStore, PanelHost, RuleSet, Settings,
    TemplateVariables, TomlConfigStore,
};

#[derive(Parser)]
#[command(name = "testgen")]
#[command(about = "Generate unit test files for JavaScript/TypeScript components")]
struct Cli {
    /// Settings file (TOML format)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Test file extension, e.g. "spec.ts"
    #[arg(long, global = true)]
    extension: Option<String>,

    /// Test directory, relative to the source file's directory
    #[arg(long, global = true)]
    test_dir: Option<String>,

    /// Template file to render instead of the configured template
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Also accept `export function Foo` / `export class Foo` as the component
    #[arg(long, global = true)]
    permissive: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the test file for a component source file
    Generate {
        source: PathBuf,

        /// Open the generated file in $VISUAL or $EDITOR
        #[arg(long, conflicts_with = "stdout")]
        open: bool,

        /// Print the test file instead of writing it
        #[arg(long)]
        stdout: bool,
    },
    /// Print the name the component is exported under
    Resolve { source: PathBuf },
    /// Render the template for a component name and import path
    Render {
        #[arg(long)]
        name: String,

        #[arg(long)]
        path: String,
    },
    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Serve the settings panel protocol as JSON lines on stdin/stdout
    Panel,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Write the default settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the settings file location
    Path,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut store = TomlConfigStore::new(&cli.config);

    match &cli.command {
        Commands::Generate {
            source,
            open,
            stdout,
        } => {
            let settings = settings(&cli, &store);
            if *stdout {
                let text = read_source(source);
                match render_for(&text, source, &settings) {
                    Ok(generated) => print!("{}", generated.content),
                    Err(e) => exit_with(e.report()),
                }
                return;
            }

            let generated = generate(source, &settings).unwrap_or_else(|e| exit_with(e.report()));
            println!("{}", generated.plan.test_file.display());
            if *open {
                open_in_editor(&generated.plan.test_file);
            }
        }
        Commands::Resolve { source } => {
            let settings = settings(&cli, &store);
            let text = read_source(source);
            match resolve_with_rules(&text, source, settings.resolution) {
                Ok(name) => println!("{}", name),
                Err(e) => exit_with(e.format(&text, &source.display().to_string())),
            }
        }
        Commands::Render { name, path } => {
            let settings = settings(&cli, &store);
            let variables = TemplateVariables::for_component(name.as_str(), path.as_str());
            print!("{}", render(&settings.test_template, &variables));
        }
        Commands::Config(ConfigCommand::Show) => {
            let settings = settings(&cli, &store);
            match settings.to_toml() {
                Ok(text) => print!("{}", text),
                Err(e) => exit_with(e),
            }
        }
        Commands::Config(ConfigCommand::Init { force }) => {
            if store.path().exists() && !force {
                exit_with(format!(
                    "'{}' already exists (use --force to overwrite)",
                    store.path().display()
                ));
            }
            if let Err(e) = store.save(&Settings::default()) {
                exit_with(e);
            }
            println!("{}", store.path().display());
        }
        Commands::Config(ConfigCommand::Path) => {
            println!("{}", store.path().display());
        }
        Commands::Panel => {
            let mut host = PanelHost::new(store);
            let stdin = io::stdin();
            if let Err(e) = run_json_lines(&mut host, stdin.lock(), io::stdout().lock()) {
                exit_with(e);
            }
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Stored settings with command line overrides applied
fn settings(cli: &Cli, store: &TomlConfigStore) -> Settings {
    let stored = store.load().unwrap_or_else(|e| exit_with(e));

    let test_template = cli.template.as_ref().map(|path| {
        fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with(format!("Error reading template '{}': {}", path.display(), e))
        })
    });

    let overrides = Overrides {
        test_file_extension: cli.extension.clone(),
        test_file_path: cli.test_dir.clone(),
        test_template,
        resolution: cli.permissive.then_some(RuleSet::Permissive),
    };
    let settings = overrides.apply(stored);
    debug!(config = %store.path().display(), resolution = %settings.resolution, "settings loaded");
    settings
}

fn read_source(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with(format!("Error reading file '{}': {}", path.display(), e)))
}

fn open_in_editor(file: &Path) {
    let Some(editor) = std::env::var_os("VISUAL").or_else(|| std::env::var_os("EDITOR")) else {
        warn!("neither VISUAL nor EDITOR is set, not opening {}", file.display());
        return;
    };

    match Command::new(&editor).arg(file).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("editor exited with {}", status),
        Err(e) => warn!("failed to launch editor {:?}: {}", editor, e),
    }
}

fn exit_with(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
