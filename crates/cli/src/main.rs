/// ferris - FerrisScript command-line driver.
/// Checks scripts, dumps tokens and syntax trees, and stands in for a game
/// engine by loading a script and driving `_ready` / `_process` frames.

use clap::Parser as ClapParser;
use ferris_host::marshal::{self, properties_to_json};
use ferris_host::{Diagnostic, FieldStore, HostConfig, ScriptInstance, Value};
use ferris_language::lexer::Lexer;
use ferris_language::{ToDiagnostic, parse};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(name = "ferris")]
#[command(about = "FerrisScript compiler and host simulator")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Lex, parse and type-check a script
    Check {
        file: PathBuf,
        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the token stream of a script
    Tokens { file: PathBuf },
    /// Print the syntax tree of a script
    Parse {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Load a script and drive it like an engine would
    Run {
        file: PathBuf,
        /// Number of `_process` frames to run
        #[arg(long, default_value_t = 1)]
        frames: u32,
        /// Seconds passed to `_process` each frame
        #[arg(long, default_value_t = 0.016)]
        delta: f32,
        /// JSON object of node properties exposed through `self`
        #[arg(long)]
        props: Option<PathBuf>,
        /// JSON host configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

/// Final state printed by `run --json`.
#[derive(Serialize)]
struct RunReport {
    frames: u32,
    properties: serde_json::Value,
    globals: serde_json::Value,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn execute(command: Commands) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Commands::Check { file, json } => {
            let source = read_source(&file)?;
            match ferris_host::compile(&source) {
                Ok(program) => {
                    if json {
                        println!("[]");
                    } else {
                        println!(
                            "{}: ok ({} functions, {} globals)",
                            file.display(),
                            program.functions().count(),
                            program.globals().count()
                        );
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    report(&file, &err.diagnostics, json)?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Tokens { file } => {
            let source = read_source(&file)?;
            let mut failed = false;
            for result in Lexer::new(&source) {
                match result {
                    Ok(token) => println!(
                        "{:>4}:{:<4} {:<14} {}",
                        token.line(),
                        token.column(),
                        format!("{:?}", token.kind.category()),
                        token.lexeme
                    ),
                    Err(err) => {
                        failed = true;
                        eprintln!("{}: {}", file.display(), err.to_diagnostic());
                    }
                }
            }
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
        Commands::Parse { file, json } => {
            let source = read_source(&file)?;
            let output = parse(&source);
            if !json {
                println!("{:#?}", output.program);
            }
            if output.is_ok() {
                return Ok(ExitCode::SUCCESS);
            }
            report(&file, &output.diagnostics(), json)?;
            Ok(ExitCode::FAILURE)
        }
        Commands::Run { file, frames, delta, props, config, json } => {
            run(&file, frames, delta, props.as_deref(), config.as_deref(), json)
        }
    }
}

fn run(
    file: &Path,
    frames: u32,
    delta: f32,
    props: Option<&Path>,
    config: Option<&Path>,
    json: bool,
) -> Result<ExitCode, Box<dyn Error>> {
    let source = read_source(file)?;
    let config = match config {
        Some(path) => HostConfig::from_json(&read_source(path)?)?,
        None => HostConfig::default(),
    };
    let store = match props {
        Some(path) => FieldStore::from_json(&read_source(path)?)?,
        None => FieldStore::new(),
    };
    let property_names: Vec<String> = store.fields().map(|(name, _)| name.to_string()).collect();

    let instance = match ScriptInstance::load(&source, store, config) {
        Ok(instance) => instance,
        Err(err) => {
            report(file, &err.diagnostics(), json)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if instance.has_function("_ready") {
        if let Err(err) = instance.dispatch("_ready", &[]) {
            report(file, &[err.to_diagnostic()], json)?;
            return Ok(ExitCode::FAILURE);
        }
    }
    if instance.has_function("_process") {
        for frame in 0..frames {
            log::debug!("frame {}", frame);
            if let Err(err) = instance.dispatch("_process", &[Value::Float(delta)]) {
                log::error!("`_process` failed on frame {}", frame);
                report(file, &[err.to_diagnostic()], json)?;
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let properties: Vec<(String, Value)> = property_names
        .into_iter()
        .filter_map(|name| instance.get_property(&name).ok().map(|value| (name, value)))
        .collect();
    let globals = instance.globals();

    if json {
        let report = RunReport {
            frames,
            properties: properties_to_json(properties.iter().map(|(n, v)| (n.as_str(), v))),
            globals: properties_to_json(globals.iter().map(|(n, v)| (n.as_str(), v))),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("properties:");
        for (name, value) in &properties {
            println!("  {} = {}", name, value);
        }
        println!("globals:");
        for (name, value) in &globals {
            println!("  {} = {}", name, value);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_source(path: &Path) -> Result<String, Box<dyn Error>> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e).into())
}

fn report(file: &Path, diagnostics: &[Diagnostic], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", marshal::diagnostics_to_json(diagnostics)?);
    } else {
        for diagnostic in diagnostics {
            eprintln!("{}: {}", file.display(), diagnostic);
        }
    }
    Ok(())
}
