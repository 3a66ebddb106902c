use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::{Builder, Env};
use log::{debug, info};

use rox as lox;

use lox::ast_printer::AstPrinter;
use lox::interpreter::Interpreter;
use lox::runner::{self, EXIT_DATA, EXIT_USAGE};
use lox::scanner::Scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Lox language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Write debug logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON instead of the plain listing
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints each statement's syntax tree
    Parse { filename: PathBuf },
}

fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source: String = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger(log_path: Option<&Path>) -> Result<()> {
    let Some(log_path) = log_path else {
        // Off unless RUST_LOG asks for more; program output owns stdout.
        Builder::from_env(Env::default().default_filter_or("off")).init();
        return Ok(());
    };

    let log_file =
        File::create(log_path).with_context(|| format!("Failed to create {:?}", log_path))?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to {:?}", log_path);
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source: String = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&source).scan_tokens();

    for error in &errors {
        eprintln!("{}", error);
    }

    if json {
        let rendered: String =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    } else {
        tokens.iter().for_each(|token: &Token| println!("{}", token));
    }

    Ok(if errors.is_empty() { 0 } else { EXIT_DATA })
}

fn parse(filename: &Path) -> Result<i32> {
    let source: String = read_file(filename)?;

    match runner::parse_source(&source) {
        Ok(statements) => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            Ok(0)
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("{}", error);
            }
            Ok(EXIT_DATA)
        }
    }
}

fn run_file(filename: &Path) -> Result<i32> {
    let source: String = read_file(filename)?;
    let mut interpreter = Interpreter::new(io::stdout());

    match runner::run_source(&mut interpreter, &source) {
        Ok(()) => Ok(0),
        Err(failure) => {
            debug!("Run failed: {:?}", failure);
            io::stdout().flush()?;
            eprintln!("{}", failure);
            Ok(failure.exit_code())
        }
    }
}

/// Reads and runs one line at a time.  Errors are reported and the prompt
/// carries on with whatever globals earlier lines defined.
fn run_prompt() -> Result<i32> {
    let mut interpreter = Interpreter::new(io::stdout());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(0);
        };
        let line: String = line.context("Failed to read from stdin")?;

        if let Err(failure) = runner::run_source(&mut interpreter, &line) {
            eprintln!("{}", failure);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            eprintln!("{}", e);
            eprintln!("Usage: rox [script]");
            process::exit(EXIT_USAGE);
        }
        // --help / --version
        Err(e) => e.exit(),
    };

    init_logger(args.log.as_deref())?;

    info!("CLI arguments: {:?}", args);

    let code: i32 = match (args.command, args.script) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json)?,
        (Some(Commands::Parse { filename }), _) => parse(&filename)?,
        (None, Some(script)) => run_file(&script)?,
        (None, None) => run_prompt()?,
    };

    if code != 0 {
        process::exit(code);
    }

    Ok(())
}
