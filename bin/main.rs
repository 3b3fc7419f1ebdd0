use clap::{ArgAction, Parser};
use descent::architecture::Architecture;
use descent::loader::{load_binary, Loader, Raw};
use descent::recovery::OptionsBuilder;
use descent::session::Static;
use descent::store::Tag;
use descent::Error;
use log::{LevelFilter, Metadata, Record};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Recover the functions reachable from an entry point of a binary.
#[derive(Parser, Debug)]
#[command(name = "descent", version, about, long_about = None)]
struct Cli {
    /// The binary to analyze. An ELF unless --raw is given.
    binary: PathBuf,

    /// Where to start: a symbol name, or an address in hex (0x...) or decimal.
    #[arg(short, long, default_value = "main")]
    entry: String,

    /// Treat the binary as a flat image of code.
    #[arg(long, requires = "arch")]
    raw: bool,

    /// Architecture of a raw image (x86 or amd64).
    #[arg(long)]
    arch: Option<String>,

    /// Address a raw image is mapped at.
    #[arg(long, default_value = "0", value_parser = parse_address)]
    base: u64,

    /// Only recover the entry function, not the functions it calls.
    #[arg(long, default_value_t = false)]
    no_recurse: bool,

    /// Stop recovery after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Stop recovery after this many functions.
    #[arg(long)]
    max_functions: Option<usize>,

    /// Print these tags for every known address as JSON, instead of the
    /// function listing.
    #[arg(long, value_delimiter = ',')]
    query: Vec<String>,

    /// Log more. Repeat for more still.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid address `{}`: {}", s, e))
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn load(cli: &Cli, session: &mut Static) -> Result<(), Error> {
    if cli.raw {
        let architecture = match cli.arch {
            Some(ref arch) => arch.parse::<Architecture>()?,
            None => return Err("--raw needs --arch".into()),
        };
        Raw::from_file(&cli.binary, cli.base, architecture)?.load(session)
    } else {
        load_binary(&cli.binary, session)
    }
}

fn resolve_entry(session: &Static, entry: &str) -> Result<u64, Error> {
    if let Ok(address) = parse_address(entry) {
        return Ok(address);
    }
    session
        .get_address_by_name(entry)
        .ok_or_else(|| Error::NameNotFound(entry.to_string()))
}

fn print_functions(session: &Static) {
    match session.architecture() {
        Some(architecture) => println!("arch: {}", architecture),
        None => println!("arch: unknown"),
    }
    println!("functions: {}", session.functions().len());

    for (&entry, function) in session.functions() {
        let name = session
            .store()
            .record(entry)
            .and_then(|record| record.name());
        match name {
            Some(name) => println!("function 0x{:x} {}", entry, name),
            None => println!("function 0x{:x}", entry),
        }

        for block in function.blocks() {
            println!("  block {}", block);
            for &address in block.addresses() {
                match session.store().instruction(address) {
                    Some(instruction) => println!("    0x{:x} {}", address, instruction),
                    None => println!("    0x{:x} ?", address),
                }
            }
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut options = OptionsBuilder::new().recurse(!cli.no_recurse);
    if let Some(timeout_ms) = cli.timeout_ms {
        options = options.deadline(Duration::from_millis(timeout_ms));
    }
    if let Some(max_functions) = cli.max_functions {
        options = options.max_functions(max_functions);
    }

    let mut session = Static::new().with_options(options.build());
    load(&cli, &mut session)?;

    let entry = resolve_entry(&session, &cli.entry)?;
    let recovery = session.recover_function(entry);
    if !recovery.is_complete() {
        log::warn!("recovery from 0x{:x} stopped early", entry);
    }

    if cli.query.is_empty() {
        print_functions(&session);
    } else {
        let tags = cli
            .query
            .iter()
            .map(|tag| tag.parse::<Tag>())
            .collect::<Result<Vec<Tag>, Error>>()?;
        let result = session.query(&tags, None);
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level(cli.verbose));
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
