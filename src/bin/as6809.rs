use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use as6809::{Assembler, Config};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Assembly source file
    source: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load address of the first byte (default: $4000)
    #[arg(short, long, value_parser = as6809::parse_base)]
    base: Option<u16>,

    /// Pre-defined symbols (repeatable)
    #[arg(short = 'D', long, value_name = "KEY1=val", value_parser = as6809::parse_defines)]
    define: Vec<(String, i32)>,

    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file for the label and constant tables, as TOML
    #[arg(long)]
    symbols: Option<PathBuf>,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = main_real(args) {
        tracing::error!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main_real(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("cant open file: {e}"))?;
            Config::from_toml(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => Config::default(),
    };

    let base = args.base.or(config.base).unwrap_or(as6809::DEFAULT_BASE);
    let mut asm = Assembler::with_base(base);
    for (name, value) in config.defines.iter().chain(args.define.iter().map(|(n, v)| (n, v))) {
        asm.define(name, *value);
    }

    let source =
        fs::read_to_string(&args.source).map_err(|e| format!("cant open file: {e}"))?;
    tracing::trace!("assembling {} at ${base:04X}", args.source.display());
    let binary = asm
        .assemble(&source)
        .map_err(|e| format!("{}:{e}", args.source.display()))?;

    let mut output: Box<dyn Write> = match args.output.clone() {
        Some(path) => Box::new(BufWriter::new(
            File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|e| format!("cant open file: {e}"))?,
        )),
        None => Box::new(io::stdout()),
    };

    tracing::trace!("writing");
    output.write_all(&binary)?;
    output.flush()?;

    if let Some(path) = args.symbols {
        let text = toml::to_string(&asm.symbols().dump())?;
        fs::write(&path, text).map_err(|e| format!("cant open file: {e}"))?;
    }
    Ok(())
}
