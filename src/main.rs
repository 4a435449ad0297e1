use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use env_logger::Env;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use qubide::{date, ListingMode, QubError, Volume};

const ENOENT: i32 = 2;
const EIO: i32 = 5;
const EINVAL: i32 = 22;

#[derive(Parser)]
#[command(name = "qubide", about = "QUBIDE/QL-SD Image Utility")]
#[command(group(ArgGroup::new("command").args(["dir", "short", "info", "name"])))]
struct Cli {
    /// The image to operate on
    #[arg(short = 'b', long = "image")]
    image: PathBuf,
    /// Long directory listing
    #[arg(short = 'd', long)]
    dir: bool,
    /// Short directory listing
    #[arg(short = 's', long)]
    short: bool,
    /// Show device info
    #[arg(short = 'i', long)]
    info: bool,
    /// Dump the named file to stdout
    #[arg(short = 'n', long)]
    name: Option<String>,
    #[arg(short, long)]
    verbose: bool,
}

enum Command {
    LongDir,
    ShortDir,
    Info,
    Dump(String),
}

impl Cli {
    fn command(&self) -> Option<Command> {
        if self.dir {
            Some(Command::LongDir)
        } else if self.short {
            Some(Command::ShortDir)
        } else if self.info {
            Some(Command::Info)
        } else {
            self.name.clone().map(Command::Dump)
        }
    }
}

fn exit_code(errno: i32) -> ExitCode {
    ExitCode::from((-errno) as u8)
}

fn run(cli: &Cli) -> Result<()> {
    let Some(command) = cli.command() else {
        return Ok(());
    };
    let mut volume = Volume::open(&cli.image)
        .with_context(|| format!("Failed to open {}", cli.image.display()))?;

    let local_offset = date::local_offset_seconds();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match command {
        Command::LongDir => volume.list_root(ListingMode::Long, local_offset, &mut out)?,
        Command::ShortDir => volume.list_root(ListingMode::Short, local_offset, &mut out)?,
        Command::Info => writeln!(out, "{}", volume.device_info())?,
        Command::Dump(name) => {
            volume.dump_file(&name, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                exit_code(EINVAL)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<QubError>() {
            Some(e) if e.is_logic_error() => {
                eprintln!("{}", e);
                exit_code(ENOENT)
            }
            Some(QubError::Io(io_err)) => {
                eprintln!("Error: {:#}", err);
                exit_code(io_err.raw_os_error().unwrap_or(EIO))
            }
            _ => {
                eprintln!("Error: {:#}", err);
                exit_code(EIO)
            }
        },
    }
}
