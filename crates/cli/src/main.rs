mod cmd;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, cmd_build, cmd_info, cmd_probe};
use output::{OutputFormat, print_error};

/// shbuild - compile generated C sources into a shared library
#[derive(Parser)]
#[command(name = "shbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a recipe directory into a shared library
  Build(BuildArgs),

  /// Check that a toolchain is installed
  Probe {
    /// Toolchain identifier (gcc, clang, msvc, ...)
    toolchain: String,

    /// Shell used to run the version query
    #[arg(long)]
    shell: Option<String>,
  },

  /// Show the resolved platform settings
  Info {
    /// Shell workers would run
    #[arg(long)]
    shell: Option<String>,
  },
}

fn main() {
  let cli = Cli::parse();

  // Initialize logging
  let default_level = if cli.verbose { "info" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build(args) => cmd_build(args, cli.output),
    Commands::Probe { toolchain, shell } => cmd_probe(&toolchain, shell, cli.output),
    Commands::Info { shell } => cmd_info(shell, cli.output),
  };

  if let Err(e) = result {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}
