//! Chronicle CLI - interactive shell for the document model

mod render;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Transactional, undoable document model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell driving a model over the in-memory engine
    Shell {
        /// Retention window for the undo stack (minimum 4)
        #[arg(short, long)]
        max_steps: Option<usize>,
    },
    /// Render a saved document stream as JSON
    Dump {
        /// Input file written by the shell's `save` command
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Shell { max_steps } => shell::run(max_steps),
        Commands::Dump { file, pretty } => render::cmd_dump(&file, pretty),
    }
}
