use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// Run the input loop in the foreground.
    Run,
    /// Scan devices once and print them with the player slots.
    List,
    /// Ask the running daemon who sits in which player slot.
    Players,
    /// Scan devices once and print emulator arguments per player.
    Export,
    /// Remember a device as a player's preferred controller.
    Assign {
        /// 1-based player number
        #[clap(short, long)]
        player: usize,
        /// Enumeration index as shown by `list`
        #[clap(short, long)]
        device: i32,
    },
    /// Interactively map the buttons of a device.
    Configure {
        /// Enumeration index as shown by `list`, or -1 for the keyboard
        #[clap(short, long, allow_hyphen_values = true)]
        device: i32,
        /// Store "no hotkey" instead of reusing select when hotkey is skipped
        #[clap(long)]
        no_hotkey: bool,
        /// Seconds to wait for each input before skipping it
        #[clap(short, long, default_value_t = 10)]
        timeout: u64,
    },
}

/// Deterministic player seats for gamepads, keyboards and light guns.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Open an input window so keyboard and mouse events arrive
    #[arg(long)]
    pub window: bool,

    /// Workspace directory with mappings and settings
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Directory of the shared, read-only mapping store
    #[arg(long)]
    pub shared: Option<PathBuf>,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}
