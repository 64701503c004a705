use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// location of config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// log to stderr instead of imagefeed.log beside the executable
    #[arg(long)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange the authorization code shown after the web login for a token
    Login {
        #[arg(long)]
        code: String,
    },
    /// Show the profile and avatar of the signed-in user
    Profile,
    /// Print the photo feed
    Feed {
        /// number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Like photos by id
    Like { ids: Vec<String> },
    /// Remove likes from photos by id
    Unlike { ids: Vec<String> },
    /// Forget the stored token
    Logout,
}
