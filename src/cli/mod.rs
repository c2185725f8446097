//! CLI module - Command-line interface for repopulse

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repopulse - recently active GitHub repositories, cached
#[derive(Parser)]
#[command(name = "repopulse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Build a feed once and print it as JSON, bypassing the cache
    Fetch {
        #[command(subcommand)]
        feed: FeedCommand,
    },

    /// Create default config file
    Init,
}

#[derive(Subcommand)]
pub enum FeedCommand {
    /// Active repositories across all languages
    Global,

    /// Active repositories for one language
    Language {
        /// Language name as GitHub spells it, e.g. rust, typescript, c++
        language: String,
    },

    /// Recently updated issues labelled for newcomers
    Issues,
}
