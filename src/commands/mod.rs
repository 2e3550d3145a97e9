use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "icqd", version = "0.4.0")]
#[command(about = "Interchain query registry relayer", long_about = None)]
pub struct Cli {
    #[clap(long, default_value = ".icqd")]
    pub home: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration to the application home
    Init,
    /// Start the relayer daemon
    Start,
    /// Print the relayer account address
    Address,
}

pub mod address;
pub mod init;
pub mod start;
