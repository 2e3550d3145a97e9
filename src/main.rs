use clap::Parser;
use icqd::commands::{address, init, start, Cli, Commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::new("info").add_directive("icqd=debug".parse().unwrap());
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let cli = Cli::parse();
    match &cli.command {
        Commands::Init => {
            init::execute(&cli);
        }
        Commands::Start => {
            start::execute(&cli).await;
        }
        Commands::Address => {
            address::execute(&cli);
        }
    }
}
