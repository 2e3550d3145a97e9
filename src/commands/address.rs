use super::Cli;
use crate::config::Config;

pub fn execute(cli: &Cli) {
    let conf = Config::from_file(&cli.home).expect("config not found; run init first");
    match conf.relayer_address() {
        Ok(address) => println!("{address}"),
        Err(e) => eprintln!("unable to derive relayer address: {e}"),
    }
}
