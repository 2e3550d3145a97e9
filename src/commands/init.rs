use super::Cli;
use crate::config::Config;

pub fn execute(cli: &Cli) {
    println!("Initialize icqd home: {}", &cli.home);
    Config::default(&cli.home).save().unwrap();
}
