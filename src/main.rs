use crate::cli::run;

pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod http;
pub mod storage;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
