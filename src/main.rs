use clap::Parser;
use colored::Colorize;
use tlbsim_grader::{config::Cli, run};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {e:#}").red());
        std::process::exit(1);
    }
}
