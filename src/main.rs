use clap::Parser;
use std::process::ExitCode;

mod installer;
mod panel;

#[derive(Parser, Debug)]
#[command(
    name = "aapanel-nginx",
    version,
    about = "Install Nginx via the aaPanel plugin API"
)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();

    let mut out = std::io::stdout();
    match installer::run(&panel::Aapanel, &mut out) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
