//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = scoop_cli::run() {
        eprintln!("scoop: {err}");
        std::process::exit(1);
    }
}
