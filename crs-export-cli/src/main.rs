//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = crs_export_cli::run() {
        eprintln!("crs-export: {err}");
        std::process::exit(1);
    }
}
