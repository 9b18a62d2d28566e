//! # Pagesmith CLI
//!
//! The binary is intentionally thin: the CLI lives in `cli/` and this file
//! only invokes `cli::run()` and maps the outcome to an exit code.
//!
//! A failed editor operation has already been reported through its
//! notification, so it only sets the exit code. Anything else (bad workspace
//! directory, unreadable config) is printed here.

mod cli;

fn main() {
    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
