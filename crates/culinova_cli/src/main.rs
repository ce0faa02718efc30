//! CLI smoke entry point.
//!
//! Opens an in-memory store to confirm `culinova_core` links and migrates,
//! then prints deterministic probe lines.

use culinova_core::db::{migrations::latest_version, open_db_in_memory};

fn main() {
    println!("culinova_core ping={}", culinova_core::ping());
    println!("culinova_core version={}", culinova_core::core_version());
    match open_db_in_memory() {
        Ok(_) => println!("culinova_core schema={}", latest_version()),
        Err(err) => {
            eprintln!("culinova_core schema=error {err}");
            std::process::exit(1);
        }
    }
}
