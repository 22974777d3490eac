//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `gardrail_core` linkage and the
//!   migration path, independently of the API server.
//! - Keep output deterministic for quick local sanity checks.

use gardrail_core::db::migrations::latest_version;
use gardrail_core::db::open_db_in_memory;
use gardrail_core::vocab::{FrequencyBand, GeneAssociationType, Onset};

fn main() {
    println!("gardrail_core ping={}", gardrail_core::ping());
    println!("gardrail_core version={}", gardrail_core::core_version());
    println!("schema version={}", latest_version());
    println!(
        "vocabularies: assoc_types={} onsets={} frequency_bands={}",
        GeneAssociationType::ALL.len(),
        Onset::ALL.len(),
        FrequencyBand::ALL.len()
    );

    match open_db_in_memory() {
        Ok(_) => println!("in-memory catalog bootstrap=ok"),
        Err(err) => {
            eprintln!("in-memory catalog bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
