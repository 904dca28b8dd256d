use std::sync::Arc;

use reelpick_core::{Catalog, MachineConfig, SeededStream, SpinOrchestrator};

fn main() {
    // Headless round: replay it by keeping the same seed and nonce
    let seed = "example-seed";
    let rng = SeededStream::new(seed, "round", 1);
    let seed_hash = rng.seed_hash_hex();
    let mut machine = SpinOrchestrator::new(
        Arc::new(Catalog::music()),
        MachineConfig::default(),
        rng,
    )
    .expect("default machine is valid");

    let outcome = machine.play_to_completion(0).expect("machine is idle");
    println!(
        "seed_hash={} winner={} resting={:?} stopped_at_ms={:?}",
        seed_hash, outcome.prize.name, outcome.resting, outcome.stopped_at_ms
    );
}
