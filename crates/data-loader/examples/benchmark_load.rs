use data_loader::DataIndex;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/sample");

    println!("Loading ad dataset from {}...\n", data_dir.display());

    let start = Instant::now();
    let index = DataIndex::load_from_files(data_dir)
        .expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (ads, playback, clicks, mappings) = index.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Ads: {}", ads);
    println!("Playback events: {}", playback);
    println!("Ad clicks: {}", clicks);
    println!("Category mappings: {}", mappings);
}
