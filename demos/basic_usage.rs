use htk_importer::{BandSource, ChannelCollection, CollectionOptions};
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let directory = env::args()
        .nth(1)
        .unwrap_or_else(|| "data/R32_B7/RawHTK".to_string());

    let options = CollectionOptions::default()
        .with_prefix("Wav")
        .with_bands(BandSource::FromDirectoryName);
    let mut collection = ChannelCollection::open(&directory, options)?;

    // Print basic collection information
    println!("Directory: {}", collection.directory().display());
    println!("Shape (files, samples, bands): {:?}", collection.shape());
    if let Some(rate) = collection.sample_rate() {
        println!("Sample rate: {} Hz", rate);
    }
    if let Some(kind) = collection.parameter_kind() {
        println!("Parameter kind: {}", kind);
    }
    println!(
        "Blocks: {}, channels per block: {}",
        collection.num_blocks(),
        collection.channels_per_block()
    );
    if let Some(bands) = collection.bands() {
        println!("Band centers: {:?}", bands);
    }
    for diagnostic in collection.diagnostics() {
        println!("Warning: {}", diagnostic);
    }

    // List first few files
    for file in collection.files().iter().take(5) {
        println!(
            "  {}: id {} (block {}, channel {})",
            file.path.display(),
            file.id,
            file.block_index,
            file.channel_index
        );
    }

    let data = collection.read_data()?;
    if !data.is_empty() {
        println!("First sample of first channel: {:?}", data[[0, 0, 0]]);
    }
    collection.clear_data();

    Ok(())
}
