use htk_importer::{ChannelCollection, ChunkLayout, CollectionOptions};
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let directory = env::args()
        .nth(1)
        .unwrap_or_else(|| "data/R32_B7/RawHTK".to_string());
    let collection = ChannelCollection::open(&directory, CollectionOptions::default())?;

    let layout = ChunkLayout {
        time_axis_first: true,
        has_bands: false,
    };
    let chunks = collection.chunks(layout);
    println!(
        "Destination shape {:?}, {} bytes per element",
        chunks.max_shape(),
        chunks.element_type().size()
    );

    let mut dest = chunks.allocate();
    for chunk in chunks {
        let chunk = chunk?;
        println!("Writing chunk at {:?}", chunk.placement.ranges());
        chunk.write_into(&mut dest)?;
    }

    println!("Assembled array of shape {:?}", dest.shape());
    Ok(())
}
