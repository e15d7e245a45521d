pub mod collection;
pub mod iterator;
pub mod layout;
pub mod naming;
pub mod reader;
pub mod source;
pub mod stream;
pub mod types;

use std::path::Path;

// Re-export types
pub use collection::{BandSource, ChannelCollection, ChannelFile, CollectionOptions, PostfixFilter};
pub use iterator::{ChannelChunkIterator, Chunk, ChunkLayout, ChunkPlacement, ElementType};
pub use reader::{decode_header, encode_header, HtkFile};
pub use source::{RecordingOutput, RecordingSource, SourceMetadata, TimeAxis};
pub use stream::{BlockSource, PreloadedBlock, StreamMetadata, StreamReader};
pub use types::*;

/// Opens a directory of HTK channel files with default options
///
/// # Examples
///
/// ```no_run
/// use htk_importer::open;
///
/// let result = open("path/to/RawHTK");
/// match result {
///     Ok(collection) => println!("Shape: {:?}", collection.shape()),
///     Err(e) => println!("Error opening collection: {}", e),
/// }
/// ```
pub fn open<P: AsRef<Path>>(directory: P) -> Result<ChannelCollection> {
    ChannelCollection::open(directory, CollectionOptions::default())
}

/// Reads a single HTK file into a `(num_samples, vector_length)` array
pub fn load<P: AsRef<Path>>(file_path: P) -> Result<ndarray::Array2<f32>> {
    HtkFile::open(file_path, CollectionOptions::default().sample_rate_base)?.read_data()
}
