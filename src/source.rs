//! A single handle over both recording backends.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::collection::{ChannelCollection, CollectionOptions};
use crate::stream::{BlockSource, StreamReader};
use crate::types::*;

/// Which axis of the output comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeAxis {
    /// `(samples, channels)`
    First,
    /// `(channels, samples)`
    #[default]
    Last,
}

/// Timing and channel description of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub sample_rate: f64,
    pub channel_ids: Vec<u64>,
    pub start_time: Option<f64>,
    pub num_channels: usize,
    pub num_samples: usize,
}

/// Fully read recording, ready to hand to a downstream writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingOutput {
    pub data: Array2<f32>,
    pub sample_rate: f64,
    pub channel_ids: Vec<u64>,
    pub start_time: Option<f64>,
}

/// Either a directory of HTK channel files or one stream of a block.
#[derive(Debug, Clone)]
pub enum RecordingSource {
    Channels(ChannelCollection),
    Block { reader: StreamReader, stream: String },
}

impl RecordingSource {
    pub fn open_channels<P: AsRef<Path>>(directory: P, options: CollectionOptions) -> Result<Self> {
        Ok(RecordingSource::Channels(ChannelCollection::open(
            directory, options,
        )?))
    }

    /// Opens `stream` of the block at `path`; device aliases are resolved here.
    pub fn open_block<S, P>(
        source: &S,
        path: P,
        stream: &str,
        channels: Option<Vec<u32>>,
    ) -> Result<Self>
    where
        S: BlockSource + ?Sized,
        P: AsRef<Path>,
    {
        let reader = StreamReader::open(source, path, channels)?;
        let stream = reader.resolve_stream(stream)?.to_string();
        Ok(RecordingSource::Block { reader, stream })
    }

    /// Channel ids in read order.
    pub fn list_channels(&self) -> Result<Vec<u64>> {
        match self {
            RecordingSource::Channels(collection) => Ok(collection.channel_ids()),
            RecordingSource::Block { reader, stream } => Ok(reader
                .get_metadata(stream)?
                .channel_ids
                .into_iter()
                .map(u64::from)
                .collect()),
        }
    }

    /// One channel as `(samples, bands)`; block streams have a single band.
    pub fn read_channel(&self, position: usize) -> Result<Array2<f32>> {
        match self {
            RecordingSource::Channels(collection) => collection.read_channel(position),
            RecordingSource::Block { reader, stream } => reader.read_channel(stream, position),
        }
    }

    pub fn metadata(&self) -> Result<SourceMetadata> {
        match self {
            RecordingSource::Channels(collection) => Ok(SourceMetadata {
                sample_rate: collection.sample_rate().unwrap_or_default(),
                channel_ids: collection.channel_ids(),
                start_time: None,
                num_channels: collection.num_files(),
                num_samples: collection.num_samples(),
            }),
            RecordingSource::Block { reader, stream } => {
                let meta = reader.get_metadata(stream)?;
                Ok(SourceMetadata {
                    sample_rate: meta.sample_rate,
                    channel_ids: meta.channel_ids.into_iter().map(u64::from).collect(),
                    start_time: meta.start_time,
                    num_channels: meta.num_channels,
                    num_samples: meta.num_samples,
                })
            }
        }
    }

    /// Reads everything into a [`RecordingOutput`] with the requested axis order.
    ///
    /// Channel files contribute their first band only.
    pub fn into_output(self, time_axis: TimeAxis) -> Result<RecordingOutput> {
        let metadata = self.metadata()?;
        let channels_first = match self {
            RecordingSource::Channels(mut collection) => collection.read_band(0)?,
            RecordingSource::Block { reader, stream } => {
                let (data, _) = reader.get_data(&stream)?;
                data.reversed_axes()
            }
        };
        let data = match time_axis {
            TimeAxis::First => channels_first.reversed_axes(),
            TimeAxis::Last => channels_first,
        };
        log::debug!("Recording output of shape {:?}", data.dim());

        Ok(RecordingOutput {
            data,
            sample_rate: metadata.sample_rate,
            channel_ids: metadata.channel_ids,
            start_time: metadata.start_time,
        })
    }
}
