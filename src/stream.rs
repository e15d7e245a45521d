//! Named streams of a recording block, read through a pluggable backend.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::*;

/// Epoc holding the event onset markers.
pub const MARK_EPOC: &str = "mark";

/// Device names and the stream each one is recorded under.
pub const STREAM_ALIASES: &[(&str, &str)] = &[("ECoG", "Wave")];

/// Stream name registered for a device alias, if any.
pub fn resolve_stream_alias(name: &str) -> Option<&'static str> {
    STREAM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, stream)| *stream)
}

/// Block-level information.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockInfo {
    pub block_name: String,
    /// Start time as seconds since the Unix epoch
    pub utc_start_time: Option<f64>,
}

/// One continuously sampled stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamData {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Channel id of each row of `data`
    pub channels: Vec<u32>,
    /// `(channels, samples)`
    pub data: Array2<f32>,
}

/// Event markers of one epoc.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Epoc {
    pub onsets: Vec<f64>,
}

/// Everything a backend hands back for one block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockRecording {
    pub info: BlockInfo,
    pub streams: BTreeMap<String, StreamData>,
    pub epocs: BTreeMap<String, Epoc>,
}

/// A backend able to decode a recording block.
pub trait BlockSource {
    /// Reads the block at `path`, keeping only `channels` when given.
    fn read_block(&self, path: &Path, channels: Option<&[u32]>) -> Result<BlockRecording>;
}

/// A block already decoded into memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreloadedBlock {
    recording: BlockRecording,
}

impl PreloadedBlock {
    pub fn new(recording: BlockRecording) -> Self {
        PreloadedBlock { recording }
    }
}

impl BlockSource for PreloadedBlock {
    fn read_block(&self, _path: &Path, channels: Option<&[u32]>) -> Result<BlockRecording> {
        let mut recording = self.recording.clone();
        if let Some(wanted) = channels {
            for stream in recording.streams.values_mut() {
                let rows: Vec<usize> = stream
                    .channels
                    .iter()
                    .enumerate()
                    .filter(|(_, id)| wanted.contains(*id))
                    .map(|(row, _)| row)
                    .collect();
                stream.data = stream.data.select(Axis(0), &rows);
                stream.channels = rows.iter().map(|&row| stream.channels[row]).collect();
            }
        }
        Ok(recording)
    }
}

/// Shape and timing of one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub sample_rate: f64,
    pub channel_ids: Vec<u32>,
    pub start_time: Option<f64>,
    pub num_channels: usize,
    pub num_samples: usize,
}

/// Reader over the streams of one block.
#[derive(Debug, Clone)]
pub struct StreamReader {
    path: PathBuf,
    channels: Option<Vec<u32>>,
    recording: BlockRecording,
}

impl StreamReader {
    /// Reads the block at `path` through `source`.
    pub fn open<S, P>(source: &S, path: P, channels: Option<Vec<u32>>) -> Result<Self>
    where
        S: BlockSource + ?Sized,
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let recording = source.read_block(&path, channels.as_deref())?;
        let reader = StreamReader {
            path,
            channels,
            recording,
        };
        log::info!("Streams: {}", reader.list_streams().join(", "));
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Channel filter the block was read with.
    pub fn channels(&self) -> Option<&[u32]> {
        self.channels.as_deref()
    }

    pub fn block_name(&self) -> &str {
        &self.recording.info.block_name
    }

    pub fn start_time(&self) -> Option<f64> {
        self.recording.info.utc_start_time
    }

    pub fn list_streams(&self) -> Vec<&str> {
        self.recording.streams.keys().map(String::as_str).collect()
    }

    /// Resolves a stream or device name to a stream present in the block.
    pub fn resolve_stream<'a>(&'a self, name: &'a str) -> Result<&'a str> {
        if self.recording.streams.contains_key(name) {
            return Ok(name);
        }
        match resolve_stream_alias(name) {
            Some(stream) if self.recording.streams.contains_key(stream) => Ok(stream),
            _ => Err(HtkError::not_found(format!(
                "Device or stream '{}' not found. Available streams: [{}]",
                name,
                self.list_streams().join(", ")
            ))),
        }
    }

    fn stream(&self, name: &str) -> Result<&StreamData> {
        let resolved = self.resolve_stream(name)?;
        self.recording
            .streams
            .get(resolved)
            .ok_or_else(|| HtkError::not_found(resolved.to_string()))
    }

    pub fn get_metadata(&self, name: &str) -> Result<StreamMetadata> {
        let stream = self.stream(name)?;
        Ok(StreamMetadata {
            sample_rate: stream.sample_rate,
            channel_ids: stream.channels.clone(),
            start_time: self.recording.info.utc_start_time,
            num_channels: stream.data.nrows(),
            num_samples: stream.data.ncols(),
        })
    }

    /// Stream data as `(samples, channels)` plus its metadata.
    pub fn get_data(&self, name: &str) -> Result<(Array2<f32>, StreamMetadata)> {
        let stream = self.stream(name)?;
        let data = stream.data.t().to_owned();
        Ok((data, self.get_metadata(name)?))
    }

    /// One channel row of a stream as `(samples, 1)`.
    pub fn read_channel(&self, name: &str, row: usize) -> Result<Array2<f32>> {
        let stream = self.stream(name)?;
        if row >= stream.data.nrows() {
            return Err(HtkError::not_found(format!(
                "channel {} of {} in stream '{}'",
                row,
                stream.data.nrows(),
                name
            )));
        }
        Ok(stream.data.row(row).to_owned().insert_axis(Axis(1)))
    }

    /// Onsets of the event markers, in stored order.
    pub fn get_events(&self) -> Result<&[f64]> {
        self.recording
            .epocs
            .get(MARK_EPOC)
            .map(|epoc| epoc.onsets.as_slice())
            .ok_or_else(|| HtkError::not_found(format!("epoc '{}'", MARK_EPOC)))
    }
}
