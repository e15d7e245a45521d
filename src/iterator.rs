//! Channel-at-a-time iteration over a [`ChannelCollection`].
//!
//! Each step decodes one file and tells the consumer where the block goes in
//! the full destination array, so large recordings can be written out
//! without holding every channel in memory.

use ndarray::{ArrayBase, ArrayD, Axis, DataMut, Dimension, Slice};
use std::iter::FusedIterator;
use std::ops::Range;

use crate::collection::ChannelCollection;
use crate::types::*;

/// Axis arrangement of the chunks and of the destination array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Time is the leading axis (`samples x channels`) instead of the second
    pub time_axis_first: bool,
    /// Keep the band axis; without it only the first band is emitted
    pub has_bands: bool,
}

impl Default for ChunkLayout {
    fn default() -> Self {
        ChunkLayout {
            time_axis_first: false,
            has_bands: true,
        }
    }
}

/// Element type of every emitted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float32,
}

impl ElementType {
    /// Size in bytes of one element
    pub fn size(self) -> usize {
        match self {
            ElementType::Float32 => 4,
        }
    }
}

/// Where a chunk lands in the destination array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlacement {
    /// Channel range covered
    pub channels: Range<usize>,
    /// Sample range covered
    pub samples: Range<usize>,
    /// Band range covered; `None` if the band axis is dropped
    pub bands: Option<Range<usize>>,
    /// Whether the sample axis precedes the channel axis
    pub time_axis_first: bool,
}

impl ChunkPlacement {
    /// Ranges in destination axis order.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = if self.time_axis_first {
            vec![self.samples.clone(), self.channels.clone()]
        } else {
            vec![self.channels.clone(), self.samples.clone()]
        };
        if let Some(bands) = &self.bands {
            ranges.push(bands.clone());
        }
        ranges
    }
}

/// One decoded channel plus its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub data: ArrayD<f32>,
    pub placement: ChunkPlacement,
}

impl Chunk {
    /// Copies the chunk into its region of `dest`.
    ///
    /// # Errors
    ///
    /// [`HtkError::InvalidArgument`] if `dest` has the wrong number of axes or
    /// is too small to hold the chunk.
    pub fn write_into<S, D>(&self, dest: &mut ArrayBase<S, D>) -> Result<()>
    where
        S: DataMut<Elem = f32>,
        D: Dimension,
    {
        let ranges = self.placement.ranges();
        if dest.ndim() != ranges.len() {
            return Err(HtkError::invalid_argument(format!(
                "destination has {} axes, chunk needs {}",
                dest.ndim(),
                ranges.len()
            )));
        }
        if let Some((axis, range)) = ranges
            .iter()
            .enumerate()
            .find(|(axis, range)| range.end > dest.len_of(Axis(*axis)))
        {
            return Err(HtkError::invalid_argument(format!(
                "destination axis {} has length {}, chunk needs {}",
                axis,
                dest.len_of(Axis(axis)),
                range.end
            )));
        }

        let mut region = dest.slice_each_axis_mut(|ax| Slice::from(ranges[ax.axis.index()].clone()));
        if region.shape() != self.data.shape() {
            return Err(HtkError::invalid_argument(format!(
                "chunk shape {:?} does not match its placement {:?}",
                self.data.shape(),
                region.shape()
            )));
        }
        region.assign(&self.data);
        Ok(())
    }
}

/// Iterator yielding one [`Chunk`] per file of a collection.
///
/// Files are visited in collection order. The cursor only moves forward; a
/// failed read is yielded once and iteration continues with the next file.
#[derive(Debug)]
pub struct ChannelChunkIterator<'a> {
    collection: &'a ChannelCollection,
    layout: ChunkLayout,
    next_file: usize,
}

impl<'a> ChannelChunkIterator<'a> {
    pub fn new(collection: &'a ChannelCollection, layout: ChunkLayout) -> Self {
        ChannelChunkIterator {
            collection,
            layout,
            next_file: 0,
        }
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub fn element_type(&self) -> ElementType {
        ElementType::Float32
    }

    /// Shape of the full destination array.
    pub fn max_shape(&self) -> Vec<usize> {
        let (files, samples, bands) = self.collection.shape();
        let mut shape = if self.layout.time_axis_first {
            vec![samples, files]
        } else {
            vec![files, samples]
        };
        if self.layout.has_bands {
            shape.push(bands);
        }
        shape
    }

    /// Allocates a zeroed destination of [`ChannelChunkIterator::max_shape`].
    pub fn allocate(&self) -> ArrayD<f32> {
        ArrayD::zeros(self.max_shape())
    }

    fn chunk_for(&self, file_index: usize) -> Result<Chunk> {
        let channel = self.collection.read_channel(file_index)?;
        let (num_samples, num_bands) = channel.dim();
        let channel_axis = if self.layout.time_axis_first { 1 } else { 0 };

        let (data, bands) = if self.layout.has_bands {
            (
                channel.insert_axis(Axis(channel_axis)).into_dyn(),
                Some(0..num_bands),
            )
        } else {
            (
                channel
                    .column(0)
                    .to_owned()
                    .insert_axis(Axis(channel_axis))
                    .into_dyn(),
                None,
            )
        };

        Ok(Chunk {
            data,
            placement: ChunkPlacement {
                channels: file_index..file_index + 1,
                samples: 0..num_samples,
                bands,
                time_axis_first: self.layout.time_axis_first,
            },
        })
    }
}

impl Iterator for ChannelChunkIterator<'_> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_file >= self.collection.num_files() {
            return None;
        }
        let file_index = self.next_file;
        self.next_file += 1;
        log::trace!("Emitting chunk for file {}", file_index);
        Some(self.chunk_for(file_index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.collection.num_files().saturating_sub(self.next_file);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChannelChunkIterator<'_> {}

impl FusedIterator for ChannelChunkIterator<'_> {}
