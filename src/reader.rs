use byteorder::{BigEndian, ByteOrder, LittleEndian};
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::types::*;

// Buffer size used when reading whole sample regions
const READ_BUFFER_CAPACITY: usize = 65536;

/// Decodes the fixed 12-byte big-endian header from the start of `reader`.
///
/// Fails with [`HtkError::Format`] when fewer than 12 bytes are available.
pub fn decode_header<R: Read>(reader: &mut R) -> Result<RecordingHeader> {
    let mut buffer = [0u8; HEADER_LENGTH];
    fill(reader, &mut buffer, "header")?;

    Ok(RecordingHeader {
        num_samples: BigEndian::read_u32(&buffer[0..4]),
        rate_field: BigEndian::read_u32(&buffer[4..8]),
        sample_size: BigEndian::read_u16(&buffer[8..10]),
        parameter_kind: ParameterKind(BigEndian::read_u16(&buffer[10..12])),
    })
}

/// Encodes a header into its 12-byte on-disk form.
pub fn encode_header(header: &RecordingHeader) -> [u8; HEADER_LENGTH] {
    let mut buffer = [0u8; HEADER_LENGTH];
    BigEndian::write_u32(&mut buffer[0..4], header.num_samples);
    BigEndian::write_u32(&mut buffer[4..8], header.rate_field);
    BigEndian::write_u16(&mut buffer[8..10], header.sample_size);
    BigEndian::write_u16(&mut buffer[10..12], header.parameter_kind.0);
    buffer
}

/// Reads the compression parameters that follow the header, if any.
///
/// Returns `None` for uncompressed data. The reflection coefficient sub-kind
/// uses fixed constants and consumes no bytes.
pub fn decode_compression<R: Read>(
    reader: &mut R,
    header: &RecordingHeader,
    host: Endianness,
) -> Result<Option<CompressionParameters>> {
    if !header.parameter_kind.is_compressed() {
        return Ok(None);
    }

    let vector_length = header.vector_length();
    if header.parameter_kind.base() == BaseKind::IRefc {
        return Ok(Some(CompressionParameters::reflection_coefficients(
            vector_length,
        )));
    }

    let mut buffer = vec![0u8; 2 * vector_length * 4];
    fill(reader, &mut buffer, "compression parameters")?;
    let (scale, bias) = buffer.split_at(vector_length * 4);

    Ok(Some(CompressionParameters {
        scale: decode_floats(scale, host),
        bias: decode_floats(bias, host),
    }))
}

/// Decodes 4-byte elements the way a host of order `host` would: load the word
/// natively, then byte-swap unless the host is big-endian like the file.
pub fn decode_floats(bytes: &[u8], host: Endianness) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let word = match host {
                Endianness::Little => LittleEndian::read_u32(chunk),
                Endianness::Big => BigEndian::read_u32(chunk),
            };
            let word = if host.swap_required() {
                word.swap_bytes()
            } else {
                word
            };
            f32::from_bits(word)
        })
        .collect()
}

/// Decodes 2-byte compressed elements with the same host-order rules as [`decode_floats`].
pub fn decode_shorts(bytes: &[u8], host: Endianness) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| {
            let word = match host {
                Endianness::Little => LittleEndian::read_u16(chunk),
                Endianness::Big => BigEndian::read_u16(chunk),
            };
            let word = if host.swap_required() {
                word.swap_bytes()
            } else {
                word
            };
            word as i16
        })
        .collect()
}

/// Turns raw sample bytes into float values, expanding compressed data.
///
/// `bytes` must hold whole elements; element `i` belongs to coefficient
/// `i % vector_length`.
pub fn decode_elements(
    bytes: &[u8],
    header: &RecordingHeader,
    compression: Option<&CompressionParameters>,
    host: Endianness,
) -> Vec<f32> {
    match compression {
        Some(params) => {
            let vector_length = header.vector_length();
            decode_shorts(bytes, host)
                .into_iter()
                .enumerate()
                .map(|(i, raw)| params.expand(i % vector_length, raw))
                .collect()
        }
        None => decode_floats(bytes, host),
    }
}

/// A single HTK file with its decoded header.
///
/// The file handle is opened for the duration of each read call and closed on
/// return; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct HtkFile {
    path: PathBuf,
    header: RecordingHeader,
    timing: SampleTiming,
    compression: Option<CompressionParameters>,
    header_length: u64,
    host: Endianness,
}

impl HtkFile {
    /// Opens an HTK file and reads its header.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.htk` file
    /// * `sample_rate_base` - `None` if the header stores the sample period in
    ///   100ns units, otherwise the divisor that turns the stored rate into Hz
    pub fn open<P: AsRef<Path>>(path: P, sample_rate_base: Option<f64>) -> Result<Self> {
        Self::open_with_host(path, sample_rate_base, Endianness::native())
    }

    /// Like [`HtkFile::open`] but decodes as if running on a host of the given byte order.
    pub fn open_with_host<P: AsRef<Path>>(
        path: P,
        sample_rate_base: Option<f64>,
        host: Endianness,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);

        let header = decode_header(&mut reader)?;
        if header.vector_length() == 0 {
            return Err(HtkError::format(format!(
                "{}: sample size {} holds no {}-byte elements",
                path.display(),
                header.sample_size,
                header.parameter_kind.element_width()
            )));
        }
        let compression = decode_compression(&mut reader, &header, host)?;
        let header_length = reader.stream_position()?;

        log::debug!(
            "Opened {}: {} samples, kind {}, vector length {}",
            path.display(),
            header.num_samples,
            header.parameter_kind,
            header.vector_length()
        );

        Ok(HtkFile {
            timing: SampleTiming::from_rate_field(header.rate_field, sample_rate_base),
            path,
            header,
            compression,
            header_length,
            host,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    pub fn num_samples(&self) -> usize {
        self.header.num_samples as usize
    }

    pub fn sample_rate(&self) -> f64 {
        self.timing.sample_rate
    }

    pub fn sample_period(&self) -> f64 {
        self.timing.sample_period
    }

    pub fn timing(&self) -> SampleTiming {
        self.timing
    }

    pub fn sample_size(&self) -> usize {
        self.header.sample_size as usize
    }

    pub fn parameter_kind(&self) -> ParameterKind {
        self.header.parameter_kind
    }

    pub fn vector_length(&self) -> usize {
        self.header.vector_length()
    }

    /// Offset of the first sample, including compression parameters.
    pub fn header_length(&self) -> u64 {
        self.header_length
    }

    pub fn compression(&self) -> Option<&CompressionParameters> {
        self.compression.as_ref()
    }

    /// Reads the vector of the sample with the given index.
    pub fn read_sample(&self, sample_index: usize) -> Result<Array1<f32>> {
        if sample_index >= self.num_samples() {
            return Err(HtkError::not_found(format!(
                "sample {} of {} in {}",
                sample_index,
                self.num_samples(),
                self.path.display()
            )));
        }

        let mut file = File::open(&self.path)?;
        let offset = self.header_length + (sample_index * self.sample_size()) as u64;
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer =
            vec![0u8; self.vector_length() * self.header.parameter_kind.element_width()];
        fill(&mut file, &mut buffer, "sample")?;

        Ok(Array1::from(decode_elements(
            &buffer,
            &self.header,
            self.compression.as_ref(),
            self.host,
        )))
    }

    /// Reads all samples as a `(num_samples, vector_length)` array.
    ///
    /// A trailing checksum element is dropped when the checksum flag is set.
    pub fn read_data(&self) -> Result<Array2<f32>> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_CAPACITY, file);
        reader.seek(SeekFrom::Start(self.header_length))?;

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let width = self.header.parameter_kind.element_width();
        if bytes.len() % width != 0 {
            return Err(HtkError::format(format!(
                "{}: sample region of {} bytes is not a multiple of {}",
                self.path.display(),
                bytes.len(),
                width
            )));
        }
        if self.header.parameter_kind.has_checksum() && bytes.len() >= width {
            bytes.truncate(bytes.len() - width);
        }

        let values = decode_elements(&bytes, &self.header, self.compression.as_ref(), self.host);
        let vector_length = self.vector_length();
        if values.len() % vector_length != 0 {
            return Err(HtkError::format(format!(
                "{}: {} elements do not form whole vectors of length {}",
                self.path.display(),
                values.len(),
                vector_length
            )));
        }

        Array2::from_shape_vec((values.len() / vector_length, vector_length), values)
            .map_err(|e| HtkError::format(e.to_string()))
    }

    /// Iterates sample vectors in file order, reading one vector per step.
    pub fn samples(&self) -> impl Iterator<Item = Result<Array1<f32>>> + '_ {
        (0..self.num_samples()).map(move |index| self.read_sample(index))
    }
}

/// Helper function to fill a buffer, mapping a short read to a format error
fn fill<R: Read>(reader: &mut R, buffer: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buffer).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            HtkError::format(format!("truncated {}: expected {} bytes", what, buffer.len()))
        }
        _ => HtkError::Io(e),
    })
}
