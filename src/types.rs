use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Length in bytes of the fixed HTK header.
pub const HEADER_LENGTH: usize = 12;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HtkError>;

/// Base sample kind stored in the low 6 bits of the parameter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    /// Sampled waveform
    Waveform,
    /// Linear prediction filter coefficients
    Lpc,
    /// Linear prediction reflection coefficients
    LpcRefc,
    /// LPC cepstral coefficients
    LpcCepstra,
    /// LPC cepstra plus delta coefficients
    LpcDelCep,
    /// LPC reflection coefficients in 16 bit integer format
    IRefc,
    /// Mel-frequency cepstral coefficients
    Mfcc,
    /// Log mel-filter bank channel outputs
    FBank,
    /// Linear mel-filter bank channel outputs
    MelSpec,
    /// User-defined sample kind
    User,
    /// Vector quantised data
    Discrete,
    /// Any code outside the documented range
    Unknown(u16),
}

impl BaseKind {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => BaseKind::Waveform,
            1 => BaseKind::Lpc,
            2 => BaseKind::LpcRefc,
            3 => BaseKind::LpcCepstra,
            4 => BaseKind::LpcDelCep,
            5 => BaseKind::IRefc,
            6 => BaseKind::Mfcc,
            7 => BaseKind::FBank,
            8 => BaseKind::MelSpec,
            9 => BaseKind::User,
            10 => BaseKind::Discrete,
            other => BaseKind::Unknown(other),
        }
    }
}

/// Parameter kind bitmask of an HTK file.
///
/// The low 6 bits carry the [`BaseKind`], the remaining bits are modifier flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterKind(pub u16);

impl ParameterKind {
    pub const BASE_MASK: u16 = 0x3f;
    /// Has energy
    pub const HAS_ENERGY: u16 = 0o000100;
    /// Absolute energy suppressed
    pub const ENERGY_SUPPRESSED: u16 = 0o000200;
    /// Has delta coefficients
    pub const HAS_DELTA: u16 = 0o000400;
    /// Has acceleration (delta-delta) coefficients
    pub const HAS_DELTA_DELTA: u16 = 0o001000;
    /// Is compressed
    pub const COMPRESSED: u16 = 0o002000;
    /// Has zero mean static coefficients
    pub const ZERO_MEAN: u16 = 0o004000;
    /// Has CRC checksum
    pub const HAS_CHECKSUM: u16 = 0o010000;
    /// Has 0th cepstral coefficient
    pub const HAS_ZEROTH_CEPSTRAL: u16 = 0o020000;

    pub fn base(self) -> BaseKind {
        BaseKind::from_code(self.0 & Self::BASE_MASK)
    }

    pub fn has(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn is_compressed(self) -> bool {
        self.has(Self::COMPRESSED)
    }

    pub fn has_checksum(self) -> bool {
        self.has(Self::HAS_CHECKSUM)
    }

    /// Width in bytes of one stored element: 2 for compressed data, 4 otherwise.
    pub fn element_width(self) -> usize {
        if self.is_compressed() {
            2
        } else {
            4
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.base())?;
        let flags = [
            (Self::HAS_ENERGY, "_E"),
            (Self::ENERGY_SUPPRESSED, "_N"),
            (Self::HAS_DELTA, "_D"),
            (Self::HAS_DELTA_DELTA, "_A"),
            (Self::COMPRESSED, "_C"),
            (Self::ZERO_MEAN, "_Z"),
            (Self::HAS_CHECKSUM, "_K"),
            (Self::HAS_ZEROTH_CEPSTRAL, "_O"),
        ];
        for (flag, suffix) in flags {
            if self.has(flag) {
                write!(f, "{}", suffix)?;
            }
        }
        Ok(())
    }
}

/// The fixed 12-byte header at the start of every HTK file.
///
/// All fields are stored big-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingHeader {
    /// Number of sample vectors in the file
    pub num_samples: u32,
    /// Sample period in 100ns units, or a hardware rate numerator when a
    /// sample rate base is configured
    pub rate_field: u32,
    /// Number of bytes per sample vector
    pub sample_size: u16,
    /// Code indicating the sample kind
    pub parameter_kind: ParameterKind,
}

impl RecordingHeader {
    /// Number of elements per sample vector.
    pub fn vector_length(&self) -> usize {
        self.sample_size as usize / self.parameter_kind.element_width()
    }
}

/// Sampling rate and period derived from a header's rate field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleTiming {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Sample period; 100ns units when read directly from the header,
    /// nanoseconds when derived from a rate base
    pub sample_period: f64,
}

impl SampleTiming {
    /// Interprets `rate_field` either as a period (no base) or as a rate numerator.
    pub fn from_rate_field(rate_field: u32, sample_rate_base: Option<f64>) -> Self {
        match sample_rate_base {
            Some(base) if base != 0.0 => {
                let sample_rate = rate_field as f64 / base;
                SampleTiming {
                    sample_rate,
                    sample_period: (1.0 / sample_rate) * 1_000_000_000.0,
                }
            }
            _ => {
                let sample_period = rate_field as f64;
                SampleTiming {
                    sample_rate: (10000.0 / sample_period) * 1000.0,
                    sample_period,
                }
            }
        }
    }
}

/// Scale and bias vectors used to expand compressed 16 bit samples.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionParameters {
    /// Per-coefficient scale `A`
    pub scale: Vec<f32>,
    /// Per-coefficient bias `B`
    pub bias: Vec<f32>,
}

impl CompressionParameters {
    /// Fixed parameters of the reflection coefficient sub-kind.
    pub fn reflection_coefficients(vector_length: usize) -> Self {
        CompressionParameters {
            scale: vec![32767.0; vector_length],
            bias: vec![0.0; vector_length],
        }
    }

    /// Expands one raw value of coefficient `k`: `(raw + B[k]) / A[k]`.
    pub fn expand(&self, k: usize, raw: i16) -> f32 {
        (raw as f32 + self.bias[k]) / self.scale[k]
    }
}

/// Byte order of the host doing the decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// Whether values read in this order must be swapped to match big-endian disk data.
    pub fn swap_required(self) -> bool {
        self != Endianness::Big
    }
}

/// Non-fatal findings reported alongside a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The directory filter matched no HTK files
    NoFilesFound { directory: PathBuf },
    /// The band count parsed from the directory name differs from the header
    BandCountMismatch {
        from_name: Option<usize>,
        from_header: usize,
    },
    /// No default square layout exists for this many electrodes
    NonSquareLayout { num_electrodes: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::NoFilesFound { directory } => {
                write!(f, "No HTK files found in {}", directory.display())
            }
            Diagnostic::BandCountMismatch {
                from_name,
                from_header,
            } => match from_name {
                Some(n) => write!(
                    f,
                    "Number of bands in the directory name {} does not match number of bands in files {}",
                    n, from_header
                ),
                None => write!(
                    f,
                    "Directory name has no band count; files have {} bands",
                    from_header
                ),
            },
            Diagnostic::NonSquareLayout { num_electrodes } => write!(
                f,
                "Default rectangular layout not possible for {} electrodes",
                num_electrodes
            ),
        }
    }
}

/// Errors raised while ingesting recordings.
#[derive(Debug, thiserror::Error)]
pub enum HtkError {
    /// Truncated or corrupt data, or an ambiguous directory layout
    #[error("Format error: {0}")]
    Format(String),

    /// Header fields differ between files of one collection
    #[error("Inconsistent {field} in {}: expected {expected}, found {found}", .path.display())]
    Consistency {
        path: PathBuf,
        field: &'static str,
        expected: String,
        found: String,
    },

    /// A requested stream, epoc or channel does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A caller-supplied parameter is outside the supported set
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O error occurred during file reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HtkError {
    pub fn format<S: Into<String>>(s: S) -> Self {
        Self::Format(s.into())
    }

    pub fn not_found<S: Into<String>>(s: S) -> Self {
        Self::NotFound(s.into())
    }

    pub fn invalid_argument<S: Into<String>>(s: S) -> Self {
        Self::InvalidArgument(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_kind_splits_base_and_flags() {
        let kind = ParameterKind(6 | ParameterKind::COMPRESSED | ParameterKind::HAS_CHECKSUM);
        assert_eq!(kind.base(), BaseKind::Mfcc);
        assert!(kind.is_compressed());
        assert!(kind.has_checksum());
        assert!(!kind.has(ParameterKind::HAS_ENERGY));
        assert_eq!(kind.element_width(), 2);
        assert_eq!(kind.to_string(), "Mfcc_C_K");
    }

    #[test]
    fn vector_length_depends_on_compression() {
        let mut header = RecordingHeader {
            num_samples: 10,
            rate_field: 100,
            sample_size: 16,
            parameter_kind: ParameterKind(0),
        };
        assert_eq!(header.vector_length(), 4);
        header.parameter_kind = ParameterKind(ParameterKind::COMPRESSED);
        assert_eq!(header.vector_length(), 8);
    }

    #[test]
    fn timing_with_and_without_base() {
        let with_base = SampleTiming::from_rate_field(30_517_578, Some(10000.0));
        assert!((with_base.sample_rate - 3051.7578).abs() < 1e-9);

        let period = SampleTiming::from_rate_field(625, None);
        assert_eq!(period.sample_period, 625.0);
        assert!((period.sample_rate - 16000.0).abs() < 1e-9);
    }

    #[test]
    fn only_big_endian_hosts_skip_swapping() {
        assert!(Endianness::Little.swap_required());
        assert!(!Endianness::Big.swap_required());
    }
}
