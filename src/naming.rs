//! Filename and directory-name conventions of HTK recordings.
//!
//! These follow the legacy naming scheme literally, quirks included:
//! the first trailing digit is the block number in block mode, so block
//! numbers above 9 cannot be represented.

use crate::types::*;

/// Extension every channel file carries.
pub const HTK_EXTENSION: &str = ".htk";

/// Base name with the `.htk` extension removed.
pub fn stem(file_name: &str) -> &str {
    file_name.strip_suffix(HTK_EXTENSION).unwrap_or(file_name)
}

/// Maximal run of ASCII digits at the end of the file stem.
pub fn trailing_digits(file_name: &str) -> &str {
    let stem = stem(file_name);
    let start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(stem.len());
    &stem[start..]
}

/// Infers the 1-based `(block, channel)` numbers encoded in a file name.
///
/// With `no_block` the whole trailing digit run is the channel and the block
/// is always 1. Otherwise the first digit is the block and the rest the channel.
pub fn parse_file_indices(file_name: &str, no_block: bool) -> Result<(u32, u32)> {
    let digits = trailing_digits(file_name);
    let parse = |s: &str| {
        s.parse::<u32>().map_err(|_| {
            HtkError::format(format!(
                "cannot infer channel index from file name '{}'",
                file_name
            ))
        })
    };

    if no_block {
        Ok((1, parse(digits)?))
    } else {
        if digits.len() < 2 {
            return Err(HtkError::format(format!(
                "file name '{}' needs a block digit followed by channel digits",
                file_name
            )));
        }
        Ok((parse(&digits[..1])?, parse(&digits[1..])?))
    }
}

/// Key matched against an id-set postfix filter.
///
/// Block mode concatenates the decimal block and channel numbers, so leading
/// zeros of the channel digits are lost (`ecog101` gives `11`).
pub fn postfix_key(block: u32, channel: u32, no_block: bool) -> u64 {
    if no_block {
        channel as u64
    } else {
        format!("{}{}", block, channel).parse().unwrap_or(u64::MAX)
    }
}

/// Band information parsed from a directory name like `HilbAA_70to150_8band`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandName {
    /// Band count before the `band` marker, if it is numeric
    pub num_bands: Option<usize>,
    /// `(low, high)` frequency range in Hz, if it parses
    pub range: Option<(u32, u32)>,
}

/// Parses the `..._<low>to<high>_<n>band` convention.
///
/// Returns `None` unless `band` occurs after the first character.
pub fn parse_band_name(dir_name: &str) -> Option<BandName> {
    let band_index = dir_name.find("band").filter(|&i| i > 0)?;
    let parts: Vec<&str> = dir_name[..band_index].split('_').collect();

    let last = parts.last().copied().unwrap_or_default();
    let num_bands = if is_number(last) {
        last.parse().ok()
    } else {
        None
    };

    let range = if parts.len() >= 2 {
        let bounds: Vec<&str> = parts[parts.len() - 2].split("to").collect();
        match bounds.as_slice() {
            [low, high] if is_number(low) && is_number(high) => {
                Some((low.parse().ok()?, high.parse().ok()?))
            }
            _ => None,
        }
    } else {
        None
    };

    Some(BandName { num_bands, range })
}

/// Logarithmically spaced band centers over `[low, high)`.
///
/// Centers are `low + 10^(i * log10(high - low) / n)` for `i` in `0..n`.
pub fn log_spaced_bands(low: u32, high: u32, num_bands: usize) -> Option<Vec<f64>> {
    if high <= low || num_bands == 0 {
        return None;
    }
    let stop = ((high - low) as f64).log10();
    Some(
        (0..num_bands)
            .map(|i| 10f64.powf(stop * i as f64 / num_bands as f64) + low as f64)
            .collect(),
    )
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_digit_run() {
        assert_eq!(trailing_digits("ecog01.htk"), "01");
        assert_eq!(trailing_digits("Wav4_12.htk"), "12");
        assert_eq!(trailing_digits("noindex.htk"), "");
        assert_eq!(trailing_digits("123.htk"), "123");
    }

    #[test]
    fn no_block_uses_whole_run_as_channel() {
        assert_eq!(parse_file_indices("ecog16.htk", true).unwrap(), (1, 16));
        assert_eq!(parse_file_indices("Wav3.htk", true).unwrap(), (1, 3));
    }

    #[test]
    fn block_mode_splits_first_digit() {
        assert_eq!(parse_file_indices("Wav101.htk", false).unwrap(), (1, 1));
        assert_eq!(parse_file_indices("Wav264.htk", false).unwrap(), (2, 64));
        // block 12, channel 3 reads as block 1, channel 23
        assert_eq!(parse_file_indices("Wav123.htk", false).unwrap(), (1, 23));
    }

    #[test]
    fn missing_digits_are_rejected() {
        assert!(matches!(
            parse_file_indices("ecog.htk", true),
            Err(HtkError::Format(_))
        ));
        assert!(matches!(
            parse_file_indices("Wav7.htk", false),
            Err(HtkError::Format(_))
        ));
    }

    #[test]
    fn postfix_key_drops_leading_zeros() {
        assert_eq!(postfix_key(1, 5, true), 5);
        assert_eq!(postfix_key(1, 1, false), 11);
        assert_eq!(postfix_key(2, 64, false), 264);
    }

    #[test]
    fn parses_band_directory_names() {
        assert_eq!(
            parse_band_name("HilbAA_70to150_8band"),
            Some(BandName {
                num_bands: Some(8),
                range: Some((70, 150)),
            })
        );
        assert_eq!(
            parse_band_name("R32_B7_Hilb_54bands"),
            Some(BandName {
                num_bands: Some(54),
                range: None,
            })
        );
        assert_eq!(parse_band_name("RawHTK"), None);
        assert_eq!(parse_band_name("bands"), None);
    }

    #[test]
    fn log_spaced_centers() {
        let bands = log_spaced_bands(70, 170, 2).unwrap();
        assert_eq!(bands.len(), 2);
        assert!((bands[0] - 71.0).abs() < 1e-9);
        assert!((bands[1] - 80.0).abs() < 1e-9);
        assert!(log_spaced_bands(150, 70, 4).is_none());
    }
}
