use ndarray::{s, Array2, Array3, Axis};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::iterator::{ChannelChunkIterator, ChunkLayout};
use crate::layout::default_layout;
use crate::naming::{self, HTK_EXTENSION};
use crate::reader::HtkFile;
use crate::types::*;

// Progress is logged every this many percent during eager reads
const PRINT_PROGRESS_STEP: usize = 10;

/// Restricts which files of a directory belong to a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixFilter {
    /// Keep files whose name, without extension, ends with one of these strings
    Suffixes(Vec<String>),
    /// Keep files whose postfix key (see [`naming::postfix_key`]) is in the set
    Ids(BTreeSet<u64>),
}

/// Where the band centers of a collection come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BandSource {
    /// Bands stay unset; sequential band indices are implied
    #[default]
    None,
    /// Band centers supplied by the caller
    Explicit(Vec<f64>),
    /// Parse `..._<low>to<high>_<n>band` from the directory name
    FromDirectoryName,
}

/// Options controlling how a directory is turned into a collection.
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Prefix valid file names must start with
    pub prefix: Option<String>,
    /// Optional postfix filter
    pub postfix: Option<PostfixFilter>,
    /// File names carry no block digit
    pub no_block: bool,
    /// Compare every file header against the first one
    pub check_consistency: bool,
    /// Divisor turning the header rate field into Hz; `None` if the header
    /// stores a sample period in 100ns units
    pub sample_rate_base: Option<f64>,
    /// Source of the band centers
    pub bands: BandSource,
    /// Electrode layout; the default square layout is used when unset
    pub layout: Option<Array2<usize>>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            postfix: None,
            no_block: true,
            check_consistency: false,
            sample_rate_base: Some(10000.0),
            bands: BandSource::None,
            layout: None,
        }
    }
}

impl CollectionOptions {
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_postfix(mut self, postfix: PostfixFilter) -> Self {
        self.postfix = Some(postfix);
        self
    }

    pub fn with_blocks(mut self) -> Self {
        self.no_block = false;
        self
    }

    pub fn with_consistency_check(mut self) -> Self {
        self.check_consistency = true;
        self
    }

    pub fn with_sample_rate_base(mut self, base: Option<f64>) -> Self {
        self.sample_rate_base = base;
        self
    }

    pub fn with_bands(mut self, bands: BandSource) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_layout(mut self, layout: Array2<usize>) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// One channel file of a collection.
///
/// Indices are derived from the trailing digits of the file name, so
/// renaming a file changes where it lands.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFile {
    /// Full path of the file
    pub path: PathBuf,
    /// 0-based block index
    pub block_index: usize,
    /// 0-based channel index within the block
    pub channel_index: usize,
    /// Id matched by [`PostfixFilter::Ids`] and reported as the channel id
    pub id: u64,
}

impl ChannelFile {
    /// Opens the file and decodes its header.
    pub fn open(&self, sample_rate_base: Option<f64>) -> Result<HtkFile> {
        HtkFile::open(&self.path, sample_rate_base)
    }
}

/// A directory of same-sized HTK files from one recording.
///
/// Built once at open time and read-only afterwards, except for the optional
/// data cache filled by [`ChannelCollection::read_data`].
#[derive(Debug, Clone)]
pub struct ChannelCollection {
    directory: PathBuf,
    sample_rate_base: Option<f64>,
    files: Vec<ChannelFile>,
    channel_map: Array2<Option<usize>>,
    first: Option<HtkFile>,
    bands: Option<Vec<f64>>,
    layout: Option<Array2<usize>>,
    diagnostics: Vec<Diagnostic>,
    data: Option<Array3<f32>>,
}

impl ChannelCollection {
    /// Discovers the HTK files of `directory` and indexes them by block and channel.
    ///
    /// # Errors
    ///
    /// * [`HtkError::Format`] if the matching files differ in byte size, a file
    ///   name has no usable index, or two files map to the same channel
    /// * [`HtkError::Consistency`] if the consistency check was requested and
    ///   a header differs from the first file's
    ///
    /// A filter that matches nothing is not an error: the collection is empty
    /// and carries a [`Diagnostic::NoFilesFound`].
    pub fn open<P: AsRef<Path>>(directory: P, options: CollectionOptions) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let mut diagnostics = Vec::new();

        let paths = list_files(&directory, &options)?;
        if paths.is_empty() {
            log::warn!("No HTK files found in {}", directory.display());
            diagnostics.push(Diagnostic::NoFilesFound {
                directory: directory.clone(),
            });
            return Ok(ChannelCollection {
                directory,
                sample_rate_base: options.sample_rate_base,
                files: Vec::new(),
                channel_map: Array2::from_elem((0, 0), None),
                first: None,
                bands: None,
                layout: None,
                diagnostics,
                data: None,
            });
        }

        check_file_sizes(&directory, &paths)?;
        let (files, channel_map) = index_files(paths, options.no_block)?;
        log::info!(
            "Found {} HTK files in {} ({} blocks x {} channels)",
            files.len(),
            directory.display(),
            channel_map.nrows(),
            channel_map.ncols()
        );

        let first = files[0].open(options.sample_rate_base)?;
        if options.check_consistency {
            check_consistency(&first, &files, options.sample_rate_base)?;
        }

        let layout = match options.layout {
            Some(layout) => Some(layout),
            None => {
                let layout = default_layout(files.len());
                if layout.is_none() {
                    log::warn!(
                        "Default rectangular layout not possible for {} electrodes",
                        files.len()
                    );
                    diagnostics.push(Diagnostic::NonSquareLayout {
                        num_electrodes: files.len(),
                    });
                }
                layout
            }
        };

        let bands = derive_bands(
            &options.bands,
            &directory,
            first.vector_length(),
            &mut diagnostics,
        );

        Ok(ChannelCollection {
            directory,
            sample_rate_base: options.sample_rate_base,
            files,
            channel_map,
            first: Some(first),
            bands,
            layout,
            diagnostics,
            data: None,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Files in canonical `(block, channel)` order.
    pub fn files(&self) -> &[ChannelFile] {
        &self.files
    }

    pub fn num_files(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn num_blocks(&self) -> usize {
        self.channel_map.nrows()
    }

    pub fn channels_per_block(&self) -> usize {
        self.channel_map.ncols()
    }

    /// Map of `(block, channel)` to file position; `None` where no file exists.
    pub fn channel_map(&self) -> &Array2<Option<usize>> {
        &self.channel_map
    }

    /// File position of the given block and channel.
    pub fn file_at(&self, block: usize, channel: usize) -> Option<usize> {
        self.channel_map.get((block, channel)).copied().flatten()
    }

    pub fn block_index(&self, file_index: usize) -> Option<usize> {
        self.files.get(file_index).map(|f| f.block_index)
    }

    pub fn channel_index(&self, file_index: usize) -> Option<usize> {
        self.files.get(file_index).map(|f| f.channel_index)
    }

    /// Channel ids in file order.
    pub fn channel_ids(&self) -> Vec<u64> {
        self.files.iter().map(|f| f.id).collect()
    }

    /// Header shared by the collection, taken from its first file.
    pub fn header(&self) -> Option<&RecordingHeader> {
        self.first.as_ref().map(|f| f.header())
    }

    pub fn num_samples(&self) -> usize {
        self.first.as_ref().map_or(0, |f| f.num_samples())
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.first.as_ref().map(|f| f.sample_rate())
    }

    pub fn sample_period(&self) -> Option<f64> {
        self.first.as_ref().map(|f| f.sample_period())
    }

    pub fn sample_size(&self) -> usize {
        self.first.as_ref().map_or(0, |f| f.sample_size())
    }

    pub fn parameter_kind(&self) -> Option<ParameterKind> {
        self.first.as_ref().map(|f| f.parameter_kind())
    }

    pub fn num_bands(&self) -> usize {
        self.first.as_ref().map_or(0, |f| f.vector_length())
    }

    /// `(num_files, num_samples, num_bands)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.num_files(), self.num_samples(), self.num_bands())
    }

    /// Band centers, if known.
    pub fn bands(&self) -> Option<&[f64]> {
        self.bands.as_deref()
    }

    pub fn layout(&self) -> Option<&Array2<usize>> {
        self.layout.as_ref()
    }

    /// Warnings collected while opening the collection.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Reads one channel as a `(num_samples, num_bands)` array.
    ///
    /// Served from the cache when [`ChannelCollection::read_data`] has run.
    pub fn read_channel(&self, file_index: usize) -> Result<Array2<f32>> {
        if let Some(data) = &self.data {
            if file_index < data.len_of(Axis(0)) {
                return Ok(data.index_axis(Axis(0), file_index).to_owned());
            }
        }

        let file = self.files.get(file_index).ok_or_else(|| {
            HtkError::not_found(format!(
                "file {} of {} in {}",
                file_index,
                self.files.len(),
                self.directory.display()
            ))
        })?;

        let channel = file.open(self.sample_rate_base)?.read_data()?;
        let expected = (self.num_samples(), self.num_bands());
        if channel.dim() != expected {
            return Err(HtkError::format(format!(
                "{}: expected {} x {} samples, found {} x {}",
                file.path.display(),
                expected.0,
                expected.1,
                channel.nrows(),
                channel.ncols()
            )));
        }
        Ok(channel)
    }

    /// Reads every channel into a `(num_files, num_samples, num_bands)` array.
    ///
    /// The result is cached until [`ChannelCollection::clear_data`] is called.
    pub fn read_data(&mut self) -> Result<&Array3<f32>> {
        if self.data.is_none() {
            let mut data = Array3::<f32>::zeros(self.shape());
            let num_files = self.files.len();
            let mut percent_done = PRINT_PROGRESS_STEP;

            for file_index in 0..num_files {
                let channel = self.read_channel(file_index)?;
                data.index_axis_mut(Axis(0), file_index).assign(&channel);

                let progress = ((file_index + 1) * 100) / num_files;
                while progress >= percent_done && percent_done <= 100 {
                    log::debug!("Reading HTK collection: {}% done", percent_done);
                    percent_done += PRINT_PROGRESS_STEP;
                }
            }
            log::info!(
                "Read {} channels from {}",
                num_files,
                self.directory.display()
            );
            self.data = Some(data);
        }

        match &self.data {
            Some(data) => Ok(data),
            None => Err(HtkError::not_found("collection data")),
        }
    }

    /// Reads one band of every channel as a `(num_files, num_samples)` array.
    pub fn read_band(&mut self, band: usize) -> Result<Array2<f32>> {
        let num_bands = self.num_bands();
        if band >= num_bands && !self.is_empty() {
            return Err(HtkError::not_found(format!(
                "band {} of {}",
                band, num_bands
            )));
        }
        if self.is_empty() {
            return Ok(Array2::zeros((0, 0)));
        }
        Ok(self.read_data()?.slice(s![.., .., band]).to_owned())
    }

    /// Cached data from the last eager read, if still held.
    pub fn data(&self) -> Option<&Array3<f32>> {
        self.data.as_ref()
    }

    /// Releases the cached data.
    pub fn clear_data(&mut self) {
        self.data = None;
    }

    /// Streams the collection one channel at a time.
    pub fn chunks(&self, layout: ChunkLayout) -> ChannelChunkIterator<'_> {
        ChannelChunkIterator::new(self, layout)
    }
}

/// Helper function to list the matching HTK files of a directory, sorted by name
fn list_files(directory: &Path, options: &CollectionOptions) -> Result<Vec<PathBuf>> {
    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(HTK_EXTENSION) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    if let Some(prefix) = &options.prefix {
        names.retain(|name| name.starts_with(prefix.as_str()));
    }

    match &options.postfix {
        Some(PostfixFilter::Suffixes(suffixes)) => {
            names.retain(|name| {
                let stem = naming::stem(name);
                suffixes.iter().any(|suffix| stem.ends_with(suffix.as_str()))
            });
        }
        Some(PostfixFilter::Ids(ids)) => {
            let mut kept = Vec::with_capacity(names.len());
            for name in names {
                let (block, channel) = naming::parse_file_indices(&name, options.no_block)?;
                if ids.contains(&naming::postfix_key(block, channel, options.no_block)) {
                    kept.push(name);
                }
            }
            names = kept;
        }
        None => {}
    }

    Ok(names.into_iter().map(|name| directory.join(name)).collect())
}

/// Helper function to reject directories mixing files of different sizes
fn check_file_sizes(directory: &Path, paths: &[PathBuf]) -> Result<()> {
    let mut sizes = BTreeSet::new();
    for path in paths {
        sizes.insert(fs::metadata(path)?.len());
    }
    if sizes.len() != 1 {
        return Err(HtkError::format(format!(
            "HTK files of varying size found in {}: {:?} bytes. Try to set the prefix filter",
            directory.display(),
            sizes
        )));
    }
    Ok(())
}

/// Helper function to infer indices, order the files and build the channel map
///
/// When the smallest channel index is above zero, channels are renumbered by
/// their position in `(block, channel)` order and every block is as wide as
/// the whole file list.
fn index_files(
    paths: Vec<PathBuf>,
    no_block: bool,
) -> Result<(Vec<ChannelFile>, Array2<Option<usize>>)> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let (block, channel) = naming::parse_file_indices(&name, no_block)?;
        let (block_index, channel_index) = match (block.checked_sub(1), channel.checked_sub(1)) {
            (Some(b), Some(c)) => (b as usize, c as usize),
            _ => {
                return Err(HtkError::format(format!(
                    "'{}' encodes a zero index; block and channel numbers are 1-based",
                    name
                )))
            }
        };
        files.push(ChannelFile {
            path,
            block_index,
            channel_index,
            id: naming::postfix_key(block, channel, no_block),
        });
    }

    files.sort_by_key(|f| (f.block_index, f.channel_index));
    if let Some(pair) = files
        .windows(2)
        .find(|w| (w[0].block_index, w[0].channel_index) == (w[1].block_index, w[1].channel_index))
    {
        return Err(HtkError::format(format!(
            "{} and {} map to the same block and channel",
            pair[0].path.display(),
            pair[1].path.display()
        )));
    }

    let num_blocks = files.iter().map(|f| f.block_index).max().unwrap_or(0) + 1;
    let min_channel = files.iter().map(|f| f.channel_index).min().unwrap_or(0);
    let channels_per_block = if min_channel > 0 {
        for (position, file) in files.iter_mut().enumerate() {
            file.channel_index = position;
        }
        files.len()
    } else {
        files.iter().map(|f| f.channel_index).max().unwrap_or(0) + 1
    };

    let mut channel_map = Array2::from_elem((num_blocks, channels_per_block), None);
    for (position, file) in files.iter().enumerate() {
        channel_map[[file.block_index, file.channel_index]] = Some(position);
    }

    Ok((files, channel_map))
}

/// Helper function to compare every header against the first file
fn check_consistency(
    first: &HtkFile,
    files: &[ChannelFile],
    sample_rate_base: Option<f64>,
) -> Result<()> {
    for file in files.iter().skip(1) {
        let other = file.open(sample_rate_base)?;
        let fields: [(&'static str, String, String); 5] = [
            (
                "num_samples",
                first.num_samples().to_string(),
                other.num_samples().to_string(),
            ),
            (
                "sample_period",
                first.sample_period().to_string(),
                other.sample_period().to_string(),
            ),
            (
                "sample_rate",
                first.sample_rate().to_string(),
                other.sample_rate().to_string(),
            ),
            (
                "sample_size",
                first.sample_size().to_string(),
                other.sample_size().to_string(),
            ),
            (
                "parameter_kind",
                first.parameter_kind().0.to_string(),
                other.parameter_kind().0.to_string(),
            ),
        ];
        for (field, expected, found) in fields {
            if expected != found {
                return Err(HtkError::Consistency {
                    path: file.path.clone(),
                    field,
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}

/// Helper function to work out the band centers of a collection
fn derive_bands(
    source: &BandSource,
    directory: &Path,
    num_bands: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Vec<f64>> {
    match source {
        BandSource::None => None,
        BandSource::Explicit(bands) => Some(bands.clone()),
        BandSource::FromDirectoryName => {
            let dir_name = directory.file_name().and_then(|n| n.to_str())?;
            let parsed = naming::parse_band_name(dir_name)?;
            if parsed.num_bands != Some(num_bands) {
                let diagnostic = Diagnostic::BandCountMismatch {
                    from_name: parsed.num_bands,
                    from_header: num_bands,
                };
                log::warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
            }
            let (low, high) = parsed.range?;
            naming::log_spaced_bands(low, high, num_bands)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::encode_header;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_channel(dir: &Path, name: &str, num_samples: u32, value: f32) {
        let header = RecordingHeader {
            num_samples,
            rate_field: 416,
            sample_size: 4,
            parameter_kind: ParameterKind(0),
        };
        let mut bytes = encode_header(&header).to_vec();
        for i in 0..num_samples {
            bytes.extend_from_slice(&(value + i as f32 / 1000.0).to_be_bytes());
        }
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(&bytes).unwrap();
    }

    #[test]
    fn orders_files_by_channel_digits() {
        let dir = TempDir::new().unwrap();
        for ch in [3, 1, 2, 10] {
            write_channel(dir.path(), &format!("ecog{:02}.htk", ch), 5, ch as f32);
        }

        let collection = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();
        assert_eq!(collection.channel_ids(), vec![1, 2, 3, 10]);
        assert_eq!(collection.channel_index(3), Some(9));
        assert_eq!(collection.channels_per_block(), 10);
        assert_eq!(collection.file_at(0, 9), Some(3));
        assert_eq!(collection.file_at(0, 5), None);
        assert_eq!(collection.read_channel(2).unwrap()[[0, 0]], 3.0);
    }

    #[test]
    fn renumbers_channels_when_none_start_at_one() {
        let dir = TempDir::new().unwrap();
        for ch in [17, 19, 18] {
            write_channel(dir.path(), &format!("poly{}.htk", ch), 4, ch as f32);
        }

        let collection = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();
        let indices: Vec<_> = collection.files().iter().map(|f| f.channel_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(collection.channel_ids(), vec![17, 18, 19]);
        assert_eq!(collection.channels_per_block(), 3);
    }

    #[test]
    fn block_mode_builds_a_two_dimensional_map() {
        let dir = TempDir::new().unwrap();
        for name in ["Wav11.htk", "Wav12.htk", "Wav21.htk", "Wav22.htk"] {
            write_channel(dir.path(), name, 3, 0.0);
        }

        let options = CollectionOptions::default().with_blocks();
        let collection = ChannelCollection::open(dir.path(), options).unwrap();
        assert_eq!(collection.num_blocks(), 2);
        assert_eq!(collection.channels_per_block(), 2);
        assert_eq!(collection.file_at(1, 0), Some(2));
        assert_eq!(collection.block_index(3), Some(1));
        assert_eq!(collection.channel_ids(), vec![11, 12, 21, 22]);
    }

    #[test]
    fn prefix_and_postfix_filters() {
        let dir = TempDir::new().unwrap();
        for ch in 1..=4 {
            write_channel(dir.path(), &format!("ecog{}.htk", ch), 3, 0.0);
            write_channel(dir.path(), &format!("poly{}.htk", ch), 7, 0.0);
        }
        fs::write(dir.path().join("notes.txt"), b"not htk").unwrap();

        let by_prefix = ChannelCollection::open(
            dir.path(),
            CollectionOptions::default().with_prefix("ecog"),
        )
        .unwrap();
        assert_eq!(by_prefix.shape(), (4, 3, 1));

        let by_ids = ChannelCollection::open(
            dir.path(),
            CollectionOptions::default()
                .with_prefix("poly")
                .with_postfix(PostfixFilter::Ids([2, 4].into_iter().collect())),
        )
        .unwrap();
        assert_eq!(by_ids.channel_ids(), vec![2, 4]);

        let by_suffix = ChannelCollection::open(
            dir.path(),
            CollectionOptions::default()
                .with_prefix("ecog")
                .with_postfix(PostfixFilter::Suffixes(vec!["3".to_string()])),
        )
        .unwrap();
        assert_eq!(by_suffix.num_files(), 1);
    }

    #[test]
    fn mixed_sizes_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_channel(dir.path(), "ecog1.htk", 3, 0.0);
        write_channel(dir.path(), "ecog2.htk", 4, 0.0);

        let err = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap_err();
        assert!(matches!(err, HtkError::Format(_)));
    }

    #[test]
    fn empty_filter_is_a_diagnostic() {
        let dir = TempDir::new().unwrap();
        write_channel(dir.path(), "ecog1.htk", 3, 0.0);

        let collection = ChannelCollection::open(
            dir.path(),
            CollectionOptions::default().with_prefix("poly"),
        )
        .unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.shape(), (0, 0, 0));
        assert_eq!(
            collection.diagnostics(),
            &[Diagnostic::NoFilesFound {
                directory: dir.path().to_path_buf()
            }]
        );
    }

    #[test]
    fn inconsistent_headers_fail_only_when_checked() {
        let dir = TempDir::new().unwrap();
        write_channel(dir.path(), "ecog1.htk", 3, 0.0);
        // same size, different rate field
        let header = RecordingHeader {
            num_samples: 3,
            rate_field: 500,
            sample_size: 4,
            parameter_kind: ParameterKind(0),
        };
        let mut bytes = encode_header(&header).to_vec();
        bytes.extend_from_slice(&[0u8; 12]);
        fs::write(dir.path().join("ecog2.htk"), bytes).unwrap();

        assert!(ChannelCollection::open(dir.path(), CollectionOptions::default()).is_ok());
        let err = ChannelCollection::open(
            dir.path(),
            CollectionOptions::default().with_consistency_check(),
        )
        .unwrap_err();
        match err {
            HtkError::Consistency { field, .. } => assert_eq!(field, "sample_period"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_channels_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_channel(dir.path(), "ecog1.htk", 3, 0.0);
        write_channel(dir.path(), "ecog01.htk", 3, 0.0);

        let err = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap_err();
        assert!(matches!(err, HtkError::Format(_)));
    }

    #[test]
    fn eager_read_is_cached_until_cleared() {
        let dir = TempDir::new().unwrap();
        for ch in 1..=4 {
            write_channel(dir.path(), &format!("ecog{}.htk", ch), 6, ch as f32);
        }
        let mut collection =
            ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();

        assert!(collection.data().is_none());
        let data = collection.read_data().unwrap();
        assert_eq!(data.dim(), (4, 6, 1));
        assert_eq!(data[[3, 0, 0]], 4.0);
        assert!(collection.data().is_some());
        assert_eq!(collection.read_band(0).unwrap().dim(), (4, 6));

        collection.clear_data();
        assert!(collection.data().is_none());
        assert!(collection.read_band(1).is_err());
    }

    #[test]
    fn non_square_collections_have_no_default_layout() {
        let dir = TempDir::new().unwrap();
        for ch in 1..=3 {
            write_channel(dir.path(), &format!("ecog{}.htk", ch), 2, 0.0);
        }
        let collection = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();
        assert!(collection.layout().is_none());
        assert!(collection
            .diagnostics()
            .contains(&Diagnostic::NonSquareLayout { num_electrodes: 3 }));
    }

    #[test]
    fn bands_from_directory_name_warn_on_count_mismatch() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("HilbAA_70to170_2band");
        fs::create_dir(&dir).unwrap();
        write_channel(&dir, "ecog1.htk", 2, 0.0);

        let collection = ChannelCollection::open(
            &dir,
            CollectionOptions::default().with_bands(BandSource::FromDirectoryName),
        )
        .unwrap();
        assert_eq!(collection.num_bands(), 1);
        assert_eq!(collection.bands(), Some(&[71.0][..]));
        assert!(collection.diagnostics().contains(&Diagnostic::BandCountMismatch {
            from_name: Some(2),
            from_header: 1,
        }));

        let explicit = ChannelCollection::open(
            &dir,
            CollectionOptions::default().with_bands(BandSource::Explicit(vec![100.0])),
        )
        .unwrap();
        assert_eq!(explicit.bands(), Some(&[100.0][..]));
    }
}
