use htk_importer::{
    encode_header, ChannelCollection, ChunkLayout, CollectionOptions, HtkError, ParameterKind,
    RecordingHeader, RecordingSource, TimeAxis,
};
use ndarray::{Array2, Axis};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn header(num_samples: u32) -> RecordingHeader {
    RecordingHeader {
        num_samples,
        rate_field: 416,
        sample_size: 4,
        parameter_kind: ParameterKind(0),
    }
}

fn write_htk(dir: &Path, name: &str, header: &RecordingHeader, values: &[f32]) {
    let mut bytes = encode_header(header).to_vec();
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    fs::write(dir.join(name), bytes).unwrap();
}

/// Sixteen single-band channels named ecog01..ecog16; sample `s` of channel
/// `c` holds `c * 10000 + s`.
fn ecog_directory() -> TempDir {
    let dir = TempDir::new().unwrap();
    for ch in 1..=16u32 {
        let values: Vec<f32> = (0..1000).map(|s| (ch * 10000 + s) as f32).collect();
        write_htk(dir.path(), &format!("ecog{:02}.htk", ch), &header(1000), &values);
    }
    dir
}

#[test]
fn sixteen_channel_directory() {
    let dir = ecog_directory();
    let mut collection = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();

    assert_eq!(collection.shape(), (16, 1000, 1));
    assert!((collection.sample_rate().unwrap() - 0.0416).abs() < 1e-12);
    assert!(collection.diagnostics().is_empty());

    let layout = collection.layout().unwrap();
    assert_eq!(layout[[0, 0]], 15);
    assert_eq!(layout[[3, 3]], 0);

    let data = collection.read_data().unwrap();
    assert_eq!(data.dim(), (16, 1000, 1));
    let squeezed = data.index_axis(Axis(2), 0);
    assert_eq!(squeezed.dim(), (16, 1000));
    assert_eq!(squeezed[[0, 0]], 10000.0);
    assert_eq!(squeezed[[15, 999]], 160999.0);
}

#[test]
fn chunked_iteration_matches_eager_read() {
    let dir = ecog_directory();
    let mut collection = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();

    let layout = ChunkLayout {
        time_axis_first: true,
        has_bands: false,
    };
    let mut assembled = Array2::<f32>::zeros((1000, 16));
    for chunk in collection.chunks(layout) {
        chunk.unwrap().write_into(&mut assembled).unwrap();
    }

    let eager = collection.read_band(0).unwrap();
    assert_eq!(assembled, eager.reversed_axes());
}

#[test]
fn mixed_file_sizes_fail_before_headers_are_read() {
    let dir = TempDir::new().unwrap();
    write_htk(dir.path(), "ecog1.htk", &header(3), &[0.0; 3]);
    // garbage that is not even a header
    fs::write(dir.path().join("ecog2.htk"), [1u8, 2, 3]).unwrap();

    let err = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap_err();
    match err {
        HtkError::Format(message) => assert!(message.contains("varying size")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn file_indices_are_gap_free_after_renumbering() {
    let dir = TempDir::new().unwrap();
    for ch in [33, 40, 35, 64, 50] {
        write_htk(dir.path(), &format!("Wav{}.htk", ch), &header(2), &[0.0, 1.0]);
    }

    let collection = ChannelCollection::open(dir.path(), CollectionOptions::default()).unwrap();
    let mut seen: Vec<usize> = (0..collection.num_files())
        .map(|i| collection.channel_index(i).unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert_eq!(collection.channel_ids(), vec![33, 35, 40, 50, 64]);
    assert!(collection.channel_map().iter().all(|cell| cell.is_some()));
}

#[test]
fn consistency_check_names_the_offending_file() {
    let dir = TempDir::new().unwrap();
    write_htk(dir.path(), "ecog1.htk", &header(4), &[0.0; 4]);
    let wider = RecordingHeader {
        num_samples: 2,
        sample_size: 8,
        ..header(2)
    };
    write_htk(dir.path(), "ecog2.htk", &wider, &[0.0; 4]);

    let err = ChannelCollection::open(
        dir.path(),
        CollectionOptions::default().with_consistency_check(),
    )
    .unwrap_err();
    match err {
        HtkError::Consistency {
            path,
            field,
            expected,
            found,
        } => {
            assert!(path.ends_with("ecog2.htk"));
            assert_eq!(field, "num_samples");
            assert_eq!(expected, "4");
            assert_eq!(found, "2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn recording_output_serializes_to_json() {
    let dir = TempDir::new().unwrap();
    for ch in 1..=4u32 {
        write_htk(dir.path(), &format!("ecog{}.htk", ch), &header(3), &[ch as f32; 3]);
    }

    let source = RecordingSource::open_channels(dir.path(), CollectionOptions::default()).unwrap();
    assert_eq!(source.list_channels().unwrap(), vec![1, 2, 3, 4]);
    let output = source.into_output(TimeAxis::First).unwrap();
    assert_eq!(output.data.dim(), (3, 4));

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["channel_ids"][3], 4);
    assert!(json["start_time"].is_null());
}
