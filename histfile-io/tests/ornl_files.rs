#![allow(clippy::uninlined_format_args)]
use approx::assert_abs_diff_eq;
use histfile_core::{CountKind, Counts, Histogram, Repository, Shape};
use histfile_io::field::FieldWriter;
use histfile_io::ornl::drr::{read_directory, Directory, DESCRIPTION_WIDTH, LABEL_WIDTH, SIGNATURE, TITLE_WIDTH};
use histfile_io::{
    decode_ornl, encode_ornl, load_file, save_file, ByteOrder, CodecConfig, Error, LoadMode,
    OrnlWriteOptions,
};
use std::io::Cursor;
use tempfile::tempdir;

fn three_histograms() -> Vec<Histogram> {
    let ramp: Vec<i32> = (0..10).map(|i| i * 3 - 5).collect();
    let matrix: Vec<i32> = (0..100).collect();
    let tail: Vec<i32> = vec![70_000, 0, 1, 2, 3, 4, -1];
    vec![
        Histogram::new("ramp", Shape::one_d(10).unwrap(), Counts::Int(ramp))
            .unwrap()
            .with_number(4),
        Histogram::new("matrix", Shape::two_d(20, 5).unwrap(), Counts::Int(matrix))
            .unwrap()
            .with_number(1),
        Histogram::new("tail", Shape::one_d(7).unwrap(), Counts::Int(tail))
            .unwrap()
            .with_number(9),
    ]
}

fn encode(histograms: &[Histogram]) -> (Vec<u8>, Vec<u8>) {
    let mut drr = Vec::new();
    let mut his = Vec::new();
    encode_ornl(histograms, &OrnlWriteOptions::default(), &mut drr, &mut his).unwrap();
    (drr, his)
}

#[test]
fn test_three_histograms_roundtrip() {
    let written = three_histograms();
    let (drr, his) = encode(&written);
    assert_eq!(his.len(), (10 + 100 + 7) * 4);

    let (directory, order) = read_directory(drr.as_slice()).unwrap();
    assert_eq!(order, ByteOrder::BigEndian);
    let offsets: Vec<i32> = directory.entries.iter().map(|e| e.offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]), "offsets {:?}", offsets);
    assert_eq!(directory.ids, [4, 1, 9]);

    let read = decode_ornl(drr.as_slice(), Cursor::new(his)).unwrap();
    assert_eq!(read.len(), 3);
    for (r, w) in read.iter().zip(&written) {
        assert_eq!(r.name(), w.name());
        assert_eq!(r.number(), w.number());
        assert_eq!(r.shape(), w.shape());
        assert_eq!(r.counts().len(), w.shape().channel_count());
        assert_eq!(r.counts(), w.counts());
    }
}

#[test]
fn test_double_counts_round_to_nearest() {
    let values = vec![0.2, 0.5, 1.49, 2.51, 1000.0, 7.9999];
    let hist = Histogram::new("calib", Shape::two_d(3, 2).unwrap(), Counts::Double(values.clone()))
        .unwrap()
        .with_number(2);
    let (drr, his) = encode(&[hist]);
    let read = decode_ornl(drr.as_slice(), Cursor::new(his)).unwrap();
    let counts = read[0].counts().as_int().unwrap();
    assert_eq!(read[0].kind(), CountKind::Int);
    for (&got, &want) in counts.iter().zip(&values) {
        assert_abs_diff_eq!(f64::from(got), want.round());
    }
}

#[test]
fn test_reads_foreign_byte_order_and_half_words() {
    // A little-endian pair with 16-bit samples, as written by other systems.
    let hist = Histogram::zeroed("sixteen", Shape::two_d(2, 3).unwrap(), CountKind::Int).with_number(11);
    let mut directory = Directory::for_histograms(&[hist], [0; 7], "foreign").unwrap();
    directory.entries[0].half_words_per_channel = 1;
    directory.header.total_half_words = 6;

    let mut out = FieldWriter::new(Vec::new(), ByteOrder::LittleEndian);
    out.write_bytes(SIGNATURE).unwrap();
    out.write_i32(directory.header.histogram_count).unwrap();
    out.write_i32(directory.header.total_half_words).unwrap();
    for &d in &directory.header.date {
        out.write_i32(d).unwrap();
    }
    out.write_text(&directory.header.description, DESCRIPTION_WIDTH).unwrap();
    let e = &directory.entries[0];
    out.write_i16(e.dimensions).unwrap();
    out.write_i16(e.half_words_per_channel).unwrap();
    for group in [&e.params, &e.raw_lengths, &e.scaled_lengths, &e.min_channels, &e.max_channels] {
        for &v in group {
            out.write_i16(v).unwrap();
        }
    }
    out.write_i32(e.offset).unwrap();
    out.write_text("x", LABEL_WIDTH).unwrap();
    out.write_text("y", LABEL_WIDTH).unwrap();
    for &c in &e.calibration {
        out.write_f32(c).unwrap();
    }
    out.write_text(&e.title, TITLE_WIDTH).unwrap();
    out.write_i32(11).unwrap();
    let drr = out.into_inner();

    // y-outer file order: (0,0) (1,0) (0,1) (1,1) (0,2) (1,2)
    let mut his = Vec::new();
    for v in [1i16, 2, 3, 4, 5, -6] {
        his.extend_from_slice(&v.to_le_bytes());
    }

    let read = decode_ornl(drr.as_slice(), Cursor::new(his)).unwrap();
    assert_eq!(read[0].name(), "sixteen");
    assert_eq!(read[0].number(), 11);
    assert_eq!(read[0].counts().as_int(), Some(&[1, 3, 5, 2, 4, -6][..]));
}

#[test]
fn test_unsupported_word_width() {
    let (mut drr, his) = encode(&three_histograms());
    // word width of the first record, right after its dimensionality
    drr[128 + 2..128 + 4].copy_from_slice(&4i16.to_be_bytes());
    assert!(matches!(
        decode_ornl(drr.as_slice(), Cursor::new(his)),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_short_his_file() {
    let (drr, mut his) = encode(&three_histograms());
    his.truncate(his.len() - 4);
    assert!(matches!(
        decode_ornl(drr.as_slice(), Cursor::new(his)),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn test_paired_files_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run12.drr");
    let mut repo = Repository::new();
    for h in three_histograms() {
        repo.add_histogram(h);
    }
    save_file(&repo, &path, &CodecConfig::default()).unwrap();
    assert!(dir.path().join("run12.his").exists());

    // Either file of the pair can be named.
    let mut loaded = Repository::new();
    load_file(&mut loaded, dir.path().join("run12.his"), LoadMode::Open).unwrap();
    assert_eq!(loaded.histograms().len(), 3);
    assert_eq!(loaded.histogram("matrix").unwrap().counts(), repo.histogram("matrix").unwrap().counts());

    // ADD the same pair again doubles every count.
    let report = load_file(&mut loaded, &path, LoadMode::Add).unwrap();
    assert_eq!(report.histograms, 3);
    assert_eq!(loaded.histogram("ramp").unwrap().counts().as_int().unwrap()[1], -4);
}
