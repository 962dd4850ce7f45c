#![allow(clippy::uninlined_format_args)]
use histfile_core::{CountKind, Counts, Gate, GateKind, GateLimits, Histogram, Repository, Scaler, Shape};
use histfile_io::field::FieldWriter;
use histfile_io::jhf::{MAGIC_V01, MAGIC_V02, NAME_WIDTH, TITLE_WIDTH};
use histfile_io::{
    decode_jhf, encode_jhf, load_file, save_file, ByteOrder, CodecConfig, Error, JhfVersion,
    JhfWriteOptions, LoadMode, Warning,
};
use tempfile::tempdir;

fn sample_repository() -> Repository {
    let mut repo = Repository::new();
    repo.add_histogram(
        Histogram::new(
            "energy",
            Shape::one_d(6).unwrap(),
            Counts::Int(vec![0, 5, -3, i32::MAX, i32::MIN, 17]),
        )
        .unwrap()
        .with_title("Clover energy, all crystals")
        .with_number(1),
    );
    let matrix: Vec<i32> = (0..12).map(|i| i * i).collect();
    repo.add_histogram(
        Histogram::new("de_e", Shape::two_d(4, 3).unwrap(), Counts::Int(matrix))
            .unwrap()
            .with_title("dE vs E")
            .with_number(2),
    );
    repo.add_histogram(
        Histogram::new(
            "ratio",
            Shape::one_d(3).unwrap(),
            Counts::Double(vec![0.25, -1.5, 1e-9]),
        )
        .unwrap()
        .with_number(3),
    );

    let mut peak = Gate::new("peak", "energy", GateKind::OneD);
    peak.set_limits(GateLimits::Interval { low: 4, high: 2 }).unwrap();
    repo.add_gate(peak).unwrap();
    let mut banana = Gate::new("banana", "de_e", GateKind::TwoD);
    banana
        .set_limits(GateLimits::Polygon(vec![(0, 0), (3, 0), (3, 2)]))
        .unwrap();
    repo.add_gate(banana).unwrap();
    repo.add_gate(Gate::new("unset", "energy", GateKind::OneD)).unwrap();

    repo.add_scaler(Scaler::new("clock", 1).with_value(123_456));
    repo.add_scaler(Scaler::new("live time", 2).with_value(-7));
    repo
}

fn encode(repo: &Repository) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_jhf(
        repo.histograms(),
        repo.gates(),
        repo.scalers(),
        &JhfWriteOptions::default(),
        &mut buf,
    )
    .unwrap();
    buf
}

/// Writes one histogram record with the given stored sizes.
fn write_record(out: &mut FieldWriter<Vec<u8>>, name: &str, stored_x: i32, samples: &[i32]) {
    out.write_text(name, NAME_WIDTH).unwrap();
    out.write_i32(1).unwrap();
    out.write_text(name, TITLE_WIDTH).unwrap();
    out.write_i32(1).unwrap();
    out.write_i32(stored_x).unwrap();
    out.write_i32(0).unwrap();
    for &s in samples {
        out.write_i32(s).unwrap();
    }
}

#[test]
fn test_v02_roundtrip_is_exact() {
    let repo = sample_repository();
    let contents = decode_jhf(encode(&repo).as_slice()).unwrap();
    assert_eq!(contents.version, JhfVersion::V02);
    assert_eq!(contents.histograms, repo.histograms());
    assert_eq!(contents.scalers, repo.scalers());

    let mut loaded = Repository::new();
    histfile_io::load::apply_jhf(&mut loaded, contents, LoadMode::Open).unwrap();
    assert_eq!(loaded, repo);
}

#[test]
fn test_file_roundtrip_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.jhf");
    let repo = sample_repository();
    save_file(&repo, &path, &CodecConfig::default()).unwrap();

    let mut loaded = Repository::new();
    loaded.add_histogram(Histogram::zeroed("stale", Shape::one_d(2).unwrap(), CountKind::Int));
    let report = load_file(&mut loaded, &path, LoadMode::Open).unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(report.histograms, 3);
    assert_eq!(report.gates, 3);
    assert_eq!(report.scalers, 2);
    assert_eq!(loaded, repo);
}

#[test]
fn test_long_names_truncated_not_rejected() {
    let hist = Histogram::zeroed("a_very_long_histogram_name", Shape::one_d(2).unwrap(), CountKind::Int)
        .with_title("x".repeat(80));
    let mut buf = Vec::new();
    encode_jhf(&[hist], &[], &[], &JhfWriteOptions::default(), &mut buf).unwrap();
    let contents = decode_jhf(buf.as_slice()).unwrap();
    assert_eq!(contents.histograms[0].name(), "a_very_long_his");
    assert_eq!(contents.histograms[0].title(), "x".repeat(TITLE_WIDTH));
}

#[test]
fn test_v01_sizes_are_one_short() {
    let samples: Vec<i32> = (0..11).collect();

    let mut out = FieldWriter::new(Vec::new(), ByteOrder::BigEndian);
    out.write_bytes(MAGIC_V01).unwrap();
    out.write_i32(1).unwrap();
    write_record(&mut out, "old", 10, &samples);
    out.write_i32(0).unwrap();
    out.write_i32(0).unwrap();
    let v01 = decode_jhf(out.into_inner().as_slice()).unwrap();
    assert_eq!(v01.version, JhfVersion::V01);
    assert_eq!(v01.histograms[0].counts().len(), 11);

    let mut out = FieldWriter::new(Vec::new(), ByteOrder::BigEndian);
    out.write_bytes(MAGIC_V02).unwrap();
    out.write_i32(1).unwrap();
    write_record(&mut out, "new", 10, &samples[..10]);
    out.write_i32(0).unwrap();
    out.write_i32(0).unwrap();
    let v02 = decode_jhf(out.into_inner().as_slice()).unwrap();
    assert_eq!(v02.histograms[0].counts().len(), 10);
}

#[test]
fn test_v00_reads_until_end_of_stream() {
    let mut out = FieldWriter::new(Vec::new(), ByteOrder::BigEndian);
    write_record(&mut out, "first", 3, &[1, 2, 3]);
    write_record(&mut out, "second", 2, &[4, 5]);
    let bytes = out.into_inner();

    let contents = decode_jhf(bytes.as_slice()).unwrap();
    assert_eq!(contents.version, JhfVersion::V00);
    let names: Vec<_> = contents.histograms.iter().map(Histogram::name).collect();
    assert_eq!(names, ["first", "second"]);
    assert_eq!(contents.histograms[1].counts().as_int(), Some(&[4, 5][..]));

    assert!(contents.warnings.is_empty());
}

#[test]
fn test_v00_partial_record_ends_scan() {
    let mut out = FieldWriter::new(Vec::new(), ByteOrder::BigEndian);
    write_record(&mut out, "first", 3, &[1, 2, 3]);
    let first_len = out.position();
    write_record(&mut out, "second", 2, &[4, 5]);
    let mut bytes = out.into_inner();
    // Keep only the name and number of the second record.
    bytes.truncate(usize::try_from(first_len).unwrap() + 19);

    let contents = decode_jhf(bytes.as_slice()).unwrap();
    assert_eq!(contents.histograms.len(), 1);
    assert_eq!(contents.histograms[0].counts().as_int(), Some(&[1, 2, 3][..]));
    assert!(matches!(
        contents.warnings.as_slice(),
        [Warning::PartialRecord { context, .. }] if context.contains("second")
    ));

    // The dropped record shows up in the load report.
    let mut repo = Repository::new();
    let report = histfile_io::load::apply_jhf(&mut repo, contents, LoadMode::Open).unwrap();
    assert_eq!(report.histograms, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(repo.histogram("first").is_some());

    // Nothing complete at all is a format error.
    assert!(matches!(decode_jhf(&bytes[..20]), Err(Error::Format(_))));
}

#[test]
fn test_random_bytes_signal_failure() {
    // xorshift, so the test is deterministic without an RNG dependency
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    for _ in 0..32 {
        let bytes: Vec<u8> = (0..256)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                state.to_be_bytes()[0]
            })
            .collect();
        match decode_jhf(bytes.as_slice()) {
            Ok(contents) => assert!(!contents.histograms.is_empty()),
            Err(Error::Format(_)) => {}
            Err(other) => panic!("unexpected error {other}"),
        }
    }
}

#[test]
fn test_reload_skips_missing_gate_and_finishes() {
    let source = sample_repository();
    let bytes = encode(&source);

    // Same histograms and scalers, but the "banana" gate was never created.
    let mut target = source.clone();
    for h in source.histograms() {
        target.add_histogram(Histogram::zeroed(h.name(), h.shape(), h.kind()).with_number(h.number()));
    }
    target.add_gate(Gate::new("peak", "energy", GateKind::OneD)).unwrap();
    target.add_gate(Gate::new("unset", "energy", GateKind::OneD)).unwrap();
    for s in source.scalers() {
        target.add_scaler(Scaler::new(s.name.clone(), s.number));
    }

    let contents = decode_jhf(bytes.as_slice()).unwrap();
    let report = histfile_io::load::apply_jhf(&mut target, contents, LoadMode::Reload).unwrap();
    assert_eq!(report.warnings, [Warning::MissingGate("banana".to_owned())]);
    assert_eq!(report.gates, 2);
    // Records after the missing gate were still applied.
    assert_eq!(target.scaler("live time").unwrap().value, -7);
    assert_eq!(
        target.gate("peak").unwrap().limits(),
        Some(&GateLimits::Interval { low: 4, high: 2 })
    );
    assert_eq!(
        target.histogram("de_e").unwrap().counts(),
        source.histogram("de_e").unwrap().counts()
    );
}

#[test]
fn test_open_with_unresolved_gate_owner_warns() {
    let repo = sample_repository();
    let options = JhfWriteOptions::default();
    let mut buf = Vec::new();
    // The banana gate's owner is dropped from the decoded contents.
    let gates: Vec<Gate> = repo.gates().iter().filter(|g| g.histogram() == "de_e").cloned().collect();
    encode_jhf(&repo.histograms()[..2], &gates, &[], &options, &mut buf).unwrap();

    let mut contents = decode_jhf(buf.as_slice()).unwrap();
    contents.histograms.truncate(1);
    let mut loaded = Repository::new();
    let report = histfile_io::load::apply_jhf(&mut loaded, contents, LoadMode::Open).unwrap();
    assert_eq!(
        report.warnings,
        [Warning::UnresolvedGateOwner {
            gate: "banana".to_owned(),
            number: 2
        }]
    );
    assert!(loaded.gates().is_empty());
}
