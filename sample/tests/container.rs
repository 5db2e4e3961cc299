//! End-to-end container scenarios: drawing batches into a directory,
//! re-running them, and sharing them among cooperating ranks.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use numlpa_sample::batch::{draw_batch, sample_seed};
use numlpa_sample::distributions::{DipolesParameters, Distribution, ParameterSets};
use numlpa_sample::partition::Partition;
use numlpa_sample::serializer::Format;
use numlpa_sample::store::{load_file, SampleStore};
use numlpa_sample::{Metadata, StoreError};

fn dipoles(length: f64, nsub: u32, pairs: u32, side: f64) -> Distribution {
    let sets = ParameterSets {
        dipoles: DipolesParameters {
            length,
            nsub,
            pairs,
            side,
            confine: false,
        },
        ..ParameterSets::default()
    };
    Distribution::from_name("dipoles", &sets).unwrap()
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

#[test]
fn single_dipole_sample() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let store = SampleStore::new(&out, 1, Format::Json);
    let report = draw_batch(&dipoles(0.0, 1, 1, 2e-6), &store, 0, Partition::whole()).unwrap();
    assert_eq!(report.written.len(), 1);

    let names = store.list_existing().unwrap();
    assert_eq!(names, BTreeSet::from(["0.json".to_owned()]));

    let sample = store.load("0.json").unwrap();
    assert_eq!(sample.dislocations.senses, vec![1, -1]);
    assert!((sample.distribution.density - 5.0e11).abs() < 1e-3);
    let [xs, ys] = &sample.dislocations.positions;
    let center = ((xs[0] + xs[1]) / 2.0, (ys[0] + ys[1]) / 2.0);
    assert!(sample.region.contains(center.0, center.1));
    let separation = ((xs[0] - xs[1]).powi(2) + (ys[0] - ys[1]).powi(2)).sqrt();
    assert!((separation - 1.0 / 5.0e11_f64.sqrt()).abs() < 1e-15);
}

#[test]
fn batch_of_ten_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path(), 10, Format::Json);
    let distribution = dipoles(0.0, 2, 1, 1e-6);

    let first = draw_batch(&distribution, &store, 42, Partition::whole()).unwrap();
    assert_eq!(first.written.len(), 10);
    let expected: BTreeSet<String> = (0..10).map(|i| format!("{i}.json")).collect();
    assert_eq!(store.list_existing().unwrap(), expected);
    for name in &expected {
        let sample = store.load(name).unwrap();
        assert_eq!(sample.dislocations.len(), 8);
        let density = 8.0 / (1e-6 * 1e-6);
        assert!((sample.distribution.density - density).abs() / density < 1e-12);
    }

    let before = snapshot(dir.path());
    let second = draw_batch(&distribution, &store, 42, Partition::whole()).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.skipped.len(), 10);
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn ranks_share_a_batch_without_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path(), 13, Format::Pyc);
    let distribution = dipoles(0.0, 2, 2, 1e-6);
    let mut written = Vec::new();
    for rank in 0..4 {
        let report = draw_batch(&distribution, &store, 5, Partition::new(rank, 4).unwrap()).unwrap();
        assert!(report.skipped.is_empty());
        written.extend(report.written);
    }
    assert_eq!(written.len(), 13);
    let expected: BTreeSet<String> = (0..13).map(|i| format!("{i:02}.pyc")).collect();
    assert_eq!(store.list_existing().unwrap(), expected);
}

#[test]
fn file_contents_depend_only_on_the_index() {
    let distribution = dipoles(0.0, 2, 1, 1e-6);
    let sharded = tempfile::tempdir().unwrap();
    let single = tempfile::tempdir().unwrap();
    for rank in 0..3 {
        let store = SampleStore::new(sharded.path(), 6, Format::Pyc);
        draw_batch(&distribution, &store, 9, Partition::new(rank, 3).unwrap()).unwrap();
    }
    let store = SampleStore::new(single.path(), 6, Format::Pyc);
    draw_batch(&distribution, &store, 9, Partition::whole()).unwrap();
    for index in 0..6 {
        let name = store.file_name(index);
        let a = load_file(&sharded.path().join(&name)).unwrap();
        let b = load_file(&single.path().join(&name)).unwrap();
        assert_eq!(a.dislocations, b.dislocations);
        assert_eq!(a.distribution, b.distribution);
        assert_eq!(a.distribution.seed, sample_seed(9, index));
    }
}

#[test]
fn save_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path(), 2, Format::Json);
    let distribution = dipoles(0.0, 1, 1, 1e-6);
    let path = store.save(1, &distribution.draw(1)).unwrap();
    let original = fs::read(&path).unwrap();
    match store.save(1, &distribution.draw(2)) {
        Err(StoreError::AlreadyExists(existing)) => assert_eq!(existing, path),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn blocked_index_fails_and_the_batch_moves_on() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path(), 4, Format::Json);
    fs::create_dir(store.path(1)).unwrap();

    let report = draw_batch(&dipoles(0.0, 1, 1, 1e-6), &store, 3, Partition::whole()).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 1);
    assert!(report.failed[0].1.contains("1.json"));
    assert!(report.skipped.is_empty());
    assert_eq!(report.written, vec![store.path(0), store.path(2), store.path(3)]);
    assert!(!report.is_complete());
    assert!(store.path(1).is_dir());

    let expected = BTreeSet::from(["0.json".to_owned(), "2.json".to_owned(), "3.json".to_owned()]);
    assert_eq!(store.list_existing().unwrap(), expected);

    let again = draw_batch(&dipoles(0.0, 1, 1, 1e-6), &store, 3, Partition::whole()).unwrap();
    assert_eq!(again.skipped, vec![0, 2, 3]);
    assert_eq!(again.failed.len(), 1);
}

#[test]
fn no_temporary_files_remain() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path(), 5, Format::Json);
    draw_batch(&dipoles(0.0, 1, 2, 1e-6), &store, 0, Partition::whole()).unwrap();
    let hidden = fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with('.')
        })
        .count();
    assert_eq!(hidden, 0);
}

#[test]
fn binary_and_json_files_hold_the_same_sample() {
    let dir = tempfile::tempdir().unwrap();
    let sample = dipoles(0.0, 3, 2, 1e-6).draw_with(77, Metadata::now());
    let json = SampleStore::new(dir.path(), 1, Format::Json);
    let pyc = SampleStore::new(dir.path(), 1, Format::Pyc);
    json.save(0, &sample).unwrap();
    pyc.save(0, &sample).unwrap();
    assert_eq!(json.load("0.json").unwrap(), pyc.load("0.pyc").unwrap());
}
