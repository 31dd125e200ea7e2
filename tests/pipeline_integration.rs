//! End-to-end pipeline tests over real files.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use linebind::{
    bindable, enum_literals, BindingRegistry, ColumnOrder, Error, LazyStream, RecordMapper,
    SelectionPolicy,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Grade {
    A,
    B,
    C,
}
enum_literals!(Grade { A, B, C });

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Event {
    name: Option<String>,
    count: Option<i32>,
    score: Option<f64>,
    grade: Option<Grade>,
}
bindable!(Event {
    name: String,
    count: i32,
    score: f64,
    grade: enum Grade,
});

fn mapper() -> RecordMapper<Event> {
    let registry = BindingRegistry::new();
    RecordMapper::<Event>::new(&registry).unwrap().with_sep(",")
}

fn sample_events() -> Vec<Event> {
    vec![
        Event {
            name: Some("boot".to_string()),
            count: Some(1),
            score: Some(0.5),
            grade: Some(Grade::A),
        },
        Event {
            name: Some("probe".to_string()),
            count: Some(7),
            score: None,
            grade: Some(Grade::C),
        },
        Event {
            name: Some("halt".to_string()),
            count: None,
            score: Some(2.25),
            grade: None,
        },
    ]
}

#[test]
fn write_then_read_round_trips_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");
    let mapper = mapper();

    let events = sample_events();
    mapper.writer().session(&path).write(&events).unwrap();

    let read_back = mapper.reader().read_path(&path).to_list().unwrap();
    assert_eq!(read_back, events);
}

#[test]
fn field_header_lines_are_consumed_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");
    let mapper = mapper();

    mapper
        .writer()
        .session(&path)
        .with_field_header()
        .write(&sample_events())
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("name,count,score,grade\n"));

    let read_back = mapper
        .reader()
        .session(&path)
        .with_header()
        .stream()
        .to_list()
        .unwrap();
    assert_eq!(read_back, sample_events());
}

#[test]
fn header_reordering_maps_columns_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shuffled.csv");
    // Columns on disk are not in declaration order.
    fs::write(&path, "count,grade,name,score\n3,B,swap,1.5\n").unwrap();

    let read_back = mapper()
        .reader()
        .session(&path)
        .with_header()
        .stream()
        .to_list()
        .unwrap();
    assert_eq!(
        read_back,
        vec![Event {
            name: Some("swap".to_string()),
            count: Some(3),
            score: Some(1.5),
            grade: Some(Grade::B),
        }]
    );
}

#[test]
fn absent_header_name_aborts_before_any_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.csv");
    // 'grade' and 'score' are missing from the header.
    fs::write(&path, "name,count\nx,1\n").unwrap();

    let err = mapper()
        .reader()
        .session(&path)
        .with_header()
        .stream()
        .to_list()
        .unwrap_err();
    match err {
        Error::Lookup { name, .. } => assert_eq!(name, "score"),
        other => panic!("expected a lookup fault, got {other}"),
    }
}

#[test]
fn skip_and_explicit_columns_compose() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offset.csv");
    // One banner line, then rows laid out as: score, name, count.
    fs::write(&path, "# export v2\n9.5,tick,4\n").unwrap();

    let registry = BindingRegistry::new();
    let policy = SelectionPolicy::all().with_use(["name", "count", "score"]);
    let mapper = RecordMapper::<Event>::with_policy(&registry, &policy)
        .unwrap()
        .with_sep(",");
    let read_back = mapper
        .reader()
        .session(&path)
        .skip(1)
        .columns(ColumnOrder::new(vec![1, 2, 0]))
        .stream()
        .to_list()
        .unwrap();
    assert_eq!(
        read_back,
        vec![Event {
            name: Some("tick".to_string()),
            count: Some(4),
            score: Some(9.5),
            grade: None,
        }]
    );
}

#[test]
fn csv_cache_computes_once_then_reads_through() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("warm");
    let mapper = mapper();
    let runs = Rc::new(Cell::new(0));

    let supplier = {
        let runs = Rc::clone(&runs);
        move || {
            runs.set(runs.get() + 1);
            sample_events().into_iter().map(Ok)
        }
    };

    let cache = mapper.csv_cache(&prefix);
    assert!(!cache.path().exists());

    let first = LazyStream::new(supplier.clone())
        .cache_by(&cache)
        .unwrap()
        .to_list()
        .unwrap();
    assert_eq!(first, sample_events());
    assert_eq!(runs.get(), 1);
    assert!(cache.path().exists());

    let second = LazyStream::new(supplier)
        .cache_by(&cache)
        .unwrap()
        .to_list()
        .unwrap();
    assert_eq!(second, first);
    // The upstream supplier was never invoked again.
    assert_eq!(runs.get(), 1);
}

#[test]
fn empty_computation_writes_no_cache_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let cache = mapper().csv_cache(dir.path().join("void"));

    let out = LazyStream::<Event>::new(std::iter::empty)
        .cache_by(&cache)
        .unwrap()
        .to_list()
        .unwrap();
    assert!(out.is_empty());
    assert!(!cache.path().exists());
}

#[test]
fn json_cache_round_trips_through_the_codec() {
    let dir = tempfile::tempdir().unwrap();
    let mapper = mapper();
    let cache = mapper.json_cache(dir.path().join("events"));

    let computed = LazyStream::of(sample_events()).cache_by(&cache).unwrap();
    assert_eq!(computed.to_list().unwrap(), sample_events());
    assert!(cache.path().ends_with("events.txt"));

    let reread = LazyStream::<Event>::new(std::iter::empty)
        .cache_by(&cache)
        .unwrap()
        .to_list()
        .unwrap();
    assert_eq!(reread, sample_events());
}

#[test]
fn async_write_handle_observes_completion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("async.csv");
    let mapper = mapper();

    let handle = mapper
        .writer()
        .session(&path)
        .write_async(sample_events());
    handle.join().expect("writer thread panicked").unwrap();

    let read_back = mapper.reader().read_path(&path).to_list().unwrap();
    assert_eq!(read_back, sample_events());
}

#[test]
fn utf8_marker_prefixes_fresh_files_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marked.csv");
    let mapper = mapper();

    mapper
        .writer()
        .session(&path)
        .utf8_marker()
        .write(&sample_events()[..1])
        .unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], "\u{feff}".as_bytes());

    mapper
        .writer()
        .session(&path)
        .append()
        .utf8_marker()
        .write(&sample_events()[1..2])
        .unwrap();
    let bytes = fs::read(&path).unwrap();
    // Still exactly one marker, at the very front.
    assert_eq!(
        bytes.windows(3).filter(|w| *w == "\u{feff}".as_bytes()).count(),
        1
    );
    assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 2);
}

#[test]
fn malformed_record_aborts_the_draining_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dirty.csv");
    fs::write(&path, "ok,1,0.5,A\nbad,not-a-number,0.5,A\n").unwrap();

    let err = mapper().reader().read_path(&path).to_list().unwrap_err();
    match err {
        Error::Data { field, value, .. } => {
            assert_eq!(field, "count");
            assert_eq!(value, "not-a-number");
        }
        other => panic!("expected a data fault, got {other}"),
    }
}

#[test]
fn transforms_compose_over_file_streams() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.csv");
    let mapper = mapper();
    let events: Vec<Event> = (0..20)
        .map(|i| Event {
            name: Some(format!("e{i}")),
            count: Some(i),
            score: Some(f64::from(i) / 2.0),
            grade: Some(Grade::B),
        })
        .collect();
    mapper.writer().session(&path).write(&events).unwrap();

    let names = mapper
        .reader()
        .read_path(&path)
        .filter(|e| e.count.unwrap_or(0) % 2 == 0)
        .limit(3)
        .map(|e| e.name.unwrap_or_default())
        .to_list()
        .unwrap();
    assert_eq!(names, vec!["e0", "e2", "e4"]);

    let grouped = mapper
        .reader()
        .read_path(&path)
        .group_by(|e| e.count.unwrap_or(0) % 2)
        .unwrap();
    assert_eq!(grouped[&0].len(), 10);
    assert_eq!(grouped[&1].len(), 10);
}

#[test]
fn materialized_file_stream_reads_the_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("once.csv");
    let mapper = mapper();
    mapper.writer().session(&path).write(&sample_events()).unwrap();

    let stream = mapper.reader().read_path(&path).materialize().unwrap();
    let before = stream.to_list().unwrap();

    // Deleting the file proves later traversals come from the backing, and
    // that deriving a filtered stream never re-reads or mutates it.
    fs::remove_file(&path).unwrap();
    let filtered = stream.clone().filter(|e| e.count.is_some());
    assert_eq!(filtered.to_list().unwrap().len(), 2);
    assert_eq!(filtered.to_list().unwrap().len(), 2);
    assert_eq!(stream.to_list().unwrap(), before);
}

#[test]
fn parallel_terminal_touches_every_record() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("par.csv");
    let mapper = mapper();
    mapper.writer().session(&path).write(&sample_events()).unwrap();

    let visits = AtomicUsize::new(0);
    let stream = mapper.reader().read_path(&path);
    stream
        .for_each_parallel(|_| {
            visits.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    assert_eq!(visits.load(Ordering::Relaxed), sample_events().len());
}
