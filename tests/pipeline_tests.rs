//! Pipeline tests: ordering, completion, soft failures, stalls, lost items, backpressure, teardown.

use ordfeed::{FileLoader, LoaderOpts, Payload, PipelineError, Polled, Processor, load_ordered};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ordfeed-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn skip_read_opts() -> LoaderOpts {
    LoaderOpts {
        skip_read: true,
        stall_timeout: Duration::from_secs(10),
        ..Default::default()
    }
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("item-{i}.png")).collect()
}

/// Uppercases identifier payloads.
fn upper() -> Processor {
    Processor::payload_only(|p| match p {
        Payload::Identifier(s) => Ok(Payload::Identifier(s.to_uppercase())),
        other => Ok(other),
    })
}

/// Sleeps a few ms depending on the identifier so workers finish out of order.
fn jitter() -> Processor {
    Processor::payload_only(|p| {
        let n: usize = p
            .as_identifier()
            .map(|s| s.bytes().map(usize::from).sum())
            .unwrap_or(0);
        thread::sleep(Duration::from_millis((n % 5) as u64));
        Ok(p)
    })
}

// --- ordering scenario ---

#[test]
fn test_uppercase_scenario_in_order() {
    // Earlier items sleep longer, so later ones finish first.
    let slow_first = Processor::with_meta(|meta, payload| {
        thread::sleep(Duration::from_millis(60 - meta.index * 25));
        Ok((meta, payload))
    });
    let opts = LoaderOpts {
        workers: Some(3),
        ..skip_read_opts()
    };
    let loader = FileLoader::new(["a.png", "b.png", "c.png"], &opts, vec![slow_first, upper()])
        .unwrap();
    let out: Vec<(u64, Payload)> = loader
        .map(|r| r.unwrap())
        .map(|(meta, payload)| (meta.index, payload))
        .collect();
    assert_eq!(
        out,
        vec![
            (0, Payload::Identifier("A.PNG".into())),
            (1, Payload::Identifier("B.PNG".into())),
            (2, Payload::Identifier("C.PNG".into())),
        ]
    );
}

#[test]
fn test_order_preserved_for_any_pool_sizes() {
    let input = names(40);
    for readers in 1..=3 {
        for workers in 1..=4 {
            let opts = LoaderOpts {
                readers,
                workers: Some(workers),
                ..skip_read_opts()
            };
            let items = load_ordered(input.clone(), &opts, vec![jitter()]).unwrap();
            let got: Vec<String> = items.into_iter().map(|(m, _)| m.identifier).collect();
            assert_eq!(got, input, "readers={readers} workers={workers}");
        }
    }
}

#[test]
fn test_order_preserved_without_post_processing() {
    let input = names(200);
    let opts = LoaderOpts {
        readers: 4,
        ..skip_read_opts()
    };
    let items = load_ordered(input.clone(), &opts, Vec::new()).unwrap();
    let got: Vec<String> = items
        .into_iter()
        .map(|(_, p)| p.as_identifier().unwrap().to_string())
        .collect();
    assert_eq!(got, input);
}

// --- completion counting ---

#[test]
fn test_exactly_n_items_then_end() {
    let opts = LoaderOpts {
        workers: Some(4),
        ..skip_read_opts()
    };
    let mut loader = FileLoader::new(names(25), &opts, vec![jitter()]).unwrap();
    assert_eq!(loader.total(), 25);
    let mut indexes = Vec::new();
    for item in loader.by_ref() {
        let (meta, _) = item.unwrap();
        assert_eq!(meta.total, 25);
        indexes.push(meta.index);
    }
    assert_eq!(indexes, (0..25).collect::<Vec<u64>>());
    assert!(loader.next().is_none());
    assert!(loader.finish().is_empty());
}

#[test]
fn test_empty_input_ends_immediately() {
    let mut loader = FileLoader::new(Vec::<String>::new(), &skip_read_opts(), vec![upper()]).unwrap();
    assert_eq!(loader.total(), 0);
    assert!(loader.next().is_none());
}

#[test]
fn test_invalid_config_rejected() {
    let opts = LoaderOpts {
        readers: 0,
        ..Default::default()
    };
    assert!(matches!(
        FileLoader::new(["a"], &opts, Vec::new()),
        Err(PipelineError::InvalidConfig(_))
    ));
}

// --- read mode and soft failures ---

#[test]
fn test_read_mode_yields_file_bytes_in_order() {
    let dir = temp_dir("read-mode");
    let mut paths = Vec::new();
    for i in 0..12 {
        let p = dir.join(format!("f{i}.bin"));
        fs::write(&p, format!("content {i}")).unwrap();
        paths.push(p.to_string_lossy().into_owned());
    }
    let opts = LoaderOpts {
        readers: 3,
        ..Default::default()
    };
    let items = load_ordered(paths.clone(), &opts, Vec::new()).unwrap();
    assert_eq!(items.len(), 12);
    for (i, (meta, payload)) in items.iter().enumerate() {
        assert_eq!(meta.identifier, paths[i]);
        assert_eq!(payload.as_bytes(), Some(format!("content {i}").as_bytes()));
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_file_passes_through_as_null() {
    let dir = temp_dir("soft-failure");
    let mut paths = Vec::new();
    for i in 0..8 {
        let p = dir.join(format!("f{i}.bin"));
        fs::write(&p, [i as u8; 4]).unwrap();
        paths.push(p.to_string_lossy().into_owned());
    }
    fs::remove_file(&paths[3]).unwrap();

    let items = load_ordered(paths.clone(), &LoaderOpts::default(), Vec::new()).unwrap();
    assert_eq!(items.len(), 8);
    for (i, (meta, payload)) in items.iter().enumerate() {
        assert_eq!(meta.index, i as u64);
        if i == 3 {
            assert!(payload.is_null());
            assert!(meta.get("read_error").is_some());
        } else {
            assert_eq!(payload.as_bytes(), Some(&[i as u8; 4][..]));
        }
    }
    let _ = fs::remove_dir_all(&dir);
}

// --- meta-aware steps ---

#[test]
fn test_meta_step_attaches_error_flag() {
    let flag_odd = Processor::with_meta(|mut meta, payload| {
        if meta.index % 2 == 1 {
            meta.set("error", "504 Gateway Timeout");
        }
        Ok((meta, payload))
    });
    let items = load_ordered(names(6), &skip_read_opts(), vec![flag_odd, upper()]).unwrap();
    for (meta, payload) in items {
        assert_eq!(meta.has_error(), meta.index % 2 == 1);
        assert_eq!(
            payload.as_identifier(),
            Some(meta.identifier.to_uppercase().as_str())
        );
    }
}

// --- failures ---

#[test]
fn test_stall_detected_within_timeout() {
    let hang = Processor::payload_only(|p| {
        thread::sleep(Duration::from_millis(1500));
        Ok(p)
    });
    let opts = LoaderOpts {
        workers: Some(1),
        stall_timeout: Duration::from_millis(200),
        ..skip_read_opts()
    };
    let start = Instant::now();
    let mut loader = FileLoader::new(["a", "b"], &opts, vec![hang]).unwrap();
    let first = loader.next().unwrap();
    let elapsed = start.elapsed();
    assert!(matches!(
        first,
        Err(PipelineError::Stalled { expected: 0, .. })
    ));
    assert!(elapsed < Duration::from_millis(1200), "took {elapsed:?}");
    assert!(loader.next().is_none());
}

#[test]
fn test_processing_failure_drops_item_and_reports_worker() {
    let fail_on_b = Processor::payload_only(|p| {
        if p.as_identifier() == Some("b") {
            anyhow::bail!("detector unavailable");
        }
        Ok(p)
    });
    let opts = LoaderOpts {
        workers: Some(2),
        ..skip_read_opts()
    };
    let mut loader = FileLoader::new(["a", "b", "c", "d"], &opts, vec![fail_on_b]).unwrap();
    let results: Vec<_> = loader.by_ref().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().0.identifier, "a");
    assert!(matches!(
        results[1],
        Err(PipelineError::Incomplete {
            expected: 1,
            total: 4
        })
    ));
    let failures = loader.finish();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].worker.starts_with("post-"));
    assert!(failures[0].reason.contains("detector unavailable"));
}

#[test]
fn test_load_ordered_surfaces_pipeline_error() {
    let always_fail = Processor::payload_only(|_| anyhow::bail!("nope"));
    let opts = LoaderOpts {
        workers: Some(1),
        ..skip_read_opts()
    };
    let err = load_ordered(["a"], &opts, vec![always_fail]).unwrap_err();
    assert!(err.to_string().contains("incomplete"));
}

#[test]
fn test_zero_stall_timeout_rejected() {
    let opts = LoaderOpts {
        stall_timeout: Duration::ZERO,
        ..skip_read_opts()
    };
    assert!(matches!(
        FileLoader::new(["a", "b", "c"], &opts, vec![upper()]),
        Err(PipelineError::InvalidConfig(_))
    ));
}

// --- polling ---

#[test]
fn test_poll_next_returns_pending_while_item_in_flight() {
    let slow = Processor::payload_only(|p| {
        thread::sleep(Duration::from_millis(400));
        Ok(p)
    });
    let opts = LoaderOpts {
        workers: Some(1),
        ..skip_read_opts()
    };
    let mut loader = FileLoader::new(["a"], &opts, vec![slow]).unwrap();
    assert!(matches!(
        loader.poll_next(Duration::from_millis(20)),
        Polled::Pending
    ));

    let deadline = Instant::now() + Duration::from_secs(5);
    let item = loop {
        match loader.poll_next(Duration::from_millis(50)) {
            Polled::Ready(item) => break item,
            Polled::Pending if Instant::now() < deadline => {}
            other => panic!("unexpected {other:?}"),
        }
    };
    assert_eq!(item.0.identifier, "a");
    assert!(matches!(loader.poll_next(Duration::from_secs(5)), Polled::Done));
    assert!(matches!(loader.poll_next(Duration::ZERO), Polled::Done));
    assert!(loader.next().is_none());
}

// --- backpressure and teardown ---

#[test]
fn test_backpressure_bounds_in_flight_items() {
    let started = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&started);
    let count = Processor::payload_only(move |p| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(p)
    });
    let opts = LoaderOpts {
        readers: 1,
        workers: Some(2),
        input_cap: 4,
        intermediate_cap: 4,
        output_cap: 4,
        reorder_window: Some(8),
        ..skip_read_opts()
    };
    let n = 1000;
    let mut loader = FileLoader::new(names(n), &opts, vec![count]).unwrap();

    // Nobody consumes: the pipeline must stall on full channels, not run ahead.
    thread::sleep(Duration::from_millis(300));
    let in_flight = started.load(Ordering::SeqCst);
    let bound = opts.input_cap + opts.intermediate_cap + opts.output_cap + 2 + 1;
    assert!(in_flight <= bound, "{in_flight} items processed before consumption");

    let got: Vec<u64> = loader.by_ref().map(|r| r.unwrap().0.index).collect();
    assert_eq!(got, (0..n as u64).collect::<Vec<_>>());
    assert_eq!(started.load(Ordering::SeqCst), n);
}

#[test]
fn test_abandoning_iteration_joins_workers() {
    let processed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&processed);
    let count = Processor::payload_only(move |p| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(p)
    });
    let opts = LoaderOpts {
        input_cap: 8,
        intermediate_cap: 8,
        output_cap: 8,
        workers: Some(3),
        ..skip_read_opts()
    };
    let mut loader = FileLoader::new(names(50_000), &opts, vec![count]).unwrap();
    for _ in 0..5 {
        assert!(loader.next().unwrap().is_ok());
    }
    // Returns only once every stage thread has exited.
    let failures = loader.finish();
    assert!(failures.is_empty());
    let after = processed.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(processed.load(Ordering::SeqCst), after);
    assert!(after < 50_000);
}

#[test]
fn test_drop_without_iterating_does_not_hang() {
    let opts = LoaderOpts {
        input_cap: 2,
        intermediate_cap: 2,
        output_cap: 2,
        ..skip_read_opts()
    };
    let loader = FileLoader::new(names(10_000), &opts, vec![upper()]).unwrap();
    drop(loader);
}
