use fenris_iga::pool::WorkerPool;
use std::sync::atomic::{AtomicUsize, Ordering};

fn pools() -> Vec<WorkerPool> {
    vec![
        WorkerPool::sequential(),
        WorkerPool::global(3),
        WorkerPool::dedicated(4).unwrap(),
    ]
}

#[test]
fn small_pools_are_sequential() {
    assert!(WorkerPool::sequential().is_sequential());
    assert!(WorkerPool::global(1).is_sequential());
    assert!(WorkerPool::global(0).is_sequential());
    assert!(WorkerPool::dedicated(1).unwrap().is_sequential());
    assert_eq!(WorkerPool::global(5).num_workers(), 5);
    assert!(!WorkerPool::global(5).is_sequential());
}

#[test]
fn run_visits_every_partition_once() {
    for pool in pools() {
        let visits: Vec<_> = (0..17).map(|_| AtomicUsize::new(0)).collect();
        let result: Result<(), ()> = pool.run(visits.len(), |p| {
            visits[p].fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
        assert!(result.is_ok());
        assert!(visits.iter().all(|v| v.load(Ordering::Relaxed) == 1));
    }
}

#[test]
fn run_reports_error() {
    for pool in pools() {
        let result = pool.run(8, |p| if p == 5 { Err(p) } else { Ok(()) });
        assert_eq!(result, Err(5));
    }
}

#[test]
fn for_each_chunk_maps_every_item() {
    for pool in pools() {
        for len in [0, 1, 2, 7, 100] {
            let input: Vec<usize> = (0..len).collect();
            let mut output = vec![0; len];
            let result: Result<(), ()> = pool.for_each_chunk(&input, &mut output, |&i, o| {
                *o = 2 * i + 1;
                Ok(())
            });
            assert!(result.is_ok());
            let expected: Vec<_> = input.iter().map(|i| 2 * i + 1).collect();
            assert_eq!(output, expected);
        }
    }
}

#[test]
#[should_panic]
fn for_each_chunk_panics_on_length_mismatch() {
    let mut output = vec![0; 2];
    let _: Result<(), ()> = WorkerPool::sequential().for_each_chunk(&[1, 2, 3], &mut output, |_, _| Ok(()));
}
