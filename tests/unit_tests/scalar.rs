use crate::{bilinear_state, linear_state};
use fenris_iga::assembly::{Assembler, EntryEvaluator, FnBilinear, FnLinear};
use fenris_iga::error::{AssemblyError, EntryKind};
use fenris_iga::index::encode;
use fenris_iga::pool::WorkerPool;
use fenris_iga::state::{Arity, AssemblerState};
use nalgebra::DVector;

/// Encodes its arguments so that tests can tell which indices were passed.
fn index_functional() -> FnLinear<impl Fn(&AssemblerState<f64, 2>, &[usize; 2]) -> f64 + Sync> {
    FnLinear(|_: &AssemblerState<f64, 2>, i: &[usize; 2]| (10 * i[0] + i[1]) as f64)
}

fn index_form() -> FnBilinear<impl Fn(&AssemblerState<f64, 2>, &[usize; 2], &[usize; 2]) -> f64 + Sync> {
    FnBilinear(|_: &AssemblerState<f64, 2>, i: &[usize; 2], j: &[usize; 2]| {
        (1000 * i[0] + 100 * i[1] + 10 * j[0] + j[1]) as f64
    })
}

struct Unimplemented;

impl EntryEvaluator<f64, 2> for Unimplemented {}

#[test]
fn linear_entry_decodes_row_major_index() {
    let assembler = Assembler::new(linear_state([3, 4], 1), index_functional());
    assert_eq!(assembler.arity(), Arity::Linear);
    assert_eq!(assembler.linear_entry(0).unwrap(), 0.0);
    assert_eq!(assembler.linear_entry(5).unwrap(), 11.0);
    assert_eq!(assembler.linear_entry(11).unwrap(), 23.0);
    assert_eq!(
        assembler.linear_entry(12),
        Err(AssemblyError::IndexOutOfBounds { index: 12, len: 12 })
    );
}

#[test]
fn bilinear_entry_uses_test_rows_and_trial_columns() {
    let assembler = Assembler::new(bilinear_state([3, 4], 1), index_form());
    let i = encode(&[2, 1], &[3, 4]);
    let j = encode(&[1, 3], &[3, 4]);
    assert_eq!(assembler.bilinear_entry(i, j).unwrap(), 2113.0);
    assert_eq!(
        assembler.bilinear_entry(0, 12),
        Err(AssemblyError::IndexOutOfBounds { index: 12, len: 12 })
    );
}

#[test]
fn mismatched_arity_gives_zero() {
    let linear = Assembler::new(linear_state([4, 4], 1), index_functional());
    assert_eq!(linear.bilinear_entry(3, 7), Ok(0.0));
    assert_eq!(linear.bilinear_entries(&[(0, 0), (1, 2)]), Ok(vec![0.0, 0.0]));
    assert_eq!(linear.assemble_matrix().unwrap().shape(), (0, 0));

    let bilinear = Assembler::new(bilinear_state([4, 4], 1), index_form());
    assert_eq!(bilinear.linear_entry(3), Ok(0.0));
    assert_eq!(bilinear.linear_entries(&[1, 2, 3]), Ok(vec![0.0; 3]));
    assert_eq!(bilinear.assemble_vector().unwrap().len(), 0);
}

#[test]
fn unimplemented_entries_are_reported() {
    let linear = Assembler::new(linear_state([2, 2], 1), Unimplemented);
    assert_eq!(
        linear.linear_entry(0),
        Err(AssemblyError::EntryNotImplemented(EntryKind::Linear))
    );
    assert!(linear.assemble_vector().is_err());

    let bilinear = Assembler::new(bilinear_state([2, 2], 1), Unimplemented);
    assert_eq!(
        bilinear.bilinear_entry(0, 1),
        Err(AssemblyError::EntryNotImplemented(EntryKind::Bilinear))
    );
    assert_eq!(
        bilinear.bilinear_entries(&[(0, 0), (1, 1), (2, 3)]),
        Err(AssemblyError::EntryNotImplemented(EntryKind::Bilinear))
    );
}

#[test]
fn assemble_vector_enumerates_row_major() {
    let assembler = Assembler::new(linear_state([2, 3], 1), index_functional());
    let expected = DVector::from_vec(vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    assert_eq!(assembler.assemble_vector().unwrap(), expected);
}

#[test]
fn batch_entries_match_single_entries() {
    let state = bilinear_state([3, 5], 1);
    let indices: Vec<(usize, usize)> = (0..15).flat_map(|i| (0..15).map(move |j| (i, j))).collect();
    let expected: Vec<f64> = indices
        .iter()
        .map(|&(i, j)| Assembler::new(state.clone(), index_form()).bilinear_entry(i, j).unwrap())
        .collect();

    for num_workers in [1, 2, 4, 8] {
        let assembler = Assembler::new(state.clone(), index_form()).with_pool(WorkerPool::global(num_workers));
        assert_eq!(assembler.bilinear_entries(&indices).unwrap(), expected);
    }

    let linear = Assembler::new(linear_state([3, 5], 1), index_functional()).with_pool(WorkerPool::global(4));
    let indices = [14, 0, 7, 7];
    assert_eq!(linear.linear_entries(&indices).unwrap(), vec![24.0, 0.0, 12.0, 12.0]);
}

#[test]
fn assemble_matrix_places_entries_by_encoded_index() {
    let assembler = Assembler::new(bilinear_state([2, 3], 1), index_form());
    let matrix = assembler.assemble_matrix().unwrap();
    assert_eq!(matrix.shape(), (6, 6));
    for i in 0..6 {
        for j in 0..6 {
            assert_eq!(matrix[(i, j)], assembler.bilinear_entry(i, j).unwrap());
        }
    }
}
