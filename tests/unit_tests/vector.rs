use crate::{bilinear_state, hat_space, linear_state};
use fenris_iga::assembly::{Assembler, EntryEvaluator, FnBilinear, FnBilinearBlock};
use fenris_iga::error::{AssemblyError, EntryKind};
use fenris_iga::index::{encode_with_component, MultiIndexIter};
use fenris_iga::pattern::{AxisPattern, TensorPattern};
use fenris_iga::pool::WorkerPool;
use fenris_iga::state::AssemblerState;
use nalgebra::DVector;

/// Symmetric under simultaneous exchange of `(i, a)` and `(j, b)`.
fn symmetric_block_entry(i: &[usize; 2], a: usize, j: &[usize; 2], b: usize) -> f64 {
    let g = |x: usize, y: usize| (3 * x.min(y) + 5 * x.max(y) + 1) as f64;
    g(i[0], j[0]) * g(i[1], j[1]) * ((a + 1) * (b + 1)) as f64 + (a * i[0] + b * j[0]) as f64
}

fn symmetric_block_form(
) -> FnBilinearBlock<impl Fn(&AssemblerState<f64, 2>, &[usize; 2], &[usize; 2], &mut [f64]) + Sync> {
    FnBilinearBlock(|state: &AssemblerState<f64, 2>, i: &[usize; 2], j: &[usize; 2], block: &mut [f64]| {
        let m = state.test_space().num_components();
        let n = state.trial_space().map_or(1, |trial| trial.num_components());
        for a in 0..m {
            for b in 0..n {
                block[a * n + b] = symmetric_block_entry(i, a, j, b);
            }
        }
    })
}

#[test]
fn vector_entries_decode_components() {
    let dims = [3, 4];
    let assembler = Assembler::new(bilinear_state(dims, 2), symmetric_block_form());
    assert_eq!(assembler.block_shape(), (2, 2));
    let i = encode_with_component(&[2, 1], 1, &dims, 2);
    let j = encode_with_component(&[0, 3], 0, &dims, 2);
    assert_eq!(
        assembler.bilinear_entry(i, j).unwrap(),
        symmetric_block_entry(&[2, 1], 1, &[0, 3], 0)
    );

    let matrix = assembler.assemble_matrix().unwrap();
    assert_eq!(matrix.shape(), (24, 24));
    assert_eq!(matrix[(i, j)], matrix[(j, i)]);
}

#[test]
fn vector_tensor_has_trailing_block_axis() {
    let pattern = TensorPattern::new([AxisPattern::banded(3, 1), AxisPattern::full(4, 4)]);
    let assembler = Assembler::new(bilinear_state([3, 4], 3), symmetric_block_form());
    let tensor = assembler.assemble_tensor(&pattern, None).unwrap();
    assert_eq!(tensor.pattern_shape(), &[7, 16]);
    assert_eq!(tensor.block_shape(), (3, 3));
    assert_eq!(tensor.shape(), vec![7, 16, 9]);

    let ((i0, j0), (i1, j1)) = (pattern.axis(0).pairs()[4], pattern.axis(1).pairs()[9]);
    let block = tensor.block(&[4, 9]).unwrap();
    assert_eq!(block[3 + 2], symmetric_block_entry(&[i0, i1], 1, &[j0, j1], 2));
    assert_eq!(tensor.get(&[4, 9, 5]), Some(&block[5]));
    assert_eq!(tensor.get(&[4, 9, 9]), None);

    let component = tensor.component(1, 2).unwrap();
    assert_eq!(component.shape(), vec![7, 16]);
    assert_eq!(component.get(&[4, 9]), Some(&block[5]));
    assert!(tensor.component(3, 0).is_none());

    let dense = tensor.to_dense_matrix(&pattern).unwrap();
    let reference = assembler.assemble_matrix().unwrap();
    for (i, j) in MultiIndexIter::from_dims([36, 36]).map(|[i, j]| (i, j)) {
        if dense[(i, j)] != 0.0 {
            assert_eq!(dense[(i, j)], reference[(i, j)]);
        }
    }
}

#[test]
fn symmetric_vector_assembly_transposes_blocks() {
    let pattern = TensorPattern::new([AxisPattern::banded(4, 2), AxisPattern::banded(3, 1)]);
    let maps = pattern.transpose_maps().unwrap();
    let state = bilinear_state([4, 3], 2);

    let unsymmetric = Assembler::new(state.clone(), symmetric_block_form())
        .assemble_tensor(&pattern, None)
        .unwrap();
    for num_workers in [1, 2, 4, 8] {
        let symmetric = Assembler::new(state.clone(), symmetric_block_form())
            .with_pool(WorkerPool::global(num_workers))
            .assemble_tensor(&pattern, Some(&maps))
            .unwrap();
        assert_eq!(symmetric, unsymmetric);
    }

    for positions in MultiIndexIter::from_dims(pattern.shape()) {
        let transposed: [usize; 2] = std::array::from_fn(|d| maps[d].apply(positions[d]));
        let block = unsymmetric.block(&positions).unwrap();
        let partner = unsymmetric.block(&transposed).unwrap();
        for a in 0..2 {
            for b in 0..2 {
                assert_eq!(partner[b * 2 + a], block[a * 2 + b]);
            }
        }
    }
}

#[test]
fn symmetric_assembly_requires_square_blocks() {
    let (space, grid) = hat_space([3, 3]);
    let state = AssemblerState::bilinear(space.clone().with_components(2), space.with_components(3), grid).unwrap();
    let assembler = Assembler::new(state, symmetric_block_form());
    assert_eq!(assembler.block_shape(), (3, 2));

    let pattern = TensorPattern::full([4, 4], [4, 4]);
    let maps = pattern.transpose_maps().unwrap();
    assert_eq!(
        assembler.assemble_tensor(&pattern, Some(&maps)),
        Err(AssemblyError::NonSquareBlock {
            test_components: 3,
            trial_components: 2
        })
    );

    // Unsymmetric assembly of rectangular blocks is fine
    let tensor = assembler.assemble_tensor(&pattern, None).unwrap();
    assert_eq!(tensor.shape(), vec![16, 16, 6]);
    assert_eq!(tensor.to_dense_matrix(&pattern).unwrap().shape(), (48, 32));
}

#[test]
fn scalar_forms_do_not_implement_blocks() {
    let form = FnBilinear(|_: &AssemblerState<f64, 2>, _: &[usize; 2], _: &[usize; 2]| 1.0);
    let assembler = Assembler::new(bilinear_state([3, 3], 2), form);
    assert_eq!(
        assembler.bilinear_entry(0, 0),
        Err(AssemblyError::EntryNotImplemented(EntryKind::BilinearBlock))
    );
    assert_eq!(
        assembler.assemble_tensor(&TensorPattern::full([3, 3], [3, 3]), None),
        Err(AssemblyError::EntryNotImplemented(EntryKind::BilinearBlock))
    );
}

#[test]
fn vector_functional_places_components_fastest() {
    struct ComponentFunctional;

    impl EntryEvaluator<f64, 2> for ComponentFunctional {
        fn linear_block(&self, _: &AssemblerState<f64, 2>, i: &[usize; 2], block: &mut [f64]) -> Result<(), AssemblyError> {
            for (a, entry) in block.iter_mut().enumerate() {
                *entry = (100 * a + 10 * i[0] + i[1]) as f64;
            }
            Ok(())
        }
    }

    let assembler = Assembler::new(linear_state([2, 2], 2), ComponentFunctional);
    let expected = DVector::from_vec(vec![0.0, 100.0, 1.0, 101.0, 10.0, 110.0, 11.0, 111.0]);
    assert_eq!(assembler.assemble_vector().unwrap(), expected);
    assert_eq!(assembler.linear_entry(5).unwrap(), 110.0);
    assert_eq!(assembler.linear_entries(&[7, 0]).unwrap(), vec![111.0, 0.0]);
}
