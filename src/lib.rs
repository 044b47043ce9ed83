//! Parallel assembly of tensor-product discretizations.
//!
//! Bilinear and linear forms over tensor-product bases, as they arise in isogeometric analysis,
//! are discretized into dense tensors restricted to a per-axis nonzero pattern. The basis
//! functions only have local support, so most index combinations are structurally zero and are
//! excluded up front. For symmetric forms, only one representative of each (entry, transpose)
//! pair is evaluated.
//!
//! The numerical meaning of an entry is supplied by an
//! [`EntryEvaluator`](crate::assembly::EntryEvaluator); this crate only provides the scaffold
//! that turns such an evaluator into a populated tensor, vector or matrix.
use nalgebra::RealField;

pub mod assembly;
pub mod error;
pub mod index;
pub mod pattern;
pub mod pool;
pub mod space;
pub mod state;
pub mod tensor;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Real scalar types usable in assembly.
///
/// Used as a trait alias for the traits needed by generic `fenris-iga` routines.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}
