#![allow(non_snake_case)]

//! Domain adaptation estimators.
//!
//! A base estimator trained on a labeled *source* domain is wrapped so that it
//! generalizes to a shifted *target* domain. The wrapper estimates the shift
//! between the two domains, derives either importance weights or a feature
//! transform from it, and fits the base estimator accordingly.
//!
//! ```ignore
//! use domainadapt::adapter::{AdaptationMethod, DomainAdapter};
//! use domainadapt::estimators::{estimators::Lasso, traits::{Fit, Predict}};
//!
//! let adapter = DomainAdapter::params(Lasso::params().alpha(0.01))
//!     .method(AdaptationMethod::coral())
//!     .fit(&dataset)?;
//! let y_pred = adapter.predict(X_target.view())?;
//! ```

use ndarray::ScalarOperand;

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast};

use std::cmp::PartialOrd;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Float point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point
/// number and implement them for 32bit and 64bit float points.
/// Ref: https://github.com/rust-ml/linfa/blob/master/src/dataset/mod.rs#L36
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + ScalarOperand
    + approx::AbsDiffEq
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

pub mod adapter;
pub mod datafits;
pub mod datasets;
pub mod deriver;
pub mod discrepancy;
pub mod error;
pub mod estimators;
pub mod helpers;
pub mod model_selection;
pub mod penalties;
pub mod solver;
