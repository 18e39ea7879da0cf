//! Ad-hoc penalties from plain functions

use std::fmt;

use ndarray::ArrayViewD;

use super::Regularizer;
use crate::tensor::Floatx;
use crate::Result;

/// Wraps a user-supplied penalty function as a [`Regularizer`]
///
/// The function carries no config, so a serialized `FnRegularizer` can only
/// be rebuilt by a registry that has a factory under the same name.
pub struct FnRegularizer<F> {
    name: String,
    func: F,
}

impl<F> FnRegularizer<F>
where
    F: Fn(ArrayViewD<'_, Floatx>) -> Floatx + Send + Sync,
{
    /// Wrap `func`, exported under `name`
    pub fn new(name: impl Into<String>, func: F) -> Self {
        FnRegularizer {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnRegularizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRegularizer").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<F> Regularizer for FnRegularizer<F>
where
    F: Fn(ArrayViewD<'_, Floatx>) -> Floatx + Send + Sync,
{
    fn class_name(&self) -> &str {
        &self.name
    }

    fn penalty(&self, weights: ArrayViewD<'_, Floatx>) -> Result<Floatx> {
        Ok((self.func)(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_function_penalty() {
        let max_abs = FnRegularizer::new("max_abs", |w| {
            w.iter().fold(0.0f32, |acc, v| acc.max(v.abs()))
        });
        let x = arr1(&[1.0, -7.0, 3.0]).into_dyn();

        assert_eq!(max_abs.class_name(), "max_abs");
        assert_eq!(max_abs.penalty(x.view()).unwrap(), 7.0);
        assert!(max_abs.config().is_empty());
        assert!(format!("{max_abs:?}").contains("max_abs"));
    }
}
