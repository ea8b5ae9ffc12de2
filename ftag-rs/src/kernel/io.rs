use super::ConfigError;

use ndarray::{Array1, ArrayView1};

/// Adapter trait for reading contiguous 1D input, such as a frequency axis.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;

    /// Borrow the underlying input, rejecting empty sequences.
    fn read_nonempty(&self, arg: &'static str) -> Result<&[T], ConfigError> {
        let slice = self.read_slice()?;
        if slice.is_empty() {
            return Err(ConfigError::EmptyInput { arg });
        }
        Ok(slice)
    }
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<'a, T> Read1D<T> for ArrayView1<'a, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Read1D};
    use ndarray::{s, Array1};

    #[test]
    fn slice_vec_and_array_adapters() {
        let freqs = [1.0f64, 2.0, 3.0];
        assert_eq!(freqs.read_slice().expect("array adapter").len(), 3);

        let s: &[f64] = &freqs;
        assert_eq!(s.read_slice().expect("slice adapter")[1], 2.0);

        let v = freqs.to_vec();
        assert_eq!(v.read_slice().expect("vec adapter"), &freqs);
    }

    #[test]
    fn ndarray_adapters_require_contiguous_axes() {
        let axis = Array1::linspace(0.0f64, 10.0, 11);
        assert_eq!(axis.read_slice().expect("array1 read")[10], 10.0);

        let strided = axis.slice(s![..;2]);
        assert_eq!(
            strided.read_slice(),
            Err(ConfigError::NonContiguous { arg: "array_view" })
        );
    }

    #[test]
    fn read_nonempty_rejects_empty_axis() {
        let empty: Vec<f64> = Vec::new();
        assert_eq!(
            empty.read_nonempty("freqs"),
            Err(ConfigError::EmptyInput { arg: "freqs" })
        );
    }
}
