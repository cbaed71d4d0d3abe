//! Breakpoint sets and N-dimensional function tables.
//!
//! A [`BreakpointSet`] is a strictly increasing 1-D grid; a BP block turns a
//! raw input into a fractional index along it. A [`FuncTable`] stores a
//! flattened grid of dependent values (last dimension varies fastest) and
//! interpolates multilinearly between the 2^N corners around a set of
//! fractional indices.

use af_core::{BlockId, ParseText, ensure_strictly_increasing};

use crate::error::{ModelError, ModelResult};

/// Named, strictly increasing grid of independent-variable values.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointSet {
    id: String,
    name: String,
    values: Vec<f64>,
    description: String,
    users: Vec<BlockId>,
}

impl BreakpointSet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> ModelResult<Self> {
        let id = id.into();
        if values.is_empty() || ensure_strictly_increasing(&values, "breakpoints").is_err() {
            return Err(ModelError::InvalidBreakpoints { id });
        }
        Ok(Self {
            id,
            name: name.into(),
            values,
            description: String::new(),
            users: Vec::new(),
        })
    }

    /// Build from a number-list string such as `"-10, -5, 0, 5"`.
    pub fn from_text(
        id: impl Into<String>,
        name: impl Into<String>,
        text: &str,
    ) -> ModelResult<Self> {
        let values = ParseText::new(text).try_to_list()?;
        Self::new(id, name, values)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// BP blocks that read this set.
    pub fn users(&self) -> &[BlockId] {
        &self.users
    }

    pub(crate) fn register_user(&mut self, block: BlockId) {
        if !self.users.contains(&block) {
            self.users.push(block);
        }
    }

    /// Fractional index of `x`: `i + (x - v[i]) / (v[i+1] - v[i])` where
    /// `v[i] <= x < v[i+1]`. Values outside the grid clamp to `0.0` or
    /// `n - 1`; NaN stays NaN.
    pub fn fractional_index(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let n = self.values.len();
        let at_or_below = self.values.partition_point(|v| *v <= x);
        if at_or_below == 0 {
            return 0.0;
        }
        if at_or_below >= n {
            return (n - 1) as f64;
        }
        let i = at_or_below - 1;
        let (lo, hi) = (self.values[i], self.values[i + 1]);
        i as f64 + (x - lo) / (hi - lo)
    }
}

/// Flattened N-dimensional table of dependent values.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncTable {
    id: String,
    name: String,
    bp_ids: Vec<String>,
    dims: Vec<usize>,
    values: Vec<f64>,
    description: String,
}

impl FuncTable {
    /// Create a table over `breakpoints`, one set per dimension in storage
    /// order. `values.len()` must equal the product of the set sizes; a
    /// table with no dimensions holds no values.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        breakpoints: &[&BreakpointSet],
        values: Vec<f64>,
    ) -> ModelResult<Self> {
        let id = id.into();
        let dims: Vec<usize> = breakpoints.iter().map(|bp| bp.len()).collect();
        let expected = if dims.is_empty() {
            0
        } else {
            dims.iter().product()
        };
        if values.len() != expected {
            return Err(ModelError::DimensionMismatch {
                what: format!(
                    "table '{}' has {} values but its breakpoints span {}",
                    id,
                    values.len(),
                    expected
                ),
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            bp_ids: breakpoints.iter().map(|bp| bp.id().to_string()).collect(),
            dims,
            values,
            description: String::new(),
        })
    }

    /// Like [`new`](Self::new), with the values given as a number list.
    pub fn from_text(
        id: impl Into<String>,
        name: impl Into<String>,
        breakpoints: &[&BreakpointSet],
        text: &str,
    ) -> ModelResult<Self> {
        let values = ParseText::new(text).try_to_list()?;
        Self::new(id, name, breakpoints, values)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Breakpoint set ids, one per dimension.
    pub fn bp_ids(&self) -> &[String] {
        &self.bp_ids
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row-major strides, last dimension fastest.
    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.dims.len()];
        for d in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * self.dims[d + 1];
        }
        strides
    }

    /// Value stored at integer grid coordinates.
    pub fn get_pt(&self, indices: &[usize]) -> ModelResult<f64> {
        if indices.len() != self.dims.len() {
            return Err(ModelError::DimensionMismatch {
                what: format!(
                    "table '{}' has {} dimensions, got {} indices",
                    self.id,
                    self.dims.len(),
                    indices.len()
                ),
            });
        }
        let mut offset = 0;
        for ((&i, &n), stride) in indices.iter().zip(&self.dims).zip(self.strides()) {
            if i >= n {
                return Err(ModelError::IndexOutOfBounds {
                    what: format!("table '{}'", self.id),
                    index: i,
                    len: n,
                });
            }
            offset += i * stride;
        }
        self.values
            .get(offset)
            .copied()
            .ok_or_else(|| ModelError::IndexOutOfBounds {
                what: format!("table '{}'", self.id),
                index: offset,
                len: self.values.len(),
            })
    }

    /// Multilinear interpolation at fractional grid coordinates.
    ///
    /// Coordinates are clamped to each dimension's range, so lookups never
    /// extrapolate. A NaN coordinate yields NaN; a table with no dimensions
    /// yields NaN.
    pub fn interpolate(&self, coords: &[f64]) -> ModelResult<f64> {
        let ndim = self.dims.len();
        if coords.len() != ndim {
            return Err(ModelError::DimensionMismatch {
                what: format!(
                    "table '{}' has {} dimensions, got {} coordinates",
                    self.id,
                    ndim,
                    coords.len()
                ),
            });
        }
        if ndim == 0 || coords.iter().any(|c| c.is_nan()) {
            return Ok(f64::NAN);
        }
        if ndim >= usize::BITS as usize {
            return Err(ModelError::DimensionMismatch {
                what: format!("table '{}' has too many dimensions", self.id),
            });
        }

        let mut base = Vec::with_capacity(ndim);
        let mut frac = Vec::with_capacity(ndim);
        for (&c, &n) in coords.iter().zip(&self.dims) {
            let top = (n - 1) as f64;
            let c = c.clamp(0.0, top);
            if n == 1 {
                base.push(0);
                frac.push(0.0);
                continue;
            }
            let i = (c.floor() as usize).min(n - 2);
            base.push(i);
            frac.push(c - i as f64);
        }

        let strides = self.strides();
        let mut sum = 0.0;
        for corner in 0..(1_usize << ndim) {
            let mut weight = 1.0;
            let mut offset = 0;
            for d in 0..ndim {
                let bit = (corner >> d) & 1;
                weight *= if bit == 1 { frac[d] } else { 1.0 - frac[d] };
                offset += (base[d] + bit) * strides[d];
            }
            // zero-weight corners may lie past the grid edge
            if weight == 0.0 {
                continue;
            }
            sum += weight * self.values[offset];
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha() -> BreakpointSet {
        BreakpointSet::new("alpha_bp", "alpha", vec![0.0, 10.0, 20.0]).unwrap()
    }

    #[test]
    fn breakpoints_must_increase() {
        assert!(BreakpointSet::new("bp", "bp", vec![]).is_err());
        assert!(BreakpointSet::new("bp", "bp", vec![1.0, 1.0]).is_err());
        assert!(matches!(
            BreakpointSet::new("bp", "bp", vec![2.0, 1.0]),
            Err(ModelError::InvalidBreakpoints { id }) if id == "bp"
        ));
    }

    #[test]
    fn breakpoints_from_text() {
        let bp = BreakpointSet::from_text("bp", "bp", "-10, -5,\n 0 5").unwrap();
        assert_eq!(bp.values(), &[-10.0, -5.0, 0.0, 5.0]);
        assert!(matches!(
            BreakpointSet::from_text("bp", "bp", "1 2.2.2"),
            Err(ModelError::MalformedNumber { .. })
        ));
    }

    #[test]
    fn fractional_index_edges() {
        let bp = alpha();
        assert_eq!(bp.fractional_index(0.0), 0.0);
        assert_eq!(bp.fractional_index(20.0), 2.0);
        assert_eq!(bp.fractional_index(-5.0), 0.0);
        assert_eq!(bp.fractional_index(99.0), 2.0);
        assert_eq!(bp.fractional_index(10.0), 1.0);
        assert!((bp.fractional_index(12.5) - 1.25).abs() < 1e-12);
        assert!(bp.fractional_index(f64::NAN).is_nan());
    }

    #[test]
    fn single_point_set_is_always_zero() {
        let bp = BreakpointSet::new("one", "one", vec![3.0]).unwrap();
        assert_eq!(bp.fractional_index(-1.0), 0.0);
        assert_eq!(bp.fractional_index(3.0), 0.0);
        assert_eq!(bp.fractional_index(9.0), 0.0);
    }

    #[test]
    fn table_size_must_match() {
        let a = alpha();
        assert!(matches!(
            FuncTable::new("t", "t", &[&a], vec![1.0, 2.0]),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn zero_dimension_table_is_empty() {
        let t = FuncTable::new("t", "t", &[], vec![]).unwrap();
        assert_eq!(t.len(), 0);
        assert_eq!(t.ndim(), 0);
        assert!(t.interpolate(&[]).unwrap().is_nan());
    }

    #[test]
    fn get_pt_bounds() {
        let a = alpha();
        let b = BreakpointSet::new("b", "b", vec![0.0, 1.0]).unwrap();
        let t = FuncTable::new("t", "t", &[&a, &b], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(t.get_pt(&[0, 1]).unwrap(), 2.0);
        assert_eq!(t.get_pt(&[2, 0]).unwrap(), 5.0);
        assert!(matches!(
            t.get_pt(&[3, 0]),
            Err(ModelError::IndexOutOfBounds { index: 3, len: 3, .. })
        ));
        assert!(matches!(
            t.get_pt(&[0]),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn bilinear_midpoint() {
        let a = alpha();
        let b = BreakpointSet::new("b", "b", vec![0.0, 1.0]).unwrap();
        let t = FuncTable::new("t", "t", &[&a, &b], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let v = t.interpolate(&[0.5, 0.5]).unwrap();
        assert!((v - 2.5).abs() < 1e-12);
        // upper edge, exactly on the last grid line
        assert_eq!(t.interpolate(&[2.0, 1.0]).unwrap(), 6.0);
        // clamped
        assert_eq!(t.interpolate(&[7.0, -3.0]).unwrap(), 5.0);
    }
}
