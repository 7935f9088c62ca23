//! Column-major matrices and their pointer-per-column views.
//!
//! The engine exchanges spectrogram-like data as an array of per-frame
//! base pointers. [`Matrix`] stores its data column-major (one frame per
//! column, each column `rows` contiguous values) so that handing the
//! engine a pointer array is O(cols) pointer arithmetic over the backing
//! buffer, never a copy.
//!
//! Raw pointers only exist inside [`ColumnPointersMut`] and
//! [`ColumnPointers`], which borrow the matrix for as long as the engine
//! may touch it.
//!
//! # Example
//!
//! ```
//! use world_rs::Matrix;
//!
//! // 3 frequency bins x 2 frames
//! let mut matrix = Matrix::zeros(3, 2);
//! {
//!     let mut columns = matrix.to_pointer_columns();
//!     assert_eq!(columns.len(), 2);
//!     columns.column_mut(1).fill(0.5);
//! }
//! assert_eq!(matrix.column(1), &[0.5, 0.5, 0.5]);
//! assert_eq!(matrix.column_offsets(), vec![0, 3]);
//! ```

use std::marker::PhantomData;
use std::slice;

use crate::error::{Error, Result};

#[cfg(feature = "ndarray")]
use ndarray::{Array2, ShapeBuilder};

/// A dense `rows x cols` matrix of `f64` stored column by column.
///
/// For analysis results rows are frequency bins and columns are frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap column-major data.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] if `data.len() != rows * cols`.
    pub fn from_columns(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::shape_mismatch("matrix data", rows * cols, data.len()));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Build a matrix from row-major data (row 0 first).
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] if `data.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: &[f64]) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::shape_mismatch("matrix data", rows * cols, data.len()));
        }

        let mut matrix = Matrix::zeros(rows, cols);
        for (row, values) in data.chunks_exact(cols.max(1)).enumerate().take(rows) {
            for (col, &value) in values.iter().enumerate() {
                matrix.data[col * rows + row] = value;
            }
        }
        Ok(matrix)
    }

    /// Number of rows (frequency bins).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (frames).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the matrix holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[col * self.rows + row])
        } else {
            None
        }
    }

    /// One column (frame) as a contiguous slice.
    ///
    /// # Panics
    ///
    /// Panics if `col >= self.cols()`.
    pub fn column(&self, col: usize) -> &[f64] {
        assert!(col < self.cols, "column {col} out of range for {} columns", self.cols);
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// One column (frame) as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if `col >= self.cols()`.
    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        assert!(col < self.cols, "column {col} out of range for {} columns", self.cols);
        &mut self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Iterate over columns in order.
    pub fn columns(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.cols).map(move |col| self.column(col))
    }

    /// Offset of each column's first element in the backing buffer.
    pub fn column_offsets(&self) -> Vec<usize> {
        (0..self.cols).map(|col| col * self.rows).collect()
    }

    /// The backing buffer in column-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Take the backing buffer (column-major).
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Copy out the elements in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        for row in 0..self.rows {
            for col in 0..self.cols {
                out.push(self.data[col * self.rows + row]);
            }
        }
        out
    }

    /// Base pointers of every column, for engines that write in place.
    ///
    /// An empty sequence when either dimension is zero.
    pub fn to_pointer_columns(&mut self) -> ColumnPointersMut<'_> {
        let ptrs = if self.is_empty() {
            Vec::new()
        } else {
            let base = self.data.as_mut_ptr();
            // SAFETY: col * rows < data.len() for every col < cols.
            (0..self.cols)
                .map(|col| unsafe { base.add(col * self.rows) })
                .collect()
        };
        ColumnPointersMut::new(ptrs, self.rows, self.cols)
    }

    /// Read-only base pointers of every column, for engines that only read.
    ///
    /// An empty sequence when either dimension is zero.
    pub fn column_pointers(&self) -> ColumnPointers<'_> {
        let ptrs = if self.is_empty() {
            Vec::new()
        } else {
            self.columns().map(<[f64]>::as_ptr).collect()
        };
        ColumnPointers::new(ptrs, self.rows, self.cols)
    }

    /// Copy into an `ndarray` array of shape `(rows, cols)`.
    ///
    /// Requires the `ndarray` feature.
    #[cfg(feature = "ndarray")]
    pub fn to_array2(&self) -> Result<Array2<f64>> {
        // Column-major (Fortran) order matches the backing buffer
        Array2::from_shape_vec((self.rows, self.cols).f(), self.data.clone())
            .map_err(|_| Error::shape_mismatch("ndarray shape", self.rows * self.cols, self.data.len()))
    }

    /// Build a matrix from any `ndarray` layout.
    ///
    /// Requires the `ndarray` feature.
    #[cfg(feature = "ndarray")]
    pub fn from_array2(array: &Array2<f64>) -> Self {
        let (rows, cols) = array.dim();
        let mut data = Vec::with_capacity(rows * cols);
        for column in array.columns() {
            data.extend(column.iter().copied());
        }
        Matrix { rows, cols, data }
    }
}

// ============================================================================
// Column pointer views
// ============================================================================

/// Mutable pointer-per-column view of a [`Matrix`].
///
/// Holds the matrix's unique borrow, so every pointer stays valid and
/// unaliased until the view is dropped.
pub struct ColumnPointersMut<'m> {
    ptrs: Vec<*mut f64>,
    rows: usize,
    cols: usize,
    _borrow: PhantomData<&'m mut [f64]>,
}

impl<'m> ColumnPointersMut<'m> {
    fn new(ptrs: Vec<*mut f64>, rows: usize, cols: usize) -> Self {
        debug_assert!(ptrs.is_empty() || ptrs.len() == cols);
        ColumnPointersMut {
            ptrs,
            rows,
            cols,
            _borrow: PhantomData,
        }
    }

    /// Number of column pointers.
    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    /// Check if there are no pointers (a degenerate matrix).
    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    /// Elements per column.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The raw pointer array for the engine's `double**` parameter.
    pub fn as_mut_ptr(&mut self) -> *mut *mut f64 {
        self.ptrs.as_mut_ptr()
    }

    /// One column through its pointer.
    ///
    /// # Panics
    ///
    /// Panics if `col >= self.len()`.
    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        let ptr = self.ptrs[col];
        // SAFETY: ptr addresses `rows` elements of the borrowed matrix and
        // the view holds the only borrow.
        unsafe { slice::from_raw_parts_mut(ptr, self.rows) }
    }

    /// Copy every column back out into a fresh matrix of the same shape.
    pub fn to_matrix(&self) -> Matrix {
        if self.ptrs.is_empty() {
            return Matrix::zeros(self.rows, self.cols);
        }
        // SAFETY: each pointer addresses `rows` live elements of the
        // borrowed matrix.
        unsafe { copy_columns(self.ptrs.iter().map(|&p| p as *const f64), self.rows, self.cols) }
    }
}

/// Read-only pointer-per-column view of a [`Matrix`].
pub struct ColumnPointers<'m> {
    ptrs: Vec<*const f64>,
    rows: usize,
    cols: usize,
    _borrow: PhantomData<&'m [f64]>,
}

impl<'m> ColumnPointers<'m> {
    fn new(ptrs: Vec<*const f64>, rows: usize, cols: usize) -> Self {
        debug_assert!(ptrs.is_empty() || ptrs.len() == cols);
        ColumnPointers {
            ptrs,
            rows,
            cols,
            _borrow: PhantomData,
        }
    }

    /// Number of column pointers.
    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    /// Check if there are no pointers (a degenerate matrix).
    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    /// Elements per column.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The raw pointer array for the engine's `const double**` parameter.
    pub fn as_ptr(&self) -> *const *const f64 {
        self.ptrs.as_ptr()
    }

    /// One column through its pointer.
    ///
    /// # Panics
    ///
    /// Panics if `col >= self.len()`.
    pub fn column(&self, col: usize) -> &[f64] {
        // SAFETY: the pointer addresses `rows` elements of the borrowed matrix.
        unsafe { slice::from_raw_parts(self.ptrs[col], self.rows) }
    }

    /// Copy every column back out into a fresh matrix of the same shape.
    pub fn to_matrix(&self) -> Matrix {
        if self.ptrs.is_empty() {
            return Matrix::zeros(self.rows, self.cols);
        }
        // SAFETY: as in `column`.
        unsafe { copy_columns(self.ptrs.iter().copied(), self.rows, self.cols) }
    }
}

/// Copy `rows` elements from each pointer into a new `rows x columns.len()`
/// matrix, preserving column order.
///
/// Use this when the engine hands back memory it owns.
///
/// # Safety
///
/// Every pointer must be valid for reads of `rows` consecutive `f64`
/// values. Null pointers are only allowed when `rows == 0`.
pub unsafe fn from_pointer_columns(columns: &[*const f64], rows: usize) -> Matrix {
    if rows == 0 {
        return Matrix::zeros(0, columns.len());
    }
    copy_columns(columns.iter().copied(), rows, columns.len())
}

unsafe fn copy_columns(
    columns: impl Iterator<Item = *const f64>,
    rows: usize,
    cols: usize,
) -> Matrix {
    let mut data = Vec::with_capacity(rows * cols);
    let mut seen = 0;
    for ptr in columns {
        data.extend_from_slice(slice::from_raw_parts(ptr, rows));
        seen += 1;
    }
    assert_eq!(seen, cols, "column pointer count must equal the column count");
    Matrix { rows, cols, data }
}
