//! A named, shaped, byte-backed array with a dynamic dtype tag.

use crate::error::{Error, Result};
use crate::pointcloud::dtype::Dtype;
use serde_json::Value as Json;

/// A dense array: row-major bytes tagged with a shape and a [`Dtype`].
///
/// The first shape dimension is the "major" axis; [`Dataset`](super::Dataset)
/// requires all of its columns to share the same major-axis length and
/// appends extend every column along it in lock-step.
#[derive(Clone, Debug, Default)]
pub struct Array {
    shape: Vec<usize>,
    dtype: Dtype,
    bytes: Vec<u8>,
    metadata: Json,
}

impl Default for Dtype {
    fn default() -> Self {
        Dtype::F8
    }
}

impl Array {
    pub fn new(shape: Vec<usize>, dtype: Dtype, bytes: Vec<u8>) -> Result<Self> {
        let expect = shape.iter().product::<usize>() * dtype.size();
        if expect != bytes.len() {
            return Err(Error::Value(format!(
                "array byte length {} does not match shape {:?} and dtype {:?} ({} expected)",
                bytes.len(),
                shape,
                dtype,
                expect
            )));
        }
        Ok(Self {
            shape,
            dtype,
            bytes,
            metadata: Json::Null,
        })
    }

    pub fn from_f64(values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Self {
            shape,
            dtype: Dtype::F8,
            bytes,
            metadata: Json::Null,
        }
    }

    pub fn from_i4(values: Vec<i32>) -> Self {
        let shape = vec![values.len()];
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Self {
            shape,
            dtype: Dtype::I4,
            bytes,
            metadata: Json::Null,
        }
    }

    pub fn zeros_like(&self, nmaj: usize) -> Self {
        if self.shape.is_empty() {
            return Self {
                metadata: self.metadata.clone(),
                ..Default::default()
            };
        }
        let mut shape = self.shape.clone();
        shape[0] = nmaj;
        let size = shape.iter().product::<usize>() * self.dtype.size();
        Self {
            shape,
            dtype: self.dtype,
            bytes: vec![0u8; size],
            metadata: self.metadata.clone(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn metadata(&self) -> &Json {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Json) {
        self.metadata = metadata;
    }

    /// Total number of elements across all dimensions.
    pub fn num_elements(&self) -> usize {
        if self.bytes.is_empty() || self.shape.is_empty() {
            return 0;
        }
        self.shape.iter().product()
    }

    /// Length of the major (first) axis.
    pub fn size_major(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn as_f64(&self) -> Result<Vec<f64>> {
        if self.dtype != Dtype::F8 {
            return Err(Error::Value(format!(
                "array dtype {:?} is not f8",
                self.dtype
            )));
        }
        Ok(self
            .bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }

    pub fn as_i32(&self) -> Result<Vec<i32>> {
        if self.dtype != Dtype::I4 {
            return Err(Error::Value(format!(
                "array dtype {:?} is not i4",
                self.dtype
            )));
        }
        Ok(self
            .bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }

    fn append_compatible(s1: &[usize], s2: &[usize]) -> bool {
        if s1.len() != s2.len() {
            return false;
        }
        if s1.len() == 1 {
            return true;
        }
        s1[1..] == s2[1..]
    }

    /// Append another array's rows onto this one. Shapes must agree on every
    /// axis but the major one.
    pub fn append(&mut self, tail: &Array) -> Result<()> {
        if !Self::append_compatible(&self.shape, tail.shape()) {
            return Err(Error::Value("array append with incompatible shape".into()));
        }
        self.append_bytes(tail.bytes())
    }

    pub fn append_bytes(&mut self, data: &[u8]) -> Result<()> {
        let ele = self.dtype.size();
        if data.len() % ele != 0 {
            return Err(Error::Value(
                "byte append not compatible with existing type".into(),
            ));
        }
        let nelem = data.len() / ele;

        let mut notrows = 1usize;
        for (i, s) in self.shape.iter().enumerate() {
            if i > 0 {
                notrows *= s;
            }
        }
        if notrows == 0 || nelem % notrows != 0 {
            return Err(Error::Value(
                "byte append not compatible with existing shape".into(),
            ));
        }
        let nrows = nelem / notrows;

        self.bytes.extend_from_slice(data);
        if self.shape.is_empty() {
            self.shape.push(nrows);
        } else {
            self.shape[0] += nrows;
        }
        Ok(())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        // Cheapest test first, bail early.
        if self.size_major() != other.size_major() {
            return false;
        }
        if self.shape != other.shape {
            return false;
        }
        if self.bytes != other.bytes {
            return false;
        }
        self.metadata == other.metadata
    }
}
