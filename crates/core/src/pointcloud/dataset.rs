//! A named collection of equal-major-length [`Array`] columns.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::pointcloud::array::Array;
use serde_json::Value as Json;

/// Mapping from column name to [`Array`]; all columns share one major length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    arrays: BTreeMap<String, Array>,
    metadata: Json,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, array: Array) -> Result<()> {
        let name = name.into();
        if let Some(existing) = self.arrays.values().next() {
            if existing.size_major() != array.size_major() {
                return Err(Error::Value(format!(
                    "column {} major size {} does not match dataset major size {}",
                    name,
                    array.size_major(),
                    existing.size_major()
                )));
            }
        }
        self.arrays.insert(name, array);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Array> {
        self.arrays
            .get(name)
            .ok_or_else(|| Error::Key(format!("no such column: {name}")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(|s| s.as_str())
    }

    pub fn metadata(&self) -> &Json {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Json) {
        self.metadata = metadata;
    }

    /// Major-axis length shared by every column, or 0 if the dataset is empty.
    pub fn size_major(&self) -> usize {
        self.arrays
            .values()
            .next()
            .map(|a| a.size_major())
            .unwrap_or(0)
    }

    /// Append a compatible dataset's columns in lock-step.
    ///
    /// Every column name in `self` must be present in `tail` with an
    /// append-compatible shape; extra columns in `tail` are ignored.
    pub fn append(&mut self, tail: &Dataset) -> Result<()> {
        let names: Vec<String> = self.arrays.keys().cloned().collect();
        for name in names {
            let tail_col = tail.get(&name)?;
            self.arrays.get_mut(&name).unwrap().append(tail_col)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_mismatched_major_size() {
        let mut ds = Dataset::new();
        ds.add("x", Array::from_f64(vec![1.0, 2.0, 3.0])).unwrap();
        let err = ds.add("y", Array::from_f64(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, Error::Value(_)));
    }

    #[test]
    fn append_extends_every_column() {
        let mut ds = Dataset::new();
        ds.add("x", Array::from_f64(vec![1.0, 2.0])).unwrap();
        ds.add("id", Array::from_i4(vec![0, 1])).unwrap();

        let mut tail = Dataset::new();
        tail.add("x", Array::from_f64(vec![3.0])).unwrap();
        tail.add("id", Array::from_i4(vec![2])).unwrap();

        ds.append(&tail).unwrap();
        assert_eq!(ds.get("x").unwrap().as_f64().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(ds.get("id").unwrap().as_i32().unwrap(), vec![0, 1, 2]);
        assert_eq!(ds.size_major(), 3);
    }
}
