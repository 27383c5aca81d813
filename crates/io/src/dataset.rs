//! Write a point-cloud [`Dataset`] out to a tensor-set archive, one
//! `.npy` entry per column, named `<prefix>_<column>.npy` (spec §6's
//! tensor-set naming convention).

use wirecell_core::pointcloud::{Dataset, Dtype};
use wirecell_core::Result;

use crate::archive::Archive;
use crate::npy;

pub fn write_dataset(archive: &mut Archive, dataset: &Dataset, prefix: &str) -> Result<()> {
    let names: Vec<String> = dataset.names().map(|s| s.to_string()).collect();
    for name in names {
        let array = dataset.get(&name)?;
        let shape: Vec<u64> = array.shape().iter().map(|&s| s as u64).collect();
        let bytes = match array.dtype() {
            Dtype::F8 => npy::write_f64_1d(&array.as_f64()?)?,
            Dtype::I4 => npy::write_i32_1d(&array.as_i32()?)?,
            other => {
                return Err(wirecell_core::Error::Value(format!(
                    "no .npy encoder wired up for dtype {other:?}"
                )))
            }
        };
        let _ = shape; // both encoders above are 1-D; multi-dim columns aren't produced by this workspace yet
        archive.write_entry(&format!("{prefix}_{name}.npy"), &bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirecell_core::pointcloud::Array;

    #[test]
    fn writes_one_entry_per_column() {
        let mut ds = Dataset::new();
        ds.add("x", Array::from_f64(vec![1.0, 2.0, 3.0])).unwrap();
        ds.add("blobid", Array::from_i4(vec![0, 0, 1])).unwrap();

        let mut path = std::env::temp_dir();
        path.push(format!("wc-io-ds-test-{}.tar", std::process::id()));
        let mut archive = Archive::create(&path).unwrap();
        write_dataset(&mut archive, &ds, "3d").unwrap();
        archive.finish().unwrap();
        std::fs::remove_file(&path).ok();
    }
}
