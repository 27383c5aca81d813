//! `.npy`-encode the small arrays a tensor-set entry is made of.

use wirecell_core::{Error, Result};

fn npy_err(e: impl std::fmt::Display) -> Error {
    Error::Io(format!("npy encode: {e}"))
}

pub fn write_f32_2d(data: &[f32], shape: [u64; 2]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut buf)
        .begin_nd()
        .map_err(npy_err)?;
    writer.extend(data.iter().copied()).map_err(npy_err)?;
    writer.finish().map_err(npy_err)?;
    Ok(buf)
}

pub fn write_i16_2d(data: &[i16], shape: [u64; 2]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut buf)
        .begin_nd()
        .map_err(npy_err)?;
    writer.extend(data.iter().copied()).map_err(npy_err)?;
    writer.finish().map_err(npy_err)?;
    Ok(buf)
}

pub fn write_i32_1d(data: &[i32]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&[data.len() as u64])
        .writer(&mut buf)
        .begin_nd()
        .map_err(npy_err)?;
    writer.extend(data.iter().copied()).map_err(npy_err)?;
    writer.finish().map_err(npy_err)?;
    Ok(buf)
}

pub fn write_i32_2d(data: &[i32], shape: [u64; 2]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut buf)
        .begin_nd()
        .map_err(npy_err)?;
    writer.extend(data.iter().copied()).map_err(npy_err)?;
    writer.finish().map_err(npy_err)?;
    Ok(buf)
}

pub fn write_f64_1d(data: &[f64]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&[data.len() as u64])
        .writer(&mut buf)
        .begin_nd()
        .map_err(npy_err)?;
    writer.extend(data.iter().copied()).map_err(npy_err)?;
    writer.finish().map_err(npy_err)?;
    Ok(buf)
}
