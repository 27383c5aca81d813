//! Suffix-selected compression envelope for wire geometry files (§6).

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use wirecell_core::{Error, Result};

pub fn read_text(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut text = String::new();
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => {
            GzDecoder::new(file).read_to_string(&mut text)?;
        }
        Some("bz2") => {
            BzDecoder::new(file).read_to_string(&mut text)?;
        }
        _ => {
            let mut file = file;
            file.read_to_string(&mut text)?;
        }
    }
    Ok(text)
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    let file = File::create(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => {
            let mut enc = GzEncoder::new(file, Compression::default());
            enc.write_all(text.as_bytes())?;
            enc.finish().map_err(Error::from)?;
        }
        Some("bz2") => {
            let mut enc = BzEncoder::new(file, bzip2::Compression::default());
            enc.write_all(text.as_bytes())?;
            enc.finish().map_err(Error::from)?;
        }
        _ => {
            let mut file = file;
            file.write_all(text.as_bytes())?;
        }
    }
    Ok(())
}
