//! Suffix-selected tensor-set archive: a named bag of byte blobs (each
//! destined to be one `.npy` tensor) written to a `.tar`, `.tar.gz`,
//! `.tar.bz2`, or `.zip` container.
//!
//! Grounded in `Stream::output_filters`'s suffix dispatch (used by
//! `FrameFileSink.cxx`) generalized from the wires crate's single-file
//! suffix dispatch ([`wirecell_wires::fileio`](../../wires/src/fileio.rs))
//! to a multi-entry archive.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use wirecell_core::{Error, Result};

/// An open tensor-set archive ready to receive named entries.
pub enum Archive {
    Tar(tar::Builder<Box<dyn Write + Send>>),
    Zip(Box<zip::ZipWriter<File>>),
}

fn suffix(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    for multi in ["tar.gz", "tar.bz2"] {
        if name.ends_with(&format!(".{multi}")) {
            return multi.to_string();
        }
    }
    path.extension().and_then(|e| e.to_str()).unwrap_or("").to_string()
}

impl Archive {
    pub fn create(path: &Path) -> Result<Self> {
        match suffix(path).as_str() {
            "tar" => {
                let f = File::create(path)?;
                Ok(Archive::Tar(tar::Builder::new(Box::new(f))))
            }
            "tar.gz" | "tgz" => {
                let f = File::create(path)?;
                let enc = GzEncoder::new(f, Compression::default());
                Ok(Archive::Tar(tar::Builder::new(Box::new(enc))))
            }
            "tar.bz2" => {
                let f = File::create(path)?;
                let enc = BzEncoder::new(f, bzip2::Compression::default());
                Ok(Archive::Tar(tar::Builder::new(Box::new(enc))))
            }
            "zip" => {
                let f = File::create(path)?;
                Ok(Archive::Zip(Box::new(zip::ZipWriter::new(f))))
            }
            other => Err(Error::Value(format!("unsupported tensor-set archive suffix: .{other}"))),
        }
    }

    pub fn write_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        match self {
            Archive::Tar(builder) => {
                let mut header = tar::Header::new_gnu();
                header.set_size(bytes.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append_data(&mut header, name, bytes).map_err(Error::from)
            }
            Archive::Zip(writer) => {
                let options = zip::write::SimpleFileOptions::default();
                writer
                    .start_file(name, options)
                    .map_err(|e| Error::Io(format!("zip entry {name}: {e}")))?;
                writer.write_all(bytes).map_err(Error::from)
            }
        }
    }

    pub fn finish(self) -> Result<()> {
        match self {
            Archive::Tar(mut builder) => builder.finish().map_err(Error::from),
            Archive::Zip(mut writer) => writer.finish().map(|_| ()).map_err(|e| Error::Io(e.to_string())),
        }
    }
}
