//! Write a digitized [`Frame`] out as a tensor-set archive entry group,
//! one `frame_<tag>_<ident>.npy` + `channels_<tag>_<ident>.npy` +
//! `tickinfo_<tag>_<ident>.npy` triple per selected tag, plus one
//! `chanmask_<name>_<ident>.npy` per named channel mask.
//!
//! Grounded in `FrameFileSink.cxx`; the per-tag "summary" array it also
//! writes has no counterpart here, since this crate's [`Frame`] does not
//! carry per-trace summary values.

use wirecell_core::Result;
use wirecell_img::frame::{Channel, Frame};

use crate::archive::Archive;
use crate::npy;

#[derive(Clone, Debug)]
pub struct FrameSinkConfig {
    /// Trace tags to write, one archive entry group per tag. `"*"`
    /// selects every trace in the frame regardless of tagging.
    pub tags: Vec<String>,
    /// Cast the dense waveform array to 16-bit integers instead of
    /// 32-bit floats.
    pub digitize: bool,
    pub baseline: f32,
    pub scale: f32,
    pub offset: f32,
    /// Also write each of the frame's named channel-mask maps.
    pub masks: bool,
}

impl Default for FrameSinkConfig {
    fn default() -> Self {
        Self {
            tags: vec!["*".to_string()],
            digitize: false,
            baseline: 0.0,
            scale: 1.0,
            offset: 0.0,
            masks: true,
        }
    }
}

pub fn write_frame(archive: &mut Archive, frame: &Frame, cfg: &FrameSinkConfig) -> Result<()> {
    for tag in &cfg.tags {
        write_tag(archive, frame, tag, cfg)?;
    }
    if cfg.masks {
        write_masks(archive, frame)?;
    }
    Ok(())
}

fn write_tag(archive: &mut Archive, frame: &Frame, tag: &str, cfg: &FrameSinkConfig) -> Result<()> {
    let indices = if tag == "*" { (0..frame.traces.len()).collect() } else { frame.tagged(tag) };
    if indices.is_empty() {
        tracing::warn!(tag, ident = frame.ident, "zero traces for tag");
        return Ok(());
    }

    let mut channels: Vec<Channel> = indices.iter().map(|&i| frame.traces[i].channel).collect();
    channels.sort_unstable();
    channels.dedup();

    let tbin_lo = indices.iter().map(|&i| frame.traces[i].tbin).min().unwrap();
    let tbin_hi = indices
        .iter()
        .map(|&i| frame.traces[i].tbin + frame.traces[i].charge.len() as i32)
        .max()
        .unwrap();
    let ncols = (tbin_hi - tbin_lo).max(0) as usize;
    let nrows = channels.len();

    let mut arr = vec![cfg.baseline; nrows * ncols];
    for &i in &indices {
        let trace = &frame.traces[i];
        let row = channels.binary_search(&trace.channel).unwrap();
        let col0 = (trace.tbin - tbin_lo) as usize;
        for (k, &q) in trace.charge.iter().enumerate() {
            let col = col0 + k;
            if col < ncols {
                arr[row * ncols + col] = cfg.baseline + cfg.scale * q as f32 + cfg.offset;
            }
        }
    }

    let shape = [nrows as u64, ncols as u64];
    if cfg.digitize {
        let sarr: Vec<i16> = arr.iter().map(|&v| v.round() as i16).collect();
        archive.write_entry(
            &format!("frame_{tag}_{}.npy", frame.ident),
            &npy::write_i16_2d(&sarr, shape)?,
        )?;
    } else {
        archive.write_entry(&format!("frame_{tag}_{}.npy", frame.ident), &npy::write_f32_2d(&arr, shape)?)?;
    }

    archive.write_entry(
        &format!("channels_{tag}_{}.npy", frame.ident),
        &npy::write_i32_1d(&channels)?,
    )?;

    let tickinfo = vec![frame.time, frame.tick, tbin_lo as f64];
    archive.write_entry(&format!("tickinfo_{tag}_{}.npy", frame.ident), &npy::write_f64_1d(&tickinfo)?)?;

    Ok(())
}

fn write_masks(archive: &mut Archive, frame: &Frame) -> Result<()> {
    if frame.masks.is_empty() {
        return Ok(());
    }
    for (name, cms) in &frame.masks {
        let nrows: usize = cms.values().map(|ranges| ranges.len()).sum();
        let mut arr = Vec::with_capacity(nrows * 3);
        for (&chid, ranges) in cms {
            for &(tbeg, tend) in ranges {
                arr.push(chid);
                arr.push(tbeg);
                arr.push(tend);
            }
        }
        archive.write_entry(
            &format!("chanmask_{name}_{}.npy", frame.ident),
            &npy::write_i32_2d(&arr, [nrows as u64, 3])?,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wirecell_img::frame::Trace;

    #[test]
    fn dense_frame_array_matches_trace_layout() {
        let frame = Frame {
            ident: 1,
            time: 0.0,
            tick: 0.5,
            traces: vec![
                Trace { channel: 5, tbin: 2, charge: vec![1.0, 2.0] },
                Trace { channel: 3, tbin: 0, charge: vec![9.0] },
            ],
            tags: BTreeMap::new(),
            masks: BTreeMap::new(),
        };
        let cfg = FrameSinkConfig::default();
        let mut dir = std::env::temp_dir();
        dir.push(format!("wc-io-test-{}.tar", std::process::id()));
        let mut archive = Archive::create(&dir).unwrap();
        write_frame(&mut archive, &frame, &cfg).unwrap();
        archive.finish().unwrap();
        std::fs::remove_file(&dir).ok();
    }
}
