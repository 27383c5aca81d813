//! Frame slicing (spec §4.4): turn digitized per-channel-per-tick traces
//! into a sparse sequence of per-tick-span [`Slice`]s, each a channel ->
//! charge and channel -> uncertainty map.
//!
//! Grounded in `SumSlice.cxx` (the plain summing slicer) and
//! `MaskSlice.cxx` (additionally understands dummy/masked planes and a
//! frame-level "bad channel" mask).

use std::collections::BTreeMap;

use wirecell_core::{Error, Result};

pub type Channel = i32;

/// One digitized trace: `charge[i]` is the sample at absolute tick
/// `tbin + i`.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    pub channel: Channel,
    pub tbin: i32,
    pub charge: Vec<f64>,
}

/// A digitized frame: a tagged bag of traces plus named channel-mask maps
/// (e.g. a "bad" mask of `(start_tick, end_tick)` ranges per channel).
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub ident: i32,
    pub time: f64,
    pub tick: f64,
    pub traces: Vec<Trace>,
    pub tags: BTreeMap<String, Vec<usize>>,
    pub masks: BTreeMap<String, BTreeMap<Channel, Vec<(i32, i32)>>>,
}

impl Frame {
    /// Trace indices tagged `tag`, or every trace if `tag` is empty.
    pub fn tagged(&self, tag: &str) -> Vec<usize> {
        if tag.is_empty() {
            return (0..self.traces.len()).collect();
        }
        self.tags.get(tag).cloned().unwrap_or_default()
    }
}

/// One time-slice: the channel -> (summed charge, combined uncertainty)
/// snapshot for one contiguous span of ticks.
#[derive(Clone, Debug, Default)]
pub struct Slice {
    pub ident: i64,
    pub start: f64,
    pub span: f64,
    pub charge: BTreeMap<Channel, f64>,
    pub error: BTreeMap<Channel, f64>,
}

#[derive(Clone, Debug)]
pub struct SumSlicerConfig {
    /// Selects the traces to sum; empty means every trace in the frame.
    pub tag: String,
    /// Number of ticks folded into one slice.
    pub tick_span: usize,
}

impl Default for SumSlicerConfig {
    fn default() -> Self {
        Self {
            tag: String::new(),
            tick_span: 1,
        }
    }
}

/// Sum-slice a frame: fold every `tick_span` consecutive ticks of each
/// selected trace into one slice, keyed by an absolute slice-bin number.
/// Slices start at the frame's absolute time, per
/// `start = frame.time + slicebin * span` (`span = tick_span * frame.tick`)
/// -- slice start times are always frame-absolute, never relative.
///
/// Samples with zero charge are skipped rather than stored as an explicit
/// zero, so a slice's channel map only ever lists channels actually hit.
pub fn sum_slice(frame: &Frame, cfg: &SumSlicerConfig) -> Result<Vec<Slice>> {
    if cfg.tick_span == 0 {
        return Err(Error::Value("tick_span must be >= 1".into()));
    }
    let span = cfg.tick_span as f64 * frame.tick;

    let mut by_bin: BTreeMap<i64, BTreeMap<Channel, (f64, f64)>> = BTreeMap::new();

    for &ti in &frame.tagged(&cfg.tag) {
        let trace = &frame.traces[ti];
        for (qind, &q) in trace.charge.iter().enumerate() {
            if q == 0.0 {
                continue;
            }
            let tbin_abs = trace.tbin as i64 + qind as i64;
            let slicebin = tbin_abs.div_euclid(cfg.tick_span as i64);
            let entry = by_bin
                .entry(slicebin)
                .or_default()
                .entry(trace.channel)
                .or_insert((0.0, 0.0));
            entry.0 += q;
            entry.1 += q.abs();
        }
    }

    Ok(by_bin
        .into_iter()
        .map(|(slicebin, channels)| {
            let mut charge = BTreeMap::new();
            let mut error = BTreeMap::new();
            for (ch, (c, var)) in channels {
                charge.insert(ch, c);
                error.insert(ch, var.sqrt());
            }
            Slice {
                ident: slicebin,
                start: frame.time + slicebin as f64 * span,
                span,
                charge,
                error,
            }
        })
        .collect())
}

/// A named group of channels belonging to one wire plane, e.g. one anode
/// face's U/V/W channels.
#[derive(Clone, Debug, Default)]
pub struct ChannelPlanes {
    pub groups: Vec<Vec<Channel>>,
}

#[derive(Clone, Debug)]
pub struct MaskSlicerConfig {
    pub tick_span: usize,
    pub tag: String,
    pub error_tag: String,
    pub mask_tag: String,
    pub active_planes: Vec<usize>,
    pub dummy_planes: Vec<usize>,
    pub masked_planes: Vec<usize>,
    pub dummy_charge: f64,
    pub dummy_error: f64,
    pub masked_charge: f64,
    pub masked_error: f64,
}

impl Default for MaskSlicerConfig {
    fn default() -> Self {
        Self {
            tick_span: 1,
            tag: String::new(),
            error_tag: String::new(),
            mask_tag: "bad".to_string(),
            active_planes: Vec::new(),
            dummy_planes: Vec::new(),
            masked_planes: Vec::new(),
            dummy_charge: 0.0,
            dummy_error: 1.0e9,
            masked_charge: 0.0,
            masked_error: 1.0e9,
        }
    }
}

/// Mask-slice a frame: like [`sum_slice`] for `active_planes`' channels
/// (using `error_tag`-tagged traces, summed in quadrature, for the
/// uncertainty rather than the charge magnitude), plus:
///
/// - `dummy_planes`: every channel gets a constant `(dummy_charge,
///   dummy_error)` at every slice across the active span, regardless of
///   any trace data (the plane is simulated as present but untrustworthy).
/// - `masked_planes`: a channel only gets a constant `(masked_charge,
///   masked_error)` entry for the slices its `mask_tag` ranges (the
///   frame's bad-channel map) actually cover.
pub fn mask_slice(frame: &Frame, planes: &ChannelPlanes, cfg: &MaskSlicerConfig) -> Result<Vec<Slice>> {
    if cfg.tick_span == 0 {
        return Err(Error::Value("tick_span must be >= 1".into()));
    }
    let span = cfg.tick_span as f64 * frame.tick;

    let active_channels: std::collections::HashSet<Channel> = cfg
        .active_planes
        .iter()
        .filter_map(|&pi| planes.groups.get(pi))
        .flatten()
        .copied()
        .collect();

    let mut charge_by_bin: BTreeMap<i64, BTreeMap<Channel, f64>> = BTreeMap::new();
    let mut var_by_bin: BTreeMap<i64, BTreeMap<Channel, f64>> = BTreeMap::new();

    for &ti in &frame.tagged(&cfg.tag) {
        let trace = &frame.traces[ti];
        if !active_channels.contains(&trace.channel) {
            continue;
        }
        for (qind, &q) in trace.charge.iter().enumerate() {
            if q == 0.0 {
                continue;
            }
            let tbin_abs = trace.tbin as i64 + qind as i64;
            let slicebin = tbin_abs.div_euclid(cfg.tick_span as i64);
            *charge_by_bin
                .entry(slicebin)
                .or_default()
                .entry(trace.channel)
                .or_insert(0.0) += q;
        }
    }
    for &ti in &frame.tagged(&cfg.error_tag) {
        let trace = &frame.traces[ti];
        if !active_channels.contains(&trace.channel) {
            continue;
        }
        for (qind, &e) in trace.charge.iter().enumerate() {
            if e == 0.0 {
                continue;
            }
            let tbin_abs = trace.tbin as i64 + qind as i64;
            let slicebin = tbin_abs.div_euclid(cfg.tick_span as i64);
            *var_by_bin
                .entry(slicebin)
                .or_default()
                .entry(trace.channel)
                .or_insert(0.0) += e * e;
        }
    }

    if charge_by_bin.is_empty() {
        return Ok(Vec::new());
    }
    let tmin = *charge_by_bin.keys().next().unwrap();
    let tmax = *charge_by_bin.keys().last().unwrap() + 1;

    let mut slices: Vec<Slice> = (tmin..tmax)
        .map(|slicebin| Slice {
            ident: slicebin,
            start: frame.time + slicebin as f64 * span,
            span,
            charge: BTreeMap::new(),
            error: BTreeMap::new(),
        })
        .collect();

    for slice in slices.iter_mut() {
        if let Some(ch) = charge_by_bin.get(&slice.ident) {
            for (&c, &q) in ch {
                slice.charge.insert(c, q);
            }
        }
        if let Some(var) = var_by_bin.get(&slice.ident) {
            for (&c, &v) in var {
                slice.error.insert(c, v.sqrt());
            }
        }
    }

    for &pi in &cfg.dummy_planes {
        let Some(group) = planes.groups.get(pi) else { continue };
        for slice in slices.iter_mut() {
            for &ch in group {
                slice.charge.insert(ch, cfg.dummy_charge);
                slice.error.insert(ch, cfg.dummy_error);
            }
        }
    }

    for &pi in &cfg.masked_planes {
        let Some(group) = planes.groups.get(pi) else { continue };
        for &ch in group {
            let Some(ranges) = frame.masks.get(&cfg.mask_tag).and_then(|m| m.get(&ch)) else {
                continue;
            };
            for &(start, end) in ranges {
                let bin_lo = (start as i64).div_euclid(cfg.tick_span as i64);
                let bin_hi = (end as i64).div_euclid(cfg.tick_span as i64);
                for slice in slices.iter_mut() {
                    if slice.ident < bin_lo || slice.ident > bin_hi {
                        continue;
                    }
                    slice.charge.insert(ch, cfg.masked_charge);
                    slice.error.insert(ch, cfg.masked_error);
                }
            }
        }
    }

    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(traces: Vec<Trace>) -> Frame {
        Frame {
            ident: 0,
            time: 100.0,
            tick: 0.5,
            traces,
            tags: BTreeMap::new(),
            masks: BTreeMap::new(),
        }
    }

    #[test]
    fn sum_slice_folds_ticks_and_skips_zero_charge() {
        let frame = frame_with(vec![Trace {
            channel: 7,
            tbin: 0,
            charge: vec![0.0, 1.0, 2.0, 0.0, 3.0],
        }]);
        let cfg = SumSlicerConfig {
            tag: String::new(),
            tick_span: 2,
        };
        let slices = sum_slice(&frame, &cfg).unwrap();
        // bins: [0,1)->0 skipped, [1,2)->1.0, [2,3)->2.0, [3,4)->skip, [4,5)->3.0
        // tick_span=2 groups ticks {0,1}->bin0, {2,3}->bin1, {4,5}->bin2
        assert_eq!(slices.len(), 3);
        let bin0 = slices.iter().find(|s| s.ident == 0).unwrap();
        assert_eq!(*bin0.charge.get(&7).unwrap(), 1.0);
        let bin1 = slices.iter().find(|s| s.ident == 1).unwrap();
        assert_eq!(*bin1.charge.get(&7).unwrap(), 2.0);
        let bin2 = slices.iter().find(|s| s.ident == 2).unwrap();
        assert_eq!(*bin2.charge.get(&7).unwrap(), 3.0);
        assert!((bin0.start - (frame.time + 0.0)).abs() < 1e-9);
        assert!((bin1.start - (frame.time + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn mask_slice_fills_dummy_plane_across_active_span() {
        let frame = frame_with(vec![Trace {
            channel: 0,
            tbin: 0,
            charge: vec![1.0, 1.0],
        }]);
        let planes = ChannelPlanes {
            groups: vec![vec![0], vec![100, 101]],
        };
        let cfg = MaskSlicerConfig {
            tick_span: 1,
            active_planes: vec![0],
            dummy_planes: vec![1],
            ..Default::default()
        };
        let slices = mask_slice(&frame, &planes, &cfg).unwrap();
        assert_eq!(slices.len(), 2);
        for s in &slices {
            assert_eq!(*s.charge.get(&100).unwrap(), cfg.dummy_charge);
            assert_eq!(*s.error.get(&101).unwrap(), cfg.dummy_error);
        }
    }

    #[test]
    fn mask_slice_dummy_fill_overwrites_stale_data_on_the_same_channel() {
        // Channel 5 belongs to a dummy plane but also appears as a tagged
        // trace with real charge: the dummy fill must still win.
        let frame = frame_with(vec![Trace {
            channel: 5,
            tbin: 0,
            charge: vec![42.0],
        }]);
        let planes = ChannelPlanes { groups: vec![vec![5]] };
        let cfg = MaskSlicerConfig {
            tick_span: 1,
            active_planes: vec![0],
            dummy_planes: vec![0],
            dummy_charge: -1.0,
            dummy_error: 7.0,
            ..Default::default()
        };
        let slices = mask_slice(&frame, &planes, &cfg).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(*slices[0].charge.get(&5).unwrap(), -1.0);
        assert_eq!(*slices[0].error.get(&5).unwrap(), 7.0);
    }

    #[test]
    fn mask_slice_ignores_traces_outside_active_planes() {
        let frame = frame_with(vec![Trace {
            channel: 9,
            tbin: 0,
            charge: vec![100.0],
        }]);
        // Channel 9 exists but isn't a member of any plane in active_planes.
        let planes = ChannelPlanes {
            groups: vec![vec![0], vec![9]],
        };
        let cfg = MaskSlicerConfig {
            tick_span: 1,
            active_planes: vec![0],
            ..Default::default()
        };
        let slices = mask_slice(&frame, &planes, &cfg).unwrap();
        assert!(slices.is_empty());
    }

    #[test]
    fn mask_slice_marks_masked_plane_only_within_bad_range() {
        let frame = Frame {
            ident: 0,
            time: 0.0,
            tick: 1.0,
            traces: vec![Trace {
                channel: 0,
                tbin: 0,
                charge: vec![1.0, 1.0, 1.0, 1.0],
            }],
            tags: BTreeMap::new(),
            masks: BTreeMap::from([("bad".to_string(), BTreeMap::from([(200, vec![(1, 2)])]))]),
        };
        let planes = ChannelPlanes {
            groups: vec![vec![0], vec![200]],
        };
        let cfg = MaskSlicerConfig {
            tick_span: 1,
            active_planes: vec![0],
            masked_planes: vec![1],
            ..Default::default()
        };
        let slices = mask_slice(&frame, &planes, &cfg).unwrap();
        let bin0 = slices.iter().find(|s| s.ident == 0).unwrap();
        assert!(bin0.charge.get(&200).is_none());
        let bin1 = slices.iter().find(|s| s.ident == 1).unwrap();
        assert_eq!(*bin1.charge.get(&200).unwrap(), cfg.masked_charge);
    }
}
