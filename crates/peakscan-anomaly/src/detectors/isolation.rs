// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use super::{DetectorOutcome, PeakAnomalyDetector, collect_finite, peak_gaps};
use crate::config::DetectorKind;
use crate::rng::StableRng;
use peakscan_core::{ScanError, stats};
use peakscan_peaks::PeakRecord;

const MIN_PEAKS: usize = 5;
const FEATURES: usize = 4;
const EULER_GAMMA: f64 = 0.5772156649;

type Row = [f64; FEATURES];

/// Isolation forest over standardized `(value, prominence, width, local gap)`.
///
/// Flags the `ceil(contamination * n)` peaks with the highest scores; ties
/// go to the lower peak position.
#[derive(Clone, Debug, PartialEq)]
pub struct IsolationDetector {
    pub contamination: f64,
    pub trees: usize,
    pub sample_size: usize,
    pub seed: u64,
}

impl PeakAnomalyDetector for IsolationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Isolation
    }

    fn evaluate(&self, peaks: &[PeakRecord]) -> Result<DetectorOutcome, ScanError> {
        let n = peaks.len();
        if n < MIN_PEAKS {
            return Err(ScanError::insufficient_data(format!(
                "isolation forest needs at least {MIN_PEAKS} peaks; got {n}"
            )));
        }

        let (rows, active) = standardized_features(self.kind(), peaks)?;
        if active.is_empty() {
            return Ok(DetectorOutcome::not_run("all isolation features are constant"));
        }

        let psi = self.sample_size.min(n);
        let depth_limit = (psi as f64).log2().ceil() as usize;
        let mut rng = StableRng::new(self.seed);
        let mut path_sums = vec![0.0; n];

        for _ in 0..self.trees {
            let members = rng.sample_indices(n, psi)?;
            let tree = grow(&rows, members, 0, depth_limit, &active, &mut rng)?;
            for (sum, row) in path_sums.iter_mut().zip(rows.iter()) {
                *sum += tree.path_length(row, 0);
            }
        }

        let normalizer = average_path_length(psi);
        let scores: Vec<f64> = path_sums
            .iter()
            .map(|sum| 2f64.powf(-(sum / self.trees as f64) / normalizer))
            .collect();

        let flag_count = flag_count(self.contamination, n);
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        let mut flags = vec![false; n];
        for &position in ranked.iter().take(flag_count) {
            flags[position] = true;
        }

        Ok(DetectorOutcome::Scored { scores, flags })
    }
}

/// Number of top-scoring peaks to flag: `ceil(contamination * n)`, at least
/// one and at most `n`.
fn flag_count(contamination: f64, n: usize) -> usize {
    // 0.1 * 30 lands just above 3.0; the slack keeps exact products exact.
    let raw = (contamination * n as f64 - 1e-9).ceil();
    (raw.max(1.0) as usize).min(n)
}

/// Per-peak feature rows standardized per column, plus the columns that
/// carry any variation.
fn standardized_features(
    kind: DetectorKind,
    peaks: &[PeakRecord],
) -> Result<(Vec<Row>, Vec<usize>), ScanError> {
    let gaps = peak_gaps(kind, peaks)?;
    let local_gap = |k: usize| {
        let before = k.checked_sub(1).map(|j| gaps[j]);
        let after = gaps.get(k).copied();
        let adjacent: Vec<f64> = before.into_iter().chain(after).collect();
        stats::mean(&adjacent).unwrap_or(0.0)
    };

    let columns = [
        collect_finite(kind, "value", peaks.iter().map(|p| p.value))?,
        collect_finite(kind, "prominence", peaks.iter().map(|p| p.prominence))?,
        collect_finite(kind, "width", peaks.iter().map(|p| p.width))?,
        (0..peaks.len()).map(local_gap).collect(),
    ];

    let mut rows = vec![[0.0; FEATURES]; peaks.len()];
    let mut active = vec![];
    for (feature, column) in columns.iter().enumerate() {
        let mean = stats::mean(column).unwrap_or(0.0);
        let std = stats::population_std(column).unwrap_or(0.0);
        if std > 0.0 && std.is_finite() {
            active.push(feature);
            for (row, value) in rows.iter_mut().zip(column) {
                row[feature] = (value - mean) / std;
            }
        }
    }
    Ok((rows, active))
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, row: &Row, depth: usize) -> f64 {
        match self {
            Self::Leaf { size } => depth as f64 + average_path_length(*size),
            Self::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] < *threshold {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
    }
}

fn grow(
    rows: &[Row],
    members: Vec<usize>,
    depth: usize,
    depth_limit: usize,
    active: &[usize],
    rng: &mut StableRng,
) -> Result<Node, ScanError> {
    if depth >= depth_limit || members.len() <= 1 {
        return Ok(Node::Leaf {
            size: members.len(),
        });
    }

    let splittable: Vec<(usize, f64, f64)> = active
        .iter()
        .filter_map(|&feature| {
            let (lo, hi) = members.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &m| (lo.min(rows[m][feature]), hi.max(rows[m][feature])),
            );
            (hi > lo).then_some((feature, lo, hi))
        })
        .collect();
    if splittable.is_empty() {
        return Ok(Node::Leaf {
            size: members.len(),
        });
    }

    let (feature, lo, hi) = splittable[rng.gen_range(splittable.len())?];
    let threshold = lo + rng.next_f64() * (hi - lo);
    let (left, right): (Vec<usize>, Vec<usize>) = members
        .into_iter()
        .partition(|&m| rows[m][feature] < threshold);

    Ok(Node::Split {
        feature,
        threshold,
        left: Box::new(grow(rows, left, depth + 1, depth_limit, active, rng)?),
        right: Box::new(grow(rows, right, depth + 1, depth_limit, active, rng)?),
    })
}

/// Expected path length of an unsuccessful BST search over `m` points.
fn average_path_length(m: usize) -> f64 {
    match m {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let m = m as f64;
            2.0 * ((m - 1.0).ln() + EULER_GAMMA) - 2.0 * (m - 1.0) / m
        }
    }
}
