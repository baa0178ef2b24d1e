// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Deterministic synthetic signals shared by the benchmarks.

use peakscan_core::{ScanError, Signal};

/// One step of a 64-bit LCG; returns a uniform sample in `[0, 1)`.
pub fn lcg_next(state: &mut u64) -> f64 {
    *state = state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407);
    (*state >> 11) as f64 / (1u64 << 53) as f64
}

/// A sine carrier with uniform noise and a sparse set of tall spikes.
pub fn noisy_spiky_values(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|i| {
            let carrier = (i as f64 * 0.02).sin() * 2.0;
            let noise = lcg_next(&mut state) - 0.5;
            let spike = if i % 997 == 500 { 25.0 } else { 0.0 };
            carrier + noise + spike
        })
        .collect()
}

pub fn noisy_spiky_signal(n: usize, seed: u64) -> Result<Signal, ScanError> {
    Signal::from_uniform(noisy_spiky_values(n, seed), 0.0, 1e-3)
}

#[cfg(test)]
mod tests {
    use super::{lcg_next, noisy_spiky_values};

    #[test]
    fn generator_is_deterministic_and_in_range() {
        let mut a = 7;
        let mut b = 7;
        for _ in 0..1_000 {
            let x = lcg_next(&mut a);
            assert_eq!(x, lcg_next(&mut b));
            assert!((0.0..1.0).contains(&x));
        }
        assert_eq!(noisy_spiky_values(64, 3), noisy_spiky_values(64, 3));
    }
}
