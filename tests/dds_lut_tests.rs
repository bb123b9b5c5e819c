//! Sine table and phase accumulator tests

use swoop_chirp_dds::dds::{phase_increment, PhaseAccumulator, SineTable, PHASE_CIRCLE};

#[test]
fn test_sine_table_matches_formula() {
    let table = SineTable::<256>::new(2047.0);
    for (i, &value) in table.entries().iter().enumerate() {
        let expected = (2047.0 * (2.0 * std::f64::consts::PI * i as f64 / 256.0).sin()).round();
        assert_eq!(value as f64, expected, "entry {}", i);
    }
}

#[test]
fn test_sine_table_quadrants() {
    let table = SineTable::<256>::new(2047.0);
    let e = table.entries();

    assert_eq!(e[0], 0);
    assert_eq!(e[64], 2047);
    assert_eq!(e[128], 0);
    assert_eq!(e[192], -2047);

    // Odd symmetry: sin(x + π) = -sin(x)
    for i in 0..128 {
        assert_eq!(e[i], -e[i + 128], "entry {}", i);
    }
}

#[test]
fn test_sine_table_fits_dac_half_range() {
    let table = SineTable::<256>::new(2047.0);
    let max = table.entries().iter().copied().max().unwrap();
    let min = table.entries().iter().copied().min().unwrap();
    assert_eq!(max, 2047);
    assert_eq!(min, -2047);
    assert!(2048 + min as i32 >= 0);
    assert!(2048 + max as i32 <= 0xFFF);
}

#[test]
fn test_lookup_ignores_low_phase_bits() {
    let table = SineTable::<256>::new(2047.0);
    for index in [0u32, 1, 63, 64, 127, 200, 255] {
        let base = index << 24;
        assert_eq!(table.lookup(base), table.lookup(base | 0x00FF_FFFF));
        assert_eq!(table.lookup(base), table.entries()[index as usize]);
    }
}

#[test]
fn test_larger_table_uses_fewer_shift_bits() {
    let table = SineTable::<1024>::new(2047.0);
    assert_eq!(table.len(), 1024);
    assert_eq!(table.lookup(256 << 22), 2047);
}

#[test]
fn test_increment_formula() {
    for freq in [1740.0, 2000.0, 2100.0, 6975.0] {
        let expected = (freq * PHASE_CIRCLE / 50_000.0).round() as u32;
        assert_eq!(phase_increment(freq, 50_000), expected);
    }
    // 2 kHz at 50 kHz: 0.04 of a turn
    assert_eq!(phase_increment(2000.0, 50_000), 171_798_692);
}

#[test]
fn test_accumulator_is_sum_mod_2_32() {
    let increments = [171_798_692u32, 3_000_000_000, 4_000_000_000, 12, u32::MAX];
    let mut acc = PhaseAccumulator::new();
    let mut expected: u64 = 0;
    for inc in increments {
        expected = (expected + inc as u64) % (1u64 << 32);
        assert_eq!(acc.advance(inc) as u64, expected);
    }
    assert_eq!(acc.phase() as u64, expected);
}

#[test]
fn test_constant_increment_period() {
    // 12.5 kHz at 50 kHz repeats every 4 samples
    let table = SineTable::<256>::new(2047.0);
    let inc = phase_increment(12_500.0, 50_000);
    let mut acc = PhaseAccumulator::new();
    let samples: Vec<i16> = (0..8).map(|_| table.lookup(acc.advance(inc))).collect();
    assert_eq!(samples, [2047, 0, -2047, 0, 2047, 0, -2047, 0]);
}
