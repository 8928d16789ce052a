//! Time sync integration tests.

use mediaext::{MAX_SPEED, MIN_SPEED, TimeSync};

#[test]
fn defaults_are_identity() {
    let sync = TimeSync::new();
    assert_eq!(sync.offset_ms(), 0);
    assert_eq!(sync.speed(), 1.0);
    assert_eq!(sync.adjusted_position_us(1_234_567), 1_234_567);
    assert_eq!(sync.adjusted_position_us(0), 0);
}

#[test]
fn offset_only() {
    let mut sync = TimeSync::new();
    sync.set_offset_ms(2000);
    assert_eq!(sync.adjusted_position_us(5_000_000), 3_000_000);
}

#[test]
fn speed_only() {
    let mut sync = TimeSync::new();
    sync.set_speed(1.1);
    assert_eq!(sync.adjusted_position_us(10_000_000), 11_000_000);
}

#[test]
fn speed_and_offset_combined() {
    let mut sync = TimeSync::new();
    sync.set_offset_ms(1000);
    sync.set_speed(1.05);
    assert_eq!(sync.adjusted_position_us(20_000_000), 20_000_000);
}

#[test]
fn speed_is_applied_before_offset() {
    let mut sync = TimeSync::new();
    sync.set_offset_ms(-1000);
    sync.set_speed(2.0);
    // (5s × 2) + 1s, not (5s + 1s) × 2.
    assert_eq!(sync.adjusted_position_us(5_000_000), 11_000_000);
}

#[test]
fn negative_results_are_allowed() {
    let sync = TimeSync::with_offset_ms(3000);
    assert_eq!(sync.adjusted_position_us(1_000_000), -2_000_000);
}

#[test]
fn speed_writes_are_clamped() {
    let mut sync = TimeSync::new();

    sync.set_speed(0.0);
    assert_eq!(sync.speed(), MIN_SPEED);

    sync.set_speed(-3.0);
    assert_eq!(sync.speed(), MIN_SPEED);

    sync.set_speed(25.0);
    assert_eq!(sync.speed(), MAX_SPEED);

    sync.set_speed(f64::INFINITY);
    assert_eq!(sync.speed(), MAX_SPEED);

    sync.set_speed(0.75);
    assert_eq!(sync.speed(), 0.75);
}

#[test]
fn nan_speed_resets_to_normal() {
    let mut sync = TimeSync::new();
    sync.set_speed(3.0);
    sync.set_speed(f64::NAN);
    assert_eq!(sync.speed(), 1.0);
}

#[test]
fn any_offset_is_accepted() {
    let mut sync = TimeSync::new();
    sync.set_offset_ms(i64::MIN);
    assert_eq!(sync.offset_ms(), i64::MIN);
    sync.set_offset_ms(i64::MAX);
    assert_eq!(sync.offset_ms(), i64::MAX);
}

#[test]
fn extreme_values_saturate() {
    let mut sync = TimeSync::new();
    sync.set_speed(MAX_SPEED);
    sync.set_offset_ms(i64::MIN);
    assert_eq!(sync.adjusted_position_us(i64::MAX), i64::MAX);

    sync.set_offset_ms(i64::MAX);
    assert_eq!(sync.adjusted_position_us(i64::MIN), i64::MIN);
}
