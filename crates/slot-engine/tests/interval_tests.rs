//! Tests for interval merging.

use chrono::{NaiveDate, NaiveDateTime};
use slot_engine::{merge_intervals, Interval};

fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

fn iv(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Interval {
    Interval::new(at(start_hour, start_min), at(end_hour, end_min))
}

#[test]
fn empty_input_merges_to_empty() {
    assert!(merge_intervals(&[]).is_empty());
}

#[test]
fn unsorted_disjoint_intervals_are_sorted() {
    let merged = merge_intervals(&[iv(14, 0, 15, 0), iv(9, 0, 10, 0)]);
    assert_eq!(merged, vec![iv(9, 0, 10, 0), iv(14, 0, 15, 0)]);
}

#[test]
fn overlapping_intervals_merge() {
    let merged = merge_intervals(&[iv(10, 0, 11, 30), iv(11, 0, 12, 0)]);
    assert_eq!(merged, vec![iv(10, 0, 12, 0)]);
}

#[test]
fn touching_intervals_merge() {
    let merged = merge_intervals(&[iv(9, 0, 10, 0), iv(10, 0, 11, 0)]);
    assert_eq!(merged, vec![iv(9, 0, 11, 0)]);
}

#[test]
fn contained_interval_is_absorbed() {
    let merged = merge_intervals(&[iv(9, 0, 17, 0), iv(10, 0, 11, 0), iv(12, 0, 13, 0)]);
    assert_eq!(merged, vec![iv(9, 0, 17, 0)]);
}

#[test]
fn chain_of_overlaps_collapses() {
    let merged = merge_intervals(&[
        iv(12, 0, 14, 0),
        iv(9, 0, 10, 30),
        iv(10, 0, 12, 30),
        iv(15, 0, 16, 0),
    ]);
    assert_eq!(merged, vec![iv(9, 0, 14, 0), iv(15, 0, 16, 0)]);
}
