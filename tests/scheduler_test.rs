use chrono::{NaiveTime, TimeZone};
use chrono_tz::Europe::Paris;

use myges_bot::services::scheduler::next_tick;

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

fn daily_times() -> Vec<NaiveTime> {
    vec![at(6, 0), at(15, 53), at(18, 0)]
}

#[test]
fn picks_the_next_time_later_today() {
    let now = Paris
        .with_ymd_and_hms(2025, 3, 10, 7, 15, 0)
        .single()
        .expect("valid");

    let next = next_tick(now, &daily_times()).expect("next tick");
    assert_eq!(
        next,
        Paris
            .with_ymd_and_hms(2025, 3, 10, 15, 53, 0)
            .single()
            .expect("valid")
    );
}

#[test]
fn rolls_over_to_tomorrow_after_the_last_tick() {
    let now = Paris
        .with_ymd_and_hms(2025, 3, 10, 19, 0, 0)
        .single()
        .expect("valid");

    let next = next_tick(now, &daily_times()).expect("next tick");
    assert_eq!(
        next,
        Paris
            .with_ymd_and_hms(2025, 3, 11, 6, 0, 0)
            .single()
            .expect("valid")
    );
}

#[test]
fn a_tick_time_is_not_its_own_successor() {
    let now = Paris
        .with_ymd_and_hms(2025, 3, 10, 18, 0, 0)
        .single()
        .expect("valid");

    let next = next_tick(now, &daily_times()).expect("next tick");
    assert_eq!(
        next,
        Paris
            .with_ymd_and_hms(2025, 3, 11, 6, 0, 0)
            .single()
            .expect("valid")
    );
}

#[test]
fn skips_times_erased_by_the_dst_gap() {
    // Paris jumps 02:00 -> 03:00 on 2025-03-30; 02:30 does not exist that day.
    let now = Paris
        .with_ymd_and_hms(2025, 3, 30, 1, 0, 0)
        .single()
        .expect("valid");

    let next = next_tick(now, &[at(2, 30)]).expect("next tick");
    assert_eq!(
        next,
        Paris
            .with_ymd_and_hms(2025, 3, 31, 2, 30, 0)
            .single()
            .expect("valid")
    );
}

#[test]
fn no_configured_times_means_no_tick() {
    let now = Paris
        .with_ymd_and_hms(2025, 3, 10, 7, 15, 0)
        .single()
        .expect("valid");

    assert_eq!(next_tick(now, &[]), None);
}
