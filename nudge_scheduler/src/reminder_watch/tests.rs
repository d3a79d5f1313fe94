use chrono::{NaiveDate, Timelike};
use nudge_models::reminder::{ReminderFireTime, ReminderStyle, new_reminder_id};
use proptest_arbitrary_interop::arb;

use super::*;

fn at(day: u32, time: &str) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, day)
        .unwrap()
        .and_time(NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap())
}

fn reminder_at(time: &str, text: &str) -> Reminder {
    Reminder {
        id: new_reminder_id(),
        fire_at: time.parse::<ReminderFireTime>().unwrap(),
        text: text.to_owned(),
        style: ReminderStyle::Popup,
        media_path: None,
    }
}

/// Ticks once per second over `[from, to]` and collects every fired text.
fn run_ticks(watch: &mut ReminderWatch, from: NaiveDateTime, to: NaiveDateTime) -> Vec<String> {
    let mut fired = Vec::new();
    let mut now = from;
    while now <= to {
        fired.extend(watch.take_due(now).into_iter().map(|reminder| reminder.text));
        now += TimeDelta::seconds(1);
    }
    fired
}

#[test]
fn fires_once_when_clock_crosses_fire_time() {
    let mut watch = ReminderWatch::new();
    watch
        .watch(reminder_at("08:00:00", "Stretch"), at(1, "07:59:59"))
        .unwrap();

    assert!(watch.take_due(at(1, "07:59:59")).is_empty());
    assert_eq!(watch.take_due(at(1, "08:00:00")).len(), 1);
    assert!(watch.take_due(at(1, "08:00:01")).is_empty());
}

#[test]
fn does_not_fire_again_for_the_rest_of_the_day() {
    let mut watch = ReminderWatch::new();
    watch
        .watch(reminder_at("09:00:00", "Coffee"), at(1, "08:59:59"))
        .unwrap();

    let fired = run_ticks(&mut watch, at(1, "08:59:59"), at(1, "23:59:59"));

    assert_eq!(fired, vec!["Coffee"]);
}

#[test]
fn fires_again_the_next_day() {
    let mut watch = ReminderWatch::new();
    watch
        .watch(reminder_at("09:00:00", "Coffee"), at(1, "08:59:59"))
        .unwrap();

    assert_eq!(watch.take_due(at(1, "09:00:00")).len(), 1);
    assert!(watch.take_due(at(2, "08:59:59")).is_empty());
    assert_eq!(watch.take_due(at(2, "09:00:00")).len(), 1);
    assert!(watch.take_due(at(2, "09:00:01")).is_empty());
}

#[test]
fn late_tick_still_fires_once() {
    let mut watch = ReminderWatch::new();
    watch
        .watch(reminder_at("08:00:00", "Stretch"), at(1, "07:59:59"))
        .unwrap();

    assert_eq!(watch.take_due(at(1, "08:00:05")).len(), 1);
    assert!(watch.take_due(at(1, "08:00:06")).is_empty());
}

#[test]
fn reminders_sharing_a_time_fire_together_in_insertion_order() {
    let mut watch = ReminderWatch::new();
    let now = at(1, "09:59:59");
    watch.watch(reminder_at("10:00:00", "Standup"), now).unwrap();
    watch.watch(reminder_at("10:00:00", "Water"), now).unwrap();

    let due: Vec<_> = watch
        .take_due(at(1, "10:00:00"))
        .into_iter()
        .map(|reminder| reminder.text)
        .collect();

    assert_eq!(due, vec!["Standup", "Water"]);
}

#[test]
fn reminder_armed_during_its_second_fires() {
    let mut watch = ReminderWatch::new();
    watch
        .watch(reminder_at("12:00:00", "Lunch"), at(1, "12:00:00"))
        .unwrap();

    assert_eq!(watch.take_due(at(1, "12:00:00")).len(), 1);
}

#[test]
fn reminder_added_after_its_time_waits_for_tomorrow() {
    let mut watch = ReminderWatch::new();
    watch
        .watch(reminder_at("09:00:00", "Coffee"), at(1, "15:00:00"))
        .unwrap();

    let fired = run_ticks(&mut watch, at(1, "15:00:00"), at(1, "23:59:59"));
    assert!(fired.is_empty());

    assert_eq!(watch.take_due(at(2, "09:00:00")).len(), 1);
}

#[test]
fn replace_keeps_fired_state_of_remaining_reminders() {
    let mut watch = ReminderWatch::new();
    let coffee = reminder_at("09:00:00", "Coffee");
    watch.watch(coffee.clone(), at(1, "08:00:00")).unwrap();
    assert_eq!(watch.take_due(at(1, "09:00:00")).len(), 1);

    let standup = reminder_at("09:00:00", "Standup");
    watch.replace(vec![coffee, standup], at(1, "09:00:30"));

    let fired = run_ticks(&mut watch, at(1, "09:00:30"), at(1, "12:00:00"));
    assert!(fired.is_empty(), "fired = {fired:?}");

    let fired = run_ticks(&mut watch, at(2, "09:00:00"), at(2, "09:00:00"));
    assert_eq!(fired, vec!["Coffee", "Standup"]);
}

#[test]
fn replace_drops_missing_and_duplicate_reminders() {
    let mut watch = ReminderWatch::new();
    let coffee = reminder_at("09:00:00", "Coffee");
    let lunch = reminder_at("12:00:00", "Lunch");
    watch.watch(coffee.clone(), at(1, "08:00:00")).unwrap();

    watch.replace(vec![lunch.clone(), lunch.clone()], at(1, "08:00:00"));

    assert_eq!(watch.len(), 1);
    assert!(!watch.contains(coffee.id));
    assert!(watch.contains(lunch.id));
}

#[test]
fn watching_same_reminder_twice_fails() {
    let mut watch = ReminderWatch::new();
    let reminder = reminder_at("09:00:00", "Coffee");
    watch.watch(reminder.clone(), at(1, "08:00:00")).unwrap();

    assert!(watch.watch(reminder, at(1, "08:00:00")).is_err());
    assert_eq!(watch.len(), 1);
}

#[test]
fn unwatched_reminder_never_fires() {
    let mut watch = ReminderWatch::new();
    let reminder = reminder_at("09:00:00", "Coffee");
    watch.watch(reminder.clone(), at(1, "08:00:00")).unwrap();

    assert_eq!(watch.unwatch(reminder.id), Some(reminder.clone()));
    assert_eq!(watch.unwatch(reminder.id), None);
    assert!(watch.is_empty());
    assert!(watch.take_due(at(1, "09:00:00")).is_empty());
}

#[test]
fn occurrence_before_fire_time_is_yesterday() {
    let fire_at = NaiveTime::from_hms_opt(13, 0, 0).unwrap();

    assert_eq!(last_occurrence(&fire_at, at(2, "12:00:00")), at(1, "13:00:00"));
    assert_eq!(last_occurrence(&fire_at, at(2, "13:00:00")), at(2, "13:00:00"));
    assert_eq!(last_occurrence(&fire_at, at(2, "14:00:00")), at(2, "13:00:00"));
}

proptest::proptest! {
    #[test]
    fn test_last_occurrence(
        now in arb::<NaiveDateTime>(),
        fire_at in arb::<NaiveTime>()
    ) {
        let fire_at = fire_at.with_nanosecond(0).unwrap();
        let now = now.with_nanosecond(0).unwrap();
        proptest::prop_assume!(now.date() > NaiveDate::MIN);

        let occurrence = last_occurrence(&fire_at, now);

        proptest::prop_assert!(occurrence <= now, "Occurrence should never be in the future");
        proptest::prop_assert!(
            now - occurrence < TimeDelta::days(1),
            "Occurrence should be within the last day. occurrence = {:?}, now = {:?}",
            occurrence,
            now
        );
        proptest::prop_assert_eq!(occurrence.time(), fire_at);
    }
}
