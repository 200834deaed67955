//! End-to-end scheduler scenarios against a real SQLite store

mod helper;

use std::sync::Arc;

use helper::{FakeReleaseSource, FakeUsageSource, create_test_store};
use upstream_check::config::AppConfig;
use upstream_check::update::clock::{Clock, ManualClock};
use upstream_check::update::error::SourceError;
use upstream_check::update::policy::UpdateDecision;
use upstream_check::update::scheduler::{CheckOutcome, UpdateScheduler};
use upstream_check::update::scheme::VersionType;
use upstream_check::update::source::Usage;
use upstream_check::update::store::{SqliteStateStore, StateStore};

const NOW: i64 = 1_700_000_000_000;

fn tag_config(version: &str) -> AppConfig {
    AppConfig {
        version_type: VersionType::Tag,
        version: version.to_string(),
        repository: "owner/app".to_string(),
        ..AppConfig::default()
    }
}

fn date_config(commit_date: &str) -> AppConfig {
    AppConfig {
        version_type: VersionType::Date,
        commit_date: commit_date.to_string(),
        repository: "owner/app".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn tag_scheme_reports_newer_tag_as_update() {
    let (_temp_dir, store) = create_test_store();
    let source = Arc::new(FakeReleaseSource::new().with_tags(&["v1.1.0", "v1.0.0"]));

    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        store.clone(),
        source.clone(),
        Arc::new(FakeUsageSource::default()),
        Arc::new(ManualClock::new(NOW)),
    );

    assert_eq!(scheduler.check_version(false).await, CheckOutcome::Updated);
    assert_eq!(
        scheduler.state().remote_version,
        Some("v1.1.0".to_string())
    );
    assert_eq!(
        scheduler.decision(),
        UpdateDecision::UpdateAvailable("v1.1.0".to_string())
    );
}

#[tokio::test]
async fn date_scheme_same_utc_day_is_up_to_date() {
    let (_temp_dir, store) = create_test_store();
    // 1700000000000 is 2023-11-14T22:13:20Z
    let source = Arc::new(
        FakeReleaseSource::new().with_commit_dates(&["2023-11-14T01:02:03Z", "2023-11-10T00:00:00Z"]),
    );

    let scheduler = UpdateScheduler::new(
        date_config("1700000000000"),
        store,
        source,
        Arc::new(FakeUsageSource::default()),
        Arc::new(ManualClock::new(NOW)),
    );

    assert_eq!(scheduler.check_version(false).await, CheckOutcome::Updated);
    let remote = scheduler.state().remote_version.unwrap();
    assert_eq!(scheduler.format_version(&remote), "20231114");
    assert_eq!(scheduler.decision(), UpdateDecision::UpToDate);
}

#[tokio::test]
async fn date_scheme_next_utc_day_is_update() {
    let (_temp_dir, store) = create_test_store();
    let source = Arc::new(FakeReleaseSource::new().with_commit_dates(&["2023-11-15T00:00:01Z"]));

    let scheduler = UpdateScheduler::new(
        date_config("1700000000000"),
        store,
        source,
        Arc::new(FakeUsageSource::default()),
        Arc::new(ManualClock::new(NOW)),
    );

    scheduler.check_version(false).await;

    assert_eq!(
        scheduler.decision(),
        UpdateDecision::UpdateAvailable("20231115".to_string())
    );
}

#[tokio::test]
async fn checks_ten_seconds_apart_fetch_once() {
    let (_temp_dir, store) = create_test_store();
    let source = Arc::new(FakeReleaseSource::new().with_tags(&["v1.1.0"]));
    let clock = Arc::new(ManualClock::new(NOW));

    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        store,
        source.clone(),
        Arc::new(FakeUsageSource::default()),
        clock.clone(),
    );

    scheduler.check_version(false).await;
    clock.advance(10_000);
    assert_eq!(scheduler.check_version(false).await, CheckOutcome::Throttled);

    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn throttle_window_survives_restart() {
    let (temp_dir, store) = create_test_store();
    let clock = Arc::new(ManualClock::new(NOW));

    {
        let scheduler = UpdateScheduler::new(
            tag_config("v1.0.0"),
            store,
            Arc::new(FakeReleaseSource::new().with_tags(&["v1.1.0"])),
            Arc::new(FakeUsageSource::default()),
            clock.clone(),
        );
        scheduler.check_version(false).await;
    }

    clock.advance(60_000);
    let reopened = Arc::new(SqliteStateStore::new(&temp_dir.path().join("state.db"), "update").unwrap());
    let source = Arc::new(FakeReleaseSource::new().with_tags(&["v1.2.0"]));
    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        reopened,
        source.clone(),
        Arc::new(FakeUsageSource::default()),
        clock,
    );

    assert_eq!(scheduler.check_version(false).await, CheckOutcome::Throttled);
    assert_eq!(source.fetch_count(), 0);
    // last-known state is replayed without fetching
    assert_eq!(
        scheduler.decision(),
        UpdateDecision::UpdateAvailable("v1.1.0".to_string())
    );
}

#[tokio::test]
async fn failed_fetch_keeps_previous_remote_and_consumes_window() {
    let (_temp_dir, store) = create_test_store();
    let clock = Arc::new(ManualClock::new(NOW));

    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        store.clone(),
        Arc::new(FakeReleaseSource::new().with_tags(&["v1.1.0"])),
        Arc::new(FakeUsageSource::default()),
        clock.clone(),
    );
    scheduler.check_version(false).await;
    drop(scheduler);

    clock.advance(3 * 60 * 60 * 1000);
    let failing = Arc::new(FakeReleaseSource::failing());
    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        store.clone(),
        failing.clone(),
        Arc::new(FakeUsageSource::default()),
        clock.clone(),
    );

    assert!(scheduler.check_version(false).await.is_failure());
    // retry right after a failure is throttled
    assert_eq!(scheduler.check_version(false).await, CheckOutcome::Throttled);
    assert_eq!(failing.fetch_count(), 1);

    let persisted = store.load().unwrap().unwrap();
    assert_eq!(persisted.remote_version, Some("v1.1.0".to_string()));
    assert_eq!(persisted.last_update, clock.now_ms());
}

#[tokio::test]
async fn usage_check_merges_and_throttles_per_minute() {
    let (_temp_dir, store) = create_test_store();
    let clock = Arc::new(ManualClock::new(NOW));
    let usage = Arc::new(FakeUsageSource::new(vec![
        Ok(Usage {
            used: 2.5,
            total: 100.0,
        }),
        Err(SourceError::UnexpectedStatus(500)),
    ]));

    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        store.clone(),
        Arc::new(FakeReleaseSource::new()),
        usage.clone(),
        clock.clone(),
    );

    assert_eq!(scheduler.check_usage(false).await, CheckOutcome::Updated);
    clock.advance(30_000);
    assert_eq!(scheduler.check_usage(false).await, CheckOutcome::Throttled);
    assert_eq!(usage.call_count(), 1);

    clock.advance(31_000);
    assert!(scheduler.check_usage(false).await.is_failure());

    let persisted = store.load().unwrap().unwrap();
    assert_eq!((persisted.used, persisted.subscription), (2.5, 100.0));
    assert_eq!(persisted.last_update_usage, NOW + 61_000);
}

#[tokio::test]
async fn no_fetch_yet_is_indeterminate() {
    let (_temp_dir, store) = create_test_store();

    let scheduler = UpdateScheduler::new(
        tag_config("v1.0.0"),
        store,
        Arc::new(FakeReleaseSource::new().with_tags(&[])),
        Arc::new(FakeUsageSource::default()),
        Arc::new(ManualClock::new(NOW)),
    );

    assert_eq!(
        scheduler.check_version(false).await,
        CheckOutcome::NoRemoteVersion
    );
    assert_eq!(scheduler.decision(), UpdateDecision::Indeterminate);
}
