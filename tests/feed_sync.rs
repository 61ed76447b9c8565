//! Feed sweeps: ordering, watermark handling and notification pacing.

mod common;

use std::time::Duration;

use common::*;
use tgfeed::notify::Dispatcher;
use tgfeed::watermark::Watermark;
use tgfeed::{Config, FeedSynchronizer, Result, SweepReport};

const A: &str = "https://a.example.com/feed.atom";
const B: &str = "https://b.example.com/feed.atom";

async fn sweep(config: &mut Config, messenger: &FakeMessenger, feeds: &FakeFeeds) -> Result<SweepReport> {
    let dispatcher = Dispatcher::from_config(messenger, config);
    FeedSynchronizer::new(feeds, &dispatcher).sweep(config).await
}

fn body(text: &str) -> String {
    text.rsplit('\n').next().unwrap_or_default().to_string()
}

#[tokio::test(start_paused = true)]
async fn test_entries_sent_in_chronological_order() {
    let mut config = config(&[A]);
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.serve(
        A,
        feed(
            "A",
            vec![
                entry(at(2024, 1, 3, 0, 0, 0), "T3"),
                entry(at(2024, 1, 1, 0, 0, 0), "T1"),
                entry(at(2024, 1, 2, 0, 0, 0), "T2"),
            ],
        ),
    );

    let report = sweep(&mut config, &messenger, &feeds).await.unwrap();

    assert_eq!(report.entries_sent, 3);
    let bodies: Vec<String> = messenger.texts_to(DESTINATION).iter().map(|t| body(t)).collect();
    assert_eq!(bodies, vec!["T1", "T2", "T3"]);
}

#[tokio::test(start_paused = true)]
async fn test_entry_at_watermark_is_new() {
    let mut config = config(&[A]);
    config.last_feed_check_time = Watermark::new(at(2024, 1, 2, 0, 0, 0));
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.serve(
        A,
        feed(
            "A",
            vec![
                entry(at(2024, 1, 1, 23, 59, 59), "Old"),
                entry(at(2024, 1, 2, 0, 0, 0), "Same"),
                entry(at(2024, 1, 2, 0, 0, 1), "New"),
            ],
        ),
    );

    sweep(&mut config, &messenger, &feeds).await.unwrap();

    let bodies: Vec<String> = messenger.texts_to(DESTINATION).iter().map(|t| body(t)).collect();
    assert_eq!(bodies, vec!["Same", "New"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_feed_is_skipped_and_watermark_advances() {
    let before = at(2024, 1, 1, 0, 0, 0);
    let mut config = config(&[A, B]);
    config.last_feed_check_time = Watermark::new(before);
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.fail(A, "failed to parse feed: no root element");
    feeds.serve(B, feed("B", vec![entry(at(2024, 2, 1, 0, 0, 0), "Fresh")]));

    let report = sweep(&mut config, &messenger, &feeds).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            feeds_checked: 1,
            feeds_failed: 1,
            entries_sent: 1,
        }
    );
    assert_eq!(feeds.fetched(), vec![A, B]);
    assert!(config.last_feed_check_time.at() > before);
}

#[tokio::test(start_paused = true)]
async fn test_skipped_feed_is_not_fetched() {
    let mut config = config(&[A, B]);
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.serve(A, feed("A", vec![entry(at(2024, 1, 1, 0, 0, 0), "Previewed")]));
    feeds.serve(B, feed("B", vec![entry(at(2024, 1, 1, 0, 0, 0), "Fresh")]));
    let dispatcher = Dispatcher::from_config(&messenger, &config);
    let added = vec![A.to_string()];

    let report = FeedSynchronizer::new(&feeds, &dispatcher)
        .skipping(&added)
        .sweep(&mut config)
        .await
        .unwrap();

    assert_eq!(report.feeds_checked, 1);
    assert_eq!(report.entries_sent, 1);
    assert_eq!(feeds.fetched(), vec![B]);
    let bodies: Vec<String> = messenger.texts_to(DESTINATION).iter().map(|t| body(t)).collect();
    assert_eq!(bodies, vec!["Fresh"]);
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_aborts_sweep_and_keeps_watermark() {
    let before = at(2024, 1, 1, 0, 0, 0);
    let mut config = config(&[A, B]);
    config.last_feed_check_time = Watermark::new(before);
    let messenger = FakeMessenger::default();
    messenger.fail_sends_after(1);
    let feeds = FakeFeeds::default();
    feeds.serve(
        A,
        feed(
            "A",
            vec![
                entry(at(2024, 1, 5, 0, 0, 0), "First"),
                entry(at(2024, 1, 6, 0, 0, 0), "Second"),
            ],
        ),
    );
    feeds.serve(B, feed("B", vec![entry(at(2024, 1, 7, 0, 0, 0), "Other")]));

    let result = sweep(&mut config, &messenger, &feeds).await;

    assert!(result.is_err());
    assert_eq!(messenger.texts_to(DESTINATION).len(), 1);
    assert_eq!(feeds.fetched(), vec![A]);
    assert_eq!(config.last_feed_check_time.at(), before);
}

#[tokio::test(start_paused = true)]
async fn test_watermark_never_moves_backwards() {
    let future = chrono::Utc::now() + chrono::Duration::days(1);
    let mut config = config(&[A]);
    config.last_feed_check_time = Watermark::new(future);
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.serve(A, feed("A", vec![]));

    sweep(&mut config, &messenger, &feeds).await.unwrap();

    assert_eq!(config.last_feed_check_time.at(), future);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_sweep_with_same_watermark_sends_same_entries() {
    let watermark = Watermark::new(at(2024, 1, 2, 0, 0, 0));
    let feeds = FakeFeeds::default();
    feeds.serve(
        A,
        feed(
            "A",
            vec![
                entry(at(2024, 1, 4, 0, 0, 0), "Later"),
                entry(at(2024, 1, 1, 0, 0, 0), "Before"),
                entry(at(2024, 1, 3, 0, 0, 0), "After"),
            ],
        ),
    );

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut config = config(&[A]);
        config.last_feed_check_time = watermark;
        let messenger = FakeMessenger::default();
        sweep(&mut config, &messenger, &feeds).await.unwrap();
        runs.push(messenger.texts_to(DESTINATION));
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_notifications_are_paced() {
    let mut config = config(&[A, B]);
    config.notify_interval_secs = 3;
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.serve(
        A,
        feed(
            "A",
            vec![
                entry(at(2024, 1, 1, 0, 0, 0), "A1"),
                entry(at(2024, 1, 2, 0, 0, 0), "A2"),
            ],
        ),
    );
    feeds.serve(B, feed("B", vec![entry(at(2024, 1, 3, 0, 0, 0), "B1")]));

    sweep(&mut config, &messenger, &feeds).await.unwrap();

    let sent = messenger.sent();
    assert_eq!(sent.len(), 3);
    for pair in sent.windows(2) {
        assert!(pair[1].at - pair[0].at >= Duration::from_secs(3));
    }
}

#[tokio::test(start_paused = true)]
async fn test_notification_format() {
    let mut config = config(&[A]);
    config.timezone = "Asia/Kolkata".to_string();
    let messenger = FakeMessenger::default();
    let feeds = FakeFeeds::default();
    feeds.serve(
        A,
        feed("Go releases", vec![entry(at(2024, 1, 1, 0, 0, 0), "go1.22")]),
    );

    sweep(&mut config, &messenger, &feeds).await.unwrap();

    let sent = messenger.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].message.disable_link_preview);
    assert_eq!(
        sent[0].message.text,
        "<b><a href=\"https://example.com/go1.22\">Go releases • Jan/1 05:30</a></b>\ngo1.22"
    );
}
