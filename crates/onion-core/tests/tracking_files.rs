//! End-to-end behaviour of the tracking files

use onion_core::{CountryTracker, EventLog, Record, SERVER_TIMESTAMP_FIELD, StartEvent, classify};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;

fn visit(n: usize) -> Record {
    json!({
        "url": format!("https://www.oaibot.net/page/{n}"),
        "referrer": if n % 3 == 0 { Value::Null } else { json!("https://google.com") },
        "screenWidth": 1920,
        "sessionId": format!("session_{n}"),
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[tokio::test]
async fn appended_events_read_back_in_arrival_order() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path().join("tracking_data/visitors.jsonl"));

    let mut written = Vec::new();
    for n in 0..25 {
        written.push(log.try_append(visit(n)).await.unwrap());
    }

    let contents = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(contents.lines().count(), 25);

    let read = log.read_all().await.unwrap().unwrap();
    assert_eq!(read.len(), 25);
    for (n, (record, original)) in read.iter().zip(&written).enumerate() {
        assert_eq!(record, &Value::Object(original.clone()));
        assert_eq!(record["sessionId"], format!("session_{n}"));
        assert!(record[SERVER_TIMESTAMP_FIELD].is_string());
    }
}

#[tokio::test]
async fn tail_returns_most_recent_window_oldest_first() {
    let dir = tempdir().unwrap();
    let log = EventLog::new(dir.path().join("visitors.jsonl"));

    for n in 0..130 {
        assert!(log.append(visit(n)).await);
    }

    let tail = log.tail(100).await.unwrap().unwrap();
    assert_eq!(tail.len(), 100);
    assert_eq!(tail.first().unwrap()["sessionId"], "session_30");
    assert_eq!(tail.last().unwrap()["sessionId"], "session_129");
}

#[tokio::test]
async fn concurrent_appends_produce_whole_lines() {
    let dir = tempdir().unwrap();
    let log = Arc::new(EventLog::new(dir.path().join("visitors.jsonl")));

    let handles: Vec<_> = (0..40)
        .map(|n| {
            let log = Arc::clone(&log);
            tokio::spawn(async move { log.append(visit(n)).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let read = log.read_all().await.unwrap().unwrap();
    assert_eq!(read.len(), 40);
}

#[tokio::test]
async fn start_flow_keeps_log_and_stats_consistent() {
    let dir = tempdir().unwrap();
    let starts = EventLog::new(dir.path().join("bot_starts.jsonl"));
    let tracker = CountryTracker::new(dir.path().join("country_stats.json"));

    let tags = [Some("it-IT"), Some("it"), Some("fr-FR"), None, Some("xx-YY")];
    for (user_id, tag) in (1..).zip(tags) {
        let mut builder = StartEvent::builder().user_id(user_id).chat_type("private");
        if let Some(tag) = tag {
            builder = builder.language_code(tag);
        }
        let event = builder.build();

        assert!(starts.append_event(&event).await);
        assert!(tracker.record_country(&event.country).await.is_some());
    }

    let stats = tracker.snapshot().await.unwrap();
    let logged = starts.read_all().await.unwrap().unwrap();

    assert_eq!(stats.total_starts, logged.len() as u64);
    assert!(stats.is_consistent());
    assert_eq!(stats.count("Italy"), 2);
    assert_eq!(stats.count("France"), 1);
    assert_eq!(stats.count("Unknown"), 2);
    assert_eq!(logged[3]["country"], classify(None));
}
