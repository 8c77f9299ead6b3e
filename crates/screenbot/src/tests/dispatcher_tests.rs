use super::fake::{Call, FakeProvider};
use crate::{ActionDispatcher, ProviderError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn dispatcher(provider: &Arc<FakeProvider>) -> ActionDispatcher {
    ActionDispatcher::new(provider.clone())
}

#[tokio::test]
async fn test_find_reports_presence() {
    let provider = Arc::new(FakeProvider::new().with_text("Login", 50, 60));
    let d = dispatcher(&provider);

    assert!(d.execute("find text login").await.unwrap());
    assert!(!d.execute("find text logout").await.unwrap());
    assert!(!d.execute("find object person").await.unwrap());
    assert!(provider.clicks().is_empty());
}

#[tokio::test]
async fn test_click_coordinates() {
    let provider = Arc::new(FakeProvider::new());
    let d = dispatcher(&provider);

    assert!(d.execute("click 1800 1000").await.unwrap());
    assert_eq!(provider.clicks(), vec![(1800, 1000)]);
}

#[tokio::test]
async fn test_click_text_uses_index() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_text("OK", 100, 100)
            .with_text("ok button", 300, 400),
    );
    let d = dispatcher(&provider);

    assert!(d.execute("click text ok 1").await.unwrap());
    assert_eq!(provider.clicks(), vec![(300, 400)]);
}

#[tokio::test]
async fn test_click_index_out_of_range_uses_last_match() {
    let provider = Arc::new(FakeProvider::new().with_text("ok", 100, 100));
    let d = dispatcher(&provider);

    assert!(d.execute("click text ok 5").await.unwrap());
    assert_eq!(provider.clicks(), vec![(100, 100)]);
}

#[tokio::test]
async fn test_click_missing_text_fails_without_clicking() {
    let provider = Arc::new(FakeProvider::new().with_text("ok", 100, 100));
    let d = dispatcher(&provider);

    assert!(!d.execute("click text cancel 1").await.unwrap());
    assert!(provider.clicks().is_empty());
}

#[tokio::test]
async fn test_click_object() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_object("person", 10, 20)
            .with_object("cell phone", 500, 600),
    );
    let d = dispatcher(&provider);

    assert!(d.execute("click object phone").await.unwrap());
    assert_eq!(provider.clicks(), vec![(500, 600)]);
    assert!(provider
        .calls()
        .contains(&Call::LocateObjects(Some("phone".to_string()))));
}

#[tokio::test]
async fn test_type_and_press() {
    let provider = Arc::new(FakeProvider::new());
    let d = dispatcher(&provider);

    assert!(d.execute("type Hello world").await.unwrap());
    assert!(d.execute("PRESS Enter").await.unwrap());
    assert_eq!(
        provider.calls(),
        vec![
            Call::Type("Hello world".to_string()),
            Call::Press("enter".to_string())
        ]
    );
}

#[tokio::test]
async fn test_list_objects_succeeds_even_when_empty() {
    let provider = Arc::new(FakeProvider::new());
    let d = dispatcher(&provider);

    assert!(d.execute("list objects").await.unwrap());
    assert_eq!(provider.calls(), vec![Call::LocateObjects(None)]);
}

#[tokio::test]
async fn test_malformed_commands_fail_without_provider_calls() {
    let provider = Arc::new(FakeProvider::new());
    let d = dispatcher(&provider);

    for text in ["", "jump 10 10", "click ten 10", "wait soon", "type", "find text"] {
        assert!(!d.execute(text).await.unwrap(), "{text:?} should fail");
    }
    assert!(provider.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_sleeps_for_duration() {
    let d = dispatcher(&Arc::new(FakeProvider::new()));
    let start = Instant::now();
    assert!(d.execute("wait 2.5").await.unwrap());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2500) && elapsed < Duration::from_millis(2600));
}

#[tokio::test(start_paused = true)]
async fn test_negative_wait_fails_without_sleeping() {
    let d = dispatcher(&Arc::new(FakeProvider::new()));
    let start = Instant::now();
    assert!(!d.execute("wait -1").await.unwrap());
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_wait_fails_without_sleeping() {
    let d = dispatcher(&Arc::new(FakeProvider::new()));
    let start = Instant::now();
    assert!(!d.execute("wait 1e20").await.unwrap());
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_wait_is_interrupted_by_cancellation() {
    let token = CancellationToken::new();
    let d = ActionDispatcher::new(Arc::new(FakeProvider::new())).with_cancellation(token.clone());

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    assert!(!d.execute("wait 30").await.unwrap());
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test]
async fn test_recoverable_provider_error_is_a_failure() {
    let provider = Arc::new(
        FakeProvider::new().failing_with(ProviderError::Recognition("blurry".to_string())),
    );
    let d = dispatcher(&provider);

    assert!(!d.execute("find text ok").await.unwrap());
}

#[tokio::test]
async fn test_fatal_provider_error_is_returned() {
    let provider = Arc::new(FakeProvider::new().failing_with(
        ProviderError::RecognizerUnavailable("no model".to_string()),
    ));
    let d = dispatcher(&provider);

    let err = d.execute("click text ok").await.unwrap_err();
    assert!(err.is_fatal());
}
