//! Playback controller against a scripted device

mod common;

use common::{initialized_controller, single_file_book, three_part_book, MockDevice, Op};
use earmark_config::SessionConfig;
use earmark_core::PlayerState;
use earmark_session::{part_track_id, DeviceState, PlaybackController, SessionError};
use std::sync::Arc;

#[tokio::test]
async fn test_multi_part_load_lands_on_saved_part_without_playing() {
    let (device, controller) = initialized_controller().await;
    let mut book = three_part_book();
    book.select_part(1);
    book.current_position_seconds = 42.0;

    controller.load_audiobook(&book).await.unwrap();

    let ids: Vec<String> = (0..3).map(|i| part_track_id(book.id, i)).collect();
    assert_eq!(
        device.ops(),
        vec![
            Op::Reset,
            Op::SetQueue(ids),
            Op::SkipTo(1, 42.0),
            Op::UpdateMetadata(1, "Saga".to_string()),
        ]
    );
    assert_eq!(device.active_index(), Some(1));
    assert_eq!(device.position_now(), 42.0);
    assert_ne!(device.state_now(), DeviceState::Playing);
    assert_eq!(controller.current_part_index().await, Some(1));
    assert_eq!(controller.loaded_book_id().await, Some(book.id));
}

#[tokio::test]
async fn test_single_file_load_seeks_only_when_resuming() {
    let (device, controller) = initialized_controller().await;

    let fresh = single_file_book("Fresh");
    controller.load_audiobook(&fresh).await.unwrap();
    assert!(!device.ops().iter().any(|op| matches!(op, Op::SeekTo(_))));
    assert_eq!(device.queue_ids(), vec![fresh.id.to_string()]);

    let mut resumed = single_file_book("Resumed");
    resumed.current_position_seconds = 125.5;
    device.clear_ops();
    controller.load_audiobook(&resumed).await.unwrap();

    assert!(device.ops().contains(&Op::SeekTo(125.5)));
    assert_eq!(controller.get_position().await, 125.5);
    assert_eq!(controller.current_part_index().await, Some(0));
}

#[tokio::test]
async fn test_out_of_range_part_index_starts_at_first_part() {
    let (device, controller) = initialized_controller().await;
    let mut book = three_part_book();
    book.current_part_index = Some(9);

    controller.load_audiobook(&book).await.unwrap();
    assert_eq!(device.active_index(), Some(0));
}

#[tokio::test]
async fn test_load_reinitializes_once_after_torn_down_session() {
    let (device, controller) = initialized_controller().await;
    device.fail_next_loads(1);

    let book = three_part_book();
    controller.load_audiobook(&book).await.unwrap();

    let ops = device.ops();
    let reinit = ops.iter().filter(|op| **op == Op::Initialize).count();
    assert_eq!(reinit, 1);
    assert_eq!(device.active_index(), Some(0));
    assert_eq!(controller.loaded_book_id().await, Some(book.id));
}

#[tokio::test]
async fn test_second_load_failure_propagates() {
    let (device, controller) = initialized_controller().await;
    device.fail_next_loads(2);

    let result = controller.load_audiobook(&three_part_book()).await;

    assert!(matches!(result, Err(SessionError::Device(_))));
    assert_eq!(controller.loaded_book_id().await, None);
    let queue_attempts = device
        .ops()
        .iter()
        .filter(|op| matches!(op, Op::SetQueue(_)))
        .count();
    assert_eq!(queue_attempts, 2);
}

#[tokio::test]
async fn test_load_without_location_is_rejected() {
    let (device, controller) = initialized_controller().await;
    let mut book = single_file_book("Nowhere");
    book.uri = String::new();

    let result = controller.load_audiobook(&book).await;
    assert!(matches!(result, Err(SessionError::NothingToPlay(id)) if id == book.id));
    assert!(device.ops().is_empty());
}

#[tokio::test]
async fn test_metadata_failure_does_not_fail_load() {
    let (device, controller) = initialized_controller().await;
    device.fail_metadata(true);

    controller.load_audiobook(&three_part_book()).await.unwrap();
    assert!(controller.loaded_book_id().await.is_some());
}

#[tokio::test]
async fn test_stop_returns_position_and_unloads() {
    let (device, controller) = initialized_controller().await;
    controller.load_audiobook(&three_part_book()).await.unwrap();
    controller.play().await;
    device.set_position(77.0);

    assert_eq!(controller.stop().await, Some(77.0));
    assert_eq!(controller.loaded_book_id().await, None);
    assert_eq!(device.active_index(), None);

    // Nothing left to report
    assert_eq!(controller.stop().await, None);
}

#[tokio::test]
async fn test_skip_backward_clamps_at_zero() {
    let (device, controller) = initialized_controller().await;
    controller
        .load_audiobook(&single_file_book("Short"))
        .await
        .unwrap();
    device.set_position(10.0);

    controller.skip_backward(30.0).await;
    assert_eq!(device.position_now(), 0.0);

    controller.skip_forward(30.0).await;
    assert_eq!(device.position_now(), 30.0);
}

#[tokio::test]
async fn test_state_queries() {
    let (device, controller) = initialized_controller().await;
    controller
        .load_audiobook(&single_file_book("States"))
        .await
        .unwrap();

    // Loaded but not started
    assert_eq!(controller.get_state().await, PlayerState::Paused);

    controller.play().await;
    assert_eq!(controller.get_state().await, PlayerState::Playing);

    device.set_state(DeviceState::Loading);
    assert_eq!(controller.get_state().await, PlayerState::Buffering);

    device.set_state(DeviceState::Error);
    assert_eq!(controller.get_state().await, PlayerState::Stopped);

    device.fail_state_queries(true);
    assert_eq!(controller.get_state().await, PlayerState::None);
    assert_eq!(controller.get_position().await, 0.0);
}

#[tokio::test]
async fn test_current_part_follows_device_advance() {
    let (device, controller) = initialized_controller().await;
    controller.load_audiobook(&three_part_book()).await.unwrap();

    device.advance_to(2, 3.0);
    assert_eq!(controller.current_part_index().await, Some(2));

    controller.stop().await;
    assert_eq!(controller.current_part_index().await, None);
}

#[tokio::test]
async fn test_transport_on_dead_session_is_harmless() {
    let device = MockDevice::new();
    let controller = PlaybackController::new(device.clone());

    controller.play().await;
    controller.pause().await;
    controller.seek_to(12.0).await;
    controller.seek_by(-5.0).await;
    controller.set_rate(1.5).await;

    assert_eq!(controller.get_position().await, 0.0);
    assert_eq!(controller.get_duration().await, 0.0);
    assert_eq!(controller.get_rate().await, 1.0);
    assert_eq!(controller.get_state().await, PlayerState::None);
    assert_eq!(controller.stop().await, None);
}

#[tokio::test]
async fn test_artwork_sync_only_touches_loaded_book() {
    let (device, controller) = initialized_controller().await;
    let mut book = three_part_book();
    controller.load_audiobook(&book).await.unwrap();
    device.advance_to(2, 0.0);
    device.clear_ops();

    let other = single_file_book("Other");
    controller
        .sync_artwork_from_library(&[other.clone()])
        .await;
    assert!(device.ops().is_empty());

    book.title = "Saga (Remastered)".to_string();
    book.artwork_uri = Some("file:///saga/cover.jpg".to_string());
    controller
        .sync_artwork_from_library(&[other, book])
        .await;
    assert_eq!(
        device.ops(),
        vec![Op::UpdateMetadata(2, "Saga (Remastered)".to_string())]
    );
}

#[tokio::test]
async fn test_load_attempts_from_config() {
    let device = MockDevice::new();
    let config = SessionConfig {
        load_attempts: 3,
        ..SessionConfig::default()
    };
    let controller = Arc::new(PlaybackController::from_config(device.clone(), &config));
    controller.initialize().await.unwrap();
    device.fail_next_loads(2);

    controller.load_audiobook(&three_part_book()).await.unwrap();
}
