//! End-to-end exercise of the room membership and session protocol against
//! the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use effortless::{
    MemoryBackend, RoomController, RoomError, SessionCategory, SessionStatus, TimerController,
};
use tokio::time::timeout;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn controller_with_room() -> (RoomController, String) {
    init_logging();
    let controller = RoomController::new(Arc::new(MemoryBackend::new()));
    let room = controller
        .create_room(
            "Math Study Group",
            Some("Finals prep".to_string()),
            SessionCategory::Study,
            "alice",
        )
        .await
        .unwrap();
    (controller, room.id)
}

#[tokio::test]
async fn list_rooms_reports_derived_participant_counts() {
    let (controller, room_id) = controller_with_room().await;
    controller.join(&room_id, "alice").await.unwrap();
    controller.join(&room_id, "bob").await.unwrap();

    let rooms = controller.list_rooms().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].participant_count, 2);
}

#[tokio::test]
async fn joining_twice_keeps_a_single_active_row() {
    let (controller, room_id) = controller_with_room().await;

    controller.join(&room_id, "alice").await.unwrap();
    controller.join(&room_id, "alice").await.unwrap();

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(snapshot.participants[0].user_id, "alice");
}

#[tokio::test]
async fn the_store_rejects_joins_beyond_capacity() {
    let (controller, room_id) = controller_with_room().await;

    for i in 0..10 {
        controller.join(&room_id, &format!("user-{i}")).await.unwrap();
    }

    let overflow = controller.join(&room_id, "late-user").await;
    assert!(matches!(overflow, Err(RoomError::Join(_))));

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    assert_eq!(snapshot.participants.len(), 10);
}

#[tokio::test]
async fn leaving_is_idempotent() {
    let (controller, room_id) = controller_with_room().await;

    controller.join(&room_id, "alice").await.unwrap();
    controller.leave(&room_id, "alice").await.unwrap();
    controller.leave(&room_id, "alice").await.unwrap();
    controller.leave(&room_id, "never-joined").await.unwrap();

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    assert!(snapshot.participants.is_empty());
}

#[tokio::test]
async fn fetching_a_missing_room_fails_with_not_found() {
    let (controller, _room_id) = controller_with_room().await;
    let missing = controller.fetch_room_state("no-such-room").await;
    assert!(matches!(missing, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn start_focus_annotates_the_member_and_starts_the_countdown() {
    let (controller, room_id) = controller_with_room().await;
    controller.join(&room_id, "alice").await.unwrap();

    let timer = TimerController::new();
    controller
        .start_focus(&room_id, "alice", "Linear algebra", 25, &timer)
        .await
        .unwrap();

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    let alice = &snapshot.participants[0];
    assert_eq!(alice.session_title.as_deref(), Some("Linear algebra"));
    assert_eq!(alice.session_duration, Some(25));

    let countdown = timer.snapshot().await;
    assert!(countdown.is_running);
    assert_eq!(countdown.total_time, 1500);

    // No session row exists until completion.
    assert!(snapshot.recent_sessions.is_empty());
}

#[tokio::test]
async fn start_focus_rejects_zero_duration_without_annotating() {
    let (controller, room_id) = controller_with_room().await;
    controller.join(&room_id, "alice").await.unwrap();

    let timer = TimerController::new();
    let result = controller
        .start_focus(&room_id, "alice", "Nothing", 0, &timer)
        .await;
    assert!(matches!(result, Err(RoomError::Timer(_))));

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    assert!(snapshot.participants[0].session_title.is_none());
}

#[tokio::test]
async fn complete_focus_appends_a_session_and_clears_the_badge() {
    let (controller, room_id) = controller_with_room().await;
    controller.join(&room_id, "alice").await.unwrap();

    let timer = TimerController::new();
    controller
        .start_focus(&room_id, "alice", "Essay draft", 45, &timer)
        .await
        .unwrap();
    let session = controller
        .complete_focus(&room_id, "alice", "Essay draft", SessionCategory::Work, 45)
        .await
        .unwrap();

    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.actual_duration, 45);

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    assert_eq!(snapshot.recent_sessions.len(), 1);
    assert_eq!(snapshot.recent_sessions[0].id, session.id);
    assert!(snapshot.participants[0].session_title.is_none());
    assert!(snapshot.participants[0].session_duration.is_none());
}

#[tokio::test]
async fn shared_music_is_visible_on_the_next_pull() {
    let (controller, room_id) = controller_with_room().await;
    controller.join(&room_id, "alice").await.unwrap();

    let url = "https://www.youtube.com/watch?v=jfKfPfyJRdk";
    assert!(effortless::utils::youtube::video_id(url).is_some());
    controller
        .update_music(&room_id, url, "lofi hip hop radio")
        .await
        .unwrap();

    let snapshot = controller.fetch_room_state(&room_id).await.unwrap();
    assert_eq!(snapshot.room.music_url.as_deref(), Some(url));
    assert_eq!(
        snapshot.room.music_title.as_deref(),
        Some("lofi hip hop radio")
    );
}

#[tokio::test]
async fn subscription_refetches_on_remote_changes_until_shutdown() {
    let (controller, room_id) = controller_with_room().await;
    controller.join(&room_id, "alice").await.unwrap();

    let (subscription, mut snapshots) = controller.subscribe(&room_id).await.unwrap();
    assert_eq!(snapshots.borrow().participants.len(), 1);

    // Another participant joins and finishes a session elsewhere.
    controller.join(&room_id, "bob").await.unwrap();
    let timer = TimerController::new();
    controller
        .start_focus(&room_id, "bob", "Flashcards", 15, &timer)
        .await
        .unwrap();
    controller
        .complete_focus(&room_id, "bob", "Flashcards", SessionCategory::Study, 15)
        .await
        .unwrap();

    let observed = timeout(Duration::from_secs(5), async {
        loop {
            {
                let snapshot = snapshots.borrow_and_update();
                if snapshot
                    .recent_sessions
                    .iter()
                    .any(|session| session.user_id == "bob")
                    && snapshot.participants.len() == 2
                {
                    break;
                }
            }
            snapshots
                .changed()
                .await
                .expect("feed task closed the snapshot channel early");
        }
    })
    .await;
    assert!(observed.is_ok(), "snapshot never converged on bob's session");

    subscription.shutdown().await;

    // The feed task is gone, so the snapshot channel closes.
    assert!(snapshots.has_changed().is_err());
}
