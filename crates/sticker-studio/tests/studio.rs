mod common;

use common::{studio, studio_with_images, SizedEncoder, CANVAS};
use sticker_core::{AnimationKind, LayerPatch, StickerError};
use sticker_encode::still::decode_data_url;
use sticker_studio::{ExportMode, ExportRequest, FixedChoice, MediaFile, PromptChoice, TickQueue};

fn quick_request() -> ExportRequest {
    ExportRequest {
        quality: 10,
        fps: 5,
        duration: 1,
        optimize: false,
    }
}

#[tokio::test]
async fn test_play_requires_decoded_media() {
    let mut studio = studio();
    let mut host = TickQueue::new();
    assert!(!studio.play(&mut host));
    assert!(!studio.is_playing());
    assert!(host.is_empty());

    studio.add_media(MediaFile::new("photo.jpg", vec![7]));
    assert!(!studio.play(&mut host));
    studio.decode_media().await;
    assert!(studio.play(&mut host));
    assert_eq!(host.len(), 1);
}

#[tokio::test]
async fn test_ticks_advance_until_paused() {
    let mut studio = studio_with_images(1).await;
    let mut host = TickQueue::new();
    studio.play(&mut host);

    for _ in 0..4 {
        let handle = host.pop().unwrap();
        assert!(studio.tick(handle, &mut host));
    }
    assert!((studio.elapsed() - 0.2).abs() < 1e-9);

    let in_flight = host.pop().unwrap();
    studio.pause(&mut host);
    assert!(!studio.tick(in_flight, &mut host));
    assert!((studio.elapsed() - 0.2).abs() < 1e-9);
    assert!(host.is_empty());
}

#[tokio::test]
async fn test_speed_scales_clock() {
    let mut studio = studio_with_images(1).await;
    let mut host = TickQueue::new();
    assert_eq!(studio.cycle_speed(), 1.5);
    studio.play(&mut host);
    let handle = host.pop().unwrap();
    studio.tick(handle, &mut host);
    assert!((studio.elapsed() - 0.075).abs() < 1e-9);
}

#[tokio::test]
async fn test_rotation_follows_clock() {
    let mut studio = studio_with_images(3).await;
    let mut host = TickQueue::new();
    studio.play(&mut host);
    for _ in 0..45 {
        let handle = host.pop().unwrap();
        studio.tick(handle, &mut host);
    }
    assert_eq!(studio.current_media_index(), 1);
}

#[tokio::test]
async fn test_removing_media_clamps_index_and_stops_when_empty() {
    let mut studio = studio_with_images(3).await;
    let mut host = TickQueue::new();
    studio.play(&mut host);
    for _ in 0..85 {
        let handle = host.pop().unwrap();
        studio.tick(handle, &mut host);
    }
    assert_eq!(studio.current_media_index(), 2);

    assert!(studio.remove_media(2, &mut host));
    assert_eq!(studio.current_media_index(), 1);
    assert!(studio.is_playing());

    assert!(!studio.remove_media(5, &mut host));
    assert!(studio.remove_media(0, &mut host));
    assert!(studio.remove_media(0, &mut host));
    assert!(studio.media().is_empty());
    assert!(!studio.is_playing());
    assert!(host.is_empty());
}

#[tokio::test]
async fn test_export_cancelled_while_stopped() {
    let mut studio = studio_with_images(1).await;
    let mut host = TickQueue::new();
    let result = studio
        .export_gif(quick_request(), &mut FixedChoice(PromptChoice::Cancel), &mut host)
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(!studio.is_playing());
}

#[tokio::test]
async fn test_static_frame_export_is_one_frame() {
    let mut studio = studio_with_images(1).await;
    let mut host = TickQueue::new();
    let export = studio
        .export_gif(quick_request(), &mut FixedChoice(PromptChoice::StaticFrame), &mut host)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(export.mode, ExportMode::StaticFrame);
    assert_eq!(export.outcome.settings.duration, 1);
    assert_eq!(export.outcome.size(), Some(SizedEncoder::expected_size(1, CANVAS, CANVAS, 10)));
    assert!(export.filename.ends_with(".gif"));
    assert!(!studio.is_playing());
}

#[tokio::test]
async fn test_export_can_start_playback() {
    let mut studio = studio_with_images(1).await;
    let mut host = TickQueue::new();
    let export = studio
        .export_gif(quick_request(), &mut FixedChoice(PromptChoice::StartPlayback), &mut host)
        .await
        .unwrap()
        .unwrap();
    assert!(studio.is_playing());
    assert_eq!(export.mode, ExportMode::Standard);
    assert!(export.outcome.success);
    assert_eq!(export.outcome.attempts, 1);
}

#[tokio::test]
async fn test_export_without_media_cannot_start_playback() {
    let mut studio = studio();
    let mut host = TickQueue::new();
    let err = studio
        .export_gif(quick_request(), &mut FixedChoice(PromptChoice::StartPlayback), &mut host)
        .await
        .unwrap_err();
    assert!(matches!(err, StickerError::Playback(_)));
}

#[tokio::test]
async fn test_optimized_export_while_playing_skips_prompt() {
    let mut studio = studio_with_images(2).await;
    let mut host = TickQueue::new();
    studio.play(&mut host);
    let request = ExportRequest {
        optimize: true,
        ..quick_request()
    };
    let export = studio
        .export_gif(request, &mut FixedChoice(PromptChoice::Cancel), &mut host)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(export.mode, ExportMode::Optimized);
    assert!(export.outcome.success);
    // Export never disturbs the live surface size or clock.
    assert_eq!(studio.surface().width, CANVAS);
    assert_eq!(studio.elapsed(), 0.0);
}

#[tokio::test]
async fn test_png_export_is_a_data_url() {
    let mut studio = studio_with_images(1).await;
    let export = studio.export_png().unwrap();
    assert!(export.still.data_url.starts_with("data:image/png;base64,"));
    assert!(export.filename.starts_with("dynamic-emoji-"));
    assert!(export.filename.ends_with(".png"));

    let bytes = decode_data_url(&export.still.data_url).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[tokio::test]
async fn test_layer_edits_prune_animation_state() {
    let mut studio = studio();
    let second = studio.add_layer(Some("Hello"));
    studio.update_layer(second, LayerPatch::animation(AnimationKind::Wave));
    assert_eq!(studio.layers().len(), 2);
    assert!(studio.remove_layer(second));
    let last = studio.current_layer().unwrap().id;
    assert!(!studio.remove_layer(last));
}
