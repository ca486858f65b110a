mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{small_config, studio_with, studio_with_images, FailingEncoder, SizedEncoder, CANVAS};
use sticker_core::{AnimationKind, ExportSettings, LayerPatch, StudioConfig};
use sticker_studio::{MediaFile, MediaKind, SizeOptimizer};

fn settings() -> ExportSettings {
    ExportSettings::new(10, 10, 3, CANVAS, CANVAS)
}

#[tokio::test]
async fn test_pass_renders_duration_times_fps_frames() {
    let mut studio = studio_with_images(2).await;
    let output = studio.render_pass().run(&settings()).await.unwrap();
    assert_eq!(output.frame_count, 30);
    assert_eq!(output.blob.size(), SizedEncoder::expected_size(30, CANVAS, CANVAS, 10));
}

#[tokio::test]
async fn test_identical_passes_produce_identical_frames() {
    let mut studio = studio_with_images(2).await;
    let plain = studio.render_pass().run(&settings()).await.unwrap();

    let id = studio.current_layer().unwrap().id;
    let centered = CANVAS as f64 / 2.0;
    studio.update_layer(
        id,
        LayerPatch {
            text: Some("HI".into()),
            x: Some(centered),
            y: Some(centered),
            font_size: Some(12.0),
            animation: Some(AnimationKind::Bounce),
            ..LayerPatch::default()
        },
    );

    let first = studio.render_pass().run(&settings()).await.unwrap();
    let second = studio.render_pass().run(&settings()).await.unwrap();
    assert_eq!(first.digest, second.digest);
    assert_ne!(first.digest, plain.digest);

    studio.update_layer(id, LayerPatch::animation(AnimationKind::Shake));
    let shaken = studio.render_pass().run(&settings()).await.unwrap();
    assert_ne!(shaken.digest, first.digest);
}

#[tokio::test]
async fn test_video_and_image_export_fits_default_ceiling() {
    let mut studio = studio_with(StudioConfig::default(), Arc::new(SizedEncoder::default()));
    studio.add_media(MediaFile::new("clip.mp4", vec![30]));
    studio.add_media(MediaFile::new("photo.png", vec![200]));
    assert_eq!(studio.decode_media().await, 2);
    assert_eq!(studio.media().kind_at(0), Some(MediaKind::Video));

    let requested = ExportSettings::new(10, 10, 3, 300, 300);
    let optimizer = SizeOptimizer::from_config(&studio.config().export);
    assert_eq!(optimizer.ceiling_bytes, 1_048_576);
    let outcome = optimizer.optimize(&mut studio.render_pass(), requested).await;

    assert!(outcome.success);
    assert!(outcome.size().unwrap() <= 1_048_576);
    assert_eq!(outcome.original_settings, requested);
    assert_eq!(
        (outcome.settings.quality, outcome.settings.fps, outcome.settings.duration),
        (20, 6, 3)
    );
    // Confirming render, four quality steps, then fps 8 and 6.
    assert_eq!(outcome.attempts, 7);
}

#[tokio::test]
async fn test_generous_ceiling_needs_one_render() {
    let mut config = small_config();
    config.export.ceiling_bytes = u64::MAX;
    let mut studio = studio_with(config, Arc::new(SizedEncoder::default()));
    studio.add_media(MediaFile::new("a.png", vec![1]));
    studio.decode_media().await;

    let optimizer = SizeOptimizer::from_config(&studio.config().export);
    let outcome = optimizer.optimize(&mut studio.render_pass(), settings()).await;
    assert!(outcome.success);
    assert_eq!(outcome.trials.len(), 1);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.settings, settings());
    assert!(outcome.changes().is_empty());
}

#[tokio::test]
async fn test_first_fitting_quality_step_wins() {
    let mut studio = studio_with_images(1).await;
    let optimizer = SizeOptimizer::from_config(&studio.config().export).with_ceiling(9_000);

    let outcome = optimizer.optimize(&mut studio.render_pass(), settings()).await;
    assert!(outcome.success);
    let qualities: Vec<u8> = outcome.trials.iter().map(|t| t.settings.quality).collect();
    assert_eq!(qualities, vec![10, 12, 15]);
    assert_eq!(outcome.settings.quality, 15);
    assert_eq!(outcome.size(), Some(7_680));
}

#[tokio::test]
async fn test_unreachable_ceiling_returns_smallest_attempt() {
    let mut studio = studio_with_images(1).await;
    let optimizer = SizeOptimizer::from_config(&studio.config().export).with_ceiling(1);

    let outcome = optimizer.optimize(&mut studio.render_pass(), settings()).await;
    assert!(!outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.attempts as usize, outcome.trials.len());

    let smallest = outcome.trials.iter().filter_map(|t| t.size).min();
    assert_eq!(outcome.size(), smallest);
    assert_eq!(outcome.settings.quality, 20);

    let distinct: HashSet<String> = outcome.trials.iter().map(|t| t.settings.to_string()).collect();
    assert_eq!(distinct.len(), outcome.trials.len());
}

#[tokio::test]
async fn test_every_render_failing_yields_no_blob() {
    let mut studio = studio_with(small_config(), Arc::new(FailingEncoder));
    let optimizer = SizeOptimizer::from_config(&studio.config().export).with_ceiling(1);

    let outcome = optimizer.optimize(&mut studio.render_pass(), settings()).await;
    assert!(!outcome.success);
    assert!(outcome.blob.is_none());
    assert!(outcome.error.is_some());
    assert!(!outcome.trials.is_empty());
    assert!(outcome.trials.iter().all(|t| t.error.is_some()));
}
