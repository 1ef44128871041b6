use std::fs;

use image::{Rgb, RgbImage, Rgba};
use ndvi_tools::{
    BatchConfig, ColorRamp, ErrorKind, NdviTransformer, Viridis,
    colors::to_rgba8,
    mask::{SELECTED, UNSELECTED},
    ndvi::TRANSPARENT,
    run_batch,
};

fn center_mask() -> RgbImage {
    RgbImage::from_fn(4, 4, |x, y| {
        if (1..3).contains(&x) && (1..3).contains(&y) {
            SELECTED
        } else {
            UNSELECTED
        }
    })
}

/// Writes `images` as numbered PNG sources plus a 4x4 center mask into `dir`.
fn setup(dir: &std::path::Path, images: &[(u32, RgbImage)]) -> BatchConfig {
    for (index, img) in images {
        img.save(dir.join(format!("phoenix_{index:03}.png"))).unwrap();
    }
    center_mask().save(dir.join("mask.png")).unwrap();

    let first = images.first().map(|(i, _)| *i).unwrap_or(1);
    let last = images.last().map(|(i, _)| *i).unwrap_or(1);
    BatchConfig::new(
        dir.join("phoenix_{index}.png").to_string_lossy(),
        dir.join("mask.png"),
        dir.join("result{index}.png").to_string_lossy(),
        first..=last,
    )
}

#[test]
fn center_block_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = RgbImage::from_pixel(4, 4, Rgb([150, 90, 50]));
    let config = setup(dir.path(), &[(78, source)]);

    let report = run_batch(&config, &NdviTransformer::default(), |_, _| {}).unwrap();
    assert!(report.is_success());
    assert_eq!(report.succeeded, vec![(78, dir.path().join("result078.png"))]);

    let output = image::open(dir.path().join("result078.png")).unwrap().to_rgba8();
    assert_eq!(output.dimensions(), (4, 4));

    let expected = to_rgba8(Viridis.color_at(0.75f64.powi(7) * 48.0));
    for (x, y, pixel) in output.enumerate_pixels() {
        if (1..3).contains(&x) && (1..3).contains(&y) {
            assert_eq!(*pixel, expected);
        } else {
            assert_eq!(*pixel, TRANSPARENT);
        }
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = RgbImage::from_fn(4, 4, |x, y| Rgb([(x * 60) as u8, 30, (y * 60) as u8]));
    let config = setup(dir.path(), &[(1, source)]);
    let output = dir.path().join("result001.png");

    run_batch(&config, &NdviTransformer::default(), |_, _| {}).unwrap();
    let first = fs::read(&output).unwrap();
    run_batch(&config, &NdviTransformer::default(), |_, _| {}).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn batch_continues_after_failing_image() {
    let dir = tempfile::tempdir().unwrap();
    let good = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
    let wrong_size = RgbImage::from_pixel(5, 4, Rgb([255, 0, 0]));
    let config = setup(dir.path(), &[(1, good.clone()), (2, wrong_size), (4, good)]);
    fs::write(dir.path().join("phoenix_004.png"), b"garbage").unwrap();

    let mut progressed = Vec::new();
    let report = run_batch(&config, &NdviTransformer::default(), |index, _| {
        progressed.push(index)
    })
    .unwrap();

    let succeeded: Vec<u32> = report.succeeded.iter().map(|(i, _)| *i).collect();
    assert_eq!(succeeded, vec![1]);

    let failed: Vec<(u32, ErrorKind)> = report.failed.iter().map(|(i, e)| (*i, e.kind())).collect();
    assert_eq!(
        failed,
        vec![
            (2, ErrorKind::Configuration), // dimension mismatch
            (3, ErrorKind::Configuration), // missing source
            (4, ErrorKind::Data),          // corrupt source
        ]
    );

    // no partial output for failed images
    assert!(dir.path().join("result001.png").is_file());
    assert!(!dir.path().join("result002.png").exists());
    assert!(!dir.path().join("result004.png").exists());
    assert_eq!(progressed, vec![1]);
}

#[test]
fn invalid_config_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let source = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
    let mut config = setup(dir.path(), &[(1, source.clone()), (2, source)]);
    config.output_path = dir.path().join("result.png").to_string_lossy().into_owned();

    let err = run_batch(&config, &NdviTransformer::default(), |_, _| {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!dir.path().join("result.png").exists());
}

#[test]
fn saturated_and_black_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let source = RgbImage::from_fn(4, 4, |x, _| {
        if x == 1 {
            Rgb([255, 9, 0])
        } else {
            Rgb([0, 9, 0])
        }
    });
    let config = setup(dir.path(), &[(5, source)]);

    run_batch(&config, &NdviTransformer::default(), |_, _| {}).unwrap();
    let output = image::open(dir.path().join("result005.png")).unwrap().to_rgba8();

    assert_eq!(*output.get_pixel(1, 1), Rgba([253, 231, 37, 255]));
    assert_eq!(*output.get_pixel(2, 2), Rgba([68, 1, 84, 255]));
    assert_eq!(*output.get_pixel(0, 0), TRANSPARENT);
}
