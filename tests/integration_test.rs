use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use object_extract_rs::{
    extract_objects_from_images_in_dir, BoundingBox, Detection, ExtractError, ExtractionConfig,
    FilterSpec, ObjectDetector, ObjectExtractor,
};

// Detector defined in the integration test so only the public API is exercised.
#[derive(Debug, Clone)]
struct TestMockDetector {
    detections: Vec<Detection>,
}

impl TestMockDetector {
    fn new(detections: &[(u32, &str, f32, [f32; 4])]) -> Self {
        Self {
            detections: detections
                .iter()
                .map(|&(class_id, class_name, confidence, [x1, y1, x2, y2])| Detection {
                    bounding_box: BoundingBox::new(x1, y1, x2, y2),
                    class_id,
                    class_name: class_name.to_string(),
                    confidence,
                })
                .collect(),
        }
    }
}

impl ObjectDetector for TestMockDetector {
    fn detect(&self, _img: &DynamicImage) -> object_extract_rs::Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

fn three_detections() -> TestMockDetector {
    TestMockDetector::new(&[
        (16, "dog", 0.92, [0.0, 0.0, 32.0, 24.0]),
        (0, "person", 0.30, [40.0, 0.0, 64.0, 48.0]),
        (15, "cat", 0.81, [16.0, 8.0, 48.0, 40.0]),
    ])
}

fn setup() -> (TempDir, ExtractionConfig) {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("images");
    let output_dir = temp_dir.path().join("extracted");
    fs::create_dir_all(&input_dir).unwrap();
    let config = ExtractionConfig::new(input_dir, output_dir);
    (temp_dir, config)
}

fn write_image(dir: &Path, name: &str) {
    RgbImage::from_pixel(64, 48, Rgb([200, 100, 50]))
        .save(dir.join(name))
        .unwrap();
}

fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| {
            if entry.path().is_dir() {
                count_files(&entry.path())
            } else {
                1
            }
        })
        .sum()
}

#[test]
fn test_single_dog_naming() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "photo.jpg");
    let detector = TestMockDetector::new(&[(16, "dog", 0.9, [8.0, 8.0, 40.0, 40.0])]);

    let report =
        extract_objects_from_images_in_dir(detector, config.clone(), None, None).unwrap();

    let expected = config.output_dir.join("photo/0_dog_photo.jpg");
    assert_eq!(report.artifacts, vec![expected.clone()]);
    assert_eq!(image::open(&expected).unwrap().dimensions(), (32, 32));
}

#[test]
fn test_two_of_three_detections_pass() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "pets.png");

    let report =
        extract_objects_from_images_in_dir(three_detections(), config.clone(), Some(0.5), None)
            .unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(
        report.artifacts,
        vec![
            config.output_dir.join("pets/0_dog_pets.png"),
            config.output_dir.join("pets/1_cat_pets.png"),
        ]
    );
    assert_eq!(count_files(&config.output_dir), 2);
}

#[test]
fn test_class_filter() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "pets.png");

    let report = extract_objects_from_images_in_dir(
        three_detections(),
        config.clone(),
        None,
        Some("0 15"),
    )
    .unwrap();

    assert_eq!(
        report.artifacts,
        vec![
            config.output_dir.join("pets/0_person_pets.png"),
            config.output_dir.join("pets/1_cat_pets.png"),
        ]
    );
}

#[test]
fn test_indices_reset_per_image() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "a.png");
    write_image(&config.input_dir, "b.jpeg");

    let report =
        extract_objects_from_images_in_dir(three_detections(), config.clone(), None, Some("16"))
            .unwrap();

    assert_eq!(report.processed, 2);
    assert!(config.output_dir.join("a/0_dog_a.png").is_file());
    assert!(config.output_dir.join("b/0_dog_b.jpeg").is_file());
    assert_eq!(count_files(&config.output_dir), 2);
}

#[test]
fn test_validation_errors_write_nothing() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "photo.jpg");

    let err =
        extract_objects_from_images_in_dir(three_detections(), config.clone(), None, Some("abc"))
            .unwrap_err();
    assert!(matches!(err, ExtractError::InvalidFilterSpec { .. }));

    let err =
        extract_objects_from_images_in_dir(three_detections(), config.clone(), Some(1.5), None)
            .unwrap_err();
    assert!(matches!(err, ExtractError::InvalidConfidence { .. }));

    assert!(!config.output_dir.exists());
}

#[test]
fn test_directory_errors_write_nothing() {
    let (temp_dir, config) = setup();

    let missing = ExtractionConfig::new(
        temp_dir.path().join("does-not-exist"),
        config.output_dir.clone(),
    );
    let err = extract_objects_from_images_in_dir(three_detections(), missing, None, None)
        .unwrap_err();
    assert!(matches!(err, ExtractError::DirectoryNotFound { .. }));

    let err = extract_objects_from_images_in_dir(three_detections(), config.clone(), None, None)
        .unwrap_err();
    assert!(matches!(err, ExtractError::NoImagesFound { .. }));

    fs::write(config.input_dir.join("notes.txt"), b"no images here").unwrap();
    fs::write(config.input_dir.join("UPPER.JPG"), b"case matters").unwrap();
    let err = extract_objects_from_images_in_dir(three_detections(), config.clone(), None, None)
        .unwrap_err();
    assert!(matches!(err, ExtractError::NoSupportedImagesFound { .. }));
    assert!(err.is_run_level());

    assert!(!config.output_dir.exists());
}

#[test]
fn test_failing_image_does_not_stop_siblings() {
    let (_temp_dir, config) = setup();
    fs::write(config.input_dir.join("broken.jpg"), b"definitely not a jpeg").unwrap();
    write_image(&config.input_dir, "good.png");

    let report =
        extract_objects_from_images_in_dir(three_detections(), config.clone(), Some(0.5), None)
            .unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].path,
        config.input_dir.join("broken.jpg")
    );
    assert!(matches!(
        report.failures[0].error,
        ExtractError::Detection { .. }
    ));
    assert!(config.output_dir.join("good/0_dog_good.png").is_file());
    assert!(config.output_dir.join("good/1_cat_good.png").is_file());
    assert!(!config.output_dir.join("broken").exists());
}

#[test]
fn test_rerun_is_idempotent() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "pets.png");
    let filter = FilterSpec::from_args(Some(0.5), None).unwrap();
    let detector = three_detections();
    let extractor = ObjectExtractor::new(&detector, config.clone(), filter);

    let first = extractor.process_directory().unwrap();
    let first_bytes = fs::read(&first.artifacts[0]).unwrap();
    let second = extractor.process_directory().unwrap();

    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(fs::read(&second.artifacts[0]).unwrap(), first_bytes);
    assert_eq!(count_files(&config.output_dir), 2);
}

#[test]
fn test_multi_dot_names_keep_first_segment() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "holiday.beach.png");
    let detector = TestMockDetector::new(&[(2, "car", 0.6, [0.0, 0.0, 10.0, 10.0])]);

    let report =
        extract_objects_from_images_in_dir(detector, config.clone(), None, None).unwrap();

    assert_eq!(
        report.artifacts,
        vec![config
            .output_dir
            .join("holiday/0_car_holiday.beach.png")]
    );
}

#[test]
fn test_subdirectories_are_not_descended() {
    let (_temp_dir, config) = setup();
    let nested = config.input_dir.join("nested");
    fs::create_dir_all(&nested).unwrap();
    write_image(&nested, "deep.png");
    write_image(&config.input_dir, "top.png");

    let report =
        extract_objects_from_images_in_dir(three_detections(), config.clone(), None, Some("16"))
            .unwrap();

    assert_eq!(report.processed, 1);
    assert!(config.output_dir.join("top").is_dir());
    assert!(!config.output_dir.join("deep").exists());
}

#[test]
fn test_degenerate_box_skips_only_its_crop() {
    let (_temp_dir, config) = setup();
    write_image(&config.input_dir, "a.png");
    write_image(&config.input_dir, "b.png");
    let detector = TestMockDetector::new(&[
        (3, "flat", 0.9, [4.0, 4.0, 4.0, 20.0]),
        (16, "dog", 0.9, [0.0, 0.0, 10.0, 10.0]),
    ]);

    let report =
        extract_objects_from_images_in_dir(detector, config.clone(), None, None).unwrap();

    assert_eq!(report.processed, 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.artifact_failures.len(), 2);
    assert!(report
        .artifact_failures
        .iter()
        .all(|failure| matches!(failure.error, ExtractError::EmptyArtifact { .. })));
    assert!(!report.is_complete());

    let dog = config.output_dir.join("a/1_dog_a.png");
    assert_eq!(image::open(&dog).unwrap().dimensions(), (10, 10));
    assert!(!config.output_dir.join("a/0_flat_a.png").exists());
    assert!(config.output_dir.join("b/1_dog_b.png").is_file());
    assert_eq!(count_files(&config.output_dir), 2);
}
