use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use tempfile::TempDir;

use categorize::{pipeline, CategorizeError, ImageEmbedding, PipelineConfig};

const DIM: usize = 8;

/// Embeds by filename convention instead of pixel content: files whose name
/// starts with "cat" land in a positive cluster, everything else in a
/// negative one. Lets the full pipeline run without ONNX or real images.
struct StubEmbedder;

impl ImageEmbedding for StubEmbedder {
    fn embedding_dim(&self) -> usize {
        DIM
    }

    fn embed_batch(&self, paths: &[PathBuf]) -> Result<Array2<f32>, CategorizeError> {
        let mut out = Array2::zeros((paths.len(), DIM));
        for (i, path) in paths.iter().enumerate() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let sign = if name.starts_with("cat") { 1.0 } else { -1.0 };
            // Small per-file offset keeps rows distinct without crossing the
            // cluster boundary.
            let jitter = (name.len() % 5) as f32 * 0.01;
            for j in 0..DIM {
                out[[i, j]] = sign * (1.0 + jitter);
            }
        }
        Ok(out)
    }
}

fn touch_jpgs(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

fn write_bank(path: &Path, rows: usize) {
    let bank = Array2::<f32>::from_elem((rows, DIM), -1.0);
    ndarray_npy::write_npy(path, &bank).unwrap();
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();

        let positives: Vec<String> = (0..10).map(|i| format!("cat_{i:02}.jpg")).collect();
        let positive_refs: Vec<&str> = positives.iter().map(String::as_str).collect();
        touch_jpgs(&root.path().join("positives"), &positive_refs);

        touch_jpgs(
            &root.path().join("target"),
            &[
                "cat_x.jpg",
                "cat_y.jpg",
                "dog_a.jpg",
                "dog_b.jpg",
                "dog_c.jpg",
                "upper.JPG",
                "readme.txt",
            ],
        );

        write_bank(&root.path().join("bank.npy"), categorize::bank::DEFAULT_BANK_SIZE);
        Fixture { root }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            positives: self.root.path().join("positives"),
            negatives: None,
            target_data: self.root.path().join("target"),
            save_to: self.root.path().join("sorted"),
            bank_path: self.root.path().join("bank.npy"),
            seed: Some(7),
        }
    }
}

#[test]
fn test_end_to_end_run() {
    let fixture = Fixture::new();
    let config = fixture.config();

    let report = pipeline::run(&StubEmbedder, &config).unwrap();

    // 10 positives force 20 sampled negatives; 30 examples split 27/3.
    assert_eq!(report.positives, 10);
    assert_eq!(report.negatives, 20);
    assert_eq!(report.train_examples, 27);
    assert_eq!(report.test_examples, 3);
    // Clusters are linearly separable, so the held-out slice is perfect.
    assert_eq!(report.accuracy, 1.0);

    // Only the lowercase-jpg targets count, and only the cat-cluster ones
    // are copied.
    assert_eq!(report.targets, 5);
    assert_eq!(report.copied, 2);
    assert_eq!(dir_names(&config.save_to), vec!["cat_x.jpg", "cat_y.jpg"]);
}

#[test]
fn test_empty_target_dir_is_reported() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    let empty = fixture.root.path().join("empty_target");
    fs::create_dir_all(&empty).unwrap();
    config.target_data = empty.clone();

    let err = pipeline::run(&StubEmbedder, &config).unwrap_err();
    // The diagnostic names the offending path.
    assert!(err.to_string().contains(&empty.display().to_string()));
    match err {
        CategorizeError::EmptyTargetDir(path) => assert_eq!(path, empty),
        other => panic!("expected EmptyTargetDir, got {other:?}"),
    }
}

#[test]
fn test_missing_negatives_dir_matches_omitted() {
    let fixture = Fixture::new();

    let mut with_missing = fixture.config();
    with_missing.negatives = Some(fixture.root.path().join("does_not_exist"));
    with_missing.save_to = fixture.root.path().join("sorted_a");

    let mut omitted = fixture.config();
    omitted.save_to = fixture.root.path().join("sorted_b");

    let report_a = pipeline::run(&StubEmbedder, &with_missing).unwrap();
    let report_b = pipeline::run(&StubEmbedder, &omitted).unwrap();

    assert_eq!(report_a.accuracy, report_b.accuracy);
    assert_eq!(report_a.negatives, report_b.negatives);
    assert_eq!(report_a.copied, report_b.copied);
    assert_eq!(
        dir_names(&with_missing.save_to),
        dir_names(&omitted.save_to)
    );
}

#[test]
fn test_hard_negatives_replace_bank_sampling() {
    let fixture = Fixture::new();
    let mut config = fixture.config();

    let hard: Vec<String> = (0..25).map(|i| format!("dog_hard_{i:02}.jpg")).collect();
    let hard_refs: Vec<&str> = hard.iter().map(String::as_str).collect();
    let hard_dir = fixture.root.path().join("hard_negatives");
    touch_jpgs(&hard_dir, &hard_refs);
    config.negatives = Some(hard_dir);

    let report = pipeline::run(&StubEmbedder, &config).unwrap();
    // 25 hard negatives already exceed 2 x 10 positives, so the bank is not
    // drawn from at all.
    assert_eq!(report.negatives, 25);
    assert_eq!(report.train_examples + report.test_examples, 35);
}

#[test]
fn test_empty_positives_dir_is_a_validation_error() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    let empty = fixture.root.path().join("empty_positives");
    fs::create_dir_all(&empty).unwrap();
    config.positives = empty;

    let err = pipeline::run(&StubEmbedder, &config).unwrap_err();
    assert!(matches!(err, CategorizeError::Validation(_)));
}
