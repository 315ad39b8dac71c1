// End-to-end tests for the training driver: online SGD over a small synthetic
// dataset, early stopping, frozen filters and IDX loading from disk.

use minicon::config::TrainingConfig;
use minicon::error::TrainError;
use minicon::mnist::{load_dataset, LabeledImage, IMAGE_MAGIC, LABEL_MAGIC};
use minicon::model::Model;
use minicon::tensor::Tensor;
use minicon::utils::SimpleRng;
use std::io::Write;
use tempfile::NamedTempFile;

const SIDE: usize = 8;

// Label 0 lights the top half, label 1 the bottom half.
fn synthetic_image(label: usize, n: usize) -> Tensor {
    let mut data = Vec::with_capacity(SIDE * SIDE);
    for r in 0..SIDE {
        for c in 0..SIDE {
            let top = r < SIDE / 2;
            let lit = if label == 0 { top } else { !top };
            let level = 0.6 + 0.05 * ((r + c + n) % 5) as f64;
            data.push(if lit { level } else { 0.0 });
        }
    }
    Tensor::from_vec(data, [SIDE, SIDE]).unwrap()
}

fn synthetic_dataset() -> Vec<LabeledImage> {
    (0..20)
        .map(|i| LabeledImage {
            image: synthetic_image(i % 2, i),
            label: i % 2,
        })
        .collect()
}

fn config(epochs: usize) -> TrainingConfig {
    TrainingConfig::new(3, 4, 0.01, epochs).unwrap()
}

// ============================================================================
// Construction Tests
// ============================================================================

mod construction_tests {
    use super::*;

    #[test]
    fn test_model_wires_flat_size_into_classifier() {
        let model = Model::new(&config(1), SIDE, &mut SimpleRng::new(7)).unwrap();

        // 8 - 3 + 1 = 6; (6 - 2) / 2 + 1 = 3; 3 * 3 * 4 = 36
        assert_eq!(model.conv().flat_size(), 36);
        assert_eq!(model.classifier().config().input_size, 36);
        assert_eq!(
            model.parameter_count(),
            4 * 9 + 36 * 120 + 120 * 80 + 80 * 10 + 120 + 80 + 10
        );
    }

    #[test]
    fn test_model_rejects_filter_larger_than_image() {
        let cfg = TrainingConfig::new(9, 2, 0.01, 1).unwrap();
        let err = Model::new(&cfg, SIDE, &mut SimpleRng::new(1)).unwrap_err();
        assert!(matches!(err, TrainError::Config(_)));
    }

    #[test]
    fn test_same_seed_same_model() {
        let a = Model::new(&config(1), SIDE, &mut SimpleRng::new(3)).unwrap();
        let b = Model::new(&config(1), SIDE, &mut SimpleRng::new(3)).unwrap();
        assert_eq!(a.conv().filters(), b.conv().filters());
        assert_eq!(a.classifier().weights(), b.classifier().weights());
    }
}

// ============================================================================
// Training Tests
// ============================================================================

mod training_tests {
    use super::*;

    #[test]
    fn test_training_stops_early_once_accurate() {
        let data = synthetic_dataset();
        let mut model = Model::new(&config(5), SIDE, &mut SimpleRng::new(7)).unwrap();

        let reports = model.train(&data).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].epoch, 1);
        assert!(reports[0].accuracy < 0.985);
        assert_eq!(reports[1].accuracy, 1.0);
        assert_eq!(model.evaluate(&data).unwrap(), 1.0);
    }

    #[test]
    fn test_training_runs_every_epoch_without_early_stop() {
        let data = synthetic_dataset();
        let mut cfg = config(3);
        cfg.early_stop_accuracy = 100.0;
        let mut model = Model::new(&cfg, SIDE, &mut SimpleRng::new(42)).unwrap();

        let reports = model.train(&data).unwrap();

        assert_eq!(reports.len(), 3);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.epoch, i + 1);
            assert!((0.0..=1.0).contains(&report.accuracy));
        }
    }

    #[test]
    fn test_training_never_touches_filters() {
        let data = synthetic_dataset();
        let mut model = Model::new(&config(2), SIDE, &mut SimpleRng::new(11)).unwrap();
        let filters = model.conv().filters().to_vec();
        let weights = model.classifier().weights().clone();

        model.train(&data).unwrap();

        assert_eq!(model.conv().filters(), filters.as_slice());
        assert_ne!(model.classifier().weights(), &weights);
    }

    #[test]
    fn test_evaluate_does_not_update() {
        let data = synthetic_dataset();
        let model = Model::new(&config(1), SIDE, &mut SimpleRng::new(5)).unwrap();
        let weights = model.classifier().weights().clone();

        let accuracy = model.evaluate(&data).unwrap();

        assert!((0.0..=1.0).contains(&accuracy));
        assert_eq!(model.classifier().weights(), &weights);
    }

    #[test]
    fn test_train_example_rejects_wrong_image_size() {
        let mut model = Model::new(&config(1), SIDE, &mut SimpleRng::new(5)).unwrap();
        let example = LabeledImage {
            image: Tensor::zeros([SIDE + 1, SIDE + 1]),
            label: 0,
        };
        assert!(model.train_example(&example).is_err());
    }
}

// ============================================================================
// IDX Loading Tests
// ============================================================================

mod loading_tests {
    use super::*;

    fn write_idx(header: &[u32], body: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for value in header {
            file.write_all(&value.to_be_bytes()).unwrap();
        }
        file.write_all(body).unwrap();
        file.flush().unwrap();
        file
    }

    fn idx_pair(count: usize) -> (NamedTempFile, NamedTempFile) {
        let mut pixels = Vec::new();
        let mut labels = Vec::new();
        for i in 0..count {
            let label = i % 2;
            let image = synthetic_image(label, i);
            pixels.extend(image.as_slice().iter().map(|&v| (v * 255.0).round() as u8));
            labels.push(label as u8);
        }
        let images = write_idx(
            &[IMAGE_MAGIC, count as u32, SIDE as u32, SIDE as u32],
            &pixels,
        );
        let labels = write_idx(&[LABEL_MAGIC, count as u32], &labels);
        (images, labels)
    }

    #[test]
    fn test_load_and_train_from_idx_files() {
        let (images, labels) = idx_pair(10);
        let data = load_dataset(
            images.path().to_str().unwrap(),
            labels.path().to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(data.len(), 10);
        assert_eq!(data[0].image.shape(), [SIDE, SIDE]);
        assert!(data
            .iter()
            .all(|ex| ex.image.as_slice().iter().all(|&p| (0.0..=1.0).contains(&p))));

        let mut model = Model::new(&config(1), SIDE, &mut SimpleRng::new(9)).unwrap();
        let reports = model.train(&data).unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_dataset("does/not/exist-images", "does/not/exist-labels");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_count_mismatch() {
        let (images, _) = idx_pair(4);
        let labels = write_idx(&[LABEL_MAGIC, 3], &[0, 1, 0]);
        let result = load_dataset(
            images.path().to_str().unwrap(),
            labels.path().to_str().unwrap(),
        );
        assert!(result.is_err());
    }
}
