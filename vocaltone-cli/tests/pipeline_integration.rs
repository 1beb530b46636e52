//! End-to-end analysis through the CLI pipeline

use std::f32::consts::PI;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use uuid::Uuid;
use vocaltone_cli::{
    analyze_batch, run_training, AppConfig, EmotionPipeline, PipelineError, TrainingJob,
    BEST_MODEL_FILE,
};
use vocaltone_model::{
    ArchitectureConfig, ClassifierWeights, EmotionClassifier, EmotionNetwork, LabelSpace,
    SatisfactionScorer, WeightsMetadata,
};
use vocaltone_train::TrainerConfig;

fn small_architecture() -> ArchitectureConfig {
    ArchitectureConfig::default()
        .conv(vec![4, 4], vec![3, 3])
        .lstm(4, 4)
        .dense(8, 8)
}

fn weights(seed: u64) -> ClassifierWeights {
    let network = EmotionNetwork::new(small_architecture(), &mut StdRng::seed_from_u64(seed)).unwrap();
    ClassifierWeights::new(
        network,
        LabelSpace::standard().clone(),
        WeightsMetadata::new(Uuid::new_v4(), 0, 0.0),
    )
    .unwrap()
}

fn pipeline() -> EmotionPipeline {
    let classifier = EmotionClassifier::with_weights(LabelSpace::standard().clone(), weights(5)).unwrap();
    EmotionPipeline::new(classifier)
}

fn wav_bytes(freq: f32, seconds: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let n = (22050.0 * seconds) as usize;
        for i in 0..n {
            let t = i as f32 / 22050.0;
            let v = 0.5 * (2.0 * PI * freq * t).sin();
            writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn write_wav(path: &Path, freq: f32) -> PathBuf {
    fs::write(path, wav_bytes(freq, 2.0)).unwrap();
    path.to_path_buf()
}

#[test]
fn test_report_matches_scoring_rule() {
    let pipeline = pipeline();
    let report = pipeline.analyze_bytes(&wav_bytes(300.0, 3.0), "call.wav", false).unwrap();

    assert_eq!(report.probabilities.len(), 7);
    let sum: f32 = report.probabilities.values().sum();
    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(
        report.confidence,
        report.probabilities[report.emotion.name()],
        epsilon = 1e-6
    );

    let expected = SatisfactionScorer::new().blend(report.emotion, report.confidence);
    assert_abs_diff_eq!(report.satisfaction_score, expected, epsilon = 0.006);
    assert!(report.descriptors.is_none());
}

#[test]
fn test_descriptors_on_request() {
    let report = pipeline()
        .analyze_bytes(&wav_bytes(440.0, 1.0), ".wav", true)
        .unwrap();
    let descriptors = report.descriptors.unwrap();
    assert!(descriptors.rms > 0.0);
    assert!(descriptors.spectral_centroid > 0.0);
}

#[test]
fn test_file_size_limit() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir.path().join("long.wav"), 200.0);
    let pipeline = pipeline().with_max_file_bytes(1024);

    match pipeline.analyze_file(&path, false) {
        Err(PipelineError::FileTooLarge { size, limit }) => {
            assert!(size > 1024);
            assert_eq!(limit, 1024);
        }
        other => panic!("expected FileTooLarge, got {:?}", other),
    }
}

#[test]
fn test_from_config_loads_artifacts() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("emotion_model.json");
    let labels_path = dir.path().join("labels.json");
    weights(9).save_json(&model_path).unwrap();
    LabelSpace::standard().save_json(&labels_path).unwrap();

    let config = AppConfig {
        model_path: model_path.clone(),
        labels_path,
        ..AppConfig::default()
    };
    let pipeline = EmotionPipeline::from_config(&config).unwrap();
    assert!(pipeline.classifier().is_loaded());

    let missing = AppConfig {
        model_path: dir.path().join("absent.json"),
        ..config
    };
    assert!(EmotionPipeline::from_config(&missing).is_err());
}

#[tokio::test]
async fn test_batch_skips_failures_and_averages() {
    let dir = TempDir::new().unwrap();
    let mut files = vec![
        write_wav(&dir.path().join("a.wav"), 180.0),
        write_wav(&dir.path().join("b.wav"), 420.0),
    ];
    let corrupt = dir.path().join("broken.wav");
    fs::write(&corrupt, b"RIFF\x00\x00\x00\x00WAVEjunk").unwrap();
    files.push(corrupt);
    files.push(write_wav(&dir.path().join("c.wav"), 950.0));

    let report = analyze_batch(Arc::new(pipeline()), files, 10, false)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].file.ends_with("broken.wav"));
    assert_eq!(report.results[2].file, dir.path().join("c.wav").display().to_string());

    let mean = report
        .results
        .iter()
        .map(|r| r.report.satisfaction_score)
        .sum::<f32>()
        / 3.0;
    assert_abs_diff_eq!(report.average_satisfaction, mean, epsilon = 0.006);
    assert_eq!(report.statistics.total, 3);
    assert!(report.statistics.most_common.is_some());
}

#[tokio::test]
async fn test_batch_limit() {
    let files: Vec<PathBuf> = (0..11).map(|i| PathBuf::from(format!("{}.wav", i))).collect();
    let err = analyze_batch(Arc::new(pipeline()), files, 10, false)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::BatchTooLarge { count: 11, limit: 10 }));
}

#[test]
fn test_training_job_writes_usable_artifacts() {
    let data = TempDir::new().unwrap();
    let speaker = data.path().join("KL");
    fs::create_dir_all(&speaker).unwrap();
    for (c, code) in ["a", "d", "f", "h", "n", "sa", "su"].iter().enumerate() {
        for n in 1..=3 {
            let freq = 150.0 + 110.0 * c as f32 + 9.0 * n as f32;
            write_wav(&speaker.join(format!("KL_{}{:02}.wav", code, n)), freq);
        }
    }

    let output = TempDir::new().unwrap();
    let job = TrainingJob {
        data_dir: data.path().to_path_buf(),
        output_dir: output.path().join("models"),
        trainer: TrainerConfig::default()
            .epochs(1)
            .batch_size(8)
            .architecture(small_architecture()),
    };
    let outcome = run_training(&job, Arc::new(AtomicBool::new(false))).unwrap();
    assert_eq!(outcome.history.len(), 1);

    assert!(job.model_path().exists());
    assert!(job.labels_path().exists());
    assert!(job.history_path().exists());
    assert!(job.output_dir.join(BEST_MODEL_FILE).exists());

    let config = AppConfig {
        model_path: job.model_path(),
        labels_path: job.labels_path(),
        ..AppConfig::default()
    };
    let pipeline = EmotionPipeline::from_config(&config).unwrap();
    let report = pipeline
        .analyze_file(speaker.join("KL_h01.wav"), false)
        .unwrap();
    assert!((0.0..=10.0).contains(&report.satisfaction_score));
}

#[test]
fn test_training_job_without_corpus() {
    let data = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let job = TrainingJob {
        data_dir: data.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        trainer: TrainerConfig::default(),
    };
    assert!(run_training(&job, Arc::new(AtomicBool::new(false))).is_err());
}
