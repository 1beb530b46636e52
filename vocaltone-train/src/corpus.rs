//! SAVEE corpus loading
//!
//! Files are named `[speaker]_[code][nn].wav`, e.g. `DC_a01.wav` or
//! `JE_sa12.wav`. Codes: `a` anger, `d` disgust, `f` fear, `h` happiness,
//! `n` neutral, `sa` sadness, `su` surprise.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vocaltone_audio::AudioNormalizer;
use vocaltone_features::FeatureExtractor;
use vocaltone_model::Emotion;

use crate::dataset::LabeledFeatures;
use crate::error::Result;

/// Log progress every this many files
const PROGRESS_INTERVAL: usize = 50;

/// Emotion encoded in a SAVEE file name; `None` for anything else
pub fn emotion_from_filename(name: &str) -> Option<Emotion> {
    let stem = name.strip_suffix(".wav").unwrap_or(name);
    let (_, tag) = stem.split_once('_')?;

    match tag.get(..2) {
        Some("sa") => return Some(Emotion::Sadness),
        Some("su") => return Some(Emotion::Surprise),
        _ => {}
    }
    match tag.chars().next()? {
        'a' => Some(Emotion::Anger),
        'd' => Some(Emotion::Disgust),
        'f' => Some(Emotion::Fear),
        'h' => Some(Emotion::Happiness),
        'n' => Some(Emotion::Neutral),
        _ => None,
    }
}

/// Every `.wav` below `dir`, in sorted order
pub fn find_wav_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Normalizes and featurizes a labeled speech corpus
pub struct SaveeLoader {
    normalizer: AudioNormalizer,
    extractor: FeatureExtractor,
}

impl Default for SaveeLoader {
    fn default() -> Self {
        Self::new(AudioNormalizer::default(), FeatureExtractor::default())
    }
}

/// Loaded samples plus the count of files that failed processing
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub samples: Vec<LabeledFeatures>,
    pub skipped: usize,
}

impl SaveeLoader {
    pub fn new(normalizer: AudioNormalizer, extractor: FeatureExtractor) -> Self {
        Self {
            normalizer,
            extractor,
        }
    }

    /// Featurize every recognizable file below `dir`
    ///
    /// Files whose names carry no emotion code are ignored; files that fail
    /// to decode or featurize are skipped with a warning.
    pub fn load<P: AsRef<Path>>(&self, dir: P) -> Result<LoadedCorpus> {
        let dir = dir.as_ref();
        info!("Loading dataset from {}", dir.display());
        let files = find_wav_files(dir)?;
        info!("Found {} audio files", files.len());

        let mut samples = Vec::new();
        let mut skipped = 0;
        for (i, path) in files.iter().enumerate() {
            if i > 0 && i % PROGRESS_INTERVAL == 0 {
                info!("Processed {}/{} files", i, files.len());
            }

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let Some(emotion) = emotion_from_filename(name) else {
                debug!("Ignoring {}", path.display());
                continue;
            };

            let featurized = self
                .normalizer
                .normalize_file(path)
                .map_err(|e| e.to_string())
                .and_then(|clip| self.extractor.extract(&clip).map_err(|e| e.to_string()));
            match featurized {
                Ok(features) => samples.push(LabeledFeatures::new(features, emotion)),
                Err(e) => {
                    warn!("Error processing {}: {}", path.display(), e);
                    skipped += 1;
                }
            }
        }

        info!(
            "Successfully processed {} files ({} skipped)",
            samples.len(),
            skipped
        );
        Ok(LoadedCorpus { samples, skipped })
    }
}
