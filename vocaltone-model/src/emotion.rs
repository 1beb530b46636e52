//! Emotion categories and the label space that maps them to class indices

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// The seven emotion categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Disgust,
    Fear,
    Happiness,
    Neutral,
    Sadness,
    Surprise,
}

impl Emotion {
    /// Alphabetical order, which is also the canonical class order
    pub const ALL: [Emotion; 7] = [
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happiness,
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Surprise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happiness => "happiness",
            Emotion::Neutral => "neutral",
            Emotion::Sadness => "sadness",
            Emotion::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Emotion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.name() == lower)
            .ok_or_else(|| ModelError::label_mismatch(format!("unknown emotion '{}'", s)))
    }
}

static STANDARD: Lazy<LabelSpace> = Lazy::new(|| LabelSpace {
    emotions: Emotion::ALL.to_vec(),
});

/// Ordered bijection between emotions and class indices
///
/// Serialized as a JSON array of names, e.g. `["anger", "disgust", ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSpace {
    emotions: Vec<Emotion>,
}

impl LabelSpace {
    /// Canonical alphabetical label space: anger=0 … surprise=6
    pub fn standard() -> &'static LabelSpace {
        &STANDARD
    }

    /// Build from names in class-index order
    ///
    /// Every emotion must appear exactly once.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let emotions = names
            .iter()
            .map(|n| n.as_ref().parse::<Emotion>())
            .collect::<Result<Vec<_>>>()?;

        if emotions.len() != Emotion::ALL.len() {
            return Err(ModelError::label_mismatch(format!(
                "expected {} labels, got {}",
                Emotion::ALL.len(),
                emotions.len()
            )));
        }
        for emotion in Emotion::ALL {
            let count = emotions.iter().filter(|&&e| e == emotion).count();
            if count != 1 {
                return Err(ModelError::label_mismatch(format!(
                    "'{}' appears {} times",
                    emotion, count
                )));
            }
        }

        Ok(Self { emotions })
    }

    pub fn len(&self) -> usize {
        self.emotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty()
    }

    pub fn emotions(&self) -> &[Emotion] {
        &self.emotions
    }

    pub fn index_of(&self, emotion: Emotion) -> Option<usize> {
        self.emotions.iter().position(|&e| e == emotion)
    }

    pub fn emotion_at(&self, index: usize) -> Option<Emotion> {
        self.emotions.get(index).copied()
    }

    /// Names in class-index order
    pub fn names(&self) -> Vec<String> {
        self.emotions.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl TryFrom<Vec<String>> for LabelSpace {
    type Error = ModelError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::from_names(&names)
    }
}

impl From<LabelSpace> for Vec<String> {
    fn from(labels: LabelSpace) -> Self {
        labels.names()
    }
}

impl Default for LabelSpace {
    fn default() -> Self {
        Self::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let labels = LabelSpace::standard();
        assert_eq!(labels.len(), 7);
        assert_eq!(labels.index_of(Emotion::Anger), Some(0));
        assert_eq!(labels.index_of(Emotion::Happiness), Some(3));
        assert_eq!(labels.index_of(Emotion::Surprise), Some(6));
    }

    #[test]
    fn test_index_name_index_roundtrip() {
        let labels = LabelSpace::standard();
        for i in 0..labels.len() {
            let emotion = labels.emotion_at(i).unwrap();
            let parsed: Emotion = emotion.name().parse().unwrap();
            assert_eq!(labels.index_of(parsed), Some(i));
        }
        assert_eq!(labels.emotion_at(7), None);
    }

    #[test]
    fn test_from_names_validation() {
        assert!(LabelSpace::from_names(&["anger", "disgust"]).is_err());
        assert!(LabelSpace::from_names(&[
            "anger", "anger", "fear", "happiness", "neutral", "sadness", "surprise"
        ])
        .is_err());
        assert!(LabelSpace::from_names(&[
            "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise"
        ])
        .is_err());

        let shuffled = LabelSpace::from_names(&[
            "surprise", "anger", "disgust", "fear", "happiness", "neutral", "sadness",
        ])
        .unwrap();
        assert_ne!(&shuffled, LabelSpace::standard());
        assert_eq!(shuffled.index_of(Emotion::Surprise), Some(0));
    }

    #[test]
    fn test_json_is_a_name_array() {
        let json = serde_json::to_string(LabelSpace::standard()).unwrap();
        assert_eq!(
            json,
            r#"["anger","disgust","fear","happiness","neutral","sadness","surprise"]"#
        );
        let back: LabelSpace = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, LabelSpace::standard());
        assert!(serde_json::from_str::<LabelSpace>(r#"["anger"]"#).is_err());
    }
}
