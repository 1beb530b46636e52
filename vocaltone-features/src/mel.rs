//! Mel filterbank and decibel scaling

use ndarray::Array2;

/// Floor applied before taking logarithms of power values
pub const AMIN: f32 = 1e-10;

/// Convert Hz to mel scale (HTK formula)
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel scale to Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular filters on the mel scale, one row per band
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Array2<f32>,
}

impl MelFilterbank {
    /// Build `n_mels` filters over the one-sided spectrum of an `n_fft` transform
    ///
    /// Filter edges are equally spaced in mel between `fmin` and `fmax`; each
    /// filter rises linearly from its left edge to its centre and falls to its
    /// right edge, evaluated at the FFT bin centre frequencies.
    pub fn new(n_mels: usize, n_fft: usize, sample_rate: f32, fmin: f32, fmax: f32) -> Self {
        let freq_bins = n_fft / 2 + 1;

        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f32> = (0..=n_mels + 1)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let bin_width = sample_rate / n_fft as f32;
        let mut filters = Array2::zeros((n_mels, freq_bins));

        for (band, mut row) in filters.outer_iter_mut().enumerate() {
            let left = edges[band];
            let center = edges[band + 1];
            let right = edges[band + 2];

            for (bin, weight) in row.iter_mut().enumerate() {
                let freq = bin as f32 * bin_width;
                if freq >= left && freq <= center && center > left {
                    *weight = (freq - left) / (center - left);
                } else if freq > center && freq <= right && right > center {
                    *weight = (right - freq) / (right - center);
                }
            }
        }

        Self { filters }
    }

    /// Shape (n_mels, n_fft/2 + 1)
    pub fn filters(&self) -> &Array2<f32> {
        &self.filters
    }

    pub fn n_mels(&self) -> usize {
        self.filters.nrows()
    }

    /// Project a (frames, freq_bins) power spectrogram onto the mel bands
    pub fn apply(&self, power: &Array2<f32>) -> Array2<f32> {
        power.dot(&self.filters.t())
    }
}

/// Convert power values to decibels relative to `reference`
///
/// `10·log10(max(S, AMIN)) − 10·log10(max(reference, AMIN))`, then floored at
/// `max − top_db` where `max` is the largest dB value in the input.
pub fn power_to_db(power: &Array2<f32>, reference: f32, top_db: f32) -> Array2<f32> {
    let ref_db = 10.0 * reference.max(AMIN).log10();
    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10() - ref_db);

    let peak = db.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    if peak.is_finite() {
        let floor = peak - top_db;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}
