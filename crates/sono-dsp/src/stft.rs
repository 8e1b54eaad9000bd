use realfft::RealFftPlanner;

/// Short-time transform: windowed real FFT producing a power spectrum.
///
/// Pre-allocates the FFT plan and scratch buffers for a zero-allocation
/// hot path; `process` writes into an internal buffer and returns a view.
///
/// # Example
/// ```
/// use sono_dsp::stft::StftPipeline;
/// let stft = StftPipeline::new(800);
/// assert_eq!(stft.bins(), 401); // N/2 + 1
/// ```
#[derive(Clone)]
pub struct StftPipeline {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f32>>,
    scratch: Vec<realfft::num_complex::Complex<f32>>,
    power: Vec<f32>,
    plan: std::sync::Arc<dyn realfft::RealToComplex<f32>>,
    /// Hann window coefficients.
    window: Vec<f32>,
}

impl StftPipeline {
    /// Create a new pipeline for sub-frames of `size` samples.
    ///
    /// # Panics
    /// Panics if `size` is 0.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "FFT size must be > 0");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();
        let power = vec![0.0; spectrum_buf.len()];

        // Hann window
        let window: Vec<f32> = (0..size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            power,
            plan,
            window,
        }
    }

    /// Process one sub-frame through the windowed FFT.
    ///
    /// Returns the normalized power spectrum (N/2+1 bins). Frames shorter
    /// than the FFT size are zero-padded.
    ///
    /// # Example
    /// ```
    /// use sono_dsp::stft::StftPipeline;
    /// let mut stft = StftPipeline::new(256);
    /// let frame = vec![0.0f32; 256];
    /// let power = stft.process(&frame);
    /// assert_eq!(power.len(), 129);
    /// assert!(power.iter().all(|&p| p == 0.0));
    /// ```
    pub fn process(&mut self, frame: &[f32]) -> &[f32] {
        let n = self.fft_size.min(frame.len());

        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n { frame[i] * self.window[i] } else { 0.0 };
        }

        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            self.power.fill(0.0);
            return &self.power;
        }

        let norm = 1.0 / (self.fft_size as f32 * self.fft_size as f32);
        for (p, c) in self.power.iter_mut().zip(self.spectrum_buf.iter()) {
            *p = (c.re * c.re + c.im * c.im) * norm;
        }
        &self.power
    }

    /// Number of spectrum bins produced per sub-frame.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.power.len()
    }

    /// FFT sub-frame size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Remplit `out` avec une sinusoïde pure.
    fn sine(freq: f32, rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn tone_energy_lands_in_expected_bin() {
        let mut stft = StftPipeline::new(800);
        // 1 kHz @ 16 kHz, bin width = 20 Hz: expect the peak at bin 50.
        let frame = sine(1000.0, 16000.0, 800);
        let power = stft.process(&frame);

        let peak = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(50));
    }

    #[test]
    fn process_is_deterministic() {
        let mut stft = StftPipeline::new(256);
        let frame = sine(440.0, 16000.0, 256);
        let first: Vec<f32> = stft.process(&frame).to_vec();
        let second: Vec<f32> = stft.process(&frame).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn short_frame_is_zero_padded() {
        let mut stft = StftPipeline::new(256);
        let frame = vec![1.0f32; 10];
        let power = stft.process(&frame);
        assert_eq!(power.len(), 129);
        assert!(power.iter().any(|&p| p > 0.0));
    }
}
