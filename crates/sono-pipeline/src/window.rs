use sono_core::error::PipelineError;
use sono_core::frame::AnalysisWindow;

/// Ring de fenêtrage : transforme un flux de chunks de taille variable en
/// fenêtres fixes avec recouvrement.
///
/// Le stockage est pré-alloué à `window_size + max_chunk_size` échantillons
/// et n'est jamais redimensionné — `ingest` ne fait que des copies et des
/// décalages bornés, jamais d'allocation sur le ring lui-même. Chaque
/// fenêtre émise est une copie indépendante (copy-on-emit) : le ring
/// continue d'accumuler sans aliasing.
///
/// Propriété exclusive du contexte producteur — aucun autre thread ne lit
/// ni n'écrit cet état.
///
/// # Example
/// ```
/// use sono_pipeline::window::WindowBuffer;
/// let mut ring = WindowBuffer::new(16000, 8192, 4096).unwrap();
/// let mut emitted = 0usize;
/// for _ in 0..5 {
///     ring.ingest(&[0.0; 4000], |_w| emitted += 1).unwrap();
/// }
/// // 20000 échantillons : une seule fenêtre complète.
/// assert_eq!(emitted, 1);
/// assert_eq!(ring.buffered(), 11808);
/// ```
pub struct WindowBuffer {
    /// Fixed storage, `window_size + max_chunk_size` long.
    storage: Vec<f32>,
    /// First unfilled position. Invariant: `write_off <= storage.len()`.
    write_off: usize,
    window_size: usize,
    hop_size: usize,
    max_chunk_size: usize,
    /// Index of the next window to emit.
    next_index: u64,
}

impl WindowBuffer {
    /// Create a windowing ring.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfiguration`] if any size is zero
    /// or if `hop_size > window_size` (samples would be skipped silently).
    pub fn new(
        window_size: usize,
        hop_size: usize,
        max_chunk_size: usize,
    ) -> Result<Self, PipelineError> {
        if window_size == 0 || hop_size == 0 || max_chunk_size == 0 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "window_size ({window_size}), hop_size ({hop_size}) and max_chunk_size \
                 ({max_chunk_size}) must be positive"
            )));
        }
        if hop_size > window_size {
            return Err(PipelineError::InvalidConfiguration(format!(
                "hop_size ({hop_size}) exceeds window_size ({window_size}): samples would \
                 be skipped"
            )));
        }

        Ok(Self {
            storage: vec![0.0; window_size + max_chunk_size],
            write_off: 0,
            window_size,
            hop_size,
            max_chunk_size,
            next_index: 0,
        })
    }

    /// Ingest one chunk, emitting zero or more windows through `emit`.
    ///
    /// A chunk may complete several hops at once; each completed hop emits
    /// exactly one window, in strictly increasing time order. Returns how
    /// many windows were emitted.
    ///
    /// # Errors
    /// Returns [`PipelineError::OversizedChunk`] if the chunk exceeds
    /// `max_chunk_size`. The ring is left untouched in that case.
    pub fn ingest<F>(&mut self, chunk: &[f32], mut emit: F) -> Result<usize, PipelineError>
    where
        F: FnMut(AnalysisWindow),
    {
        if chunk.len() > self.max_chunk_size {
            return Err(PipelineError::OversizedChunk {
                len: chunk.len(),
                max: self.max_chunk_size,
            });
        }

        self.storage[self.write_off..self.write_off + chunk.len()].copy_from_slice(chunk);
        self.write_off += chunk.len();

        let mut emitted = 0usize;
        while self.write_off >= self.window_size {
            emit(AnalysisWindow {
                index: self.next_index,
                start_sample: self.next_index * self.hop_size as u64,
                samples: self.storage[..self.window_size].to_vec(),
            });
            self.next_index += 1;
            emitted += 1;

            // Retain the overlapping tail at the front of the storage.
            self.storage.copy_within(self.hop_size..self.write_off, 0);
            self.write_off -= self.hop_size;
        }

        Ok(emitted)
    }

    /// Samples currently accumulated and not yet consumed by a hop.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.write_off
    }

    /// Total windows emitted so far.
    #[must_use]
    pub fn windows_emitted(&self) -> u64 {
        self.next_index
    }

    /// Clear the ring between capture sessions. No reallocation.
    pub fn reset(&mut self) {
        self.write_off = 0;
        self.next_index = 0;
    }

    /// Fixed storage capacity, in samples.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Échantillons reconnaissables : s[i] = i.
    fn ramp(start: usize, len: usize) -> Vec<f32> {
        (start..start + len).map(|i| i as f32).collect()
    }

    fn collect_windows(
        ring: &mut WindowBuffer,
        chunks: &[Vec<f32>],
    ) -> Vec<AnalysisWindow> {
        let mut windows = Vec::new();
        for chunk in chunks {
            ring.ingest(chunk, |w| windows.push(w)).expect("ingest");
        }
        windows
    }

    #[test]
    fn one_large_chunk_emits_one_window_and_retains_tail() {
        let mut ring = WindowBuffer::new(16000, 8192, 20000).expect("ring");
        let windows = collect_windows(&mut ring, &[ramp(0, 20000)]);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].index, 0);
        assert_eq!(windows[0].start_sample, 0);
        assert_eq!(windows[0].samples.len(), 16000);
        assert_eq!(windows[0].samples[0], 0.0);
        assert_eq!(windows[0].samples[15999], 15999.0);

        // Tail retained after the shift: samples [8192, 20000).
        assert_eq!(ring.buffered(), 11808);
    }

    #[test]
    fn five_chunks_emit_two_windows_at_hop_offsets() {
        let mut ring = WindowBuffer::new(16000, 8192, 5000).expect("ring");
        let chunks = vec![
            ramp(0, 5000),
            ramp(5000, 5000),
            ramp(10000, 5000),
            ramp(15000, 5000),
            ramp(20000, 4000),
        ];
        let windows = collect_windows(&mut ring, &chunks);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start_sample, 0);
        assert_eq!(windows[1].start_sample, 8192);
        assert_eq!(windows[1].samples[0], 8192.0);
        assert_eq!(windows[1].samples[15999], 24191.0);
    }

    #[test]
    fn window_count_matches_closed_form() {
        // floor((total - window) / hop) + 1 for any total >= window.
        let window = 1000;
        let hop = 300;
        for total in [1000usize, 1299, 1300, 5000, 9999] {
            let mut ring = WindowBuffer::new(window, hop, 128).expect("ring");
            let mut count = 0usize;
            let mut sent = 0usize;
            while sent < total {
                let len = 128.min(total - sent);
                ring.ingest(&ramp(sent, len), |_| count += 1).expect("ingest");
                sent += len;
            }
            let expected = (total - window) / hop + 1;
            assert_eq!(count, expected, "total {total}");
        }
    }

    #[test]
    fn chunking_is_invariant() {
        // The same stream split into different chunk sizes must emit
        // identical windows, sample for sample.
        let stream = ramp(0, 50000);
        let mut reference: Option<Vec<AnalysisWindow>> = None;

        for chunk_size in [1usize, 7, 160, 1000, 4096] {
            let mut ring = WindowBuffer::new(16000, 8192, 4096).expect("ring");
            let chunks: Vec<Vec<f32>> =
                stream.chunks(chunk_size).map(<[f32]>::to_vec).collect();
            let windows = collect_windows(&mut ring, &chunks);

            match &reference {
                None => reference = Some(windows),
                Some(expected) => {
                    assert_eq!(&windows, expected, "chunk size {chunk_size}");
                }
            }
        }
    }

    #[test]
    fn a_single_chunk_can_emit_multiple_windows() {
        // hop == window (no overlap): a max-size chunk spans several hops.
        let mut ring = WindowBuffer::new(100, 100, 350).expect("ring");
        let mut windows = Vec::new();
        ring.ingest(&ramp(0, 350), |w| windows.push(w)).expect("ingest");

        assert_eq!(windows.len(), 3);
        for (k, w) in windows.iter().enumerate() {
            assert_eq!(w.start_sample, k as u64 * 100);
            assert_eq!(w.samples[0], (k * 100) as f32);
        }
        assert_eq!(ring.buffered(), 50);
    }

    #[test]
    fn oversized_chunk_rejected_without_mutation() {
        let mut ring = WindowBuffer::new(16000, 8192, 4096).expect("ring");
        ring.ingest(&ramp(0, 4096), |_| {}).expect("ingest");
        let buffered_before = ring.buffered();

        let err = ring.ingest(&ramp(0, 4097), |_| {});
        assert!(matches!(
            err,
            Err(PipelineError::OversizedChunk {
                len: 4097,
                max: 4096
            })
        ));
        assert_eq!(ring.buffered(), buffered_before);

        // Subsequent ingests behave as if the rejected call never happened.
        let stream = ramp(4096, 20096);
        let mut windows = Vec::new();
        for chunk in stream.chunks(4096) {
            ring.ingest(chunk, |w| windows.push(w)).expect("ingest");
        }
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].samples[0], 0.0);
        assert_eq!(windows[0].samples[15999], 15999.0);
        assert_eq!(windows[1].samples[0], 8192.0);
    }

    #[test]
    fn storage_never_grows() {
        let mut ring = WindowBuffer::new(1000, 400, 256).expect("ring");
        let cap = ring.capacity();
        assert_eq!(cap, 1256);

        for i in 0..1000 {
            ring.ingest(&ramp(i * 256, 256), |_| {}).expect("ingest");
            assert!(ring.buffered() <= cap);
        }
        assert_eq!(ring.capacity(), cap);
    }

    #[test]
    fn invalid_geometry_rejected_at_construction() {
        assert!(WindowBuffer::new(0, 1, 1).is_err());
        assert!(WindowBuffer::new(1, 0, 1).is_err());
        assert!(WindowBuffer::new(1, 1, 0).is_err());
        assert!(WindowBuffer::new(100, 101, 10).is_err());
        // hop == window is valid (non-overlapping windows).
        assert!(WindowBuffer::new(100, 100, 10).is_ok());
    }

    #[test]
    fn reset_clears_state_without_reallocation() {
        let mut ring = WindowBuffer::new(1000, 500, 600).expect("ring");
        ring.ingest(&ramp(0, 600), |_| {}).expect("ingest");
        let cap = ring.capacity();

        ring.reset();
        assert_eq!(ring.buffered(), 0);
        assert_eq!(ring.windows_emitted(), 0);
        assert_eq!(ring.capacity(), cap);

        let mut windows = Vec::new();
        ring.ingest(&ramp(0, 600), |w| windows.push(w)).expect("ingest");
        ring.ingest(&ramp(600, 600), |w| windows.push(w)).expect("ingest");
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].index, 0);
    }
}
