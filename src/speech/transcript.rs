use super::recognizer::RecognitionResult;

pub const SILENCE_MARKER: &str = "\n--------Silence-------\n";

/// Committed dictation plus the in-progress hypothesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    text: String,
    interim: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one result batch. Returns the newly committed text, if any.
    ///
    /// Finals win: when the batch holds any final result, all finals are
    /// appended (each followed by a space) and the interim buffer clears.
    /// Otherwise the concatenated interim results replace the interim buffer.
    pub fn apply(&mut self, result_index: usize, results: &[RecognitionResult]) -> Option<String> {
        let mut finals = String::new();
        let mut interim = String::new();

        for result in results.iter().skip(result_index) {
            if result.is_final {
                finals.push_str(&result.transcript);
                finals.push(' ');
            } else {
                interim.push_str(&result.transcript);
            }
        }

        if !finals.is_empty() {
            self.text.push_str(&finals);
            self.interim.clear();
            Some(finals)
        } else {
            if !interim.is_empty() {
                self.interim = interim;
            }
            None
        }
    }

    pub fn push_silence(&mut self) {
        self.text.push_str(SILENCE_MARKER);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.interim.is_empty()
    }
}
