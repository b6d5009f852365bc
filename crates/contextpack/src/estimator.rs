use pa_domain::message::Message;

/// Approximates how many model tokens a message costs.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;

    fn estimate_message(&self, message: &Message) -> usize {
        self.estimate(&message.content)
    }
}

/// `ceil(chars / 4)`: roughly one token per four characters of English.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharHeuristic;

impl TokenEstimator for CharHeuristic {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up() {
        let est = CharHeuristic;
        assert_eq!(est.estimate(""), 0);
        assert_eq!(est.estimate("abc"), 1);
        assert_eq!(est.estimate("abcd"), 1);
        assert_eq!(est.estimate("abcde"), 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 4 chars, 8 bytes.
        assert_eq!(CharHeuristic.estimate("café"), 1);
    }
}
