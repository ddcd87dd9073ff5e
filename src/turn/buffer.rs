//! Accumulating buffer of finalized transcript text.

/// Accumulates finalized fragment text between flushes.
///
/// Final fragments are appended space-joined; interim text never enters the
/// buffer. The turn controller is the single writer, and the buffer is
/// cleared exactly once per flush by `take()`.
#[derive(Debug, Default)]
pub struct UtteranceBuffer {
    text: String,
}

impl UtteranceBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finalized fragment, space-joined to the existing text.
    ///
    /// Blank fragments are ignored so stray empty finals from the engine do
    /// not inject separator spaces.
    pub fn push_final(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(fragment);
    }

    /// Returns the accumulated text without clearing it.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if no finalized text has accumulated.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Takes the accumulated text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Discards any accumulated text.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = UtteranceBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_str(), "");
    }

    #[test]
    fn test_push_final_space_joins() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("hello");
        buffer.push_final("world");
        buffer.push_final("again");
        assert_eq!(buffer.as_str(), "hello world again");
    }

    #[test]
    fn test_push_final_trims_fragments() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("  hello ");
        buffer.push_final(" world  ");
        assert_eq!(buffer.as_str(), "hello world");
    }

    #[test]
    fn test_blank_fragments_ignored() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("hello");
        buffer.push_final("");
        buffer.push_final("   ");
        buffer.push_final("world");
        assert_eq!(buffer.as_str(), "hello world");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("hello world");

        assert_eq!(buffer.take(), "hello world");
        assert!(buffer.is_empty());
        // Second take yields nothing
        assert_eq!(buffer.take(), "");
    }

    #[test]
    fn test_clear() {
        let mut buffer = UtteranceBuffer::new();
        buffer.push_final("discard me");
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_no_fragment_dropped_or_duplicated() {
        let fragments = ["one", "two", "three", "four", "five"];
        let mut buffer = UtteranceBuffer::new();
        for f in fragments {
            buffer.push_final(f);
        }
        assert_eq!(buffer.take(), fragments.join(" "));
    }
}
