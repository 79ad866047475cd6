//! A small append/prepend text buffer.
//!
//! Segment closers need to prepend stack guards and then a `useGas` call
//! onto text that was built incrementally while scanning opcodes. Doing that
//! with raw `String` splicing (`format!("{}{}", prefix, existing)`) reads
//! fine once but becomes unreadable once two separate prepends stack up, and
//! invites the kind of buffer-juggling bug the original C++ translator had.
//! `TextBuf` keeps prepended and appended pieces in separate lists and only
//! joins them when the text is finally taken.

#[derive(Debug, Default, Clone)]
pub struct TextBuf {
    prepended: Vec<String>,
    body: String,
}

impl TextBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the end of the buffer, in scan order.
    pub fn append(&mut self, text: &str) {
        self.body.push_str(text);
    }

    /// Prepend to the front of the buffer. Each call moves to the very
    /// front, ahead of anything prepended earlier: prepending stack guards
    /// and then a `useGas` call (the order §4.4 describes them in) leaves
    /// `useGas` closest to the front in the final text.
    pub fn prepend(&mut self, text: &str) {
        self.prepended.insert(0, text.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.prepended.is_empty() && self.body.is_empty()
    }

    /// Consume the buffer, returning the joined text and resetting this
    /// instance to empty.
    pub fn take(&mut self) -> String {
        let mut out = String::new();
        for piece in self.prepended.drain(..) {
            out.push_str(&piece);
        }
        out.push_str(&self.body);
        self.body.clear();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_prepend_ends_up_first() {
        let mut buf = TextBuf::new();
        buf.append("(call $ADD)");
        buf.prepend("(guard-overflow)");
        buf.prepend("(call $useGas (i64.const 9))");
        assert_eq!(
            buf.take(),
            "(call $useGas (i64.const 9))(guard-overflow)(call $ADD)"
        );
    }

    #[test]
    fn take_resets_buffer() {
        let mut buf = TextBuf::new();
        buf.append("x");
        buf.prepend("y");
        let _ = buf.take();
        assert!(buf.is_empty());
        assert_eq!(buf.take(), "");
    }
}
