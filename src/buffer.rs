//! The input cursor: a `String` plus a byte position, with whitespace
//! skipping and nameguard-aware token/pattern matching.
//!
//! This is the only part of the engine that knows about raw text. Rules
//! are built on top of [`Buffer::match_token`] and [`Buffer::match_pattern`];
//! neither ever looks behind the cursor or past the end of the text.

use regex::Regex;
use std::collections::HashMap;

/// A cursor over the source text, with the whitespace-skipping and
/// nameguard policy a grammar's tokens are matched under.
pub struct Buffer {
    text: String,
    pos: usize,
    /// Characters `next_token` treats as whitespace to skip. Empty disables
    /// skipping entirely.
    whitespace: String,
    /// When set, a token that looks like an identifier (alphabetic, and
    /// followed by more alphanumerics) only matches if it is not itself a
    /// prefix of a longer identifier at the match site.
    nameguard: bool,
    pattern_cache: HashMap<String, Regex>,
}

impl Buffer {
    /// A cursor over `text`, starting at position 0 with the default
    /// whitespace set (space, tab, CR, LF) and nameguard on.
    pub fn new(text: impl Into<String>) -> Self {
        Buffer {
            text: text.into(),
            pos: 0,
            whitespace: " \t\r\n".to_string(),
            nameguard: true,
            pattern_cache: HashMap::new(),
        }
    }

    pub fn whitespace(&self) -> &str {
        &self.whitespace
    }

    pub fn set_whitespace(&mut self, whitespace: impl Into<String>) {
        self.whitespace = whitespace.into();
    }

    pub fn nameguard(&self) -> bool {
        self.nameguard
    }

    pub fn set_nameguard(&mut self, nameguard: bool) {
        self.nameguard = nameguard;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn at_eol(&self) -> bool {
        self.at_end() || matches!(self.byte_at(self.pos), Some(b'\r') | Some(b'\n'))
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.text.as_bytes().get(pos).copied()
    }

    /// The byte at the cursor, or `None` at end of input.
    pub fn current(&self) -> Option<u8> {
        self.byte_at(self.pos)
    }

    /// The byte `off` positions ahead of the cursor, or `None` past the end.
    pub fn peek(&self, off: usize) -> Option<u8> {
        self.byte_at(self.pos + off)
    }

    /// Consume and return the current byte, or `None` at end of input.
    pub fn next(&mut self) -> Option<u8> {
        let b = self.current()?;
        self.pos += 1;
        Some(b)
    }

    /// Move to an absolute position, clamped to `[0, len]`.
    pub fn go_to(&mut self, pos: usize) {
        self.pos = pos.min(self.text.len());
    }

    /// Move by a signed offset from the current position, clamped.
    pub fn move_by(&mut self, off: isize) {
        let target = (self.pos as isize).saturating_add(off).max(0) as usize;
        self.go_to(target);
    }

    fn is_name_byte(&self, pos: usize) -> bool {
        matches!(self.byte_at(pos), Some(b) if b.is_ascii_alphabetic())
    }

    /// Skip leading whitespace (from [`Buffer::whitespace`]) until a fixpoint;
    /// a no-op once the cursor sits on non-whitespace or at end of input.
    pub fn next_token(&mut self) {
        if self.whitespace.is_empty() {
            return;
        }
        loop {
            let before = self.pos;
            while self.current().map_or(false, |b| self.whitespace.as_bytes().contains(&b)) {
                self.pos += 1;
            }
            if self.pos == before {
                break;
            }
        }
    }

    /// Try to match the literal `token` at the cursor. Empty tokens always
    /// match without consuming input. On success, advances past the match
    /// and returns `true`.
    ///
    /// When [`Buffer::nameguard`] is set and `token` looks like a whole
    /// identifier (every byte alphanumeric, first byte alphabetic), the
    /// match is rejected if the byte right after it is also alphabetic —
    /// i.e. it would only be a prefix of a longer identifier at the match
    /// site (e.g. matching `"if"` against `"iffy"`). A following digit
    /// does not trigger the guard: `"if"` matches `"if3"`.
    pub fn match_token(&mut self, token: &str) -> bool {
        if token.is_empty() {
            return true;
        }
        if !self.text[self.pos..].as_bytes().starts_with(token.as_bytes()) {
            return false;
        }
        if self.nameguard {
            let token_first_is_alpha = self.is_name_byte(self.pos);
            let follow_is_alpha = self.is_name_byte(self.pos + token.len());
            if token_first_is_alpha && follow_is_alpha {
                let token_is_alnum = token.bytes().all(|b| b.is_ascii_alphanumeric());
                if token_is_alnum {
                    return false;
                }
            }
        }
        self.pos += token.len();
        true
    }

    /// Try to match `pattern`, anchored at the cursor (never searching
    /// ahead). Compiled regexes are cached by pattern text across calls.
    /// On success, advances past the match and returns the matched slice.
    pub fn match_pattern(&mut self, pattern: &str) -> Result<Option<String>, regex::Error> {
        if !self.pattern_cache.contains_key(pattern) {
            let re = Regex::new(pattern)?;
            self.pattern_cache.insert(pattern.to_string(), re);
        }
        let re = &self.pattern_cache[pattern];
        match re.find(&self.text[self.pos..]) {
            Some(m) if m.start() == 0 => {
                let matched = m.as_str().to_string();
                self.pos += m.end();
                Ok(Some(matched))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_matches_and_advances() {
        let mut buf = Buffer::new("foobar");
        assert!(buf.match_token("foo"));
        assert_eq!(buf.pos(), 3);
    }

    #[test]
    fn empty_token_always_matches_without_consuming() {
        let mut buf = Buffer::new("foobar");
        assert!(buf.match_token(""));
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn nameguard_rejects_prefix_of_longer_identifier() {
        let mut buf = Buffer::new("iffy");
        assert!(!buf.match_token("if"));
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn nameguard_does_not_fire_on_a_following_digit() {
        let mut buf = Buffer::new("if3");
        assert!(buf.match_token("if"));
        assert_eq!(buf.pos(), 2);
    }

    #[test]
    fn nameguard_allows_identifier_followed_by_punctuation() {
        let mut buf = Buffer::new("if(x)");
        assert!(buf.match_token("if"));
        assert_eq!(buf.pos(), 2);
    }

    #[test]
    fn nameguard_does_not_apply_to_punctuation_tokens() {
        let mut buf = Buffer::new("+++");
        assert!(buf.match_token("+"));
        assert_eq!(buf.pos(), 1);
    }

    #[test]
    fn nameguard_disabled_allows_prefix_match() {
        let mut buf = Buffer::new("iffy");
        buf.set_nameguard(false);
        assert!(buf.match_token("if"));
        assert_eq!(buf.pos(), 2);
    }

    #[test]
    fn next_token_skips_whitespace_fixpoint() {
        let mut buf = Buffer::new("   \t\n foo");
        buf.next_token();
        assert_eq!(buf.pos(), 6);
    }

    #[test]
    fn next_token_is_noop_on_non_whitespace() {
        let mut buf = Buffer::new("foo");
        buf.next_token();
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn pattern_matches_anchored_at_cursor() {
        let mut buf = Buffer::new("123abc");
        let m = buf.match_pattern(r"[0-9]+").unwrap();
        assert_eq!(m.as_deref(), Some("123"));
        assert_eq!(buf.pos(), 3);
    }

    #[test]
    fn pattern_does_not_search_ahead() {
        let mut buf = Buffer::new("abc123");
        let m = buf.match_pattern(r"[0-9]+").unwrap();
        assert_eq!(m, None);
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn pattern_cache_reuses_compiled_regex() {
        let mut buf = Buffer::new("aaabbb");
        assert_eq!(buf.match_pattern(r"a+").unwrap().as_deref(), Some("aaa"));
        assert_eq!(buf.match_pattern(r"b+").unwrap().as_deref(), Some("bbb"));
        assert_eq!(buf.pattern_cache.len(), 2);
    }

    #[test]
    fn go_to_clamps_to_text_length() {
        let mut buf = Buffer::new("abc");
        buf.go_to(100);
        assert_eq!(buf.pos(), 3);
        assert!(buf.at_end());
    }

    #[test]
    fn at_eol_true_at_end_and_at_line_breaks() {
        let mut buf = Buffer::new("a\nb");
        assert!(!buf.at_eol());
        buf.next();
        assert!(buf.at_eol());
    }
}
