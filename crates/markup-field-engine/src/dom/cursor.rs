/// A byte cursor over markup source.
///
/// Delimiters are ASCII. Stepping over anything else goes through
/// [`Cursor::bump_char`] so the index stays on a UTF-8 boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The markup being parsed.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns true if at end of input.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Peeks `n` bytes ahead of the current one.
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + n).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat)
    }

    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        let rest = &self.s.as_bytes()[self.i.min(self.s.len())..];
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    /// Advances past the whole character at the cursor.
    pub fn bump_char(&mut self) -> Option<char> {
        let c = self.s.get(self.i..)?.chars().next()?;
        self.i += c.len_utf8();
        Some(c)
    }

    /// Advances by `n` bytes, stopping at the end of input.
    pub fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    /// Consumes bytes while `pred` holds and returns them.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while self.peek().is_some_and(&pred) {
            self.i += 1;
        }
        &self.s[start..self.i]
    }

    /// Consumes up to (not including) the first occurrence of `pat`, or to
    /// the end of input when `pat` is absent.
    pub fn take_until(&mut self, pat: &str) -> &'a str {
        let start = self.i.min(self.s.len());
        let end = self.s[start..]
            .find(pat)
            .map(|off| start + off)
            .unwrap_or(self.s.len());
        self.i = end;
        &self.s[start..end]
    }

    /// Like [`Cursor::take_until`], matching `pat` case-insensitively.
    pub fn take_until_ignore_case(&mut self, pat: &str) -> &'a str {
        let start = self.i.min(self.s.len());
        let haystack = self.s[start..].to_ascii_lowercase();
        let end = haystack
            .find(&pat.to_ascii_lowercase())
            .map(|off| start + off)
            .unwrap_or(self.s.len());
        self.i = end;
        &self.s[start..end]
    }
}
