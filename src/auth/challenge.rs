//! `WWW-Authenticate` / `Proxy-Authenticate` challenge parsing.
//!
//! RFC 7235 challenge grammar is ambiguous: challenges are
//! comma-separated, parameter lists inside a challenge are *also*
//! comma-separated, and a comma may sit inside a quoted string. A token
//! after a comma is a new scheme name unless it is followed (ignoring
//! whitespace) by `=` before the next quote, comma, or backslash. Real
//! servers additionally violate the strict grammar, so the parser is a
//! hand-rolled single-pass scanner rather than a grammar library, and it
//! never fails: malformed input degrades to a best-effort result.

/// Ordered string multimap with case-insensitive lookup.
///
/// Duplicate keys are retained as separate entries in insertion order;
/// a repeated `realm` stays visible twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    params: Vec<(String, String)>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append an entry. Existing entries with the same key are kept.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    /// First value for a key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All values for a key, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.params
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// One authentication scheme offered by the server.
///
/// `values` holds decoded parameters (keys lower-cased, quotes stripped,
/// escapes resolved); `raw_values` holds the same parameters positionally
/// aligned but textually untouched (original key casing, quotes and
/// backslashes preserved). `raw_value` is the exact substring of the
/// header after the scheme token, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeEntry {
    pub scheme: String,
    pub raw_value: String,
    pub values: ParamList,
    pub raw_values: ParamList,
}

impl ChallengeEntry {
    pub fn scheme_is(&self, name: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(name)
    }
}

/// Parse one header value into its challenges, in order.
///
/// Pure and restartable; a single O(n) left-to-right scan. Never fails:
/// unterminated quotes, stray commas, and empty segments are absorbed.
pub fn parse_challenges(header: &str) -> Vec<ChallengeEntry> {
    Scanner::new(header).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Scheme,
    Key,
    Value,
}

const fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

const fn is_special(b: u8) -> bool {
    is_ws(b) || matches!(b, b'"' | b'=' | b',' | b'\\')
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mode: Mode,
    in_quotes: bool,
    /// Set when the previous character was an unconsumed backslash
    /// inside quotes; it escapes exactly the one following character.
    escaped: bool,
    scheme: String,
    scheme_start: usize,
    key: String,
    key_start: usize,
    value: String,
    value_start: Option<usize>,
    /// Byte offset where the current entry's raw-value region begins
    /// (right after the scheme token).
    params_start: Option<usize>,
    /// Byte offset just past the last completed parameter, used as the
    /// raw-value end when a new scheme terminates the entry.
    last_param_end: usize,
    values: ParamList,
    raw_values: ParamList,
    entries: Vec<ChallengeEntry>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            mode: Mode::Scheme,
            in_quotes: false,
            escaped: false,
            scheme: String::new(),
            scheme_start: 0,
            key: String::new(),
            key_start: 0,
            value: String::new(),
            value_start: None,
            params_start: None,
            last_param_end: 0,
            values: ParamList::new(),
            raw_values: ParamList::new(),
            entries: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<ChallengeEntry> {
        while self.pos < self.bytes.len() {
            match self.next_special() {
                Some(idx) => {
                    self.consume_run(idx);
                    let b = self.bytes[idx];
                    self.pos = idx + 1;
                    self.handle_special(idx, b);
                }
                None => {
                    self.consume_run(self.bytes.len());
                    break;
                }
            }
        }
        self.finish();
        self.entries
    }

    /// Index of the next interesting character at or after `pos`.
    fn next_special(&self) -> Option<usize> {
        self.bytes[self.pos..]
            .iter()
            .position(|&b| is_special(b))
            .map(|off| self.pos + off)
    }

    /// Append the ordinary-text run `[pos, end)` to the active buffer.
    fn consume_run(&mut self, end: usize) {
        if end <= self.pos {
            return;
        }
        let text = &self.input[self.pos..end];
        match self.mode {
            Mode::Scheme => {
                if self.scheme.is_empty() {
                    self.scheme_start = self.pos;
                }
                self.scheme.push_str(text);
            }
            Mode::Key => {
                if self.key.is_empty() {
                    self.key_start = self.pos;
                }
                self.key.push_str(text);
            }
            Mode::Value => {
                if self.value_start.is_none() {
                    self.value_start = Some(self.pos);
                }
                // A pending escape applies to the run's first character,
                // which is appended unchanged either way.
                self.escaped = false;
                self.value.push_str(text);
            }
        }
        self.pos = end;
    }

    fn handle_special(&mut self, idx: usize, b: u8) {
        if self.mode == Mode::Value && self.in_quotes {
            self.handle_quoted(idx, b);
            return;
        }
        match self.mode {
            Mode::Scheme => self.handle_scheme_special(idx, b),
            Mode::Key => self.handle_key_special(idx, b),
            Mode::Value => self.handle_value_special(idx, b),
        }
    }

    fn handle_scheme_special(&mut self, idx: usize, b: u8) {
        match b {
            _ if is_ws(b) => {
                if !self.scheme.is_empty() {
                    self.begin_params(idx);
                }
            }
            b',' => {
                // Leading commas before any scheme are tolerated; a comma
                // right after the scheme token still allows `key=value`
                // parameters to bind to it (the lookahead decides).
                if !self.scheme.is_empty() {
                    self.begin_params(idx);
                }
            }
            b'=' => {
                // The header began mid-parameter: the token was a key.
                self.key = std::mem::take(&mut self.scheme);
                self.key_start = self.scheme_start;
                if self.params_start.is_none() {
                    self.params_start = Some(self.key_start);
                    self.last_param_end = self.key_start;
                }
                self.mode = Mode::Value;
                self.value_start = None;
            }
            b'"' => {
                if !self.scheme.is_empty() {
                    self.begin_params(idx);
                } else {
                    self.params_start = Some(idx);
                }
                self.mode = Mode::Value;
                self.in_quotes = true;
                self.value_start = Some(idx);
            }
            b'\\' => {
                if self.scheme.is_empty() {
                    self.scheme_start = idx;
                }
                self.scheme.push('\\');
            }
            _ => unreachable!("scanner yielded a non-special byte"),
        }
    }

    fn handle_key_special(&mut self, idx: usize, b: u8) {
        match b {
            _ if is_ws(b) => {
                if !self.key.is_empty() && !self.lookahead_is_param() {
                    self.start_new_scheme(idx);
                }
            }
            b',' => {
                if !self.key.is_empty() {
                    // Token directly terminated by a comma: no `=` can
                    // follow, so it names a new scheme.
                    self.start_new_scheme(idx);
                }
            }
            b'=' => {
                self.mode = Mode::Value;
                self.value_start = None;
                self.escaped = false;
            }
            b'"' => {
                if !self.key.is_empty() {
                    self.start_new_scheme(idx);
                }
                self.mode = Mode::Value;
                self.in_quotes = true;
                self.value_start = Some(idx);
            }
            b'\\' => {
                if !self.key.is_empty() {
                    self.start_new_scheme(idx);
                }
                if self.key.is_empty() {
                    self.key_start = idx;
                }
                self.key.push('\\');
            }
            _ => unreachable!("scanner yielded a non-special byte"),
        }
    }

    fn handle_value_special(&mut self, idx: usize, b: u8) {
        match b {
            _ if is_ws(b) => {
                if self.value_start.is_some() {
                    self.flush_param(idx);
                    self.mode = Mode::Key;
                }
                // else: whitespace between `=` and the value, skipped
            }
            b',' => {
                self.flush_param(idx);
                self.mode = Mode::Key;
            }
            b'"' => {
                if self.value_start.is_none() {
                    self.in_quotes = true;
                    self.value_start = Some(idx);
                } else {
                    // Quote in the middle of an unquoted token: literal.
                    self.value.push('"');
                }
            }
            b'=' | b'\\' => {
                // Unquoted values may contain `=` (base64 padding) and
                // backslashes; escaping only exists inside quotes.
                if self.value_start.is_none() {
                    self.value_start = Some(idx);
                }
                self.value.push(b as char);
            }
            _ => unreachable!("scanner yielded a non-special byte"),
        }
    }

    fn handle_quoted(&mut self, idx: usize, b: u8) {
        if self.escaped {
            self.value.push(b as char);
            self.escaped = false;
            return;
        }
        match b {
            b'"' => {
                self.flush_param(idx + 1);
                self.in_quotes = false;
                self.mode = Mode::Key;
            }
            b'\\' => self.escaped = true,
            // Commas, whitespace and `=` are literal inside quotes.
            _ => self.value.push(b as char),
        }
    }

    /// The scheme token just ended at `idx`; parameters follow.
    fn begin_params(&mut self, idx: usize) {
        self.mode = Mode::Key;
        self.params_start = Some(idx);
        self.last_param_end = idx;
        self.key.clear();
    }

    /// A token after a whitespace boundary is a parameter key only if
    /// the next non-whitespace character is `=`; anything else (quote,
    /// comma, backslash, another token, end of input) makes it a new
    /// scheme name.
    fn lookahead_is_param(&self) -> bool {
        let mut i = self.pos;
        while i < self.bytes.len() && is_ws(self.bytes[i]) {
            i += 1;
        }
        i < self.bytes.len() && self.bytes[i] == b'='
    }

    /// The buffered key token turned out to name a new scheme: flush the
    /// accumulated entry, then start the next one at `boundary`.
    fn start_new_scheme(&mut self, boundary: usize) {
        self.flush_entry(self.last_param_end);
        self.scheme = std::mem::take(&mut self.key);
        self.scheme_start = self.key_start;
        self.params_start = Some(boundary);
        self.last_param_end = boundary;
        self.mode = Mode::Key;
    }

    fn flush_param(&mut self, value_end: usize) {
        let raw = match self.value_start {
            Some(start) if value_end > start => self.input[start..value_end].to_string(),
            _ => String::new(),
        };
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);
        if key.is_empty() && value.is_empty() && raw.is_empty() {
            self.value_start = None;
            return;
        }
        self.values.push(key.to_ascii_lowercase(), value);
        self.raw_values.push(key, raw);
        self.value_start = None;
        self.escaped = false;
        self.last_param_end = value_end;
    }

    fn flush_entry(&mut self, end: usize) {
        if self.scheme.is_empty() && self.values.is_empty() {
            self.params_start = None;
            return;
        }
        let raw_value = match self.params_start {
            Some(start) if end > start => self.input[start..end].trim().to_string(),
            _ => String::new(),
        };
        self.entries.push(ChallengeEntry {
            scheme: std::mem::take(&mut self.scheme),
            raw_value,
            values: std::mem::take(&mut self.values),
            raw_values: std::mem::take(&mut self.raw_values),
        });
        self.params_start = None;
    }

    fn finish(&mut self) {
        let end = self.bytes.len();
        match self.mode {
            Mode::Value => {
                // Covers the unterminated-quote case: end of string acts
                // as the missing terminator.
                self.flush_param(end);
                self.flush_entry(end);
            }
            Mode::Key => {
                if !self.key.is_empty() {
                    // Trailing bare token with no `=`: a new scheme.
                    self.flush_entry(self.last_param_end);
                    self.scheme = std::mem::take(&mut self.key);
                    self.params_start = None;
                }
                self.flush_entry(end);
            }
            Mode::Scheme => self.flush_entry(end),
        }
    }
}
