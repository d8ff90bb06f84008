/// Node identifier allocation
///
/// Each editor owns its own allocator, so two open workflows never share a
/// sequence. Loading a document reseeds it past the highest `node_<N>` present.

/// Prefix of every editor-allocated node id
pub const NODE_ID_PREFIX: &str = "node_";

/// Issues `node_1`, `node_2`, ... for one loaded workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    /// `None` once the sequence has run past `u64::MAX`
    next: Option<u64>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: Some(1) }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for which `in_use` is false
    ///
    /// Suffixes strictly increase while the sequence lasts. Once it is exhausted the
    /// lowest free suffix is issued instead.
    pub fn next_id(&mut self, in_use: impl Fn(&str) -> bool) -> String {
        while let Some(suffix) = self.next {
            self.next = suffix.checked_add(1);
            let id = format_id(suffix);
            if !in_use(&id) {
                return id;
            }
        }

        // terminates: a graph holds finitely many ids
        let mut suffix: u64 = 1;
        loop {
            let id = format_id(suffix);
            if !in_use(&id) {
                return id;
            }
            suffix += 1;
        }
    }

    /// Numeric suffix the next call to [`next_id`](Self::next_id) will try first
    pub fn peek(&self) -> Option<u64> {
        self.next
    }

    /// Restart the sequence after the highest `node_<digits>` id in `ids`
    ///
    /// Ids that do not match the pattern are ignored; with no match the sequence
    /// restarts at 1.
    pub fn reseed<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let max = ids.into_iter().filter_map(Self::parse_suffix).max().unwrap_or(0);
        self.next = max.checked_add(1);
    }

    /// Numeric part of a `node_<digits>` id
    pub fn parse_suffix(id: &str) -> Option<u64> {
        let digits = id.strip_prefix(NODE_ID_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

fn format_id(suffix: u64) -> String {
    format!("{NODE_ID_PREFIX}{suffix}")
}
