use serde::Serialize;

/// One tracked object's two-line element set, as found in a feed.
///
/// Only the lexical shape is guaranteed: three trimmed lines. Whether
/// `line1` and `line2` actually describe an orbit is decided when the
/// record is handed to a propagator.
/// https://en.wikipedia.org/wiki/Two-line_element_set
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct ElementRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl ElementRecord {
    pub fn new<N, L1, L2>(name: N, line1: L1, line2: L2) -> Self
    where
        N: AsRef<str>,
        L1: AsRef<str>,
        L2: AsRef<str>,
    {
        Self {
            name: name.as_ref().trim().to_string(),
            line1: line1.as_ref().trim().to_string(),
            line2: line2.as_ref().trim().to_string(),
        }
    }

    /// NORAD catalog number from columns 3-7 of line 1, when it is purely numeric
    pub fn catalog_number(&self) -> Option<u32> {
        self.line1.get(2..7)?.trim().parse().ok()
    }
}
