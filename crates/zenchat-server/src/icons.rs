//! Member icon assignment.

use zenchat_core::Environment;

/// Icons assigned to members when no custom set is configured.
pub const DEFAULT_ICONS: &[&str] =
    &["🦊", "🐼", "🐨", "🐯", "🦁", "🐸", "🐵", "🐧", "🐙", "🦄", "🐝", "🐢"];

/// Non-empty set of icons drawn from on every join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
    icons: Vec<String>,
}

impl IconSet {
    /// Build a set from the given icons. `None` if the set would be empty.
    pub fn new<I, S>(icons: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let icons: Vec<String> = icons.into_iter().map(Into::into).collect();
        if icons.is_empty() { None } else { Some(Self { icons }) }
    }

    /// Pick an icon uniformly at random.
    pub fn pick<E: Environment>(&self, env: &E) -> &str {
        // `icons` is never empty and `random_index` stays below its bound.
        &self.icons[env.random_index(self.icons.len())]
    }

    /// Whether `icon` belongs to this set.
    pub fn contains(&self, icon: &str) -> bool {
        self.icons.iter().any(|i| i == icon)
    }

    /// Number of icons.
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Whether the set holds no icons.
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl Default for IconSet {
    fn default() -> Self {
        Self { icons: DEFAULT_ICONS.iter().map(|icon| (*icon).to_string()).collect() }
    }
}
