//! Presence roster: the ordered set of participant display labels.
//!
//! Labels are plain display names, with the local participant shown as
//! `"name (You)"`. Deduplication is by exact string match only; distinct
//! participants sharing a display name collide into one label.

/// Ordered, deduplicated set of display labels.
#[derive(Debug, Clone)]
pub struct Roster {
    local_name: String,
    labels: Vec<String>,
}

impl Roster {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            labels: Vec::new(),
        }
    }

    fn local_label(&self) -> String {
        format!("{} (You)", self.local_name)
    }

    fn add(&mut self, label: String) -> bool {
        if self.labels.contains(&label) {
            false
        } else {
            self.labels.push(label);
            true
        }
    }

    /// Add the local participant's own label. Returns true if the roster
    /// changed.
    pub fn announce_self(&mut self) -> bool {
        let label = self.local_label();
        self.add(label)
    }

    /// Record an observed announce. A peer announcing our own name is shown
    /// as the local label (self-detection by name equality).
    pub fn observe(&mut self, username: &str) -> bool {
        let label = if username == self.local_name {
            self.local_label()
        } else {
            username.to_string()
        };
        self.add(label)
    }

    /// Remove any label exactly equal to `name` or `"name (You)"`.
    pub fn remove(&mut self, name: &str) -> bool {
        let you = format!("{name} (You)");
        let before = self.labels.len();
        self.labels.retain(|l| l != name && *l != you);
        self.labels.len() != before
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
