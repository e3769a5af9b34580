//! Include/exclude pattern lists

/// Ordered, de-duplicated list of glob patterns parsed from newline-separated text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<String>,
}

impl PatternSet {
    /// Parse every non-blank line as a pattern
    pub fn parse(text: &str) -> Self {
        let mut set = Self::default();
        for line in text.lines() {
            set.push(line.trim());
        }
        set
    }

    /// Parse patterns for one component.
    ///
    /// A line written as `glob=componentName` only applies to that component;
    /// lines without the suffix apply to every component.
    pub fn for_component(text: &str, component: &str) -> Self {
        let mut set = Self::default();
        for line in text.lines() {
            let line = line.trim();
            match line.rsplit_once('=') {
                Some((glob, target)) => {
                    if target.trim() == component {
                        set.push(glob.trim());
                    }
                }
                None => set.push(line),
            }
        }
        set
    }

    fn push(&mut self, pattern: &str) {
        if !pattern.is_empty() && !self.patterns.iter().any(|p| p == pattern) {
            self.patterns.push(pattern.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
