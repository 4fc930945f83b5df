use crate::models::{CategoryRule, WorkItem};

/// Assigns work items to Batch 1 categories by parent id
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<CategoryRule>,
}

impl Categorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Category of the item, or `None` when its parent is in no set.
    /// Uncategorized items are left out of every report.
    pub fn categorize(&self, item: &WorkItem) -> Option<&str> {
        self.category_for_parent(item.parent)
    }

    pub fn category_for_parent(&self, parent: u64) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.parents.contains(&parent))
            .map(|rule| rule.name.as_str())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(crate::models::ReportConfig::default().categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sets() {
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.category_for_parent(3136758),
            Some("Client Communications")
        );
        assert_eq!(
            categorizer.category_for_parent(3107305),
            Some("Client Communications")
        );
        assert_eq!(
            categorizer.category_for_parent(3680361),
            Some("Workpapers (incl. Workpaper Properties)")
        );
        assert_eq!(categorizer.category_for_parent(1), None);
    }

    #[test]
    fn test_first_rule_wins() {
        let categorizer = Categorizer::new(vec![
            CategoryRule::new("First", &[5]),
            CategoryRule::new("Second", &[5, 6]),
        ]);
        assert_eq!(categorizer.category_for_parent(5), Some("First"));
        assert_eq!(categorizer.category_for_parent(6), Some("Second"));
    }
}
