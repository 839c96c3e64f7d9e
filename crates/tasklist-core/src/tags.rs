use crate::task::Task;

pub const ALL_TAGS_OPTION: &str = "all";

/// Distinct tags across all tasks, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCatalog {
    tags: Vec<String>,
}

impl TagCatalog {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in tasks.iter().flat_map(|t| t.tags.iter()) {
            if !tags.iter().any(|seen| seen == tag) {
                tags.push(tag.clone());
            }
        }
        Self { tags }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Choices for the tag selector, led by the universal option.
    pub fn options(&self) -> Vec<String> {
        std::iter::once(ALL_TAGS_OPTION.to_string())
            .chain(self.tags.iter().cloned())
            .collect()
    }
}
