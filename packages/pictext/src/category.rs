//! Image categories and the candidate labels that describe them.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Where an image is routed after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Graph,
    Formula,
    Text,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Graph => "Graph",
            Category::Formula => "Formula",
            Category::Text => "Text",
        };
        f.pad(name)
    }
}

/// Candidate labels grouped by category, as `{"Graph": [...], "Formula": [...], "Text": [...]}`.
///
/// Label sets are expected to be disjoint but this is not enforced; when a
/// label appears twice, `Text` wins over `Formula`, which wins over `Graph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(rename = "Graph", default)]
    pub graph: Vec<String>,
    #[serde(rename = "Formula", default)]
    pub formula: Vec<String>,
    #[serde(rename = "Text", default)]
    pub text: Vec<String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        fn labels(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            graph: labels(&[
                "a picture including curve graph",
                "a picture including linear graph",
                "a picture including bar graph",
            ]),
            formula: labels(&[
                "equilibrium expression for a chemical",
                "formula including fraction or symbols",
            ]),
            text: labels(&[
                "a formula including Korean",
                "a sentence including Hangul",
                "a photo including Hangul",
                "a sentence including English",
            ]),
        }
    }
}

impl CategoryTable {
    /// Loads a table from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read category table {}", path.as_ref().display()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let table: CategoryTable =
            serde_json::from_str(contents).context("Failed to parse category table JSON")?;
        if table.candidate_labels().is_empty() {
            bail!("category table has no labels");
        }
        Ok(table)
    }

    pub fn labels(&self, category: Category) -> &[String] {
        match category {
            Category::Graph => &self.graph,
            Category::Formula => &self.formula,
            Category::Text => &self.text,
        }
    }

    /// Every label, flattened in Graph, Formula, Text order.
    pub fn candidate_labels(&self) -> Vec<String> {
        self.graph
            .iter()
            .chain(&self.formula)
            .chain(&self.text)
            .cloned()
            .collect()
    }

    /// Maps a classifier label back to its category. Unknown labels fall back
    /// to `Graph`, which is routed to the captioner.
    pub fn category_of(&self, label: &str) -> Category {
        if self.text.iter().any(|l| l == label) {
            Category::Text
        } else if self.formula.iter().any(|l| l == label) {
            Category::Formula
        } else {
            Category::Graph
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_labels_order() {
        let table = CategoryTable::default();
        let labels = table.candidate_labels();
        assert_eq!(labels.len(), 9);
        assert_eq!(labels[0], "a picture including curve graph");
        assert_eq!(labels[3], "equilibrium expression for a chemical");
        assert_eq!(labels[8], "a sentence including English");
    }

    #[test]
    fn test_category_of() {
        let table = CategoryTable::default();
        assert_eq!(table.category_of("a sentence including Hangul"), Category::Text);
        assert_eq!(table.category_of("a formula including Korean"), Category::Text);
        assert_eq!(
            table.category_of("formula including fraction or symbols"),
            Category::Formula
        );
        assert_eq!(table.category_of("a picture including bar graph"), Category::Graph);
        assert_eq!(table.category_of("something else entirely"), Category::Graph);
    }

    #[test]
    fn test_text_wins_on_overlap() {
        let table = CategoryTable {
            graph: vec!["shared".into()],
            formula: vec!["shared".into()],
            text: vec!["shared".into()],
        };
        assert_eq!(table.category_of("shared"), Category::Text);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(CategoryTable::default()).unwrap();
        assert_eq!(json["Graph"].as_array().unwrap().len(), 3);
        assert_eq!(json["Formula"].as_array().unwrap().len(), 2);
        assert_eq!(json["Text"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_from_json_partial_table() {
        let table = CategoryTable::from_json(r#"{"Text": ["a scanned page"]}"#).unwrap();
        assert!(table.graph.is_empty());
        assert_eq!(table.category_of("a scanned page"), Category::Text);
    }

    #[test]
    fn test_from_json_rejects_empty_table() {
        assert!(CategoryTable::from_json("{}").is_err());
        assert!(CategoryTable::from_json("not json").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Category::Formula.to_string(), "Formula");
    }
}
