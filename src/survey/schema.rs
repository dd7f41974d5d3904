//! Declarative survey layout.
//!
//! A survey sheet is a fixed sequence of identity columns followed by
//! competency groups, each a run of Likert item columns. Survey variants
//! differ only in labels, group names and item counts, so one [`Schema`]
//! value replaces per-variant column lists.

use crate::config::SurveyConfig;
use crate::error::{SurveyError, SurveyResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

/// Semantic role of a pass-through identity column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IdentityField {
    Timestamp,
    Gender,
    Grade,
    Class,
    Number,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Timestamp => write!(f, "timestamp"),
            IdentityField::Gender => write!(f, "gender"),
            IdentityField::Grade => write!(f, "grade"),
            IdentityField::Class => write!(f, "class"),
            IdentityField::Number => write!(f, "number"),
        }
    }
}

/// An identity column: its role and the header label shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityColumn {
    pub field: IdentityField,
    pub label: String,
}

impl IdentityColumn {
    pub fn new(field: IdentityField, label: &str) -> Self {
        Self {
            field,
            label: label.to_string(),
        }
    }
}

/// A named cluster of Likert items measuring one competency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyGroup {
    pub name: String,
    pub items: Vec<String>,
}

impl CompetencyGroup {
    /// Builds a group whose items are named `<name>1..=<name>N`.
    pub fn numbered(name: &str, item_count: usize) -> Self {
        Self {
            name: name.to_string(),
            items: (1..=item_count).map(|i| format!("{}{}", name, i)).collect(),
        }
    }
}

/// Ordered column layout of one survey variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub identity: Vec<IdentityColumn>,
    pub groups: Vec<CompetencyGroup>,
}

/// Competency groups of the Daegu future-school survey, in sheet order.
pub const DAEGU_GROUPS: [&str; 4] = [
    "공감소통역량",
    "창의융합적사고역량",
    "자기관리역량",
    "공동체역량",
];

/// Items per competency group in the Daegu survey.
pub const DAEGU_ITEMS_PER_GROUP: usize = 6;

pub fn default_identity_columns() -> Vec<IdentityColumn> {
    vec![
        IdentityColumn::new(IdentityField::Timestamp, "Timestamp"),
        IdentityColumn::new(IdentityField::Gender, "성별"),
        IdentityColumn::new(IdentityField::Grade, "학년"),
        IdentityColumn::new(IdentityField::Class, "학반"),
        IdentityColumn::new(IdentityField::Number, "번호"),
    ]
}

impl Default for Schema {
    fn default() -> Self {
        Self::daegu()
    }
}

impl Schema {
    /// The 29-column Daegu survey (`A`..`AC`).
    pub fn daegu() -> Self {
        Self {
            identity: default_identity_columns(),
            groups: DAEGU_GROUPS
                .iter()
                .map(|name| CompetencyGroup::numbered(name, DAEGU_ITEMS_PER_GROUP))
                .collect(),
        }
    }

    /// Build and validate a schema from the `[survey]` config section.
    pub fn from_config(config: &SurveyConfig) -> SurveyResult<Self> {
        let schema = Self {
            identity: config.identity.clone(),
            groups: config
                .groups
                .iter()
                .map(|name| CompetencyGroup::numbered(name, config.items_per_group))
                .collect(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Reject layouts the aggregator cannot work with.
    pub fn validate(&self) -> SurveyResult<()> {
        if self.groups.is_empty() {
            return Err(SurveyError::InvalidSchema {
                detail: "at least one competency group is required".to_string(),
            });
        }

        if let Some(group) = self.groups.iter().find(|g| g.items.is_empty()) {
            return Err(SurveyError::InvalidSchema {
                detail: format!("competency group {} has no items", group.name),
            });
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(SurveyError::InvalidSchema {
                    detail: format!("duplicate competency group {}", group.name),
                });
            }
        }

        let mut fields = HashSet::new();
        for column in &self.identity {
            if !fields.insert(column.field) {
                return Err(SurveyError::InvalidSchema {
                    detail: format!("identity field {} declared twice", column.field),
                });
            }
        }

        Ok(())
    }

    /// Total number of columns a data row must have.
    pub fn width(&self) -> usize {
        self.identity.len() + self.item_count()
    }

    /// Number of competency item columns across all groups.
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Column names in sheet order.
    pub fn column_names(&self) -> Vec<String> {
        self.identity
            .iter()
            .map(|c| c.label.clone())
            .chain(self.groups.iter().flat_map(|g| g.items.iter().cloned()))
            .collect()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    /// Position of an identity field among the identity columns.
    pub fn identity_index(&self, field: IdentityField) -> Option<usize> {
        self.identity.iter().position(|c| c.field == field)
    }

    /// Display label of an identity field, falling back to its role name.
    pub fn identity_label(&self, field: IdentityField) -> String {
        self.identity
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| field.to_string())
    }

    /// Indices into a row's score vector covered by group `index`.
    pub fn item_span(&self, index: usize) -> Range<usize> {
        let start: usize = self.groups[..index].iter().map(|g| g.items.len()).sum();
        start..start + self.groups[index].items.len()
    }
}
