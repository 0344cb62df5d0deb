//! Nested tree payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quire_core::{Entry, Group, Notebook, Page, Subgroup};

/// Notebook header plus one page of groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookTree {
    pub notebook: Notebook,
    pub groups: Page<GroupNode>,
}

impl NotebookTree {
    pub fn group(&self, id: Uuid) -> Option<&GroupNode> {
        self.groups.data.iter().find(|node| node.group.id == id)
    }
}

/// A group with its optional subgroups block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    #[serde(flatten)]
    pub group: Group,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroups: Option<Page<SubgroupNode>>,
}

impl GroupNode {
    pub fn subgroup(&self, id: Uuid) -> Option<&SubgroupNode> {
        self.subgroups
            .as_ref()?
            .data
            .iter()
            .find(|node| node.subgroup.id == id)
    }
}

/// A subgroup with its optional entries block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupNode {
    #[serde(flatten)]
    pub subgroup: Subgroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Page<Entry>>,
}
