use crate::core::member::{Member, ReferralCode};
use crate::core::rates::MAX_TREE_DEPTH;
use crate::network::directory::{DirectoryError, DownlineRepository};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Errors raised while assembling a downline tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A member appears among its own descendants. The directory data is corrupt.
    #[error("cycle detected: {code} appears among its own descendants")]
    CycleDetected { code: ReferralCode },
    /// A member is placed in more than one downline slot.
    #[error("{code} occupies more than one slot in the tree")]
    DuplicatePlacement { code: ReferralCode },
    #[error("tree depth {depth} exceeds the maximum of {max}")]
    DepthTooLarge { depth: u32, max: u32 },
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// A member placed in a binary downline tree.
///
/// Trees are rebuilt for every calculation and never cached.
/// The root sits at level 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub member: Member,
    pub left: Option<Box<TreeNode>>,
    pub right: Option<Box<TreeNode>>,
    pub level: u32,
    pub is_eligible: bool,
}

/// Member counts of the two legs under a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LegCounts {
    pub left_members: u32,
    pub right_members: u32,
    pub left_eligible: u32,
    pub right_eligible: u32,
}

impl TreeNode {
    /// A leaf node for `member` at `level`.
    pub fn leaf(member: Member, level: u32) -> Self {
        let is_eligible = member.is_eligible();
        Self {
            member,
            left: None,
            right: None,
            level,
            is_eligible,
        }
    }

    pub fn referral_code(&self) -> &ReferralCode {
        &self.member.referral_code
    }

    pub fn left(&self) -> Option<&TreeNode> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&TreeNode> {
        self.right.as_deref()
    }

    /// Number of members in this subtree, this node included.
    pub fn size(&self) -> u32 {
        1 + self.left().map_or(0, TreeNode::size) + self.right().map_or(0, TreeNode::size)
    }

    /// Number of eligible members in this subtree, this node included.
    pub fn eligible_count(&self) -> u32 {
        u32::from(self.is_eligible)
            + self.left().map_or(0, TreeNode::eligible_count)
            + self.right().map_or(0, TreeNode::eligible_count)
    }

    /// Number of levels in this subtree, this node included.
    pub fn height(&self) -> u32 {
        1 + self
            .left()
            .map_or(0, TreeNode::height)
            .max(self.right().map_or(0, TreeNode::height))
    }

    /// Member and eligible counts of the left and right legs.
    pub fn leg_counts(&self) -> LegCounts {
        LegCounts {
            left_members: self.left().map_or(0, TreeNode::size),
            right_members: self.right().map_or(0, TreeNode::size),
            left_eligible: self.left().map_or(0, TreeNode::eligible_count),
            right_eligible: self.right().map_or(0, TreeNode::eligible_count),
        }
    }

    /// Nodes of this subtree in pre-order (node, left, right).
    pub fn preorder(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(right) = node.right() {
                stack.push(right);
            }
            if let Some(left) = node.left() {
                stack.push(left);
            }
        }
        out
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, prefix: &str, slot: &str) -> fmt::Result {
        let marker = if self.is_eligible { "*" } else { " " };
        writeln!(f, "{}{}{}{}", prefix, slot, self.referral_code(), marker)?;
        let child_prefix = format!("{}    ", prefix);
        if let Some(left) = self.left() {
            left.write_indented(f, &child_prefix, "L: ")?;
        }
        if let Some(right) = self.right() {
            right.write_indented(f, &child_prefix, "R: ")?;
        }
        Ok(())
    }
}

/// Renders the tree one member per line; eligible members carry a `*`.
impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, "", "")
    }
}

/// Build the downline tree rooted at `root`, at most `max_depth` levels deep.
///
/// The whole subtree is fetched with a single `load_subtree` call.
/// Returns `Ok(None)` when `root` is unknown or `max_depth` is zero.
/// `max_depth` may not exceed [`MAX_TREE_DEPTH`].
/// Slots below the depth bound are left empty, as are slots naming a
/// member the directory does not know.
///
/// # Errors
///
/// [`TreeError::CycleDetected`] if a member is its own descendant,
/// [`TreeError::DuplicatePlacement`] if a member fills two slots,
/// [`TreeError::DepthTooLarge`] for an out-of-range depth, and
/// [`TreeError::Directory`] if the lookup itself fails.
///
/// A slot pointing back at a member on the current path is a cycle even
/// when it sits below the depth bound.
pub fn build_tree<R: DownlineRepository + ?Sized>(
    repo: &R,
    root: &ReferralCode,
    max_depth: u32,
) -> Result<Option<TreeNode>, TreeError> {
    if max_depth > MAX_TREE_DEPTH {
        return Err(TreeError::DepthTooLarge {
            depth: max_depth,
            max: MAX_TREE_DEPTH,
        });
    }
    if max_depth == 0 {
        return Ok(None);
    }
    let members = repo.load_subtree(root, max_depth)?;
    if !members.contains_key(root) {
        debug!("referral code {} not found", root);
        return Ok(None);
    }

    let mut builder = TreeBuilder {
        members: &members,
        max_depth,
        path: HashSet::new(),
        placed: HashSet::new(),
    };
    builder.build(root, 0)
}

struct TreeBuilder<'a> {
    members: &'a HashMap<ReferralCode, Member>,
    max_depth: u32,
    /// Codes on the path from the root to the node being built.
    path: HashSet<ReferralCode>,
    /// Codes already placed anywhere in the tree.
    placed: HashSet<ReferralCode>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, code: &ReferralCode, level: u32) -> Result<Option<TreeNode>, TreeError> {
        if self.path.contains(code) {
            return Err(TreeError::CycleDetected { code: code.clone() });
        }
        if self.placed.contains(code) {
            return Err(TreeError::DuplicatePlacement { code: code.clone() });
        }
        if level >= self.max_depth {
            return Ok(None);
        }
        let Some(member) = self.members.get(code) else {
            warn!("downline slot points at unknown referral code {}", code);
            return Ok(None);
        };
        self.placed.insert(code.clone());

        self.path.insert(code.clone());
        let left = match &member.left_down_line {
            Some(child) => self.build(child, level + 1)?,
            None => None,
        };
        let right = match &member.right_down_line {
            Some(child) => self.build(child, level + 1)?,
            None => None,
        };
        self.path.remove(code);

        let mut node = TreeNode::leaf(member.clone(), level);
        node.left = left.map(Box::new);
        node.right = right.map(Box::new);
        Ok(Some(node))
    }
}
