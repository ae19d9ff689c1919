use crate::core::member::ReferralCode;
use crate::network::tree::TreeNode;

/// Count matched pairs across a whole tree.
///
/// A node forms one pair when both its children exist and both are
/// eligible. An ineligible child breaks the pair at that position even
/// if its own children are eligible. Pairs are counted at every level.
pub fn count_pairs(node: Option<&TreeNode>) -> u32 {
    let Some(node) = node else {
        return 0;
    };
    u32::from(forms_pair(node)) + count_pairs(node.left()) + count_pairs(node.right())
}

/// Referral codes of the nodes that form a pair, in pre-order.
pub fn pair_positions(node: Option<&TreeNode>) -> Vec<ReferralCode> {
    node.map(|n| {
        n.preorder()
            .into_iter()
            .filter(|n| forms_pair(n))
            .map(|n| n.referral_code().clone())
            .collect()
    })
    .unwrap_or_default()
}

fn forms_pair(node: &TreeNode) -> bool {
    matches!(
        (node.left(), node.right()),
        (Some(left), Some(right)) if left.is_eligible && right.is_eligible
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::member::{Member, UserId};

    fn node(code: &str, eligible: bool, left: Option<TreeNode>, right: Option<TreeNode>) -> TreeNode {
        let mut member = Member::new(UserId::new(code), ReferralCode::new(code));
        if eligible {
            member = member.approved();
        }
        let mut n = TreeNode::leaf(member, 0);
        n.left = left.map(Box::new);
        n.right = right.map(Box::new);
        n
    }

    fn leaf(code: &str, eligible: bool) -> Option<TreeNode> {
        Some(node(code, eligible, None, None))
    }

    #[test]
    fn test_empty_tree_has_no_pairs() {
        assert_eq!(count_pairs(None), 0);
        assert!(pair_positions(None).is_empty());
    }

    #[test]
    fn test_single_pair_at_root() {
        let tree = node("ROOT", true, leaf("L", true), leaf("R", true));
        assert_eq!(count_pairs(Some(&tree)), 1);
    }

    #[test]
    fn test_root_eligibility_does_not_matter_for_own_pair() {
        let tree = node("ROOT", false, leaf("L", true), leaf("R", true));
        assert_eq!(count_pairs(Some(&tree)), 1);
    }

    #[test]
    fn test_one_sided_tree_has_no_pairs() {
        let tree = node("ROOT", true, leaf("L", true), None);
        assert_eq!(count_pairs(Some(&tree)), 0);
    }

    #[test]
    fn test_ineligible_child_breaks_pair() {
        let left = node("L", false, leaf("LL", true), leaf("LR", true));
        let tree = node("ROOT", true, Some(left), leaf("R", true));
        // ROOT loses its pair, L still forms one below it
        assert_eq!(count_pairs(Some(&tree)), 1);
        assert_eq!(pair_positions(Some(&tree)), vec![ReferralCode::new("L")]);
    }

    #[test]
    fn test_pairs_counted_at_every_level() {
        let left = node("L", true, leaf("LL", true), leaf("LR", true));
        let right = node("R", true, leaf("RL", true), leaf("RR", true));
        let tree = node("ROOT", true, Some(left), Some(right));
        assert_eq!(count_pairs(Some(&tree)), 3);
        let codes: Vec<String> = pair_positions(Some(&tree))
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(codes, vec!["ROOT", "L", "R"]);
    }

    #[test]
    fn test_completing_a_pair_adds_exactly_one() {
        let incomplete = node("ROOT", true, leaf("L", true), None);
        let complete = node("ROOT", true, leaf("L", true), leaf("R", true));
        assert_eq!(
            count_pairs(Some(&complete)),
            count_pairs(Some(&incomplete)) + 1
        );
    }
}
