use crate::selection::Selection;
use crate::spec::{OptionGroup, Registry};

/// A group is applicable unless its condition evaluates to exactly `false`.
pub fn is_applicable(group: &OptionGroup, selection: &Selection) -> bool {
    match &group.condition {
        None => true,
        Some(condition) => condition.evaluate(selection) != Some(false),
    }
}

/// Applicable groups in registry order.
pub fn applicable_groups<'a, 's>(
    registry: &'a Registry,
    selection: &'s Selection,
) -> impl Iterator<Item = &'a OptionGroup> + 's
where
    'a: 's,
{
    registry
        .groups
        .iter()
        .filter(move |group| is_applicable(group, selection))
}

/// Applicability flag for every group, aligned with `registry.groups`.
pub fn resolve_visibility(registry: &Registry, selection: &Selection) -> Vec<bool> {
    registry
        .groups
        .iter()
        .map(|group| is_applicable(group, selection))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::catalogue::{COLOR_SAMPLE, PLATE_MAKING, REORDER_CHANGES};

    #[test]
    fn root_groups_are_always_applicable() {
        let registry = Registry::order_config();
        let titles: Vec<_> = applicable_groups(&registry, &Selection::new())
            .map(|group| group.title.as_str())
            .collect();
        assert_eq!(titles, vec!["单据类型", "品类", "复杂度", "产能", "二次工艺"]);
    }

    #[test]
    fn branch_groups_follow_the_unit_type() {
        let registry = Registry::order_config();
        let selection = Selection::from_tokens(["首单", "不需要打板"]);
        let titles: Vec<_> = applicable_groups(&registry, &selection)
            .map(|group| (group.title.as_str(), group.level))
            .collect();
        assert!(titles.contains(&(PLATE_MAKING, 2)));
        assert!(titles.contains(&(COLOR_SAMPLE, 3)));
        assert!(!titles.contains(&(COLOR_SAMPLE, 4)));
        assert!(!titles.iter().any(|(title, _)| *title == REORDER_CHANGES));
    }

    #[test]
    fn undecided_condition_counts_as_applicable() {
        let group = OptionGroup::new("g", ["a"]).when(crate::expr::Condition::AllOf {
            tokens: vec![],
        });
        assert!(is_applicable(&group, &Selection::new()));
        let hidden = OptionGroup::new("h", ["b"]).when(crate::expr::Condition::LiteralBool {
            value: false,
        });
        assert!(!is_applicable(&hidden, &Selection::new()));
    }

    #[test]
    fn visibility_aligns_with_groups() {
        let registry = Registry::order_config();
        let visibility = resolve_visibility(&registry, &Selection::from_tokens(["翻单"]));
        assert_eq!(visibility.len(), registry.groups.len());
        assert!(visibility[2]);
        assert!(!visibility[1]);
    }
}
