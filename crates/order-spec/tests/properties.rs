use proptest::prelude::*;

use order_spec::{Registry, Selection, ValidationOutcome, apply_edit, validate};

/// An edit: group index plus option indices, both wrapped into range when applied.
type Edit = (usize, Vec<usize>);

fn edits() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(
        (0usize..32, prop::collection::vec(0usize..8, 0..4)),
        0..24,
    )
}

fn values_for(registry: &Registry, edit: &Edit) -> (usize, Vec<String>) {
    let index = edit.0 % registry.groups.len();
    let options = &registry.groups[index].options;
    let values = edit
        .1
        .iter()
        .map(|option| options[option % options.len()].clone())
        .collect();
    (index, values)
}

fn replay(registry: &Registry, edits: &[Edit]) -> Selection {
    edits.iter().fold(Selection::new(), |selection, edit| {
        let (index, values) = values_for(registry, edit);
        apply_edit(registry, &selection, &registry.groups[index], &values)
    })
}

proptest! {
    #[test]
    fn single_choice_groups_hold_at_most_one_token(history in edits(), last in (0usize..32, prop::collection::vec(0usize..8, 0..4))) {
        let registry = Registry::order_config();
        let before = replay(&registry, &history);
        let (index, values) = values_for(&registry, &last);
        let after = apply_edit(&registry, &before, &registry.groups[index], &values);

        for group in &registry.groups {
            if !registry.is_multi_choice(group) {
                prop_assert!(after.within(&group.options).count() <= 1, "{} in {:?}", group.title, after);
            }
        }

        let added: Vec<&String> = after.difference(&before).collect();
        for group in &registry.groups {
            if added.iter().any(|token| group.is_reset_by(token)) {
                prop_assert!(!group.is_answered(&after), "{} survived reset in {:?}", group.title, after);
            }
        }
    }

    #[test]
    fn reapplying_current_values_is_a_no_op(history in edits(), group in 0usize..32) {
        let registry = Registry::order_config();
        let selection = replay(&registry, &history);
        let group = &registry.groups[group % registry.groups.len()];
        let current: Vec<String> = selection.within(&group.options).cloned().collect();
        let again = apply_edit(&registry, &selection, group, &current);
        prop_assert_eq!(again, selection);
    }

    #[test]
    fn validation_is_deterministic(history in edits()) {
        let registry = Registry::order_config();
        let selection = replay(&registry, &history);
        let first = validate(&registry, &selection);
        prop_assert_eq!(&first, &validate(&registry, &selection.clone()));
        if let ValidationOutcome::Missing { group } = &first {
            prop_assert!(registry.variants(group).any(|variant| variant.required));
        }
    }
}
