use std::sync::Arc;

use order_spec::{
    DoneReason, EditError, FlowError, Phase, Registry, Retarget, Selection, Session, Submission, Target,
    ValidationOutcome, apply_edit, edit_group, resolve_group, validate,
};

fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn session_for(record: &str) -> Session {
    let mut session = Session::new(Arc::new(Registry::order_config()));
    assert_eq!(
        session.retarget(Some(Target::new("tbl", record))),
        Retarget::Reset
    );
    session
}

fn answer_root_groups(session: &mut Session) {
    session.edit("品类", &tokens(&["牛仔"])).expect("category");
    session.edit("复杂度", &tokens(&["复杂款"])).expect("complexity");
    session.edit("产能", &tokens(&["有产能"])).expect("capacity");
}

#[test]
fn first_order_without_plate_requires_color_sample() {
    let registry = Registry::order_config();
    let selection = Selection::from_tokens(["首单"]);

    let next = edit_group(&registry, &selection, "是否要打板", &tokens(&["不需要打板"]))
        .expect("edit");
    assert_eq!(next.as_slice(), &tokens(&["首单", "不需要打板"]));

    assert_eq!(
        validate(&registry, &next),
        ValidationOutcome::Missing {
            group: "批色样".into()
        }
    );
    let variant = resolve_group(&registry, &next, "批色样").expect("group");
    assert_eq!(variant.level, 3);

    let answered = apply_edit(&registry, &next, variant, &tokens(&["不要批色样"]));
    assert_eq!(
        answered.as_slice(),
        &tokens(&["首单", "不需要打板", "不要批色样"])
    );
    assert_eq!(
        validate(&registry, &answered),
        ValidationOutcome::Missing {
            group: "品类".into()
        }
    );
}

#[test]
fn switching_to_reorder_drops_first_order_answers() {
    let registry = Registry::order_config();
    let selection = Selection::from_tokens(["首单", "需要打板"]);
    let next = edit_group(&registry, &selection, "单据类型", &tokens(&["首单", "翻单"]))
        .expect("edit");
    assert_eq!(next.as_slice(), &tokens(&["翻单"]));

    let with_sample = Selection::from_tokens(["首单", "不需要打板", "要批色样"]);
    let next = edit_group(&registry, &with_sample, "单据类型", &tokens(&["翻单"])).expect("edit");
    assert_eq!(next.as_slice(), &tokens(&["翻单"]));
}

#[test]
fn unchanged_reorder_commits_without_prompt() {
    let mut session = session_for("rec-c");
    session.edit("单据类型", &tokens(&["翻单"])).expect("edit");
    session
        .edit("翻单变动", &tokens(&["无变动不需要修改"]))
        .expect("edit");
    answer_root_groups(&mut session);
    session.edit("二次工艺", &tokens(&["印花"])).expect("edit");

    let Submission::Commit(request) = session.submit().expect("submit") else {
        panic!("expected a direct commit");
    };
    assert_eq!(request.target, Target::new("tbl", "rec-c"));
    assert_eq!(
        request.tokens,
        tokens(&["翻单", "无变动不需要修改", "牛仔", "复杂款", "有产能", "印花"])
    );
    assert!(session.is_busy());

    assert_eq!(session.complete_commit(Ok(())), Ok(DoneReason::Committed));
    assert!(session.selection().is_empty());
    assert!(session.target().is_none());
}

#[test]
fn changed_reorder_confirms_fabric_test() {
    let mut session = session_for("rec-d");
    session.edit("单据类型", &tokens(&["翻单"])).expect("edit");
    session
        .edit("翻单变动", &tokens(&["有变动需要修改"]))
        .expect("edit");
    answer_root_groups(&mut session);
    let snapshot = session.selection().clone();

    assert_eq!(session.submit().expect("submit"), Submission::SecondaryPrompt);
    assert!(matches!(session.phase(), Phase::SecondaryPromptOpen { draft, .. } if *draft == snapshot));

    let request = session
        .confirm_secondary(Some("需要面料测试"))
        .expect("confirm");
    let mut expected = snapshot.into_vec();
    expected.push("需要面料测试".into());
    assert_eq!(request.tokens, expected);
}

#[test]
fn confirming_without_choice_keeps_prompt_open() {
    let mut session = session_for("rec-e");
    session.edit("单据类型", &tokens(&["首单"])).expect("edit");
    answer_root_groups(&mut session);
    let before = session.selection().clone();
    assert_eq!(session.submit().expect("submit"), Submission::SecondaryPrompt);

    let err = session.confirm_secondary(None).unwrap_err();
    assert_eq!(
        err,
        FlowError::SecondaryPromptIncomplete {
            prompt: "面料测试".into()
        }
    );
    assert_eq!(err.to_string(), "please choose one option in 【面料测试】");
    assert_eq!(session.phase().name(), "secondary_prompt_open");
    assert_eq!(session.selection(), &before);
}

#[test]
fn prompt_choice_is_single_and_validated() {
    let mut session = session_for("rec-f");
    session.edit("单据类型", &tokens(&["首单"])).expect("edit");
    answer_root_groups(&mut session);
    session.submit().expect("submit");

    let choice = session
        .select_secondary(&tokens(&["需要面料测试", "不需要面料测试"]))
        .expect("choose");
    assert_eq!(choice.as_slice(), &tokens(&["不需要面料测试"]));
    assert!(matches!(
        session.select_secondary(&tokens(&["牛仔"])),
        Err(FlowError::Edit(_))
    ));

    let request = session.confirm_secondary(None).expect("confirm");
    assert_eq!(request.tokens.last().map(String::as_str), Some("不需要面料测试"));
}

#[test]
fn failed_save_still_discards_the_selection() {
    let mut session = session_for("rec-g");
    session.edit("单据类型", &tokens(&["翻单"])).expect("edit");
    session
        .edit("翻单变动", &tokens(&["无变动不需要修改"]))
        .expect("edit");
    answer_root_groups(&mut session);
    session.submit().expect("submit");

    let reason = session
        .complete_commit(Err("disk full".into()))
        .expect("complete");
    assert_eq!(
        reason,
        DoneReason::Discarded {
            message: "disk full".into()
        }
    );
    assert_eq!(session.phase(), &Phase::Done(reason));
    assert!(session.selection().is_empty());
    assert!(session.target().is_none());
}

#[test]
fn target_change_during_prompt_discards_everything() {
    let mut session = session_for("rec-h");
    session.edit("单据类型", &tokens(&["首单"])).expect("edit");
    answer_root_groups(&mut session);
    session.submit().expect("submit");
    session
        .select_secondary(&tokens(&["需要面料测试"]))
        .expect("choose");

    assert_eq!(
        session.retarget(Some(Target::new("tbl", "rec-i"))),
        Retarget::Reset
    );
    assert_eq!(session.phase(), &Phase::Editing);
    assert!(session.selection().is_empty());
    assert!(session.secondary_choice().is_none());

    assert_eq!(session.retarget(None), Retarget::Reset);
    assert_eq!(session.phase(), &Phase::Idle);
}

#[test]
fn hidden_branch_groups_reject_edits() {
    let mut session = session_for("rec-j");
    session.edit("单据类型", &tokens(&["首单"])).expect("edit");
    let before = session.selection().clone();

    let err = session
        .edit("翻单变动", &tokens(&["无变动不需要修改"]))
        .unwrap_err();
    assert_eq!(err, FlowError::Edit(EditError::NotApplicable("翻单变动".into())));
    assert_eq!(err.to_string(), "【翻单变动】 does not apply to the current selection");
    assert_eq!(session.selection(), &before);
    assert_eq!(session.phase(), &Phase::Editing);

    assert!(session.edit("特殊订单", &tokens(&["加色"])).is_err());
    assert!(session.edit("批色样", &tokens(&["要批色样"])).is_err());
    assert_eq!(session.selection(), &before);
}
