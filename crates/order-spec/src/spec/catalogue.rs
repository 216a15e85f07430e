use crate::expr::Condition;
use crate::spec::group::OptionGroup;
use crate::spec::registry::{CompositeRule, Registry, SecondaryPrompt, default_multi_choice_group};

pub const UNIT_TYPE: &str = "单据类型";
pub const FIRST_ORDER: &str = "首单";
pub const REORDER: &str = "翻单";

pub const PLATE_MAKING: &str = "是否要打板";
pub const NEEDS_PLATE: &str = "需要打板";
pub const NO_PLATE: &str = "不需要打板";

pub const REORDER_CHANGES: &str = "翻单变动";
pub const NO_CHANGE: &str = "无变动不需要修改";
pub const CHANGED: &str = "有变动需要修改";

pub const SPECIAL_ORDER: &str = "特殊订单";
pub const ADD_COLOR: &str = "加色";

pub const COLOR_SAMPLE: &str = "批色样";
pub const COLOR_SAMPLE_OPTIONS: [&str; 2] = ["要批色样", "不要批色样"];

pub const SECONDARY_PROCESS: &str = "二次工艺";

pub const FABRIC_TEST: &str = "面料测试";
pub const NEEDS_FABRIC_TEST: &str = "需要面料测试";
pub const NO_FABRIC_TEST: &str = "不需要面料测试";

impl Registry {
    /// The built-in order configuration catalogue.
    pub fn order_config() -> Self {
        let groups = vec![
            OptionGroup::new(UNIT_TYPE, [FIRST_ORDER, REORDER]).required(),
            OptionGroup::new(PLATE_MAKING, [NEEDS_PLATE, NO_PLATE])
                .nested(2, FIRST_ORDER)
                .when(Condition::contains(FIRST_ORDER))
                .reset_on([REORDER]),
            OptionGroup::new(REORDER_CHANGES, [NO_CHANGE, CHANGED])
                .nested(2, REORDER)
                .when(Condition::contains(REORDER))
                .reset_on([FIRST_ORDER]),
            OptionGroup::new(
                SPECIAL_ORDER,
                [
                    "换料寄面料样",
                    "换料重新打板",
                    ADD_COLOR,
                    "改尺寸不打版",
                    "改尺寸重新打板",
                ],
            )
            .nested(3, CHANGED)
            .when(Condition::contains(CHANGED))
            .reset_on([FIRST_ORDER, NO_CHANGE]),
            OptionGroup::new(COLOR_SAMPLE, COLOR_SAMPLE_OPTIONS)
                .required()
                .nested(4, ADD_COLOR)
                .when(Condition::contains(ADD_COLOR))
                .reset_on([FIRST_ORDER, NO_CHANGE, NEEDS_PLATE, NO_PLATE]),
            OptionGroup::new(COLOR_SAMPLE, COLOR_SAMPLE_OPTIONS)
                .required()
                .nested(3, NO_PLATE)
                .when(Condition::all_of([FIRST_ORDER, NO_PLATE]))
                .reset_on([REORDER, CHANGED, NO_CHANGE]),
            OptionGroup::new("品类", ["牛仔", "时装"]).required(),
            OptionGroup::new("复杂度", ["简单款", "基础款", "复杂款"]).required(),
            OptionGroup::new("产能", ["有产能", "没产能"]).required(),
            OptionGroup::new(SECONDARY_PROCESS, ["绣花", "印花"]),
        ];

        Registry {
            id: "order-config".into(),
            title: "订单配置".into(),
            version: "1.0.0".into(),
            multi_choice_group: default_multi_choice_group(),
            groups,
            composite_rules: vec![CompositeRule {
                group: COLOR_SAMPLE.into(),
                when_all: vec![FIRST_ORDER.into(), NO_PLATE.into()],
                require_any: COLOR_SAMPLE_OPTIONS.iter().map(|token| token.to_string()).collect(),
            }],
            secondary: Some(SecondaryPrompt {
                title: FABRIC_TEST.into(),
                options: vec![NEEDS_FABRIC_TEST.into(), NO_FABRIC_TEST.into()],
                skip_when: Some(Condition::all_of([REORDER, NO_CHANGE])),
            }),
        }
    }
}
