use oddslab::LabError;
use oddslab::features::FeatureTable;
use oddslab::strategy::{BoundStrategy, Condition, StrategyBank, StrategyRule, apply_strategies};
use oddslab::synthetic::generate;

#[test]
fn adding_conditions_never_grows_matches() {
    let table = FeatureTable::derive(&generate(21, 500));
    let bank = StrategyBank::bundled().unwrap();
    for rule in bank.rules() {
        let mut previous = usize::MAX;
        for n in 1..=rule.conditions.len() {
            let count = rule.prefix(n).matched_rows(&table).len();
            assert!(count <= previous, "{} grew at {n} conditions", rule.name);
            previous = count;
        }
    }
}

#[test]
fn bound_strategy_agrees_with_rule_mask() {
    let table = FeatureTable::derive(&generate(22, 200));
    let bank = StrategyBank::bundled().unwrap();
    for bound in apply_strategies(&bank, &table) {
        let rule = bank
            .rules()
            .iter()
            .find(|r| r.name == bound.name())
            .unwrap();
        assert_eq!(bound.mask(), rule.mask(&table));
        for row in 0..table.len() {
            assert_eq!(bound.matches(row), rule.matches_row(&table, row));
        }
    }
}

#[test]
fn open_bounds_match_every_row() {
    let table = FeatureTable::derive(&generate(23, 50));
    let rule = StrategyRule::new(
        "Back Home",
        "OPEN",
        vec![Condition::new("VAR01", f64::NEG_INFINITY, f64::INFINITY)],
    )
    .unwrap();
    let bound = BoundStrategy::bind(&rule, &table);
    assert!(bound.mask().into_iter().all(|keep| keep));
}

#[test]
fn bank_csv_with_blank_bounds_and_comments() {
    let raw = "# comment\npage,strategy,feature,lower,upper\nBack Home,X,VAR01,,2.0\nBack Home,X,pH,0.4,\n";
    let bank = StrategyBank::from_csv_reader(raw.as_bytes()).unwrap();
    assert_eq!(bank.len(), 1);
    let rule = &bank.rules()[0];
    assert_eq!(rule.conditions[0].lower, f64::NEG_INFINITY);
    assert_eq!(rule.conditions[1].upper, f64::INFINITY);
}

#[test]
fn unknown_feature_fails_bank_load() {
    let raw = "page,strategy,feature,lower,upper\nBack Home,X,VAR99,0,1\n";
    assert!(matches!(
        StrategyBank::from_csv_reader(raw.as_bytes()),
        Err(LabError::UnknownFeature(name)) if name == "VAR99"
    ));
}
