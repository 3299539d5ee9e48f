//! Filter engine against a three-country construction company fixture.

use rstest::{fixture, rstest};

use tukey::util::testing;
use tukey::{
    DataSet, Filter, FilterOptions, Label, LabelId, OrphanStrategy, Payload, TreeError, Value, Verdict,
};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn year(y: i64) -> Label {
    Label::new(y.to_string())
        .with_id(vec![format!("{y}-01-01"), format!("{y}-12-31")])
        .with_meta_value("started_on", format!("{y}-01-01"))
        .with_meta_value("ended_on", format!("{y}-12-31"))
}

fn city(name: &str, amounts: &[(i64, i64)]) -> DataSet {
    DataSet::branch(
        name,
        amounts
            .iter()
            .map(|(y, amount)| DataSet::new(Some(year(*y)), *amount))
            .collect(),
    )
}

#[fixture]
fn company() -> DataSet {
    DataSet::branch(
        "Root",
        vec![
            DataSet::branch(
                "Bobs bouw NL",
                vec![
                    city("Amsterdam", &[(2014, 1), (2013, 33)]),
                    city("Nijmegen", &[(2015, 100), (2014, 2)]),
                ],
            ),
            DataSet::branch(
                "Bobs bouw UK",
                vec![
                    city("London", &[(2014, 3), (2013, 44)]),
                    city("Reading", &[(2014, 4), (2014, 5)]),
                ],
            ),
            DataSet::branch(
                "Bobs bouw DE",
                vec![
                    city("Berlin", &[(2013, 55), (2014, 6)]),
                    city("Köln", &[(2014, 7), (2015, 200)]),
                ],
            ),
        ],
    )
}

fn child_ids(tree: &DataSet) -> Vec<LabelId> {
    tree.root()
        .children()
        .map(|c| c.label().unwrap().id.clone())
        .collect()
}

#[rstest]
fn given_existing_leaf_label_when_filtering_by_label_then_only_matching_paths(company: DataSet) {
    let expected = DataSet::branch(
        "Root",
        vec![
            DataSet::branch("Bobs bouw NL", vec![city("Amsterdam", &[(2013, 33)])]),
            DataSet::branch("Bobs bouw UK", vec![city("London", &[(2013, 44)])]),
            DataSet::branch("Bobs bouw DE", vec![city("Berlin", &[(2013, 55)])]),
        ],
    );

    let result = company.filter_by_label(year(2013).id).unwrap();

    assert_eq!(result, expected);
}

#[rstest]
fn given_unknown_label_when_filtering_by_label_then_empty_child_list_with_root_label(
    company: DataSet,
) {
    let result = company.filter_by_label("You shall not find... me").unwrap();

    assert_eq!(result.root().label(), company.root().label());
    assert!(matches!(result.root().payload(), Payload::Children(c) if c.is_empty()));
}

#[rstest]
#[case::keep(Verdict::Keep, true)]
#[case::drop(Verdict::Drop, false)]
#[case::undecided(Verdict::Undecided, false)]
fn given_constant_predicate_when_filtering_then_identity_or_annihilation(
    company: DataSet,
    #[case] verdict: Verdict,
    #[case] identity: bool,
) {
    let result = company.filter(|_, _| verdict).unwrap();

    assert_eq!(result == company, identity);
    if !identity {
        assert_eq!(result.root().label(), company.root().label());
        assert_eq!(result.root().child_count(), 0);
        assert!(result.root().has_child_list());
    }
}

#[rstest]
fn given_any_predicate_when_filtering_then_source_untouched(company: DataSet) {
    let saved = company.clone();

    let _ = company.filter(|_, node| Verdict::from(node.is_leaf())).unwrap();
    let _ = company.compact_onelings().unwrap();

    assert_eq!(company, saved);
    assert_eq!(company.len(), saved.len());
}

#[rstest]
fn given_realistic_predicate_when_filtering_then_selected_cities_with_ancestors(company: DataSet) {
    let needed = ["Köln", "Amsterdam"];
    let expected = DataSet::branch(
        "Root",
        vec![
            DataSet::branch(
                "Bobs bouw NL",
                vec![city("Amsterdam", &[(2014, 1), (2013, 33)])],
            ),
            DataSet::branch("Bobs bouw DE", vec![city("Köln", &[(2014, 7), (2015, 200)])]),
        ],
    );

    let result = company
        .filter(|_, node| {
            let wanted = node.label().is_some_and(|l| needed.contains(&l.name.as_str()));
            if wanted {
                Verdict::Keep
            } else {
                Verdict::Undecided
            }
        })
        .unwrap();

    assert_eq!(result, expected);
}

#[rstest]
fn given_dropped_company_when_adopting_then_cities_move_to_root(company: DataSet) {
    let result = company
        .filter_with_options(
            |_, node| {
                if node.label().is_some_and(|l| l.id == LabelId::from("Bobs bouw NL")) {
                    Verdict::Drop
                } else if node.is_leaf() {
                    Verdict::Keep
                } else {
                    Verdict::Undecided
                }
            },
            FilterOptions {
                orphan_strategy: OrphanStrategy::Adopt,
                ..FilterOptions::default()
            },
        )
        .unwrap();

    let ids = child_ids(&result);
    assert!(ids.contains(&LabelId::from("Amsterdam")));
    assert!(ids.contains(&LabelId::from("Nijmegen")));
    assert!(!ids.contains(&LabelId::from("Bobs bouw NL")));
    assert_eq!(ids.len(), 4);
    assert_eq!(result.sum().unwrap(), company.sum().unwrap());
}

#[rstest]
fn given_dropped_company_when_discarding_then_subtree_gone(company: DataSet) {
    let result = company
        .filter(|_, node| {
            if node.label().is_some_and(|l| l.name == "Bobs bouw NL") {
                Verdict::Drop
            } else if node.is_leaf() {
                Verdict::Keep
            } else {
                Verdict::Undecided
            }
        })
        .unwrap();

    assert_eq!(child_ids(&result).len(), 2);
    assert!(result
        .root()
        .find_by(|n| n.label().is_some_and(|l| l.name == "Amsterdam"))
        .is_none());
}

#[rstest]
fn given_undecided_predicate_when_keeping_leafs_then_equal_to_source(company: DataSet) {
    let result = Filter::new()
        .predicate(|_, _| Verdict::Undecided)
        .keep_leafs(true)
        .apply(company.root())
        .unwrap();

    assert_eq!(result, company);
}

#[rstest]
fn given_subtree_cursor_when_filtering_then_result_rooted_there(company: DataSet) {
    let uk = company
        .root()
        .find_by(|n| n.label().is_some_and(|l| l.name == "Bobs bouw UK"))
        .unwrap();

    let result = uk.filter_by_label(year(2014).id).unwrap();

    assert_eq!(result.root().id(), uk.id());
    assert!(result.root().is_root());
    assert_eq!(result.sum().unwrap(), Some(Value::Int(12)));
}

#[test]
fn given_filter_without_criterion_when_applied_then_invalid_operation() {
    let tree = DataSet::leaf("Total", 5);

    let result = Filter::new().apply(tree.root());

    assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
}

#[test]
fn given_chain_of_onelings_when_compacting_then_leaves_hang_below_root() {
    let tree = DataSet::branch(
        "Expenses per year",
        vec![DataSet::branch(
            "2014",
            vec![DataSet::branch(
                "Food",
                vec![DataSet::leaf("Junk food", 123.4), DataSet::leaf("Super foods", 2)],
            )],
        )],
    );

    let compacted = tree.compact_onelings().unwrap();

    let expected = DataSet::branch(
        "Expenses per year",
        vec![DataSet::leaf("Junk food", 123.4), DataSet::leaf("Super foods", 2)],
    );
    assert_eq!(compacted, expected);
}
