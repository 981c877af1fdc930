//! Tests for ErrorMerger against the bill form

use rstest::{fixture, rstest};

use billform::domain::{
    BillRecord, DomainError, ErrorKind, ErrorMerger, FieldPath, FieldTree, RuleSet,
    ValidationMessage,
};
use billform::util::testing::{init_test_setup, message};

struct Form {
    tree: FieldTree,
    rules: RuleSet,
}

#[fixture]
fn form() -> Form {
    init_test_setup();
    let mut tree = BillRecord::sample().to_field_tree().unwrap();
    let rules = BillRecord::rules().unwrap();
    rules.apply_all(&mut tree);
    Form { tree, rules }
}

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn server_paths(tree: &FieldTree) -> Vec<String> {
    tree.leaves()
        .filter(|(_, leaf)| leaf.errors().contains(ErrorKind::Server))
        .map(|(path, _)| path.to_string())
        .collect()
}

#[rstest]
fn given_response_naming_creditor_name_when_merging_then_only_that_leaf_flagged(mut form: Form) {
    // Arrange
    ErrorMerger::apply(
        &mut form.tree,
        &[message("account", "invalid IBAN"), message("debtor.town", "unknown")],
    )
    .unwrap();

    // Act
    let summary =
        ErrorMerger::apply(&mut form.tree, &[message("creditor.name", "too long")]).unwrap();

    // Assert
    assert_eq!(summary.cleared, 2);
    assert_eq!(summary.flagged, 1);
    assert_eq!(server_paths(&form.tree), vec!["creditor.name"]);
}

#[rstest]
fn given_same_response_when_applied_twice_then_state_equals_single_application(mut form: Form) {
    // Arrange
    let response = vec![
        message("creditor.name", "too long"),
        message("amount", "not accepted"),
    ];
    ErrorMerger::apply(&mut form.tree, &response).unwrap();
    let once: Vec<_> = form
        .tree
        .leaves()
        .map(|(path, leaf)| (path, leaf.errors().clone()))
        .collect();

    // Act
    ErrorMerger::apply(&mut form.tree, &response).unwrap();

    // Assert
    let twice: Vec<_> = form
        .tree
        .leaves()
        .map(|(path, leaf)| (path, leaf.errors().clone()))
        .collect();
    assert_eq!(once, twice);
}

#[rstest]
fn given_leaf_with_both_kinds_when_merging_then_at_most_one_entry_per_kind(mut form: Form) {
    // Act
    ErrorMerger::apply(
        &mut form.tree,
        &[message("amount", "first"), message("amount", "second")],
    )
    .unwrap();

    // Assert
    let entries = form.tree.errors(&path("amount")).unwrap().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, ErrorKind::Client);
    assert_eq!(entries[1].kind, ErrorKind::Server);
    assert_eq!(entries[1].message, "second");
}

#[rstest]
fn given_server_error_when_client_error_cleared_then_server_error_stays(mut form: Form) {
    // Arrange
    let amount = path("amount");
    ErrorMerger::apply(&mut form.tree, &[message("amount", "not accepted")]).unwrap();

    // Act
    form.tree.set_value(&amount, 25.0.into()).unwrap();
    let outcome = form.rules.apply(&mut form.tree, &amount).unwrap();

    // Assert
    assert!(outcome.is_none());
    let errors = form.tree.errors(&amount).unwrap();
    assert!(!errors.contains(ErrorKind::Client));
    assert_eq!(errors.server(), Some("not accepted"));
}

#[rstest]
fn given_finalcreditor_message_when_merging_then_creditor_is_untouched(mut form: Form) {
    ErrorMerger::apply(
        &mut form.tree,
        &[message("finalCreditor.countryCode", "unsupported")],
    )
    .unwrap();

    assert_eq!(server_paths(&form.tree), vec!["finalCreditor.countryCode"]);
    assert!(form
        .tree
        .errors(&path("creditor.countryCode"))
        .unwrap()
        .is_empty());
}

#[rstest]
#[case("iban")]
#[case("creditor")]
#[case("creditor.name.first")]
fn given_unresolvable_path_when_merging_then_unknown_field_and_tree_kept(
    mut form: Form,
    #[case] field: &str,
) {
    // Arrange
    ErrorMerger::apply(&mut form.tree, &[message("account", "invalid IBAN")]).unwrap();

    // Act
    let result = ErrorMerger::apply(
        &mut form.tree,
        &[
            message("creditor.town", "unknown"),
            ValidationMessage::new(path(field), "?"),
        ],
    );

    // Assert
    assert!(matches!(result, Err(DomainError::UnknownField(p)) if p.to_string() == field));
    assert_eq!(server_paths(&form.tree), vec!["account"]);
}
