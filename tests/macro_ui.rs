//! UI tests for the annotation attributes

#[test]
fn ui_collection_forms_ok() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/collection_forms.rs");
}

#[test]
fn ui_option_and_generated_ok() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/option_and_generated.rs");
}

#[test]
fn ui_collection_without_name_fails() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/collection_missing_name.rs");
}

#[test]
fn ui_collection_with_blank_name_fails() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/collection_empty_name.rs");
}
