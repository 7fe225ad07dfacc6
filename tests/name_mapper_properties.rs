use std::path::Path;

use proptest::prelude::*;
use sql2scaffold::definition::{Definition, PlasoDefinition};
use sql2scaffold::generator::path_planner::plan;
use sql2scaffold::mapping::identity::PluginIdentity;
use sql2scaffold::parser::names::{to_attribute_identifier, to_class_name_stem, to_file_name_stem};

fn is_class_stem(stem: &str) -> bool {
    let mut chars = stem.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_file_stem(stem: &str) -> bool {
    let mut chars = stem.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn arb_plugin_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9 !?._:/-]{0,32}",
        "[a-z]{1,6}([A-Z][a-z]{1,6}){0,3}",
        any::<String>(),
    ]
}

#[test]
fn documented_examples() {
    assert_eq!(to_class_name_stem("My Cool Plugin!"), "MyCoolPlugin");
    assert_eq!(to_file_name_stem("My Cool Plugin!"), "my_cool_plugin");
    assert_eq!(to_class_name_stem("3com logs"), "P3comLogs");
    assert_eq!(to_file_name_stem("3com logs"), "p3com_logs");
    assert_eq!(to_class_name_stem("!!!"), "Plugin");
    assert_eq!(to_file_name_stem(""), "plugin");
    assert_eq!(to_attribute_identifier("_rowid"), "_rowid");
    assert_eq!(to_attribute_identifier("lastVisitTime"), "last_visit_time");
}

proptest! {
    #[test]
    fn class_and_file_stems_are_valid_identifiers(raw in arb_plugin_name()) {
        let class_stem = to_class_name_stem(&raw);
        let file_stem = to_file_name_stem(&raw);
        prop_assert!(is_class_stem(&class_stem), "bad class stem {class_stem:?} for {raw:?}");
        prop_assert!(is_file_stem(&file_stem), "bad file stem {file_stem:?} for {raw:?}");
        prop_assert!(!file_stem.ends_with('_') && !file_stem.contains("__"));
    }

    #[test]
    fn class_and_file_stems_share_word_boundaries(raw in arb_plugin_name()) {
        prop_assert_eq!(
            to_class_name_stem(&raw).to_ascii_lowercase(),
            to_file_name_stem(&raw).replace('_', "")
        );
    }

    #[test]
    fn attribute_identifiers_are_empty_or_valid(raw in arb_plugin_name()) {
        let identifier = to_attribute_identifier(&raw);
        prop_assert!(identifier.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!identifier.starts_with(|c: char| c.is_ascii_digit()));
    }

    #[test]
    fn planning_is_pure(raw in arb_plugin_name(), suffix in "[a-z]{0,6}") {
        let definition = PlasoDefinition::new();
        let identity = PluginIdentity::derive(&raw, definition.data_type_namespace());
        let first = plan(definition.path_convention(), Path::new("/out"), &identity, &suffix);
        let second = plan(definition.path_convention(), Path::new("/out"), &identity, &suffix);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.iter().all(|(_, path)| path.starts_with("/out")));
    }
}
