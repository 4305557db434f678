//! Template catalog, selection and table formatting through the public API

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use reqprompt::config::TemplateSettings;
use reqprompt::template::{candidates, render, SelectionInput, SelectionReason};
use reqprompt::{
    format_table, parse_formatted_table, select, ColumnRole, Confidence, ReqifError, Table,
    TemplateCatalog, TemplateConfigError, VariableBag,
};

const OVERLAPPING: &str = r#"
default_template: generic
templates:
  generic:
    template: "generic {heading}"
    variables:
      required: [heading]
  lock_a:
    selection:
      keywords: [lock]
    template: "a {heading}"
    variables:
      required: [heading]
  lock_b:
    selection:
      keywords: [lock]
    template: "b {heading}"
    variables:
      required: [heading]
  by_id:
    selection:
      id_patterns: ["^REQ_LCK_"]
    template: "id {heading}"
    variables:
      required: [heading]
"#;

fn input<'a>(heading: &'a str, id: Option<&'a str>) -> SelectionInput<'a> {
    SelectionInput {
        heading,
        human_readable_id: id,
        internal_id: "_x1",
    }
}

fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_keyword_tie_goes_to_first_declared() {
    let catalog = TemplateCatalog::from_yaml_str(OVERLAPPING, "overlap.yaml").unwrap();
    for _ in 0..5 {
        let selection = select(&catalog, &input("Central Lock Logic", Some("REQ_CL_001")));
        assert_eq!(selection.template.name, "lock_a");
        assert_eq!(selection.confidence, Confidence::Medium);
    }

    let all = candidates(&catalog, &input("Central Lock Logic", Some("REQ_CL_001")));
    let names: Vec<&str> = all.iter().map(|c| c.template.name.as_str()).collect();
    assert_eq!(names, vec!["lock_a", "lock_b"]);
}

#[test]
fn test_id_pattern_outranks_keyword() {
    let catalog = TemplateCatalog::from_yaml_str(OVERLAPPING, "overlap.yaml").unwrap();
    let selection = select(&catalog, &input("Central Lock Logic", Some("REQ_LCK_007")));
    assert_eq!(selection.template.name, "by_id");
    assert_eq!(selection.confidence, Confidence::High);
    assert!(matches!(selection.reason, SelectionReason::IdPattern { ref id, .. } if id == "REQ_LCK_007"));
}

#[test]
fn test_no_match_falls_back_to_default() {
    let catalog = TemplateCatalog::from_yaml_str(OVERLAPPING, "overlap.yaml").unwrap();
    let selection = select(&catalog, &input("Mirror Heating", None));
    assert_eq!(selection.template.name, "generic");
    assert_eq!(selection.confidence, Confidence::Low);
    assert_eq!(selection.reason, SelectionReason::Default);
}

#[test]
fn test_case_sensitive_keywords() {
    let settings = TemplateSettings {
        case_sensitive: true,
        ..Default::default()
    };
    let catalog = TemplateCatalog::from_sources(
        &[("overlap.yaml".to_string(), OVERLAPPING.to_string())],
        &settings,
    )
    .unwrap();
    assert_eq!(select(&catalog, &input("Central Lock Logic", None)).template.name, "generic");
    assert_eq!(select(&catalog, &input("central lock logic", None)).template.name, "lock_a");
}

#[test]
fn test_missing_row_count_is_named() {
    let catalog = TemplateCatalog::builtin().unwrap();
    let template = catalog.get("automotive_default").unwrap();
    let mut bag = VariableBag::new();
    bag.insert("heading", "Door")
        .insert("requirement_id", "REQ_DCS_001")
        .insert("table_str", "Headers: ['Input - A', 'Output - B']\n");

    let err = render(template, &bag).unwrap_err();
    assert_eq!(err.missing, vec!["row_count".to_string()]);
    assert!(err.to_string().contains("row_count"));
}

#[test]
fn test_template_files_merge_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(
        dir.path(),
        "base.yaml",
        "default_template: base\ntemplates:\n  base:\n    template: base\n",
    );
    let second = write(
        dir.path(),
        "extra.yaml",
        "default_template: extra\ntemplates:\n  extra:\n    selection:\n      keywords: [seat]\n    template: extra\n",
    );

    let catalog =
        TemplateCatalog::load_files(&[first.clone(), second.clone()], &TemplateSettings::default())
            .unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.default_template().name, "extra");
    assert_eq!(catalog.templates()[0].origin, first.display().to_string());

    let duplicate = write(
        dir.path(),
        "dup.yaml",
        "templates:\n  base:\n    template: again\n",
    );
    let err =
        TemplateCatalog::load_files(&[first, duplicate], &TemplateSettings::default()).unwrap_err();
    assert!(matches!(
        err,
        ReqifError::TemplateConfiguration(TemplateConfigError::DuplicateTemplate { .. })
    ));
}

#[test]
fn test_missing_template_file_is_an_error() {
    let err = TemplateCatalog::load_files(
        &[PathBuf::from("no/such/templates.yaml")],
        &TemplateSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReqifError::Io(_)));
}

#[test]
fn test_formatted_table_reads_back() {
    let table = Table::from_parts(
        vec!["Input - It's".into(), "Output - C:\\path".into()],
        vec![vec!["0".into(), "a, b".into()], vec!["1".into(), "".into()]],
    )
    .unwrap();
    let text = format_table(&table);
    assert!(text.starts_with("Headers: ['Input - It\\'s', 'Output - C:\\\\path']\n"));
    assert_eq!(parse_formatted_table(&text).unwrap(), table);
}

#[test]
fn test_column_roles_from_headers() {
    assert_eq!(ColumnRole::infer("Input - B_DOOR_OPEN"), ColumnRole::Input);
    assert_eq!(ColumnRole::infer("OUTPUT signal"), ColumnRole::Output);
    assert_eq!(ColumnRole::infer("No. - Test Case"), ColumnRole::Ignored);
    assert!(Table::from_parts(vec!["Input".into()], vec![]).is_err());
}
