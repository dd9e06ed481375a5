use taskgraph_parser::ast::{ExitStatus, Step};
use taskgraph_parser::{ErrorCode, ParserConfig, parse, validate};

#[test]
fn test_multiline_definition() {
    let source = r#"
        prepare --env=prod
        <load-a --path='/data/a b' || load-b> 'FAILED' -> cleanup
        report
        cleanup: notify --channel=ops
    "#;

    let config = ParserConfig::default();
    let task = parse("nightly", source, &config).expect("Failed to parse");
    assert!(validate(&task, &config).is_empty());

    let steps = &task.sequence.steps;
    assert_eq!(steps.len(), 4);

    match &steps[1] {
        Step::Split(split) => {
            assert_eq!(split.branches.len(), 2);
            assert_eq!(split.transitions.len(), 1);
            assert_eq!(
                *split.transitions[0].on_exit.inner(),
                ExitStatus::Code("FAILED".to_string())
            );
        }
        Step::TaskApp(_) => panic!("Expected a split"),
    }

    assert_eq!(
        task.to_string(),
        "prepare --env=prod && <load-a --path='/data/a b' || load-b> 'FAILED' -> cleanup \
         && report && cleanup: notify --channel=ops"
    );
}

#[test]
fn test_validation_reports_all_problems() {
    let config = ParserConfig::default();
    let task = parse("t", "a: foo 'X' -> missing && a: bar && a: baz", &config)
        .expect("Failed to parse");

    let problems = validate(&task, &config);
    let codes: Vec<_> = problems.iter().filter_map(|p| p.code()).collect();
    assert_eq!(codes, vec![ErrorCode::E200, ErrorCode::E201, ErrorCode::E201]);

    let descriptors: Vec<_> = problems.iter().map(|p| p.to_descriptor()).collect();
    assert_eq!(descriptors[0].range(), Some((14, 21)));
    assert_eq!(descriptors[0].message(), "undefined label `missing`");
}

#[test]
fn test_syntax_error_descriptor() {
    let err = parse("t", "<foo || bar", &ParserConfig::default()).unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::E101));
    assert_eq!(err.to_descriptor().range(), Some((11, 11)));
    assert_eq!(
        err.to_string(),
        "error[E101]: unexpected end of input: expected `||` or `>`"
    );
}

#[test]
fn test_empty_definition_policy() {
    let strict = ParserConfig::new(true, false, 63);

    assert!(parse("t", "", &ParserConfig::default()).unwrap().is_empty());
    assert_eq!(
        parse("t", "\n\n", &strict).unwrap_err().code(),
        Some(ErrorCode::E102)
    );
}
