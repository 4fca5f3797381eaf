use std::fs;
use std::path::Path;

use regex::Regex;
use test_generator::test_resources;

use rusty_monkey::interpreter::{evaluate_with_output, new_context};

/// Each `.mnk` script has a sidecar `.expected` file holding either the
/// exact stdout of the script, or a single `error: <fragment>` line naming a
/// fragment of the expected failure. Expectations cannot live in the
/// scripts themselves since the language has no comments.
#[test_resources("tests/monkey_test_cases/**/*.mnk")]
fn run_monkey_script(script: &str) {
    let source = fs::read_to_string(script).unwrap();
    let expected_path = Path::new(script).with_extension("expected");
    let expected = fs::read_to_string(&expected_path).unwrap();

    let error_regexer = Regex::new(r"^error: (.*)$").unwrap();
    let expected_error = expected.lines().next().and_then(|line| {
        error_regexer
            .captures(line)
            .map(|r| r.get(1).unwrap().as_str().to_owned())
    });

    let context = new_context();
    let mut out = vec![];
    let result = evaluate_with_output(&source, &context, "script", &mut out);
    let output = String::from_utf8(out).unwrap();

    match expected_error {
        Some(fragment) => {
            let error = result.expect_err("script should fail").to_string();
            assert!(
                error.contains(&fragment),
                "expected an error containing {:?}, got {:?}",
                fragment,
                error
            );
        }
        None => {
            if let Err(e) = result {
                panic!("script failed: {}", e);
            }
            assert_eq!(output, expected);
        }
    }
}
