use rstest::*;
use tracing_test::traced_test;

use crate::errors::SimError;
use crate::policy::FailurePolicy;

#[rstest]
#[case::log("log", Ok(FailurePolicy::Log))]
#[case::raise("raise", Ok(FailurePolicy::Raise))]
#[case::unknown("warn", Err(SimError::UnsupportedPolicy("warn".into())))]
#[case::case_sensitive("Raise", Err(SimError::UnsupportedPolicy("Raise".into())))]
fn test_parse_policy(#[case] input: &str, #[case] expected: Result<FailurePolicy, SimError>) {
    assert_eq!(input.parse::<FailurePolicy>(), expected);
}

#[rstest]
#[traced_test]
fn test_report_log() {
    let err = SimError::schema("subject", "something is off");
    assert_eq!(FailurePolicy::Log.report(err), Ok(()));
    assert!(logs_contain("schema error in entity type `subject`: something is off"));
}

#[rstest]
fn test_report_raise() {
    let err = SimError::schema("subject", "something is off");
    assert_eq!(FailurePolicy::Raise.report(err.clone()), Err(err));
}
