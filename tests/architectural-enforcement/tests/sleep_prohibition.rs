//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Animation time
//! advances through the scheduler's `tokio::time::interval` ticker.
//! **Exceptions**: test code

use architectural_enforcement::find_violations;

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_violations(|code| code.contains("::sleep(") || code.contains(".sleep("));

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n✅ ACCEPTABLE sleep uses:");
        eprintln!("  - Test code (#[test] or #[tokio::test] functions)");
        eprintln!("  - Periodic work driven by tokio::time::interval()");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
