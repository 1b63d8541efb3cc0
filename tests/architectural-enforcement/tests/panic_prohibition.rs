//! Integration Test: Panic Prohibition
//!
//! **Policy**: Production code MUST NOT call `unwrap()` or `expect()`. Host
//! failures and closed channels are returned as errors or logged; a panic on
//! the UI task would take every overlay down with it.
//! **Exceptions**: test code, `unwrap_or*` combinators

use architectural_enforcement::find_violations;

#[test]
fn test_no_unwrap_in_production_code() {
    let violations = find_violations(|code| code.contains(".unwrap()") || code.contains(".expect("));

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: unwrap()/expect() found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n✅ Use instead:");
        eprintln!("  - `?` with a thiserror/anyhow error");
        eprintln!("  - unwrap_or / unwrap_or_default / unwrap_or_else");
        eprintln!("  - warn!() and continue when the failure is recoverable");

        panic!(
            "\nFound {} unwrap/expect violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
