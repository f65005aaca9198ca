//! Common assertion macros for doctor tests

/// Assert that a validation result contains an error whose message contains `pattern`
#[macro_export]
macro_rules! assert_validation_error {
    ($result:expr, $pattern:expr) => {
        assert!(!$result.success, "Expected validation error, but validation succeeded");
        let errors_str =
            $result.errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>().join("\n");
        assert!(
            errors_str.contains($pattern),
            "Expected error containing '{}', but got:\n{}",
            $pattern,
            errors_str
        );
    };
}

/// Assert that validation warning contains pattern
#[macro_export]
macro_rules! assert_validation_warning {
    ($result:expr, $pattern:expr) => {
        let pattern = $pattern;
        let found = $result.warnings.iter().any(|w| w.message.contains(pattern));
        if !found {
            let warnings_str = $result
                .warnings
                .iter()
                .map(|w| format!("  - {}", w.message))
                .collect::<Vec<_>>()
                .join("\n");
            panic!(
                "Expected warning containing '{}', but got:\n{}",
                pattern,
                if warnings_str.is_empty() { "  (no warnings)".to_string() } else { warnings_str }
            );
        }
    };
}

/// Assert that some diagnostic carries the given rule code
#[macro_export]
macro_rules! assert_has_code {
    ($result:expr, $code:expr) => {
        let code = $code;
        let found = $result.iter().any(|d| d.code.as_deref() == Some(code));
        assert!(
            found,
            "Expected a diagnostic with code '{}', got codes: {:?}",
            code,
            $result.iter().map(|d| d.code.clone()).collect::<Vec<_>>()
        );
    };
}

/// Assert that validation succeeded
#[macro_export]
macro_rules! assert_success {
    ($result:expr) => {
        if !$result.success {
            let errors_str =
                $result.errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>().join("\n");
            panic!("Expected success, but got errors:\n{}", errors_str);
        }
    };
}
