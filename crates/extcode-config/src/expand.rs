//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so a bare `$` is kept.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Variable that was referenced but not set.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_value() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("EXTCODE_TEST_OUT", "/srv/site");
        }
        let result = expand_env("${EXTCODE_TEST_OUT}/html", "build.output_dir").unwrap();
        assert_eq!(result, "/srv/site/html");
        unsafe {
            std::env::remove_var("EXTCODE_TEST_OUT");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("EXTCODE_TEST_UNSET");
        }
        let result = expand_env("${EXTCODE_TEST_UNSET:-docs}", "build.source_dir").unwrap();
        assert_eq!(result, "docs");
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("EXTCODE_TEST_MISSING");
        }
        let err = expand_env("${EXTCODE_TEST_MISSING}", "build.source_dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("EXTCODE_TEST_MISSING"));
        assert!(err.to_string().contains("build.source_dir"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(expand_env("$HOME/docs", "build.source_dir").unwrap(), "$HOME/docs");
    }
}
