use super::schema::Settings;

/// Validate settings at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if settings.jobs == Some(0) {
        errors.push("jobs: must be at least 1".to_string());
    }

    if let Some(penalty) = settings.default_penalty {
        if penalty.magnitude < 0 {
            errors.push(format!("default_penalty: must be non-negative, got {}", penalty));
        }
    }

    let lists = [
        ("exclude.penalty", &settings.exclude.penalty),
        ("exclude.time_precision", &settings.exclude.time_precision),
    ];
    for (field, patterns) in lists {
        for (i, pattern) in patterns.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(pattern) {
                errors.push(format!("{}[{}]: invalid pattern '{}' - {}", field, i, pattern, e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
