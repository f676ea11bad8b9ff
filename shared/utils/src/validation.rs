use crate::error::{TradeflowError, TradeflowResult};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

pub const MAX_PAGE_SIZE: u64 = 100;

/// Validates a model and reports every failure with its full field path,
/// e.g. `items[0].children[1].quantity`.
pub fn validate_model<T: Validate>(model: &T) -> TradeflowResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let failures = collect_validation_errors(&errors);
            let field = failures
                .first()
                .map(|(path, _)| path.clone())
                .unwrap_or_else(|| "model".to_string());
            Err(TradeflowError::validation(field, format_failures(&failures)))
        }
    }
}

/// Flattens nested validation errors into `(path, message)` pairs, ordered
/// by field name and then by list index as it appears in the document.
pub fn collect_validation_errors(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut failures = Vec::new();
    collect_into(errors, "", &mut failures);
    failures.sort_by(|a, b| path_key(&a.0).cmp(&path_key(&b.0)).then_with(|| a.1.cmp(&b.1)));
    failures
}

/// `items[10].quantity` sorts after `items[2].quantity`.
fn path_key(path: &str) -> Vec<(&str, Option<usize>)> {
    path.split('.')
        .map(|segment| match segment.split_once('[') {
            Some((name, index)) => (name, index.trim_end_matches(']').parse().ok()),
            None => (segment, None),
        })
        .collect()
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    format_failures(&collect_validation_errors(errors))
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(path, message)| {
            if path.is_empty() {
                message.clone()
            } else {
                format!("{}: {}", path, message)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn collect_into(errors: &ValidationErrors, prefix: &str, failures: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    // Schema errors may name the field they concern
                    let path = match error.params.get("field").and_then(|value| value.as_str()) {
                        Some(named) if *field == "__all__" => join_path(prefix, named),
                        _ => path.clone(),
                    };
                    failures.push((path, describe(field, error)));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_into(inner, &path, failures),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_into(inner, &format!("{}[{}]", path, index), failures);
                }
            }
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    match (prefix.is_empty(), field) {
        // Struct-level (schema) errors belong to the enclosing path
        (_, "__all__") => prefix.to_string(),
        (true, _) => field.to_string(),
        (false, _) => format!("{}.{}", prefix, field),
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match &*error.code {
        "length" => format!("Length validation failed for field '{}'", field),
        "range" => format!("Value out of range for field '{}'", field),
        "required" => format!("Field '{}' is required", field),
        code => format!("Validation failed for field '{}': {}", field, code),
    }
}

pub fn validate_uuid(uuid_str: &str) -> TradeflowResult<uuid::Uuid> {
    uuid::Uuid::parse_str(uuid_str)
        .map_err(|_| TradeflowError::validation("id", "Invalid UUID format"))
}

pub fn validate_page_request(page: u64, limit: u64) -> TradeflowResult<()> {
    if page == 0 {
        return Err(TradeflowError::validation("page", "Page numbers start at 1"));
    }

    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(TradeflowError::validation(
            "limit",
            format!("Limit must be between 1 and {}", MAX_PAGE_SIZE),
        ));
    }

    // MongoDB takes the offset as a signed 64-bit integer
    let offset = (page - 1).checked_mul(limit).filter(|offset| *offset <= i64::MAX as u64);
    if offset.is_none() {
        return Err(TradeflowError::validation("page", "Page number is out of range"));
    }

    Ok(())
}
