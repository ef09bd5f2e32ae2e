/// Per-field validation rules
///
/// These are the runtime counterparts of the column constraints in
/// `schema::tables`: the one place "a valid todo title" or "a valid display
/// name" is defined. The model payload structs reference these functions
/// from their `validator` derives, and the tests use the same constants to
/// generate boundary cases.

use validator::ValidationError;

pub const TITLE_MIN_LEN: usize = 1;
pub const TITLE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const NAME_MIN_LEN: usize = 1;
pub const NAME_MAX_LEN: usize = 100;

/// Todo priority labels, in ascending order of urgency
///
/// Shared by the `todo_priority` Postgres enum DDL and the `Priority`
/// Rust enum; a test pins the two to this list.
pub const PRIORITY_LABELS: [&str; 3] = ["low", "medium", "high"];

/// A valid todo title is 1-255 characters
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.chars().count();
    if len < TITLE_MIN_LEN || len > TITLE_MAX_LEN {
        let mut err = ValidationError::new("title_length");
        err.message = Some(
            format!("title must be between {TITLE_MIN_LEN} and {TITLE_MAX_LEN} characters").into(),
        );
        return Err(err);
    }
    Ok(())
}

/// A valid todo description is at most 1000 characters (absence is valid)
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        let mut err = ValidationError::new("description_length");
        err.message =
            Some(format!("description must be at most {DESCRIPTION_MAX_LEN} characters").into());
        return Err(err);
    }
    Ok(())
}

/// A valid display name is 1-100 characters (absence is valid)
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < NAME_MIN_LEN || len > NAME_MAX_LEN {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters").into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_boundaries() {
        assert!(validate_title("").is_err());
        assert!(validate_title("a").is_ok());
        assert!(validate_title(&"a".repeat(TITLE_MAX_LEN)).is_ok());
        assert!(validate_title(&"a".repeat(TITLE_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_description_boundaries() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"d".repeat(DESCRIPTION_MAX_LEN)).is_ok());
        assert!(validate_description(&"d".repeat(DESCRIPTION_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_display_name_boundaries() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("N").is_ok());
        assert!(validate_display_name(&"n".repeat(NAME_MAX_LEN)).is_ok());
        assert!(validate_display_name(&"n".repeat(NAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        // 255 multibyte characters are still a valid title
        assert!(validate_title(&"ü".repeat(TITLE_MAX_LEN)).is_ok());
    }
}
