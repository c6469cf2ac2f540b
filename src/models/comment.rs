use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    /// Author.
    pub user_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(
        length(
            min = 1,
            max = 1000,
            message = "Comment must be between 1 and 1000 characters"
        ),
        custom(function = "not_blank")
    )]
    pub content: String,
}

fn not_blank(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("The content field is required.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(content: String) -> bool {
        CreateCommentRequest { content }.validate().is_ok()
    }

    #[test]
    fn content_length_bounds() {
        assert!(!validate(String::new()));
        assert!(!validate("   \n".to_string()));
        assert!(validate("a".repeat(1000)));
        assert!(!validate("a".repeat(1001)));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 1000 two-byte characters.
        assert!(validate("é".repeat(1000)));
    }
}
