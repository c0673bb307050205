//! Request field validation

use crate::error::ServiceError;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const MIN_AGE: u32 = 12;

/// Reject an absent or blank required field
pub fn require(field: &'static str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::FieldMissing(field));
    }
    Ok(())
}

pub fn password_length(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ServiceError::FieldError(format!(
            "Password should at least have {} characters.",
            PASSWORD_MIN_LENGTH
        )));
    }
    Ok(())
}

pub fn minimum_age(age: u32) -> Result<(), ServiceError> {
    if age < MIN_AGE {
        return Err(ServiceError::FieldError(format!(
            "Age should be {} and above years old to create an account.",
            MIN_AGE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("token", "abc").is_ok());
        assert!(matches!(
            require("token", "   "),
            Err(ServiceError::FieldMissing("token"))
        ));
    }

    #[test]
    fn test_password_and_age_bounds() {
        assert!(password_length("1234567").is_err());
        assert!(password_length("12345678").is_ok());
        assert!(minimum_age(11).is_err());
        assert!(minimum_age(12).is_ok());
    }
}
