//! Form validation run before the client is invoked.
//!
//! Lengths are counted in characters after trimming, except the description
//! which is counted as typed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Dog name is required")]
    NameRequired,
    #[error("Dog name must be at least 2 characters")]
    NameTooShort,
    #[error("Dog name must not exceed 50 characters")]
    NameTooLong,
    #[error("Breed is required")]
    BreedRequired,
    #[error("Breed must be at least 2 characters")]
    BreedTooShort,
    #[error("Breed must not exceed 50 characters")]
    BreedTooLong,
    #[error("Age must be a valid number")]
    AgeNotANumber,
    #[error("Age must be between 0 and 50")]
    AgeOutOfRange,
    #[error("Description must not exceed 500 characters")]
    DescriptionTooLong,
    #[error("Please enter a search query")]
    QueryRequired,
    #[error("Search query must be at least 2 characters")]
    QueryTooShort,
    #[error("Please select at least one image")]
    NoImages,
}

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_AGE: i64 = 50;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MIN_QUERY_LEN: usize = 2;

pub fn validate_dog_name(name: &str) -> Result<(), ValidationError> {
    check_length(
        name,
        ValidationError::NameRequired,
        ValidationError::NameTooShort,
        ValidationError::NameTooLong,
    )
}

pub fn validate_breed(breed: &str) -> Result<(), ValidationError> {
    check_length(
        breed,
        ValidationError::BreedRequired,
        ValidationError::BreedTooShort,
        ValidationError::BreedTooLong,
    )
}

fn check_length(
    value: &str,
    required: ValidationError,
    too_short: ValidationError,
    too_long: ValidationError,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        Err(required)
    } else if len < MIN_NAME_LEN {
        Err(too_short)
    } else if len > MAX_NAME_LEN {
        Err(too_long)
    } else {
        Ok(())
    }
}

/// Age is optional; when given, its leading integer must be in `0..=50`.
pub fn validate_age(age: &str) -> Result<(), ValidationError> {
    if age.trim().is_empty() {
        return Ok(());
    }
    match parse_age(age) {
        None => Err(ValidationError::AgeNotANumber),
        Some(years) if !(0..=MAX_AGE).contains(&years) => Err(ValidationError::AgeOutOfRange),
        Some(_) => Ok(()),
    }
}

/// Leading integer of `input`, so "3 years" reads as 3.
pub fn parse_age(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['-', '+']));
    let digits_len = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    trimmed[..digits_start + digits_len].parse().ok()
}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        Err(ValidationError::DescriptionTooLong)
    } else {
        Ok(())
    }
}

pub fn validate_search_query(query: &str) -> Result<(), ValidationError> {
    let len = query.trim().chars().count();
    if len == 0 {
        Err(ValidationError::QueryRequired)
    } else if len < MIN_QUERY_LEN {
        Err(ValidationError::QueryTooShort)
    } else {
        Ok(())
    }
}
