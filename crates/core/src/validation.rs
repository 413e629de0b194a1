//! Input rules for natural keys (username, email, room number) and the
//! client-supplied upload filename.

use validator::ValidateEmail;

use crate::error::CoreError;

pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_ROOM_NUMBER_LENGTH: usize = 20;
/// Matches `videos.original_filename VARCHAR(255)`, which counts characters.
pub const MAX_ORIGINAL_FILENAME_LENGTH: usize = 255;

pub fn validate_username(username: &str) -> Result<(), CoreError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(CoreError::Validation(
            "Username may only contain letters, digits, '_', '.' and '-'".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.len() > MAX_EMAIL_LENGTH || !email.validate_email() {
        return Err(CoreError::Validation(format!(
            "Invalid email address '{email}'"
        )));
    }
    Ok(())
}

/// Room numbers end up as a directory name under the upload root, so only
/// characters that are safe in a single path component are accepted.
pub fn validate_room_number(room_number: &str) -> Result<(), CoreError> {
    if room_number.is_empty() || room_number.len() > MAX_ROOM_NUMBER_LENGTH {
        return Err(CoreError::Validation(format!(
            "Room number must be between 1 and {MAX_ROOM_NUMBER_LENGTH} characters"
        )));
    }
    if !room_number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(CoreError::Validation(
            "Room number may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

pub fn validate_original_filename(filename: &str) -> Result<(), CoreError> {
    if filename.chars().count() > MAX_ORIGINAL_FILENAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Filename must be at most {MAX_ORIGINAL_FILENAME_LENGTH} characters"
        )));
    }
    Ok(())
}
