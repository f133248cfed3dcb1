//! Registration input validation.

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// bcrypt only reads the first 72 bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

const MAX_NAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidEmail,
    WeakPassword,
    NameTooLong(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "Missing field: {}", field),
            ValidationError::InvalidEmail => write!(f, "Invalid email"),
            ValidationError::WeakPassword => write!(
                f,
                "Weak password: use at least {} characters with upper and lower case letters, a digit and a symbol",
                MIN_PASSWORD_LENGTH
            ),
            ValidationError::NameTooLong(field) => {
                write!(f, "{} must be at most {} characters", field, MAX_NAME_LENGTH)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Registration fields as received. Absent fields are `None`.
#[derive(Debug, Default)]
pub struct RegistrationInput<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Registration fields that passed validation.
#[derive(Debug)]
pub struct ValidRegistration<'a> {
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub email: &'a str,
    pub password: &'a str,
}

/// Check mandatory fields, email shape and password strength, in that order.
pub fn validate_registration<'a>(
    input: &RegistrationInput<'a>,
) -> Result<ValidRegistration<'a>, ValidationError> {
    let first_name = input
        .first_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField("firstName"))?;
    let email = input
        .email
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField("emailId"))?;
    let password = input
        .password
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField("password"))?;
    let last_name = input.last_name.map(str::trim).filter(|s| !s.is_empty());

    if first_name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong("firstName"));
    }
    if last_name.is_some_and(|s| s.chars().count() > MAX_NAME_LENGTH) {
        return Err(ValidationError::NameTooLong("lastName"));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !is_strong_password(password) {
        return Err(ValidationError::WeakPassword);
    }

    Ok(ValidRegistration {
        first_name,
        last_name,
        email,
        password,
    })
}

/// Structural email check: one `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let valid_labels = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    valid_labels && tld_ok
}

/// Length bounds plus at least one lowercase, uppercase, digit and symbol.
pub fn is_strong_password(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LENGTH || password.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    has_lower && has_upper && has_digit && has_symbol
}
