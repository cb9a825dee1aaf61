//! Login and registration form validation.
//!
//! Forms hold raw user input. `validate` either produces the request body for
//! the backend or every field error at once, so the form can mark all invalid
//! inputs in one pass.

use std::fmt;

use printshop_core::{Email, LoginRequest, RegisterRequest};
use thiserror::Error;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Form fields, named as the backend names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Identifier,
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
}

impl Field {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single invalid input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every invalid input of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summary(.0))]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// All errors, in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// First error message for `field`.
    #[must_use]
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Login
// =============================================================================

/// Raw input of the sign-in form.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub identifier: String,
    pub password: String,
}

impl LoginForm {
    /// Check the form and build the `/auth/login` body.
    ///
    /// # Errors
    ///
    /// Returns every missing field.
    pub fn validate(&self) -> Result<LoginRequest, FormErrors> {
        let mut errors = FormErrors::default();
        let identifier = self.identifier.trim();

        if identifier.is_empty() {
            errors.push(Field::Identifier, "email is required");
        }
        if self.password.is_empty() {
            errors.push(Field::Password, "password is required");
        }

        errors.into_result(|| LoginRequest {
            identifier: identifier.to_string(),
            password: self.password.clone(),
        })
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Raw input of the registration form.
#[derive(Clone, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the form and build the `/auth/register` body.
    ///
    /// Names are trimmed and the email is normalized.
    ///
    /// # Errors
    ///
    /// Returns every invalid field, not just the first.
    pub fn validate(&self) -> Result<RegisterRequest, FormErrors> {
        let mut errors = FormErrors::default();

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        check_name(&mut errors, Field::FirstName, "first name", first_name);
        check_name(&mut errors, Field::LastName, "last name", last_name);

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(Field::Email, e.to_string());
                None
            }
        };

        if self.password.is_empty() {
            errors.push(Field::Password, "password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(
                Field::Password,
                format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        if self.confirm_password != self.password {
            errors.push(Field::ConfirmPassword, "passwords do not match");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(RegisterRequest {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.into_inner(),
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

fn check_name(errors: &mut FormErrors, field: Field, label: &str, value: &str) {
    if value.is_empty() {
        errors.push(field, format!("{label} is required"));
    } else if value.chars().count() > MAX_NAME_LENGTH {
        errors.push(
            field,
            format!("{label} must be at most {MAX_NAME_LENGTH} characters"),
        );
    }
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}
