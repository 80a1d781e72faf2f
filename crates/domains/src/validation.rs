//! Form validation rules. These run before any network call.

use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::ValidationErrors;
use crate::models::{ImageRef, ListingFields};

// ASCII digits only; `\d` would also accept other Unicode digits.
static WHATSAPP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,12}$").expect("whatsapp pattern compiles"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LEN: usize = 6;

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(field, format!("{field} is required"));
    }
}

fn email(errors: &mut ValidationErrors, value: &str) {
    if value.is_empty() {
        errors.push("email", "email is required");
    } else if !EMAIL_RE.is_match(value) {
        errors.push("email", "enter a valid email address");
    }
}

/// Checks a WhatsApp contact number: 10 to 12 digits, nothing else.
pub fn is_valid_whatsapp(value: &str) -> bool {
    WHATSAPP_RE.is_match(value)
}

impl ListingFields {
    /// Reports every failing field at once, in form order.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name);
        required(&mut errors, "model", &self.model);
        required(&mut errors, "year", &self.year);
        required(&mut errors, "km", &self.km);
        required(&mut errors, "price", &self.price);
        required(&mut errors, "city", &self.city);
        if self.whatsapp.is_empty() {
            errors.push("whatsapp", "whatsapp is required");
        } else if !is_valid_whatsapp(&self.whatsapp) {
            errors.push("whatsapp", "invalid phone number");
        }
        required(&mut errors, "description", &self.description);
        errors.into_result()
    }
}

/// A listing needs at least one image, all owned by the submitting user.
pub fn validate_images(images: &[ImageRef], owner_uid: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if images.is_empty() {
        errors.push("images", "upload at least one image of the vehicle");
    } else if images.iter().any(|img| img.owner_uid != owner_uid) {
        errors.push("images", "images must be uploaded by the listing owner");
    }
    errors.into_result()
}

/// Login form.
#[derive(Debug)]
pub struct SignInForm {
    pub email: String,
    pub password: SecretString,
}

impl SignInForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        email(&mut errors, &self.email);
        if self.password.expose_secret().is_empty() {
            errors.push("password", "password is required");
        }
        errors.into_result()
    }
}

/// Registration form.
#[derive(Debug)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

impl SignUpForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name);
        email(&mut errors, &self.email);
        let password = self.password.expose_secret();
        if password.is_empty() {
            errors.push("password", "password is required");
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(
                "password",
                format!("password must have at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        errors.into_result()
    }
}
