use bytes::Bytes;
use image::ImageFormat;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::config::DEFAULT_SCREENSHOT_MAX_BYTES;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s\-+()]{10,}$").expect("phone pattern"));

pub const MIN_NAME_CHARS: usize = 3;
pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const ALLOWED_SCREENSHOT_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    FullName,
    Email,
    Phone,
    PaymentMethod,
    Screenshot,
    Message,
}

impl Field {
    /// Form field name, as posted to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::PaymentMethod => "paymentMethod",
            Field::Screenshot => "screenshot",
            Field::Message => "message",
        }
    }
}

/// One message per offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field.as_str(), message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Easypaisa,
    JazzCash,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Easypaisa => "easypaisa",
            PaymentMethod::JazzCash => "jazzcash",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easypaisa" => Some(PaymentMethod::Easypaisa),
            "jazzcash" => Some(PaymentMethod::JazzCash),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }
}

/// Payment proof picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Screenshot {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub screenshot_max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            screenshot_max_bytes: DEFAULT_SCREENSHOT_MAX_BYTES,
        }
    }
}

/// Raw enrollment form input.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub payment_method: String,
    pub screenshot: Option<Screenshot>,
    pub message: String,
}

/// An enrollment form that passed every check.
#[derive(Debug, Clone)]
pub struct ValidEnrollment {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub screenshot: Screenshot,
    pub message: Option<String>,
}

impl EnrollmentForm {
    pub fn validate(&self, limits: &UploadLimits) -> Result<ValidEnrollment, FieldErrors> {
        let mut errors = FieldErrors::default();

        let full_name = self.full_name.trim();
        if full_name.chars().count() < MIN_NAME_CHARS {
            errors.insert(Field::FullName, "Name must be at least 3 characters");
        }

        if !is_valid_email(&self.email) {
            errors.insert(Field::Email, "Please enter a valid email address");
        }

        let phone = self.phone.trim();
        if !phone.is_empty() && !is_valid_phone(phone) {
            errors.insert(Field::Phone, "Please enter a valid phone number");
        }

        let payment_method = if self.payment_method.trim().is_empty() {
            errors.insert(Field::PaymentMethod, "Please select a payment method");
            None
        } else {
            let parsed = PaymentMethod::parse(self.payment_method.trim());
            if parsed.is_none() {
                errors.insert(Field::PaymentMethod, "Please select a valid payment method");
            }
            parsed
        };

        if let Err(message) = check_screenshot(self.screenshot.as_ref(), limits) {
            errors.insert(Field::Screenshot, message);
        }

        let message = self.message.trim();
        if message.chars().count() > MAX_MESSAGE_CHARS {
            errors.insert(Field::Message, "Message must be at most 1000 characters");
        }

        match (payment_method, &self.screenshot) {
            (Some(payment_method), Some(screenshot)) if errors.is_empty() => {
                Ok(ValidEnrollment {
                    full_name: full_name.to_string(),
                    email: self.email.clone(),
                    phone: (!phone.is_empty()).then(|| phone.to_string()),
                    payment_method,
                    screenshot: screenshot.clone(),
                    message: (!message.is_empty()).then(|| message.to_string()),
                })
            }
            _ => Err(errors),
        }
    }
}

fn check_screenshot(screenshot: Option<&Screenshot>, limits: &UploadLimits) -> Result<(), String> {
    let Some(screenshot) = screenshot else {
        return Err("Payment screenshot is required".to_string());
    };

    if screenshot.len() > limits.screenshot_max_bytes {
        return Err(format!(
            "Screenshot must be less than {}",
            human_size(limits.screenshot_max_bytes)
        ));
    }

    let content_type = screenshot.content_type.to_ascii_lowercase();
    if !ALLOWED_SCREENSHOT_TYPES.contains(&content_type.as_str()) {
        return Err("Screenshot must be an image (JPEG, PNG or WebP)".to_string());
    }

    match image::guess_format(&screenshot.data) {
        Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP) => Ok(()),
        _ => Err("Screenshot file is not a valid image".to_string()),
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
