//! # src/services/input_validation.rs
//!
//! Prüft die Formulareingaben der drei Rollen, bevor eine Transaktion gebaut wird:
//! Medikamentenkennung, Telefonnummer, Lieferadresse, Firmennamen und Chargen-ID.

use crate::models::identifier::{IdentifierError, ObjectId};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Mindestlänge einer Lieferadresse.
pub const MIN_ADDRESS_LEN: usize = 10;
/// Mindestlänge eines Firmennamens.
pub const MIN_COMPANY_NAME_LEN: usize = 3;

lazy_static! {
    static ref MEDICINE_CODE_RE: Regex = Regex::new(r"^[A-Za-z]{2,4}-\d{4}-(\d{2})$").unwrap();
    static ref PHONE_SEPARATORS_RE: Regex = Regex::new(r"[\s\-().]").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^(0|\+84)[35789][0-9]{8}$").unwrap();
    static ref HAS_NUMBER_RE: Regex = Regex::new(r"\d").unwrap();
    static ref ADDRESS_COMPONENT_VI_RE: Regex =
        Regex::new(r"(?i)(đường|phố|ngõ|ngách|hẻm|phường|xã|thị trấn|quận|huyện|thị xã)").unwrap();
    static ref ADDRESS_COMPONENT_EN_RE: Regex =
        Regex::new(r"(?i)\b(street|st|road|rd|avenue|ave|lane|ln|boulevard|blvd|ward|district)\b")
            .unwrap();
    static ref COMPANY_NAME_RE: Regex = Regex::new(r"^[a-zA-ZÀ-ỹ0-9\s\-,.()]+$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputValidationError {
    #[error("Medicine code must look like <abbreviation>-<year>-<month>, e.g. PhT-2025-12 (2-4 letters, 4-digit year, 2-digit month).")]
    InvalidMedicineCode,

    #[error("Month must be between 01 and 12, got {0:02}.")]
    InvalidMonth(u32),

    #[error("Invalid phone number. Expected 0xxxxxxxxx or +84xxxxxxxxx, e.g. 0987654321.")]
    InvalidPhoneNumber,

    #[error("Address must have at least {MIN_ADDRESS_LEN} characters.")]
    AddressTooShort,

    #[error("Address must include a house number.")]
    AddressMissingNumber,

    #[error("Address must include a street, ward or district.")]
    AddressMissingComponents,

    #[error("Company name must have at least {MIN_COMPANY_NAME_LEN} characters.")]
    CompanyNameTooShort,

    #[error("Company name may only contain letters, digits, spaces and - , . ( )")]
    CompanyNameInvalidCharacters,

    #[error("Receiver company '{actual}' does not match the registered company '{expected}'.")]
    ReceiverCompanyMismatch { expected: String, actual: String },

    #[error("Invalid batch id: {0}")]
    InvalidBatchId(#[from] IdentifierError),
}

/// Prüft eine Medikamentenkennung der Form `<Kürzel>-<Jahr>-<Monat>`.
pub fn validate_medicine_code(code: &str) -> Result<(), InputValidationError> {
    let captures = MEDICINE_CODE_RE
        .captures(code)
        .ok_or(InputValidationError::InvalidMedicineCode)?;
    let month: u32 = captures
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(InputValidationError::InvalidMedicineCode)?;
    if !(1..=12).contains(&month) {
        return Err(InputValidationError::InvalidMonth(month));
    }
    Ok(())
}

/// Prüft eine vietnamesische Mobilnummer und liefert sie ohne Trennzeichen zurück.
pub fn validate_phone_number(phone: &str) -> Result<String, InputValidationError> {
    let cleaned = PHONE_SEPARATORS_RE.replace_all(phone, "").into_owned();
    if PHONE_RE.is_match(&cleaned) {
        Ok(cleaned)
    } else {
        Err(InputValidationError::InvalidPhoneNumber)
    }
}

/// Prüft, ob eine Adresse detailliert genug für die Zustellung ist.
pub fn validate_address(address: &str) -> Result<(), InputValidationError> {
    if address.trim().chars().count() < MIN_ADDRESS_LEN {
        return Err(InputValidationError::AddressTooShort);
    }
    if !HAS_NUMBER_RE.is_match(address) {
        return Err(InputValidationError::AddressMissingNumber);
    }
    if !ADDRESS_COMPONENT_VI_RE.is_match(address) && !ADDRESS_COMPONENT_EN_RE.is_match(address) {
        return Err(InputValidationError::AddressMissingComponents);
    }
    Ok(())
}

/// Gilt für Producer-, Carrier-, Pharmacy- und Empfängernamen.
pub fn validate_company_name(name: &str) -> Result<(), InputValidationError> {
    if name.trim().chars().count() < MIN_COMPANY_NAME_LEN {
        return Err(InputValidationError::CompanyNameTooShort);
    }
    if !COMPANY_NAME_RE.is_match(name) {
        return Err(InputValidationError::CompanyNameInvalidCharacters);
    }
    Ok(())
}

/// Prüft den Empfängernamen und vergleicht ihn (ohne Groß-/Kleinschreibung) mit dem
/// beim Producer hinterlegten Namen.
pub fn validate_receiver_company(
    company: &str,
    expected: Option<&str>,
) -> Result<(), InputValidationError> {
    validate_company_name(company)?;
    if let Some(expected) = expected {
        if company.trim().to_lowercase() != expected.trim().to_lowercase() {
            return Err(InputValidationError::ReceiverCompanyMismatch {
                expected: expected.to_string(),
                actual: company.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_batch_id(batch_id: &str) -> Result<ObjectId, InputValidationError> {
    Ok(ObjectId::parse(batch_id)?)
}
