//! Registration form state: field values, completion progress, and the
//! normalization applied right before a lead is created.

use crate::attribution::EntryContext;
use crate::countries::{self, BARE_DIAL_PREFIX, DEFAULT_COUNTRY, DEFAULT_DIAL_CODE, OTHER_COUNTRY};
use crate::errors::AppError;
use crate::models::{AgeBracket, Attribution, Interest, NewLead, Sex, Situation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Editable form fields, named as the page submits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Email,
    Phone,
    Country,
    OtherCountry,
    CountryCode,
    Age,
    Sex,
    Situation,
    Interest,
    Consent,
}

/// Fields counted by the progress indicator.
pub const REQUIRED_FIELDS: [FormField; 9] = [
    FormField::Name,
    FormField::Email,
    FormField::Phone,
    FormField::Country,
    FormField::Age,
    FormField::Sex,
    FormField::Situation,
    FormField::Interest,
    FormField::Consent,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub name: String,
    pub email: String,
    /// Raw phone exactly as typed.
    pub phone: String,
    pub country: String,
    pub other_country: String,
    pub country_code: String,
    pub age: Option<AgeBracket>,
    pub sex: Option<Sex>,
    pub situation: Option<Situation>,
    pub interest: Option<Interest>,
    pub consent: bool,
    #[serde(skip)]
    pub attribution: Attribution,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            other_country: String::new(),
            country_code: DEFAULT_DIAL_CODE.to_string(),
            age: None,
            sex: None,
            situation: None,
            interest: None,
            consent: false,
            attribution: Attribution::default(),
        }
    }
}

fn phone_separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\-()]").expect("valid phone separator pattern"))
}

/// Strips whitespace, hyphens and parentheses.
pub fn clean_phone(raw: &str) -> String {
    phone_separators().replace_all(raw, "").into_owned()
}

/// Concatenates the trimmed dial code with the cleaned local number.
pub fn normalize_phone(dial_code: &str, raw_phone: &str) -> String {
    format!("{}{}", dial_code.trim(), clean_phone(raw_phone))
}

fn text(field: FormField, value: FieldValue) -> Result<String, AppError> {
    match value {
        FieldValue::Text(s) => Ok(s),
        FieldValue::Flag(_) => Err(AppError::BadRequest(format!(
            "Field {:?} expects text",
            field
        ))),
    }
}

fn option<T>(field: FormField, value: FieldValue) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    let raw = text(field, value)?;
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}

impl FormState {
    /// Fresh form pre-filled from the entry URL and timezone.
    pub fn from_entry(entry: &EntryContext) -> Self {
        Self {
            country: entry.country.name.to_string(),
            country_code: entry.country.dial.to_string(),
            attribution: entry.attribution.clone(),
            ..Self::default()
        }
    }

    /// Sets one field. Selecting a country also recomputes the dial code.
    pub fn update_field(&mut self, field: FormField, value: FieldValue) -> Result<(), AppError> {
        match field {
            FormField::Name => self.name = text(field, value)?,
            FormField::Email => self.email = text(field, value)?,
            FormField::Phone => self.phone = text(field, value)?,
            FormField::OtherCountry => self.other_country = text(field, value)?,
            FormField::CountryCode => {
                if !self.dial_code_editable() {
                    return Err(AppError::BadRequest(
                        "Dial code is derived from the selected country".to_string(),
                    ));
                }
                self.country_code = text(field, value)?;
            }
            FormField::Country => {
                let country = text(field, value)?;
                if countries::is_other(&country) {
                    self.country_code = BARE_DIAL_PREFIX.to_string();
                } else if let Some(listed) = countries::find_by_name(&country) {
                    self.country_code = listed.dial.to_string();
                }
                self.country = country;
            }
            FormField::Age => self.age = option(field, value)?,
            FormField::Sex => self.sex = option(field, value)?,
            FormField::Situation => self.situation = option(field, value)?,
            FormField::Interest => self.interest = option(field, value)?,
            FormField::Consent => {
                self.consent = match value {
                    FieldValue::Flag(flag) => flag,
                    FieldValue::Text(s) => matches!(s.as_str(), "true" | "on" | "1"),
                }
            }
        }
        Ok(())
    }

    /// Dial code is free text only while the placeholder country is selected.
    pub fn dial_code_editable(&self) -> bool {
        countries::is_other(&self.country)
    }

    fn is_filled(&self, field: FormField) -> bool {
        match field {
            FormField::Name => !self.name.is_empty(),
            FormField::Email => !self.email.is_empty(),
            FormField::Phone => !self.phone.is_empty(),
            FormField::Country => !self.country.is_empty(),
            FormField::OtherCountry => !self.other_country.is_empty(),
            FormField::CountryCode => !self.country_code.is_empty(),
            FormField::Age => self.age.is_some(),
            FormField::Sex => self.sex.is_some(),
            FormField::Situation => self.situation.is_some(),
            FormField::Interest => self.interest.is_some(),
            FormField::Consent => self.consent,
        }
    }

    /// Percentage of required fields filled in.
    pub fn progress(&self) -> f64 {
        let filled = REQUIRED_FIELDS
            .iter()
            .filter(|field| self.is_filled(**field))
            .count();
        (filled as f64 / REQUIRED_FIELDS.len() as f64) * 100.0
    }

    /// Builds the lead payload: phone concatenated without separators and the
    /// free-text country substituted for the placeholder.
    pub fn normalize_for_submission(&self) -> NewLead {
        let country = if countries::is_other(&self.country) {
            if self.other_country.is_empty() {
                OTHER_COUNTRY.to_string()
            } else {
                self.other_country.clone()
            }
        } else {
            self.country.clone()
        };

        NewLead {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: normalize_phone(&self.country_code, &self.phone),
            country,
            age: self.age,
            sex: self.sex,
            situation: self.situation,
            interest: self.interest,
            consent: self.consent,
            utm_source: self.attribution.utm_source.clone(),
            utm_medium: self.attribution.utm_medium.clone(),
            utm_campaign: self.attribution.utm_campaign.clone(),
        }
    }
}
