//! Country and dial-code lookup table used by the registration form.

use serde::Serialize;

/// Placeholder entry meaning "my country is not listed".
pub const OTHER_COUNTRY: &str = "Otros";
/// Dial code shown (and left editable) when the placeholder is selected.
pub const BARE_DIAL_PREFIX: &str = "+";
pub const DEFAULT_COUNTRY: &str = "España";
pub const DEFAULT_DIAL_CODE: &str = "+34";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    pub name: &'static str,
    pub code: &'static str,
    pub dial: &'static str,
    pub timezone: &'static str,
}

/// Alphabetical by display name, placeholder last.
pub const COUNTRIES: &[Country] = &[
    Country { name: "Argentina", code: "AR", dial: "+54", timezone: "America/Argentina/Buenos_Aires" },
    Country { name: "Bolivia", code: "BO", dial: "+591", timezone: "America/La_Paz" },
    Country { name: "Chile", code: "CL", dial: "+56", timezone: "America/Santiago" },
    Country { name: "Colombia", code: "CO", dial: "+57", timezone: "America/Bogota" },
    Country { name: "Costa Rica", code: "CR", dial: "+506", timezone: "America/Costa_Rica" },
    Country { name: "Ecuador", code: "EC", dial: "+593", timezone: "America/Guayaquil" },
    Country { name: "España", code: "ES", dial: "+34", timezone: "Europe/Madrid" },
    Country { name: "Estados Unidos", code: "US", dial: "+1", timezone: "America/New_York" },
    Country { name: "México", code: "MX", dial: "+52", timezone: "America/Mexico_City" },
    Country { name: "Panamá", code: "PA", dial: "+507", timezone: "America/Panama" },
    Country { name: "Paraguay", code: "PY", dial: "+595", timezone: "America/Asuncion" },
    Country { name: "Perú", code: "PE", dial: "+51", timezone: "America/Lima" },
    Country { name: "República Dominicana", code: "DO", dial: "+1", timezone: "America/Santo_Domingo" },
    Country { name: "Uruguay", code: "UY", dial: "+598", timezone: "America/Montevideo" },
    Country { name: "Venezuela", code: "VE", dial: "+58", timezone: "America/Caracas" },
    Country { name: OTHER_COUNTRY, code: "OT", dial: BARE_DIAL_PREFIX, timezone: "" },
];

pub fn find_by_name(name: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.name == name)
}

pub fn default_country() -> &'static Country {
    find_by_name(DEFAULT_COUNTRY).unwrap_or(&COUNTRIES[0])
}

pub fn is_other(name: &str) -> bool {
    name == OTHER_COUNTRY
}

/// Resolves the browser timezone to a listed country.
///
/// Exact IANA match wins; otherwise the first listed country sharing the
/// region prefix (`America`, `Europe`) is used; otherwise the default.
pub fn detect_from_timezone(timezone: &str) -> &'static Country {
    let timezone = timezone.trim();
    if timezone.is_empty() {
        return default_country();
    }

    if let Some(exact) = COUNTRIES.iter().find(|c| c.timezone == timezone) {
        return exact;
    }

    let region = timezone.split('/').next().unwrap_or_default();
    COUNTRIES
        .iter()
        .filter(|c| !c.timezone.is_empty())
        .find(|c| c.timezone.split('/').next() == Some(region))
        .unwrap_or_else(default_country)
}
