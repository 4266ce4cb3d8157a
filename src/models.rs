use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Declares a closed set of form options with their stored value and label.
macro_rules! form_options {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($value:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Value persisted on the lead record.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            /// Text shown next to the option.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(AppError::BadRequest(format!(
                        "Invalid {} option: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

form_options! {
    /// Age bracket of the registrant.
    AgeBracket {
        Under35 => ("<35", "Menos de 35 años"),
        From35To45 => ("35-45", "35–45 años"),
        From46To55 => ("46-55", "46–55 años"),
        Over55 => (">55", "Más de 55 años"),
    }
}

form_options! {
    Sex {
        Woman => ("Mujer", "Mujer"),
        Man => ("Hombre", "Hombre"),
        Undisclosed => ("Prefiero no decirlo", "Prefiero no decirlo"),
    }
}

form_options! {
    /// Current health situation.
    Situation {
        Survivor => ("He pasado por un cáncer", "He pasado por un cáncer"),
        Prevention => ("Quiero prevenir y mejorar mis hábitos", "Quiero prevenir y mejorar mis hábitos"),
        InTreatment => ("Estoy en tratamiento actualmente", "Estoy en tratamiento actualmente"),
        Caregiver => ("Acompaño a alguien con cáncer/enfermedad", "Acompaño a alguien con cáncer/enfermedad"),
        SelfCare => ("Simplemente quiero cuidarme mejor", "Simplemente quiero cuidarme mejor"),
    }
}

form_options! {
    /// Interest in the school.
    Interest {
        VeryInterested => ("Muy interesado/a", "Muy interesado/a (¡avisadme el primero/a!)"),
        InterestedWithQuestions => ("Interesado/a con dudas", "Me interesa, pero tengo preguntas"),
        UpdatesOnly => ("Solo informado/a", "Solo quiero recibir actualizaciones"),
    }
}

/// Campaign attribution captured from the entry URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// Lead payload sent on creation. The identifier is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    /// Dial code and local number, no separators.
    pub phone: String,
    pub country: String,
    pub age: Option<AgeBracket>,
    pub sex: Option<Sex>,
    pub situation: Option<Situation>,
    pub interest: Option<Interest>,
    pub consent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
}

/// Lead row as stored in the hosted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub age: Option<AgeBracket>,
    pub sex: Option<Sex>,
    pub situation: Option<Situation>,
    pub interest: Option<Interest>,
    pub consent: bool,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub downloaded_kit: Option<bool>,
}

impl LeadRecord {
    pub fn from_new(id: impl Into<String>, lead: NewLead) -> Self {
        Self {
            id: id.into(),
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            country: lead.country,
            age: lead.age,
            sex: lead.sex,
            situation: lead.situation,
            interest: lead.interest,
            consent: lead.consent,
            utm_source: lead.utm_source,
            utm_medium: lead.utm_medium,
            utm_campaign: lead.utm_campaign,
            downloaded_kit: None,
        }
    }
}

/// Row shape returned by `select=id`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadId {
    pub id: serde_json::Value,
}

impl LeadId {
    /// Stores may hand back either string or numeric keys.
    pub fn into_string(self) -> Option<String> {
        match self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
