use crate::config::Config;
use crate::controller::LandingController;
use crate::countries::{Country, COUNTRIES};
use crate::errors::AppError;
use crate::form::FormState;
use crate::links;
use crate::models::{AgeBracket, Interest, Sex, Situation};
use crate::state_machine::ViewState;
use serde::Serialize;

/// One selectable option: stored value and visible label.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
}

macro_rules! option_views {
    ($ty:ty) => {
        <$ty>::ALL
            .iter()
            .map(|o| OptionView {
                value: o.as_str(),
                label: o.label(),
            })
            .collect::<Vec<_>>()
    };
}

#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub countries: &'static [Country],
    pub age: Vec<OptionView>,
    pub sex: Vec<OptionView>,
    pub situation: Vec<OptionView>,
    pub interest: Vec<OptionView>,
}

impl FormOptions {
    pub fn new() -> Self {
        Self {
            countries: COUNTRIES,
            age: option_views!(AgeBracket),
            sex: option_views!(Sex),
            situation: option_views!(Situation),
            interest: option_views!(Interest),
        }
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Confetti burst played once after registering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Celebration {
    pub particle_count: u32,
    pub spread: u32,
    pub origin_y: f32,
    pub colors: [&'static str; 3],
}

impl Default for Celebration {
    fn default() -> Self {
        Self {
            particle_count: 150,
            spread: 70,
            origin_y: 0.6,
            colors: ["#059669", "#10b981", "#34d399"],
        }
    }
}

/// The four mutually exclusive screens.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum View {
    Registration {
        status: &'static str,
        form: FormState,
        progress: f64,
        error_message: Option<String>,
        /// Submit button disabled, busy indicator shown.
        busy: bool,
        dial_code_editable: bool,
        options: FormOptions,
        logo_url: String,
    },
    Loading,
    Success {
        lead_id: String,
        magic_link: String,
        invitation_link: String,
        whatsapp_link: String,
        celebration: Option<Celebration>,
    },
    GatedKit {
        kit_url: String,
        logo_url: String,
    },
}

impl View {
    /// Renders the controller's current state. Consumes a pending celebration.
    pub fn render(controller: &mut LandingController, config: &Config) -> Result<Self, AppError> {
        let celebration = controller.take_celebration().then(Celebration::default);

        let view = match controller.state() {
            ViewState::Verifying { .. } => View::Loading,
            ViewState::GatedKit { .. } => View::GatedKit {
                kit_url: config.kit_url.clone(),
                logo_url: config.logo_url.clone(),
            },
            ViewState::Success { lead_id } => View::Success {
                lead_id: lead_id.clone(),
                magic_link: links::magic_link(&config.public_base_url, lead_id)?,
                invitation_link: links::invitation_link(&config.public_base_url)?,
                whatsapp_link: links::whatsapp_share_link(&config.public_base_url)?,
                celebration,
            },
            state => {
                let error_message = match state {
                    ViewState::IdleWithError { message } => Some(message.clone()),
                    _ => None,
                };
                View::Registration {
                    status: state.name(),
                    form: controller.form().clone(),
                    progress: controller.progress(),
                    error_message,
                    busy: matches!(state, ViewState::Submitting),
                    dial_code_editable: controller.form().dial_code_editable(),
                    options: FormOptions::new(),
                    logo_url: config.logo_url.clone(),
                }
            }
        };

        Ok(view)
    }
}
