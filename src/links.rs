//! Shareable links shown on the success screen.
//!
//! Link format: `<origin><path>` for invitations, `<origin><path>?uid=<id>`
//! for the visitor's personal "reopen kit" link.

use crate::attribution::UID_PARAM;
use crate::errors::AppError;
use url::Url;

pub const SHARE_TEXT: &str = "¡Hola! Me acabo de unir a la lista prioritaria de la Escuela Cuid-Arte de la Dra. Odile Fernández y me han regalado un Kit de Supervivencia. ¡Únete tú también aquí!";

const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send";

/// Origin plus path of the page, without query or fragment.
pub fn invitation_link(page_url: &str) -> Result<String, AppError> {
    let mut url = Url::parse(page_url)
        .map_err(|e| AppError::BadRequest(format!("Invalid page URL: {}", e)))?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Personal link that re-opens the kit for `lead_id`.
pub fn magic_link(page_url: &str, lead_id: &str) -> Result<String, AppError> {
    let base = invitation_link(page_url)?;
    let mut url = Url::parse(&base)
        .map_err(|e| AppError::InternalError(format!("Invalid invitation link: {}", e)))?;
    url.query_pairs_mut().append_pair(UID_PARAM, lead_id);
    Ok(url.to_string())
}

/// WhatsApp share URL inviting friends to the general page (never the personal link).
pub fn whatsapp_share_link(page_url: &str) -> Result<String, AppError> {
    let text = format!("{} {}", SHARE_TEXT, invitation_link(page_url)?);
    let url = Url::parse_with_params(WHATSAPP_SEND_URL, &[("text", text.as_str())])
        .map_err(|e| AppError::InternalError(format!("Failed to build share URL: {}", e)))?;
    Ok(url.to_string())
}
