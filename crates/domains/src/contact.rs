//! Messaging deep link shown on the listing detail view.

use url::form_urlencoded;

use crate::models::Listing;

pub const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send";

/// Builds `https://api.whatsapp.com/send?phone=...&text=...` for a listing.
pub fn whatsapp_link(listing: &Listing) -> String {
    let message = format!(
        "Olá vi esse {} no WebCarros e fiquei interessado",
        listing.name
    );
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("phone", &listing.whatsapp)
        .append_pair("text", &message)
        .finish();
    format!("{WHATSAPP_SEND_URL}?{query}")
}
