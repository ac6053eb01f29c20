use chrono::SecondsFormat;
use hoops_core::model::HoopAttributes;
use quick_xml::escape::escape;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const EXTENDED_NS: &str = "http://schemas.google.com/spreadsheets/2006/extended";

/// Builds the Atom entry that inserts `hoop` as a list feed row. Column names are the
/// lowercased record field names, as the list feed exposes them.
pub fn row_entry(hoop: &HoopAttributes) -> String {
    let columns = [
        ("id", hoop.id.to_string()),
        ("location", hoop.location.clone()),
        ("lat", format!("{:.6}", hoop.lat)),
        ("lng", format!("{:.6}", hoop.lng)),
        ("image", hoop.image.clone()),
        ("story", hoop.story.clone()),
        ("contactok", hoop.contact_ok.to_string()),
        ("email", hoop.email.clone()),
        ("phone", hoop.phone.clone()),
        (
            "created",
            hoop.created.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    let body: String = columns
        .iter()
        .map(|(column, value)| format!("<gsx:{column}>{}</gsx:{column}>", escape(value.as_str())))
        .collect();

    format!(r#"<entry xmlns="{ATOM_NS}" xmlns:gsx="{EXTENDED_NS}">{body}</entry>"#)
}
