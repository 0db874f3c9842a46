//! Interpretation of parsed AllClients API responses.
//!
//! Every successful transport produces a `<results>` document, which still
//! comes in two shapes: a business-level failure
//! (`<results><error>…</error></results>`) or the method-specific payload.
//! Call sites check for the error element first, then decode the payload
//! with the typed extractors below.

use chrono::DateTime;
use chrono_tz::Tz;
use xmltree::{Element, XMLNode};

use super::time::parse_api_datetime;

/// Failures while interpreting a well-formed API response document.
#[derive(thiserror::Error, Debug)]
pub enum ResponseError {
    /// The AllClients server reported a business-level failure, such as
    /// rejected credentials or an unknown contact.
    #[error("AllClients API returned an error: {0}")]
    Api(String),
    /// A field the method's response schema requires was absent.
    #[error("API response is missing the expected <{0}> element")]
    MissingField(String),
    /// A required field was present but its value did not decode.
    #[error("API field <{field}> has a malformed value: {value:?}")]
    Malformed { field: String, value: String },
}

/// A contact record from `GetContacts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Empty when the contact has no company on file.
    pub company: String,
    pub email: Option<String>,
    pub add_date: DateTime<Tz>,
    pub edit_date: DateTime<Tz>,
}

/// A contact flag from `GetFlags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub flag_id: i64,
    pub name: String,
}

/// A to-do plan from `GetToDoPlans`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPlan {
    pub id: i64,
    pub name: String,
}

/// Returns the business-level error message if the response carries one.
pub fn api_error(document: &Element) -> Option<String> {
    document.get_child("error").map(element_text)
}

/// Fails with [`ResponseError::Api`] if the response carries an `<error>`
/// element. Run this before any typed extraction.
pub fn check(document: &Element) -> Result<(), ResponseError> {
    match api_error(document) {
        Some(message) => Err(ResponseError::Api(message)),
        None => Ok(()),
    }
}

/// Extracts the new contact ID from an `AddContact` response.
pub fn contact_id(document: &Element) -> Result<i64, ResponseError> {
    require_int(document, "contactid")
}

/// Extracts the contact list from a `GetContacts` response, preserving
/// document order. Datetime fields are interpreted in the given zone.
pub fn contacts(document: &Element, zone: Tz) -> Result<Vec<Contact>, ResponseError> {
    let list = require_child(document, "contacts")?;
    child_elements(list, "contact")
        .map(|contact| decode_contact(contact, zone))
        .collect()
}

/// Extracts the flag list from a `GetFlags` response.
pub fn flags(document: &Element) -> Result<Vec<Flag>, ResponseError> {
    let list = require_child(document, "flags")?;
    child_elements(list, "flag")
        .map(|flag| {
            Ok(Flag {
                flag_id: require_int(flag, "flagid")?,
                name: require_text(flag, "name")?,
            })
        })
        .collect()
}

/// Extracts the to-do plan list from a `GetToDoPlans` response.
pub fn todo_plans(document: &Element) -> Result<Vec<TodoPlan>, ResponseError> {
    let list = require_child(document, "todoplans")?;
    child_elements(list, "todoplan")
        .map(|plan| {
            Ok(TodoPlan {
                id: require_int(plan, "id")?,
                name: require_text(plan, "name")?,
            })
        })
        .collect()
}

fn decode_contact(element: &Element, zone: Tz) -> Result<Contact, ResponseError> {
    Ok(Contact {
        id: require_int(element, "id")?,
        first_name: require_text(element, "firstname")?,
        last_name: require_text(element, "lastname")?,
        // Optional fields: an absent company reads as an empty string, an
        // absent email as None, matching how integrations consume them.
        company: element.get_child("company").map(element_text).unwrap_or_default(),
        email: element.get_child("email").map(element_text),
        add_date: require_datetime(element, "adddate", zone)?,
        edit_date: require_datetime(element, "editdate", zone)?,
    })
}

/// Child elements of `parent` with the given tag name, in document order.
fn child_elements<'a>(
    parent: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |element| element.name == name)
}

fn element_text(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

fn require_child<'a>(parent: &'a Element, name: &str) -> Result<&'a Element, ResponseError> {
    parent
        .get_child(name)
        .ok_or_else(|| ResponseError::MissingField(name.to_string()))
}

fn require_text(parent: &Element, name: &str) -> Result<String, ResponseError> {
    require_child(parent, name).map(element_text)
}

fn require_int(parent: &Element, name: &str) -> Result<i64, ResponseError> {
    let value = require_text(parent, name)?;
    value.trim().parse().map_err(|_| ResponseError::Malformed {
        field: name.to_string(),
        value,
    })
}

fn require_datetime(
    parent: &Element,
    name: &str,
    zone: Tz,
) -> Result<DateTime<Tz>, ResponseError> {
    let value = require_text(parent, name)?;
    parse_api_datetime(&value, zone).ok_or_else(|| ResponseError::Malformed {
        field: name.to_string(),
        value,
    })
}
