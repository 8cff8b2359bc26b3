//! Wire model for a course enrollment and the single-shot submission
//! routine. Field names equal the endpoint's JSON names, so nothing is
//! renamed during (de)serialization.

use log::debug;
use serde::{Deserialize, Serialize};
use sonic_rs::Value;

use crate::adapter::{Client, PostResult};

/// Endpoint the submission binary posts to.
pub const DEFAULT_SIGNUP_URL: &str = "http://127.0.0.1:8080/signup";

/// A person reachable by phone: the member themselves or their emergency
/// contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub firstname: String,
    /// Dutch name infix such as "de" or "van".
    pub infix: String,
    pub lastname: String,
    pub phone: String,
}

/// Everything the signup endpoint wants to know about a new member:
/// personal details, an emergency contact, and the bank account the
/// membership fee is collected from. The payload is not validated on this
/// side; the endpoint owns all checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupPayload {
    pub legalfirstnames: String,
    pub member: Contact,
    /// ISO-8601 timestamp, e.g. `2000-10-12T00:00:00Z`.
    pub date_of_birth: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub email: String,
    pub course: String,
    pub cohort: String,
    pub emergency_contact: Contact,
    pub iban: String,
    pub account_holder: String,
}

impl SignupPayload {
    /// The canned enrollment posted by the submission binary; the tests use
    /// it as their fixture too.
    pub fn test_user() -> Self {
        Self {
            legalfirstnames: "boben b".to_string(),
            member: Contact {
                firstname: "bob".to_string(),
                infix: "de".to_string(),
                lastname: "tak".to_string(),
                phone: "+31612345678".to_string(),
            },
            date_of_birth: "2000-10-12T00:00:00Z".to_string(),
            address: "Lovensdijkstaat 16".to_string(),
            postal_code: "4793RR".to_string(),
            city: "Breda".to_string(),
            email: "jandevries@example.org".to_string(),
            course: "TI".to_string(),
            cohort: "2022/2023".to_string(),
            emergency_contact: Contact {
                firstname: "greetje".to_string(),
                infix: "de".to_string(),
                lastname: "vries".to_string(),
                phone: "+31687654321".to_string(),
            },
            iban: "NL13KNAB121223232345".to_string(),
            account_holder: "B. B. de Tak".to_string(),
        }
    }
}

/// Post one enrollment to `url` and return the parsed JSON reply.
///
/// The endpoint reports validation problems as a JSON body on a 4xx reply;
/// that still resolves here, and callers print whatever came back instead of
/// branching on it.
pub async fn send_signup(
    client: &Client,
    url: &str,
    payload: &SignupPayload,
) -> PostResult<Value> {
    debug!("submitting enrollment for {}", payload.email);
    client.send(url, payload).await
}
