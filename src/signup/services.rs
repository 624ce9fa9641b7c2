use lazy_static::lazy_static;
use regex::Regex;

use crate::signup::{
    dto::SignupForm,
    errors::ValidationError,
    repo_types::{NewUser, Role},
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // ASCII digits only; `\d` would also accept other scripts' digits.
    static ref IDNUMBER_RE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{4}$").unwrap();
    // Two digit groups split by a dash, whitespace, or both.
    static ref SPLIT_ID_RE: Regex =
        Regex::new(r"^([0-9]{4})(?:\s*-\s*|\s+)([0-9]{4})$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_idnumber(idnumber: &str) -> bool {
    IDNUMBER_RE.is_match(idnumber)
}

/// Fold dash look-alikes into `-`, treat the gap between the two digit
/// groups as the separator, and drop any other whitespace.
pub fn normalize_idnumber(raw: &str) -> String {
    let dashed: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    if let Some(caps) = SPLIT_ID_RE.captures(&dashed) {
        return format!("{}-{}", &caps[1], &caps[2]);
    }
    dashed.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize a raw form and run the checks in order, stopping at the first
/// failure.
pub fn validate(form: SignupForm) -> Result<NewUser, ValidationError> {
    let fullname = form.fullname.trim().to_string();
    let email = form.email.trim().to_string();
    let idnumber = normalize_idnumber(&form.idnumber);
    let role = form.role.trim();
    let agreed = form.agree.as_deref().is_some_and(|a| !a.is_empty());

    if fullname.is_empty() || email.is_empty() || idnumber.is_empty() || role.is_empty() || !agreed
    {
        return Err(ValidationError::MissingFields);
    }

    // Only one of the deployed form variants checked the address shape;
    // it is always enforced here.
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }

    if !is_valid_idnumber(&idnumber) {
        return Err(ValidationError::InvalidIdNumber);
    }

    let role = role
        .parse::<Role>()
        .map_err(|_| ValidationError::InvalidRole)?;

    Ok(NewUser {
        fullname,
        email,
        idnumber,
        role,
    })
}
