// src/process/names.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::Gender;

/// Gender suffixes, tried in order; the first match wins.
static GENDER_RULES: Lazy<Vec<(Gender, Regex)>> = Lazy::new(|| {
    [
        (Gender::Female, r"(?i)^(?P<name>.*)[\-– ]FEM[INO]*$"),
        (Gender::Male, r"(?i)^(?P<name>.*)[\-– ]MASC[ULINO]*$"),
    ]
    .into_iter()
    .map(|(gender, pattern)| (gender, Regex::new(pattern).expect("valid gender regex")))
    .collect()
});

/// `"<name> - <ABBR>"`, abbreviation in capitals.
static ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^\-–]*)[\-–] *(?P<abbr>[A-Z]*)[\-– ]*$")
        .expect("valid abbreviation regex")
});

/// What a free-text facility name cell encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    pub name: String,
    pub abbreviation: String,
    /// Set only when the name carries a gender suffix.
    pub gender: Option<Gender>,
}

/// Label and captured name of the first rule matching `text`.
fn first_match<'a, L: Copy>(rules: &[(L, Regex)], text: &'a str) -> Option<(L, &'a str)> {
    rules.iter().find_map(|(label, re)| {
        re.captures(text)
            .and_then(|c| c.name("name"))
            .map(|m| (*label, m.as_str()))
    })
}

pub fn parse_facility_name(raw: &str) -> NameParts {
    let trimmed = raw.trim();
    let (gender, rest) = match first_match(&GENDER_RULES, trimmed) {
        Some((gender, name)) => (Some(gender), name.trim()),
        None => (None, trimmed),
    };

    let (name, abbreviation) = match ABBREVIATION.captures(rest) {
        Some(caps) => (
            caps.name("name").map_or("", |m| m.as_str()),
            caps.name("abbr").map_or("", |m| m.as_str()),
        ),
        None => (rest, ""),
    };

    NameParts {
        name: name.trim().to_string(),
        abbreviation: abbreviation.trim().to_string(),
        gender,
    }
}
