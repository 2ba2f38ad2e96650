use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref IDENTIFIER:  Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
}

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// `TblSkillLevel` -> `tbl_skill_level`. A capital letter right after a
/// lowercase letter or digit starts a new segment.
pub fn camel_to_underscore(name: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(name, "${1}_${2}")
        .to_lowercase()
}
