/// Region code used when a token is not in the table.
pub const FALLBACK_REGION_CODE: &str = "ag";

/// Map a user-facing region token to the code the like service expects.
pub fn region_code(token: &str) -> &'static str {
    match token.trim().to_ascii_lowercase().as_str() {
        "ind" => "ind",
        "br" | "us" | "sac" | "na" | "nx" => "nx",
        _ => FALLBACK_REGION_CODE,
    }
}
