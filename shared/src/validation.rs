//! Validation utilities for the Stockroom inventory backend

/// Maximum length of free-text location fields
pub const MAX_LOCATION_LEN: usize = 255;

/// Maximum length of notes and rejection reasons
pub const MAX_NOTE_LEN: usize = 1000;

/// Validate a movement or request quantity (at least one unit)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Validate an initial stock balance (zero allowed)
pub fn validate_opening_stock(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Stock cannot be negative");
    }
    Ok(())
}

/// Validate item code format (3-32 uppercase alphanumeric, dash allowed)
pub fn validate_item_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Item code must be at least 3 characters");
    }
    if code.len() > 32 {
        return Err("Item code must be at most 32 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Item code must be uppercase alphanumeric");
    }
    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), &'static str> {
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err("Location must be at most 255 characters");
    }
    Ok(())
}

pub fn validate_note(note: &str) -> Result<(), &'static str> {
    if note.chars().count() > MAX_NOTE_LEN {
        return Err("Note must be at most 1000 characters");
    }
    Ok(())
}

/// Trim a free-text field, mapping blank input to `None`
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
