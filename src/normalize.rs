// 🧹 Field Normalizer - course codes, departments and credit hours
// Turns raw spreadsheet cells into the values stored in the database

// ============================================================================
// CREDIT FIELD
// ============================================================================

/// Raw "Credit Hours" cell as it comes out of the sheet
#[derive(Debug, Clone, PartialEq)]
pub enum CreditField {
    /// Empty cell or column not present
    Missing,

    /// Free text, e.g. "3", "3 or 4", "3/4", "N/A"
    Text(String),

    /// Already numeric
    Number(f64),
}

impl CreditField {
    /// Build from an optional CSV cell. Blank text counts as missing.
    /// Sheet cells are always text, so this never yields `Number`.
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            Some(text) if !text.trim().is_empty() => CreditField::Text(text.to_string()),
            _ => CreditField::Missing,
        }
    }

    /// Original cell text for log messages
    pub fn raw(&self) -> String {
        match self {
            CreditField::Missing => String::new(),
            CreditField::Text(text) => text.clone(),
            CreditField::Number(n) => n.to_string(),
        }
    }
}

/// The malformed credit values the importer tolerates (row gets skipped)
#[derive(Debug, Clone, PartialEq)]
pub enum CreditError {
    /// No value at all
    Missing,

    /// Text with no token that reads as a number
    NoNumericToken(String),

    /// Parsed, but NaN or infinite
    NotFinite(f64),
}

impl std::fmt::Display for CreditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreditError::Missing => write!(f, "credits missing"),
            CreditError::NoNumericToken(text) => write!(f, "no numeric credit value in '{}'", text),
            CreditError::NotFinite(n) => write!(f, "credit value {} is not finite", n),
        }
    }
}

impl std::error::Error for CreditError {}

// ============================================================================
// CREDITS
// ============================================================================

/// Classify a credit cell into a number or one of the tolerated failures.
///
/// Text is read as a list of alternatives: `/` and `or` separate values and
/// the first token that parses as a finite float wins ("3 or 4" -> 3.0).
pub fn classify_credits(value: &CreditField) -> Result<f64, CreditError> {
    match value {
        CreditField::Missing => Err(CreditError::Missing),
        CreditField::Number(n) if n.is_nan() => Err(CreditError::Missing),
        CreditField::Number(n) if n.is_infinite() => Err(CreditError::NotFinite(*n)),
        CreditField::Number(n) => Ok(*n),
        CreditField::Text(text) => {
            if text.trim().is_empty() {
                return Err(CreditError::Missing);
            }

            let separated = text.replace('/', " ").replace("or", " ");
            let mut non_finite = None;

            for token in separated.split_whitespace() {
                match token.parse::<f64>() {
                    Ok(n) if n.is_finite() => return Ok(n),
                    Ok(n) => non_finite = non_finite.or(Some(n)),
                    Err(_) => continue,
                }
            }

            match non_finite {
                Some(n) => Err(CreditError::NotFinite(n)),
                None => Err(CreditError::NoNumericToken(text.clone())),
            }
        }
    }
}

/// Credit hours as a number, or None when the cell can't be read
pub fn parse_credits(value: &CreditField) -> Option<f64> {
    classify_credits(value).ok()
}

// ============================================================================
// COURSE CODES
// ============================================================================

/// Department = first token of the course code, lowercased ("CS 101" -> "cs")
pub fn infer_department(full_code: Option<&str>) -> Option<String> {
    full_code?
        .split_whitespace()
        .next()
        .map(|token| token.trim().to_lowercase())
}

/// Course code with all whitespace removed ("CS 101" -> "CS101")
pub fn compact_code(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}
