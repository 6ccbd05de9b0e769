use crate::error::ScoutError;

const SEARCH_BASE: &str = "https://www.zillow.com/homes";

const STATE_CODES: &[(&str, &str)] = &[
    ("ALABAMA", "AL"), ("ALASKA", "AK"), ("ARIZONA", "AZ"), ("ARKANSAS", "AR"),
    ("CALIFORNIA", "CA"), ("COLORADO", "CO"), ("CONNECTICUT", "CT"), ("DELAWARE", "DE"),
    ("FLORIDA", "FL"), ("GEORGIA", "GA"), ("HAWAII", "HI"), ("IDAHO", "ID"),
    ("ILLINOIS", "IL"), ("INDIANA", "IN"), ("IOWA", "IA"), ("KANSAS", "KS"),
    ("KENTUCKY", "KY"), ("LOUISIANA", "LA"), ("MAINE", "ME"), ("MARYLAND", "MD"),
    ("MASSACHUSETTS", "MA"), ("MICHIGAN", "MI"), ("MINNESOTA", "MN"), ("MISSISSIPPI", "MS"),
    ("MISSOURI", "MO"), ("MONTANA", "MT"), ("NEBRASKA", "NE"), ("NEVADA", "NV"),
    ("NEW HAMPSHIRE", "NH"), ("NEW JERSEY", "NJ"), ("NEW MEXICO", "NM"), ("NEW YORK", "NY"),
    ("NORTH CAROLINA", "NC"), ("NORTH DAKOTA", "ND"), ("OHIO", "OH"), ("OKLAHOMA", "OK"),
    ("OREGON", "OR"), ("PENNSYLVANIA", "PA"), ("RHODE ISLAND", "RI"), ("SOUTH CAROLINA", "SC"),
    ("SOUTH DAKOTA", "SD"), ("TENNESSEE", "TN"), ("TEXAS", "TX"), ("UTAH", "UT"),
    ("VERMONT", "VT"), ("VIRGINIA", "VA"), ("WASHINGTON", "WA"), ("WEST VIRGINIA", "WV"),
    ("WISCONSIN", "WI"), ("WYOMING", "WY"),
];

/// A validated "City, ST" search and the results URL it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLocation {
    pub display: String,
    pub url: String,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn state_code(state: &str) -> Option<&'static str> {
    STATE_CODES
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, code)| *code)
}

/// URL path segment for a formatted location, e.g. `los-angeles-ca`
fn slug(location: &str) -> String {
    location
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Parse free-text "City, State" input into a search location
pub fn validate_location(query: &str) -> Result<SearchLocation, ScoutError> {
    let cleaned = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return Err(ScoutError::InvalidLocation("Search query cannot be empty".to_string()));
    }

    let parts: Vec<&str> = cleaned.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(ScoutError::InvalidLocation(
            "Please enter both city and state (e.g., 'Los Angeles, California')".to_string(),
        ));
    }

    let city = parts[0]
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    let state = parts[1].to_uppercase();
    let state = match state.chars().count() {
        2 => state,
        n if n > 2 => state_code(&state)
            .ok_or_else(|| {
                ScoutError::InvalidLocation(
                    "Invalid state name. Please enter a valid US state".to_string(),
                )
            })?
            .to_string(),
        _ => {
            return Err(ScoutError::InvalidLocation(
                "Invalid state format. Please enter full state name or two-letter code"
                    .to_string(),
            ))
        }
    };

    let display = format!("{}, {}", city, state);
    let url = format!("{}/{}_rb/", SEARCH_BASE, slug(&display));

    Ok(SearchLocation { display, url })
}
