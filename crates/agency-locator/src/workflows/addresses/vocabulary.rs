use std::collections::HashSet;
use std::sync::OnceLock;

static STREET_SUFFIXES: OnceLock<HashSet<&'static str>> = OnceLock::new();
static DIRECTIONALS: OnceLock<HashSet<&'static str>> = OnceLock::new();
static OCCUPANCY_TYPES: OnceLock<HashSet<&'static str>> = OnceLock::new();
static STATE_ABBREVIATIONS: OnceLock<HashSet<&'static str>> = OnceLock::new();
static STATE_NAMES: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Longest multi-word state name ("district of columbia").
pub(crate) const MAX_STATE_NAME_WORDS: usize = 3;

pub(crate) fn is_street_suffix(token: &str) -> bool {
    street_suffixes().contains(fold(token).as_str())
}

pub(crate) fn is_directional(token: &str) -> bool {
    directionals().contains(fold(token).as_str())
}

pub(crate) fn is_occupancy_type(token: &str) -> bool {
    token.starts_with('#') || occupancy_types().contains(fold(token).as_str())
}

pub(crate) fn is_state_abbreviation(token: &str) -> bool {
    token.len() == 2 && state_abbreviations().contains(fold(token).as_str())
}

pub(crate) fn is_state_name(words: &[String]) -> bool {
    let joined = words
        .iter()
        .map(|word| fold(word))
        .collect::<Vec<_>>()
        .join(" ");
    state_names().contains(joined.as_str())
}

/// Lowercases and drops the trailing period of abbreviations ("St." -> "st").
fn fold(token: &str) -> String {
    token.trim_end_matches('.').to_ascii_lowercase()
}

fn street_suffixes() -> &'static HashSet<&'static str> {
    STREET_SUFFIXES.get_or_init(|| {
        [
            "aly", "alley", "ave", "av", "avenue", "blvd", "boulevard", "cir", "circle", "ct",
            "court", "cv", "cove", "dr", "drive", "expy", "expressway", "hwy", "highway", "ln",
            "lane", "loop", "pkwy", "parkway", "pl", "place", "plz", "plaza", "rd", "road", "row",
            "sq", "square", "st", "str", "street", "ter", "terrace", "trl", "trail", "way",
        ]
        .into_iter()
        .collect()
    })
}

fn directionals() -> &'static HashSet<&'static str> {
    DIRECTIONALS.get_or_init(|| {
        [
            "n", "s", "e", "w", "ne", "nw", "se", "sw", "north", "south", "east", "west",
            "northeast", "northwest", "southeast", "southwest",
        ]
        .into_iter()
        .collect()
    })
}

fn occupancy_types() -> &'static HashSet<&'static str> {
    OCCUPANCY_TYPES.get_or_init(|| {
        [
            "apt", "apartment", "bldg", "building", "dept", "fl", "floor", "rm", "room", "ste",
            "suite", "unit",
        ]
        .into_iter()
        .collect()
    })
}

fn state_abbreviations() -> &'static HashSet<&'static str> {
    STATE_ABBREVIATIONS.get_or_init(|| {
        [
            "al", "ak", "az", "ar", "ca", "co", "ct", "de", "dc", "fl", "ga", "hi", "id", "il",
            "in", "ia", "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne",
            "nv", "nh", "nj", "nm", "ny", "nc", "nd", "oh", "ok", "or", "pa", "pr", "ri", "sc",
            "sd", "tn", "tx", "ut", "vt", "va", "wa", "wv", "wi", "wy",
        ]
        .into_iter()
        .collect()
    })
}

fn state_names() -> &'static HashSet<&'static str> {
    STATE_NAMES.get_or_init(|| {
        [
            "alabama",
            "alaska",
            "arizona",
            "arkansas",
            "california",
            "colorado",
            "connecticut",
            "delaware",
            "district of columbia",
            "florida",
            "georgia",
            "hawaii",
            "idaho",
            "illinois",
            "indiana",
            "iowa",
            "kansas",
            "kentucky",
            "louisiana",
            "maine",
            "maryland",
            "massachusetts",
            "michigan",
            "minnesota",
            "mississippi",
            "missouri",
            "montana",
            "nebraska",
            "nevada",
            "new hampshire",
            "new jersey",
            "new mexico",
            "new york",
            "north carolina",
            "north dakota",
            "ohio",
            "oklahoma",
            "oregon",
            "pennsylvania",
            "rhode island",
            "south carolina",
            "south dakota",
            "tennessee",
            "texas",
            "utah",
            "vermont",
            "virginia",
            "washington",
            "west virginia",
            "wisconsin",
            "wyoming",
        ]
        .into_iter()
        .collect()
    })
}
