use super::normalizer::segment_tokens;
use super::vocabulary::{
    is_directional, is_occupancy_type, is_state_abbreviation, is_state_name, is_street_suffix,
    MAX_STATE_NAME_WORDS,
};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Labels a parser can attach to a piece of an address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Recipient,
    AddressNumber,
    StreetNamePreDirectional,
    StreetName,
    StreetNamePostType,
    StreetNamePostDirectional,
    OccupancyType,
    OccupancyIdentifier,
    #[serde(rename = "USPSBoxType")]
    UspsBoxType,
    #[serde(rename = "USPSBoxID")]
    UspsBoxId,
    PlaceName,
    StateName,
    ZipCode,
}

impl ComponentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recipient => "Recipient",
            Self::AddressNumber => "AddressNumber",
            Self::StreetNamePreDirectional => "StreetNamePreDirectional",
            Self::StreetName => "StreetName",
            Self::StreetNamePostType => "StreetNamePostType",
            Self::StreetNamePostDirectional => "StreetNamePostDirectional",
            Self::OccupancyType => "OccupancyType",
            Self::OccupancyIdentifier => "OccupancyIdentifier",
            Self::UspsBoxType => "USPSBoxType",
            Self::UspsBoxId => "USPSBoxID",
            Self::PlaceName => "PlaceName",
            Self::StateName => "StateName",
            Self::ZipCode => "ZipCode",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Component values in the order they were first seen. Tokens sharing a kind
/// are joined with a single space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredAddress {
    components: Vec<(ComponentKind, String)>,
}

impl StructuredAddress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ComponentKind, value: &str) {
        if value.is_empty() {
            return;
        }

        match self
            .components
            .iter_mut()
            .find(|(existing, _)| *existing == kind)
        {
            Some((_, current)) => {
                current.push(' ');
                current.push_str(value);
            }
            None => self.components.push((kind, value.to_string())),
        }
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&str> {
        self.components
            .iter()
            .find(|(existing, _)| *existing == kind)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &str)> {
        self.components
            .iter()
            .map(|(kind, value)| (*kind, value.as_str()))
    }
}

impl<S: AsRef<str>> FromIterator<(ComponentKind, S)> for StructuredAddress {
    fn from_iter<I: IntoIterator<Item = (ComponentKind, S)>>(iter: I) -> Self {
        let mut address = Self::new();
        for (kind, value) in iter {
            address.push(kind, value.as_ref());
        }
        address
    }
}

impl Serialize for StructuredAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.components.iter().map(|(kind, value)| (kind, value)))
    }
}

/// Turns free text into labelled address components.
///
/// Implementations must be deterministic and total: unknown input yields a
/// sparse (possibly empty) structure, never an error.
pub trait AddressParser: Send + Sync {
    fn parse(&self, text: &str) -> StructuredAddress;
}

/// Token rules for US-style addresses ("1 Main St Ste 2, Chicago, IL 60601").
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedParser;

impl AddressParser for RuleBasedParser {
    fn parse(&self, text: &str) -> StructuredAddress {
        let mut segments = segment_tokens(text);
        let mut address = StructuredAddress::new();
        if segments.is_empty() {
            return address;
        }

        let zip = take_zip(&mut segments);
        let state = take_state(&mut segments, zip.is_some());

        let mut remaining = segments.into_iter().peekable();

        // A leading name segment ("Youth Center, 12 Oak Ave") is a recipient.
        while let Some(segment) = remaining.peek() {
            let has_number = segment.iter().any(|token| starts_with_digit(token));
            let next_starts_with_number = remaining.clone().nth(1).is_some_and(|next| {
                next.first().is_some_and(|token| starts_with_digit(token))
            });
            if has_number || !next_starts_with_number {
                break;
            }

            if let Some(segment) = remaining.next() {
                for token in &segment {
                    address.push(ComponentKind::Recipient, token);
                }
            }
        }

        if let Some(street) = remaining.next() {
            let leftover = parse_street(&street, &mut address);
            push_all(&mut address, ComponentKind::PlaceName, leftover);
        }

        for segment in remaining {
            let consumed = parse_occupancy(&segment, 0, &mut address);
            push_all(&mut address, ComponentKind::PlaceName, &segment[consumed..]);
        }

        if let Some(state) = state {
            address.push(ComponentKind::StateName, &state);
        }
        if let Some(zip) = zip {
            address.push(ComponentKind::ZipCode, &zip);
        }

        address
    }
}

fn push_all(address: &mut StructuredAddress, kind: ComponentKind, tokens: &[String]) {
    for token in tokens {
        address.push(kind, token);
    }
}

fn starts_with_digit(token: &str) -> bool {
    token.chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

fn is_zip(token: &str) -> bool {
    let (base, plus_four) = match token.split_once('-') {
        Some((base, extension)) => (base, Some(extension)),
        None => (token, None),
    };

    let all_digits = |value: &str, len: usize| {
        value.len() == len && value.chars().all(|ch| ch.is_ascii_digit())
    };

    all_digits(base, 5) && plus_four.map_or(true, |extension| all_digits(extension, 4))
}

fn total_tokens(segments: &[Vec<String>]) -> usize {
    segments.iter().map(Vec::len).sum()
}

fn drop_empty_tail(segments: &mut Vec<Vec<String>>) {
    if segments.last().is_some_and(Vec::is_empty) {
        segments.pop();
    }
}

fn take_zip(segments: &mut Vec<Vec<String>>) -> Option<String> {
    if total_tokens(segments) < 2 {
        return None;
    }

    let last = segments.last_mut()?;
    if !last.last().is_some_and(|token| is_zip(token)) {
        return None;
    }

    let zip = last.pop();
    drop_empty_tail(segments);
    zip
}

/// Pops a trailing state. Without a zip, only a state in its own trailing
/// segment is trusted, so "100 Main Ct" keeps its street type.
fn take_state(segments: &mut Vec<Vec<String>>, has_zip: bool) -> Option<String> {
    let segment_index = segments.len().checked_sub(1)?;
    if !has_zip && segment_index == 0 {
        return None;
    }

    let last = &segments[segment_index];
    let floor = if segment_index == 0 { 1 } else { 0 };

    for words in (1..=MAX_STATE_NAME_WORDS).rev() {
        if last.len() < words + floor {
            continue;
        }

        let tail = &last[last.len() - words..];
        let is_state = if words == 1 {
            is_state_abbreviation(&tail[0]) || is_state_name(tail)
        } else {
            is_state_name(tail)
        };

        if is_state {
            let state = tail.join(" ");
            let keep = last.len() - words;
            segments[segment_index].truncate(keep);
            drop_empty_tail(segments);
            return Some(state);
        }
    }

    None
}

fn is_po_box_start(tokens: &[String]) -> Option<usize> {
    let folded: Vec<String> = tokens
        .iter()
        .take(2)
        .map(|token| token.to_ascii_lowercase())
        .collect();

    match folded.as_slice() {
        [first, second, ..] if matches!(first.as_str(), "po" | "p.o." | "p.o") && second == "box" => {
            Some(2)
        }
        [first, ..] if matches!(first.as_str(), "pob" | "box" | "pobox") => Some(1),
        _ => None,
    }
}

/// Labels the street segment and returns the tokens it could not place.
fn parse_street<'a>(tokens: &'a [String], address: &mut StructuredAddress) -> &'a [String] {
    let len = tokens.len();
    let mut index = 0;

    if let Some(box_words) = is_po_box_start(tokens) {
        address.push(ComponentKind::UspsBoxType, &tokens[..box_words].join(" "));
        index = box_words;
        if index < len {
            address.push(ComponentKind::UspsBoxId, &tokens[index]);
            index += 1;
        }
        return &tokens[index..];
    }

    if let Some(number_at) = tokens.iter().position(|token| starts_with_digit(token)) {
        push_all(address, ComponentKind::Recipient, &tokens[..number_at]);
        address.push(ComponentKind::AddressNumber, &tokens[number_at]);
        index = number_at + 1;
    }

    if index + 1 < len && is_directional(&tokens[index]) && !is_occupancy_type(&tokens[index + 1])
    {
        address.push(ComponentKind::StreetNamePreDirectional, &tokens[index]);
        index += 1;
    }

    let boundary = tokens[index..]
        .iter()
        .position(|token| is_occupancy_type(token))
        .map_or(len, |offset| index + offset);

    match (index + 1..boundary)
        .rev()
        .find(|&position| is_street_suffix(&tokens[position]))
    {
        Some(suffix_at) => {
            push_all(address, ComponentKind::StreetName, &tokens[index..suffix_at]);
            address.push(ComponentKind::StreetNamePostType, &tokens[suffix_at]);
            index = suffix_at + 1;

            if index < boundary && is_directional(&tokens[index]) {
                address.push(ComponentKind::StreetNamePostDirectional, &tokens[index]);
                index += 1;
            }
        }
        None => {
            push_all(address, ComponentKind::StreetName, &tokens[index..boundary]);
            index = boundary;
        }
    }

    index = parse_occupancy(tokens, index, address);
    &tokens[index..]
}

/// Consumes occupancy designators ("Ste 200", "#4", "Fl 2 Rm 210") starting at
/// `index` and returns the index of the first unconsumed token.
fn parse_occupancy(tokens: &[String], mut index: usize, address: &mut StructuredAddress) -> usize {
    while index < tokens.len() && is_occupancy_type(&tokens[index]) {
        let token = &tokens[index];
        index += 1;

        if let Some(identifier) = token.strip_prefix('#').filter(|rest| !rest.is_empty()) {
            address.push(ComponentKind::OccupancyType, "#");
            address.push(ComponentKind::OccupancyIdentifier, identifier);
            continue;
        }

        address.push(ComponentKind::OccupancyType, token);

        if index < tokens.len() && tokens[index] == "#" {
            index += 1;
        }
        if let Some(next) = tokens.get(index) {
            let identifier = next.trim_start_matches('#');
            if !identifier.is_empty() && !is_occupancy_type(identifier) {
                address.push(ComponentKind::OccupancyIdentifier, identifier);
                index += 1;
            }
        }
    }

    index
}
