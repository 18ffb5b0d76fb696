//! WhatsApp-style chat export parser
//!
//! Lines look like `[25/12/23, 18:30:05] some user: message`. An event is
//! a marker message (💩) immediately followed by a location share from the
//! same user; the event takes the marker's timestamp and the share's
//! coordinates. Lines that do not match the header grammar are message
//! continuations and are skipped.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use nom::bytes::complete::{tag, take_until};
use nom::character::complete::char;
use nom::sequence::delimited;
use nom::{IResult, Parser};
use regex::Regex;

use crate::ingest::Event;

/// The message content that counts as an event marker.
pub const EVENT_MARKER: &str = "💩";

const TIMESTAMP_FORMAT: &str = "%d/%m/%y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
struct ChatLine<'a> {
    timestamp: NaiveDateTime,
    user: &'a str,
    body: &'a str,
}

/// `[stamp] user: body` -> (stamp, user, body)
fn split_line(line: &str) -> IResult<&str, (&str, &str, &str)> {
    let (rest, stamp) = delimited(char('['), take_until("]"), char(']')).parse(line)?;
    let (rest, _) = char(' ').parse(rest)?;
    let (rest, user) = take_until(": ").parse(rest)?;
    let (body, _) = tag(": ").parse(rest)?;
    Ok(("", (stamp, user, body)))
}

fn parse_line(line: &str) -> Option<ChatLine<'_>> {
    // Exports prefix some lines with a left-to-right mark.
    let line = line.trim_start_matches('\u{200e}');
    let (_, (stamp, user, body)) = split_line(line).ok()?;
    let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some(ChatLine {
        timestamp,
        user,
        body,
    })
}

fn is_location_share(body: &str) -> bool {
    body.contains("Posizione:") || body.contains("maps")
}

fn coord_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(-?\d+\.\d+),\s*(-?\d+\.\d+)").expect("coordinate pattern is valid")
    })
}

/// Extract a `(latitude, longitude)` pair from a location share.
fn extract_coords(body: &str) -> Option<(f64, f64)> {
    let captures = coord_pattern().captures(body)?;
    let lat = captures.get(1)?.as_str().parse().ok()?;
    let lon = captures.get(2)?.as_str().parse().ok()?;
    Some((lat, lon))
}

fn canonical(aliases: &BTreeMap<String, String>, raw: &str) -> String {
    let trimmed = raw.trim();
    aliases
        .get(trimmed)
        .cloned()
        .unwrap_or_else(|| trimmed.to_string())
}

/// Parse the export into the Event Stream: ascending by timestamp, users
/// normalized through the alias table.
pub fn parse_chat(content: &str, aliases: &BTreeMap<String, String>) -> Vec<Event> {
    let lines: Vec<ChatLine<'_>> = content.lines().filter_map(parse_line).collect();

    let mut events = Vec::new();
    for pair in lines.windows(2) {
        let (marker, share) = (&pair[0], &pair[1]);
        if !marker.body.contains(EVENT_MARKER) {
            continue;
        }
        if share.user != marker.user || !is_location_share(share.body) {
            continue;
        }
        let Some((latitude, longitude)) = extract_coords(share.body) else {
            continue;
        };
        events.push(Event {
            timestamp: marker.timestamp,
            user: canonical(aliases, marker.user),
            latitude,
            longitude,
        });
    }

    // Stable, so same-minute events keep their chat order.
    events.sort_by_key(|event| event.timestamp);
    tracing::info!(events = events.len(), "parsed chat export");
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[01/03/24, 10:15:02] riki nata: 💩
[01/03/24, 10:15:40] riki nata: Posizione: https://maps.google.com/?q=43.769562,11.255814
[01/03/24, 11:02:00] mariam: ciao a tutti
come va?
[01/03/24, 11:30:11] mariam: 💩💩
[01/03/24, 11:30:45] mariam: https://maps.google.com/?q=48.856614,2.352222
[01/03/24, 12:00:00] riki nata: 💩
[01/03/24, 12:00:30] mariam: Posizione: https://maps.google.com/?q=41.902782,12.496366
";

    fn aliases() -> BTreeMap<String, String> {
        BTreeMap::from([("riki nata".to_string(), "Riccardo".to_string())])
    }

    #[test]
    fn test_marker_plus_share_becomes_event() {
        let events = parse_chat(SAMPLE, &aliases());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].user, "Riccardo");
        assert!((events[0].latitude - 43.769562).abs() < 1e-9);
        assert!((events[0].longitude - 11.255814).abs() < 1e-9);
    }

    #[test]
    fn test_event_takes_marker_timestamp() {
        let events = parse_chat(SAMPLE, &aliases());
        assert_eq!(
            events[0].timestamp,
            NaiveDateTime::parse_from_str("01/03/24, 10:15:02", TIMESTAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn test_share_from_other_user_does_not_pair() {
        // The 12:00 marker is followed by a share from a different user.
        let events = parse_chat(SAMPLE, &aliases());
        assert!(!events
            .iter()
            .any(|e| e.user == "Riccardo" && e.timestamp.format("%H").to_string() == "12"));
    }

    #[test]
    fn test_unaliased_user_kept_verbatim() {
        let events = parse_chat(SAMPLE, &aliases());
        assert_eq!(events[1].user, "mariam");
    }

    #[test]
    fn test_continuation_lines_skipped() {
        let events = parse_chat("orphan line without header\n", &BTreeMap::new());
        assert!(events.is_empty());
    }

    #[test]
    fn test_marker_without_share_is_no_event() {
        let chat = "[01/03/24, 09:00:00] mariam: 💩\n[01/03/24, 09:05:00] mariam: dimenticavo\n";
        assert!(parse_chat(chat, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_output_sorted_by_timestamp() {
        let chat = "\
[01/03/24, 15:00:00] b: 💩
[01/03/24, 15:00:10] b: Posizione: 10.5,20.5
[01/03/24, 09:00:00] a: 💩
[01/03/24, 09:00:10] a: Posizione: -1.5,-2.5
";
        let events = parse_chat(chat, &BTreeMap::new());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].user, "a");
        assert_eq!(events[1].user, "b");
    }

    #[test]
    fn test_negative_coordinates() {
        assert_eq!(
            extract_coords("Posizione: -33.868820, 151.209290"),
            Some((-33.868820, 151.209290))
        );
    }

    #[test]
    fn test_ltr_mark_stripped() {
        let chat = "\u{200e}[01/03/24, 10:00:00] a: 💩\n[01/03/24, 10:00:05] a: maps 1.5,2.5\n";
        assert_eq!(parse_chat(chat, &BTreeMap::new()).len(), 1);
    }
}
