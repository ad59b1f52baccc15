//! Field extraction from `NationStates` API responses.
//!
//! Responses are small, flat XML documents. The handful of elements the
//! tracker reads are pulled out with anchored patterns rather than a full
//! XML parser:
//!
//! ```text
//! <NATION id="x"><REGION>The Communist Bloc</REGION></NATION>
//! <NATION id="x"><ZOMBIE><ACTION>export</ACTION><ZOMBIES>120</ZOMBIES>...</ZOMBIE></NATION>
//! <REGION id="y"><NATIONS>a:b:c</NATIONS></REGION>
//! <WORLD><HAPPENINGS><EVENT id="42"><TIMESTAMP>1509000000</TIMESTAMP><TEXT>...</TEXT></EVENT>...</HAPPENINGS></WORLD>
//! ```

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use zday_types::{Happening, NationName, RegionName, ZombieAction, ZombieStatus};

use crate::error::PayloadError;

static REGION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<REGION>(.*?)</REGION>").ok());

static ACTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<ACTION>(.*?)</ACTION>|<ACTION\s*/>").ok());

static ZOMBIES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<ZOMBIES>\s*(\d+)\s*</ZOMBIES>").ok());

static NATIONS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<NATIONS>(.*?)</NATIONS>|<NATIONS\s*/>").ok());

static HAPPENINGS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<HAPPENINGS\s*/?>").ok());

static EVENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<EVENT id="(\d+)">.*?<TIMESTAMP>(\d+)</TIMESTAMP>.*?<TEXT>(.*?)</TEXT>.*?</EVENT>"#)
        .ok()
});

/// Region a nation resides in, from a `q=region` response.
pub fn nation_region(body: &str) -> Result<RegionName, PayloadError> {
    let raw = capture(&REGION, body).ok_or(PayloadError::Missing("REGION"))?;
    Ok(RegionName::new(&unescape(raw)))
}

/// Z-Day status, from a `q=zombie` response.
pub fn zombie_status(body: &str) -> Result<ZombieStatus, PayloadError> {
    let action = ACTION
        .as_ref()
        .and_then(|re| re.captures(body))
        .ok_or(PayloadError::Missing("ACTION"))?;
    let action = action
        .get(1)
        .map_or(ZombieAction::Unknown, |m| ZombieAction::parse(m.as_str()));

    let zombies = capture(&ZOMBIES, body)
        .ok_or(PayloadError::Missing("ZOMBIES"))?
        .parse::<i64>()
        .ok()
        .ok_or(PayloadError::Invalid("ZOMBIES"))?;

    Ok(ZombieStatus { action, zombies })
}

/// Colon-separated population listing, from a region `q=nations` response.
pub fn region_nations(body: &str) -> Result<Vec<NationName>, PayloadError> {
    let listing = NATIONS
        .as_ref()
        .and_then(|re| re.captures(body))
        .ok_or(PayloadError::Missing("NATIONS"))?;
    Ok(listing
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(':')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(NationName::new)
        .collect())
}

/// Every event in a world `q=happenings` response.
pub fn happenings(body: &str) -> Result<Vec<Happening>, PayloadError> {
    if !HAPPENINGS.as_ref().is_some_and(|re| re.is_match(body)) {
        return Err(PayloadError::Missing("HAPPENINGS"));
    }
    let Some(event) = EVENT.as_ref() else {
        return Ok(Vec::new());
    };

    event
        .captures_iter(body)
        .map(|caps| -> Result<Happening, PayloadError> {
            let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
            let id = field(1)
                .parse::<u64>()
                .ok()
                .ok_or(PayloadError::Invalid("EVENT id"))?;
            let secs = field(2)
                .parse::<i64>()
                .ok()
                .ok_or(PayloadError::Invalid("TIMESTAMP"))?;
            let timestamp =
                DateTime::from_timestamp(secs, 0).ok_or(PayloadError::Invalid("TIMESTAMP"))?;
            Ok(Happening {
                id,
                timestamp,
                text: unescape(field(3)),
            })
        })
        .collect()
}

fn capture<'a>(re: &LazyLock<Option<Regex>>, body: &'a str) -> Option<&'a str> {
    re.as_ref()?
        .captures(body)?
        .get(1)
        .map(|m| m.as_str())
}

/// Unwrap a CDATA section or decode the predefined XML entities.
fn unescape(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(inner) = raw
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return inner.to_owned();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn reads_nation_region() {
        let body = r#"<NATION id="testlandia"><REGION>The Communist Bloc</REGION></NATION>"#;
        assert_eq!(
            nation_region(body).unwrap(),
            RegionName::new("the_communist_bloc")
        );
    }

    #[test]
    fn region_root_element_is_not_mistaken_for_a_field() {
        let body = r#"<REGION id="lazarus"><NATIONS></NATIONS></REGION>"#;
        assert_eq!(nation_region(body), Err(PayloadError::Missing("REGION")));
    }

    #[test]
    fn reads_zombie_status() {
        let body = r#"<NATION id="x"><ZOMBIE><ACTION>export</ACTION><ZOMBIES>1520</ZOMBIES><SURVIVORS>9000</SURVIVORS><DEAD>12</DEAD></ZOMBIE></NATION>"#;
        let status = zombie_status(body).unwrap();
        assert_eq!(status.action, ZombieAction::Export);
        assert_eq!(status.zombies, 1520);
    }

    #[test]
    fn undecided_action_is_unknown() {
        let body = "<NATION><ZOMBIE><ACTION/><ZOMBIES>0</ZOMBIES></ZOMBIE></NATION>";
        assert_eq!(zombie_status(body).unwrap().action, ZombieAction::Unknown);
    }

    #[test]
    fn zombie_status_requires_a_count() {
        let body = "<NATION><ZOMBIE><ACTION>research</ACTION></ZOMBIE></NATION>";
        assert_eq!(zombie_status(body), Err(PayloadError::Missing("ZOMBIES")));
    }

    #[test]
    fn splits_population_listing() {
        let body = r#"<REGION id="tcb"><NATIONS>kethania:max_barry::testlandia</NATIONS></REGION>"#;
        let names = region_nations(body).unwrap();
        assert_eq!(
            names,
            vec![
                NationName::new("kethania"),
                NationName::new("max_barry"),
                NationName::new("testlandia"),
            ]
        );
        assert!(region_nations("<REGION><NATIONS/></REGION>").unwrap().is_empty());
    }

    #[test]
    fn reads_events_with_cdata_and_entities() {
        let body = concat!(
            "<WORLD><HAPPENINGS>",
            r#"<EVENT id="7"><TIMESTAMP>1509000000</TIMESTAMP><TEXT><![CDATA[@@a@@ fired cure missiles at @@b@@, curing 3 infected.]]></TEXT></EVENT>"#,
            r#"<EVENT id="8"><TIMESTAMP>1509000060</TIMESTAMP><TEXT>@@c@@ relocated from %%x &amp; y%% to %%z%%.</TEXT></EVENT>"#,
            "</HAPPENINGS></WORLD>"
        );
        let events = happenings(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 7);
        assert_eq!(events[0].timestamp.timestamp(), 1_509_000_000);
        assert!(events[0].text.starts_with("@@a@@ fired cure missiles"));
        assert_eq!(events[1].text, "@@c@@ relocated from %%x & y%% to %%z%%.");
    }

    #[test]
    fn empty_feed_is_not_an_error() {
        assert!(happenings("<WORLD><HAPPENINGS></HAPPENINGS></WORLD>").unwrap().is_empty());
        assert!(happenings("<WORLD><HAPPENINGS/></WORLD>").unwrap().is_empty());
        assert_eq!(
            happenings("<html>maintenance</html>"),
            Err(PayloadError::Missing("HAPPENINGS"))
        );
    }
}
