//! The link between an issue and its Trello card lives only in the issue body:
//! a summary line followed by a hidden HTML comment holding the card id.
//!
//! ```text
//! <original body>
//!
//! This issue was automatically linked to Trello card [<name>](<shortUrl>). Closing this issue will move the Trello card to the archive.
//! <!---WARNING DO NOT MOVE OR REMOVE THIS ID! IT MUST STAY AT THE END OF THE THIS BODY <card id>-->
//! ```
//!
//! Issues linked by earlier releases carry this exact text, so the template
//! must not change. `compose`, `extract_card_id` and `strip` share the
//! constants below and have to move together.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::card::{CardId, CardRef};

const SUMMARY_PREFIX: &str = "This issue was automatically linked to Trello card ";
const SUMMARY_SUFFIX: &str =
    ". Closing this issue will move the Trello card to the archive.";
const SENTINEL_PREFIX: &str =
    "<!---WARNING DO NOT MOVE OR REMOVE THIS ID! IT MUST STAY AT THE END OF THE THIS BODY ";
const SENTINEL_SUFFIX: &str = "-->";
const LINE_BREAK: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no Trello card marker found")]
pub struct MarkerNotFound;

static SENTINEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{}([0-9a-f]{{24}}){}",
        regex::escape(SENTINEL_PREFIX),
        regex::escape(SENTINEL_SUFFIX)
    ))
    .expect("sentinel pattern is valid")
});

// Separator, optional summary line, sentinel. Card names are free text so the
// link is matched loosely between the fixed prefix and suffix.
static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:\r?\n\r?\n)?(?:{}\[[^\r\n]*\]\([^\r\n]*\){}[ \t]*\r?\n)?{}",
        regex::escape(SUMMARY_PREFIX),
        regex::escape(SUMMARY_SUFFIX),
        SENTINEL.as_str()
    ))
    .expect("marker block pattern is valid")
});

/// Append the marker for `card` to `body`, replacing any marker already there.
pub fn compose(body: Option<&str>, card: &CardRef) -> String {
    let base = strip(body.unwrap_or_default());
    let block = format!(
        "{SUMMARY_PREFIX}[{name}]({url}){SUMMARY_SUFFIX}{LINE_BREAK}{SENTINEL_PREFIX}{id}{SENTINEL_SUFFIX}",
        name = card.name,
        url = card.short_url,
        id = card.id,
    );
    if base.is_empty() {
        block
    } else {
        format!("{base}{LINE_BREAK}{LINE_BREAK}{block}")
    }
}

/// Card id from the last sentinel in `body`.
pub fn extract_card_id(body: Option<&str>) -> Result<CardId, MarkerNotFound> {
    let body = body.ok_or(MarkerNotFound)?;
    SENTINEL
        .captures_iter(body)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
        .ok_or(MarkerNotFound)
}
/// Remove every marker block, leaving the rest of the body as it was.
///
/// Removing one block can join the text around it into a new sentinel, so
/// this repeats until no block is left. Each pass shrinks the body.
pub fn strip(body: &str) -> String {
    let mut stripped = body.to_string();
    while BLOCK.is_match(&stripped) {
        stripped = BLOCK.replace_all(&stripped, "").into_owned();
    }
    stripped
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ID: &str = "507f1f77bcf86cd799439011";

    fn card(id: &str, name: &str) -> CardRef {
        CardRef {
            id: id.parse().unwrap(),
            name: name.to_string(),
            short_url: "https://trello.com/c/AbCd1234".to_string(),
            description: String::new(),
            list_id: None,
            label_ids: vec![],
            label_names: vec![],
        }
    }

    #[test]
    fn compose_uses_the_legacy_template() {
        let body = compose(Some("Steps to reproduce"), &card(ID, "[#42] Bug"));
        assert_eq!(
            body,
            "Steps to reproduce\r\n\r\n\
             This issue was automatically linked to Trello card [[#42] Bug](https://trello.com/c/AbCd1234). \
             Closing this issue will move the Trello card to the archive.\r\n\
             <!---WARNING DO NOT MOVE OR REMOVE THIS ID! IT MUST STAY AT THE END OF THE THIS BODY \
             507f1f77bcf86cd799439011-->"
        );
    }

    #[test]
    fn compose_without_body_is_just_the_block() {
        let body = compose(None, &card(ID, "[#1] Empty"));
        assert!(body.starts_with(SUMMARY_PREFIX));
        assert_eq!(extract_card_id(Some(&body)), Ok(ID.parse().unwrap()));
    }

    #[test]
    fn round_trip_restores_original_body() {
        let bodies = [
            "",
            "plain",
            "ends with newline\n",
            "ends with crlf\r\n",
            "multi\n\nparagraph\n\n",
            "has a link [x](y) and --> arrows",
        ];
        let c = card(ID, "[#9] Weird ] name (with) parens");
        for original in bodies {
            let composed = compose(Some(original), &c);
            assert!(composed.starts_with(original));
            assert_eq!(extract_card_id(Some(&composed)), Ok(c.id.clone()));

            let stripped = strip(&composed);
            assert_eq!(stripped, original, "body {original:?}");
            assert_eq!(extract_card_id(Some(&stripped)), Err(MarkerNotFound));
        }
    }

    #[test]
    fn strip_is_idempotent() {
        let composed = compose(Some("body"), &card(ID, "[#3] x"));
        let once = strip(&composed);
        assert_eq!(strip(&once), once);
    }

    #[test]
    fn strip_removes_sentinel_formed_by_an_earlier_removal() {
        let other = "aaaaaaaaaaaaaaaaaaaaaaaa";
        let body = format!(
            "{SENTINEL_PREFIX}{SENTINEL_PREFIX}{ID}{SENTINEL_SUFFIX}{other}{SENTINEL_SUFFIX}"
        );
        assert_eq!(strip(&body), "");

        let relinked = compose(Some(&format!("notes\r\n{body}")), &card(ID, "[#4] new"));
        assert_eq!(SENTINEL.find_iter(&relinked).count(), 1);
        assert!(relinked.starts_with("notes\r\n\r\n"));
        assert_eq!(extract_card_id(Some(&relinked)), Ok(ID.parse().unwrap()));
    }

    /// Text built from marker pieces, so the generated bodies regularly hold
    /// whole, partial and nested markers.
    fn marker_soup() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            Just(SENTINEL_PREFIX.to_string()),
            Just(SENTINEL_SUFFIX.to_string()),
            Just(SUMMARY_PREFIX.to_string()),
            Just(SUMMARY_SUFFIX.to_string()),
            Just("[n](u)".to_string()),
            Just(ID.to_string()),
            Just(LINE_BREAK.to_string()),
            Just("\n".to_string()),
            "[a-z #]{0,6}",
        ];
        proptest::collection::vec(piece, 0..12).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn compose_then_strip_round_trips(
            body in "(?s).{0,60}",
            name in "[^\r\n]{0,30}",
            id in "[0-9a-f]{24}",
        ) {
            prop_assume!(!SENTINEL.is_match(&body));
            let c = card(&id, &name);
            let composed = compose(Some(&body), &c);

            prop_assert_eq!(extract_card_id(Some(&composed)), Ok(c.id.clone()));
            prop_assert_eq!(strip(&composed), body);
        }

        #[test]
        fn strip_is_idempotent_for_any_body(body in prop_oneof!["(?s).{0,80}", marker_soup()]) {
            let once = strip(&body);
            prop_assert_eq!(strip(&once), once.clone());
            prop_assert_eq!(extract_card_id(Some(&once)), Err(MarkerNotFound));
        }

        #[test]
        fn compose_leaves_exactly_one_marker(body in marker_soup(), id in "[0-9a-f]{24}") {
            let c = card(&id, "[#1] x");
            let composed = compose(Some(&body), &c);

            prop_assert_eq!(SENTINEL.find_iter(&composed).count(), 1);
            prop_assert_eq!(extract_card_id(Some(&composed)), Ok(c.id.clone()));
        }
    }

    #[test]
    fn compose_replaces_an_existing_marker() {
        let first = compose(Some("body"), &card(ID, "[#3] old"));
        let second = compose(Some(&first), &card("aaaaaaaaaaaaaaaaaaaaaaaa", "[#3] new"));
        assert_eq!(SENTINEL.find_iter(&second).count(), 1);
        assert_eq!(
            extract_card_id(Some(&second)),
            Ok("aaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap())
        );
        assert_eq!(strip(&second), "body");
    }

    #[test]
    fn extract_from_closed_issue_body() {
        let body = "Fixed upstream.\r\n\r\nThis issue was automatically linked to Trello card \
                    [[#5] Crash](https://trello.com/c/x). Closing this issue will move the Trello card to the archive.\r\n\
                    <!---WARNING DO NOT MOVE OR REMOVE THIS ID! IT MUST STAY AT THE END OF THE THIS BODY 507f1f77bcf86cd799439011-->";
        assert_eq!(extract_card_id(Some(body)), Ok(ID.parse().unwrap()));
        assert_eq!(strip(body), "Fixed upstream.");
    }

    #[test]
    fn extract_tolerates_lf_and_trailing_text() {
        let body = format!(
            "text\n\n{SUMMARY_PREFIX}[n](u){SUMMARY_SUFFIX}\n{SENTINEL_PREFIX}{ID}{SENTINEL_SUFFIX}\n\nedited later"
        );
        assert_eq!(extract_card_id(Some(&body)), Ok(ID.parse().unwrap()));
        assert_eq!(strip(&body), "text\n\nedited later");
    }

    #[test]
    fn strip_removes_orphaned_sentinel() {
        let body = format!("text\r\n{SENTINEL_PREFIX}{ID}{SENTINEL_SUFFIX}");
        assert_eq!(strip(&body), "text\r\n");
    }

    #[test]
    fn extract_fails_without_marker() {
        assert_eq!(extract_card_id(None), Err(MarkerNotFound));
        assert_eq!(extract_card_id(Some("")), Err(MarkerNotFound));
        assert_eq!(
            extract_card_id(Some("ends with 507f1f77bcf86cd799439011-->")),
            Err(MarkerNotFound)
        );
    }

    #[test]
    fn extract_ignores_malformed_ids() {
        let body = format!("{SENTINEL_PREFIX}NOT-A-CARD-ID-AT-ALL-123{SENTINEL_SUFFIX}");
        assert_eq!(extract_card_id(Some(&body)), Err(MarkerNotFound));
        assert_eq!(strip(&body), body);
    }
}
