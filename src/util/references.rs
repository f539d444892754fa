//! Issue reference extraction from free-form issue text.
//!
//! Recognizes a verb phrase followed by one or more references:
//!
//! ```text
//! Closes #12
//! Fixes acme/widgets#3 and #4, #5
//! Depends on https://github.com/acme/widgets/issues/9
//! ```
//!
//! Each reference after the phrase is captured as its own link until a
//! separator other than a comma, `and` or whitespace is reached.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{Issue, LinkType};

const REFERENCE: &str = r"(?:https?://github\.com/(?P<url_owner>[\w.-]+)/(?P<url_repo>[\w.-]+)/(?:issues|pull)/(?P<url_number>\d+)|(?:(?P<owner>[\w.-]+)/(?P<repo>[\w.-]+))?#(?P<number>\d+))\b";

const PHRASES: &str = r"close[sd]?|fix(?:e[sd])?|resolve[sd]?|child\s+of|parent\s+of|depends\s+on|needs|requires|required\s+by|needed\s+by|related\s+to|connect(?:s|ed)?\s+to";

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?P<phrase>{PHRASES}):?\s+{REFERENCE}"))
        .expect("link pattern is valid")
});

static CONTINUATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?:\s*,\s*(?:and\s+)?|\s+and\s+|\s+){REFERENCE}"))
        .expect("continuation pattern is valid")
});

/// A reference candidate extracted from text.
///
/// Same-repository references leave `owner` and `repo` empty; callers
/// default them to the referencing issue's own repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    pub link_type: LinkType,
    pub number: u64,
    pub owner: Option<String>,
    pub repo: Option<String>,
}

/// Map a matched verb phrase to its link type.
fn phrase_type(phrase: &str) -> Option<LinkType> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let link_type = match normalized.as_str() {
        "close" | "closes" | "closed" | "fix" | "fixes" | "fixed" | "resolve" | "resolves"
        | "resolved" => LinkType::Closes,
        "child of" => LinkType::ChildOf,
        "parent of" => LinkType::ParentOf,
        "depends on" | "needs" | "requires" => LinkType::DependsOn,
        "required by" | "needed by" => LinkType::RequiredBy,
        "related to" => LinkType::LinkedTo,
        // Historical mapping; clients rely on it.
        "connect to" | "connects to" | "connected to" => LinkType::ChildOf,
        _ => return None,
    };

    Some(link_type)
}

fn reference_from(captures: &Captures<'_>, link_type: LinkType) -> Option<ParsedLink> {
    if let Some(number) = captures.name("url_number") {
        return Some(ParsedLink {
            link_type,
            number: number.as_str().parse().ok()?,
            owner: captures.name("url_owner").map(|m| m.as_str().to_string()),
            repo: captures.name("url_repo").map(|m| m.as_str().to_string()),
        });
    }

    let number = captures.name("number")?;
    Some(ParsedLink {
        link_type,
        number: number.as_str().parse().ok()?,
        owner: captures.name("owner").map(|m| m.as_str().to_string()),
        repo: captures.name("repo").map(|m| m.as_str().to_string()),
    })
}

/// Extract typed references from arbitrary text.
///
/// When `filter` is given, only links of those types are returned, in
/// document order.
#[must_use]
pub fn find_links_in_text(text: &str, filter: Option<&[LinkType]>) -> Vec<ParsedLink> {
    let mut links = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(captures) = LINK_PATTERN.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = captures.get(0) else {
            break;
        };
        pos = whole.end();

        let Some(link_type) = captures.name("phrase").and_then(|m| phrase_type(m.as_str())) else {
            continue;
        };

        if let Some(link) = reference_from(&captures, link_type) {
            links.push(link);
        }

        while let Some(more) = CONTINUATION_PATTERN.captures(&text[pos..]) {
            let Some(span) = more.get(0) else {
                break;
            };
            if let Some(link) = reference_from(&more, link_type) {
                links.push(link);
            }
            pos += span.end();
        }
    }

    if let Some(types) = filter {
        links.retain(|link| types.contains(&link.link_type));
    }

    links
}

/// Extract typed references from an issue's title and body.
#[must_use]
pub fn find_links(issue: &Issue, filter: Option<&[LinkType]>) -> Vec<ParsedLink> {
    find_links_in_text(&issue.reference_text(), filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(links: &[ParsedLink]) -> Vec<u64> {
        links.iter().map(|link| link.number).collect()
    }

    #[test]
    fn bare_reference() {
        let links = find_links_in_text("Closes #2", None);
        assert_eq!(
            links,
            vec![ParsedLink {
                link_type: LinkType::Closes,
                number: 2,
                owner: None,
                repo: None,
            }]
        );
    }

    #[test]
    fn phrases_are_case_insensitive() {
        let links = find_links_in_text("FIXES #1\nresolved #2\nDepends On #3", None);
        let types: Vec<_> = links.iter().map(|link| link.link_type).collect();
        assert_eq!(
            types,
            vec![LinkType::Closes, LinkType::Closes, LinkType::DependsOn]
        );
    }

    #[test]
    fn cross_repo_reference() {
        let links = find_links_in_text("needs acme/widgets#44", None);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_type, LinkType::DependsOn);
        assert_eq!(links[0].owner.as_deref(), Some("acme"));
        assert_eq!(links[0].repo.as_deref(), Some("widgets"));
        assert_eq!(links[0].number, 44);
    }

    #[test]
    fn url_reference() {
        let links = find_links_in_text(
            "child of https://github.com/acme/widgets/pull/7 please",
            None,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_type, LinkType::ChildOf);
        assert_eq!(links[0].owner.as_deref(), Some("acme"));
        assert_eq!(links[0].number, 7);
    }

    #[test]
    fn list_of_references_shares_the_phrase() {
        let links = find_links_in_text("Closes #1, #2 and #3 #4", None);
        assert_eq!(numbers(&links), vec![1, 2, 3, 4]);
        assert!(links.iter().all(|link| link.link_type == LinkType::Closes));
    }

    #[test]
    fn list_stops_at_unknown_separator() {
        let links = find_links_in_text("Closes #1; #2", None);
        assert_eq!(numbers(&links), vec![1]);
    }

    #[test]
    fn connects_to_maps_to_child_of() {
        let links = find_links_in_text("connects to #9", None);
        assert_eq!(links[0].link_type, LinkType::ChildOf);
    }

    #[test]
    fn required_by_and_related_to() {
        let links = find_links_in_text("required by #1\nneeded by #2\nrelated to #3", None);
        let types: Vec<_> = links.iter().map(|link| link.link_type).collect();
        assert_eq!(
            types,
            vec![LinkType::RequiredBy, LinkType::RequiredBy, LinkType::LinkedTo]
        );
    }

    #[test]
    fn phrase_must_be_a_word() {
        assert!(find_links_in_text("prefixes #1", None).is_empty());
        assert!(find_links_in_text("mentions #1", None).is_empty());
    }

    #[test]
    fn filter_preserves_order() {
        let text = "depends on #1\ncloses #2\nrequires #3";
        let links = find_links_in_text(text, Some(&[LinkType::DependsOn]));
        assert_eq!(numbers(&links), vec![1, 3]);
    }

    #[test]
    fn issue_title_and_body_are_scanned() {
        let repo = crate::model::Repository {
            id: 1,
            name: "y".to_string(),
            owner: "x".to_string(),
            private: false,
        };
        let mut issue = Issue::new("1-1", "x/y#1", repo);
        issue.title = "Fixes #5".to_string();
        issue.body = Some("Parent of #6".to_string());
        let links = find_links(&issue, None);
        assert_eq!(numbers(&links), vec![5, 6]);
    }
}
