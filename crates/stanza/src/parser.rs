//! Inbound stanza parsing.
//!
//! All parsers degrade to empty/default values when the optional structure
//! is missing; absent protocol elements are expected, not erroneous.

use minidom::Element;

use crate::{DiscoItem, NS_DISCO_INFO, NS_DISCO_ITEMS, NS_MUC_USER, Participant};

/// Extract the `<item/>` children of a disco#items result, in document order.
pub fn items(result: &Element) -> Vec<DiscoItem> {
    let Some(query) = result.get_child("query", NS_DISCO_ITEMS) else {
        return Vec::new();
    };

    query
        .children()
        .filter(|child| child.is("item", NS_DISCO_ITEMS))
        .filter_map(|item| {
            item.attr("jid").map(|jid| DiscoItem {
                jid: jid.to_string(),
                name: item.attr("name").map(str::to_string),
            })
        })
        .collect()
}

/// True iff any `<feature/>` of a disco#info result has a `var` ending in
/// `suffix`. MUC detection passes `"muc"`.
pub fn has_feature(result: &Element, suffix: &str) -> bool {
    let Some(query) = result.get_child("query", NS_DISCO_INFO) else {
        return false;
    };

    query
        .children()
        .filter(|child| child.is("feature", NS_DISCO_INFO))
        .any(|feature| feature.attr("var").is_some_and(|var| var.ends_with(suffix)))
}

/// Occupant affiliation/role from a MUC presence; empty strings when the
/// user extension or its fields are missing.
pub fn participant(presence: &Element) -> Participant {
    let item = presence
        .get_child("x", NS_MUC_USER)
        .and_then(|x| x.get_child("item", NS_MUC_USER));

    match item {
        Some(item) => Participant {
            affiliation: item.attr("affiliation").unwrap_or_default().to_string(),
            role: item.attr("role").unwrap_or_default().to_string(),
        },
        None => Participant::default(),
    }
}
