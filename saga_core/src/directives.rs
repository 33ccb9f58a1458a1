//! State-change directives carried in AI responses.
//!
//! The narrator attaches tags such as
//! `[ITEM_ACQUIRED: name="Jade Slip, Cracked", quantity=2]` to its narration.
//! Each tag parses into a [`Directive`] that the session applies to the
//! knowledge base after the turn is accepted.

use std::collections::BTreeMap;

use saga_model::{Item, ItemKind, KnowledgeBase, Location, LocationType, Quest, QuestStatus};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    CurrencyChange { amount: i64 },
    AdvanceDate { days: u32 },
    ItemAcquired { name: String, quantity: u32, value: u64 },
    QuestAssigned { title: String, description: String },
    QuestCompleted { title: String },
    LocationChange { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("empty tag")]
    Empty,

    #[error("malformed tag '{0}'")]
    Malformed(String),

    #[error("unknown directive {0}")]
    Unknown(String),

    #[error("{directive} is missing '{key}'")]
    MissingArgument { directive: &'static str, key: &'static str },

    #[error("{directive} has invalid {key}='{value}'")]
    InvalidArgument {
        directive: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("no active quest titled '{0}'")]
    UnknownQuest(String),
}

/// Parse one tag.
pub fn parse_directive(tag: &str) -> Result<Directive, DirectiveError> {
    let tag = tag.trim();
    let tag = tag
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(tag)
        .trim();
    if tag.is_empty() {
        return Err(DirectiveError::Empty);
    }

    let (name, rest) = tag.split_once(':').unwrap_or((tag, ""));
    let name = name.trim().to_ascii_uppercase();
    let args = parse_args(rest).ok_or_else(|| DirectiveError::Malformed(tag.to_string()))?;

    match name.as_str() {
        "CURRENCY_CHANGE" => {
            const D: &str = "CURRENCY_CHANGE";
            Ok(Directive::CurrencyChange {
                amount: parse_number(D, &args, "amount")?,
            })
        }
        "ADVANCE_DATE" => {
            const D: &str = "ADVANCE_DATE";
            Ok(Directive::AdvanceDate {
                days: parse_number(D, &args, "days")?,
            })
        }
        "ITEM_ACQUIRED" => {
            const D: &str = "ITEM_ACQUIRED";
            Ok(Directive::ItemAcquired {
                name: required(D, &args, "name")?.to_string(),
                quantity: optional_number(D, &args, "quantity")?.unwrap_or(1),
                value: optional_number(D, &args, "value")?.unwrap_or(0),
            })
        }
        "QUEST_ASSIGNED" => {
            const D: &str = "QUEST_ASSIGNED";
            Ok(Directive::QuestAssigned {
                title: required(D, &args, "title")?.to_string(),
                description: args.get("description").cloned().unwrap_or_default(),
            })
        }
        "QUEST_COMPLETED" => Ok(Directive::QuestCompleted {
            title: required("QUEST_COMPLETED", &args, "title")?.to_string(),
        }),
        "LOCATION_CHANGE" => Ok(Directive::LocationChange {
            name: required("LOCATION_CHANGE", &args, "name")?.to_string(),
        }),
        _ => Err(DirectiveError::Unknown(name)),
    }
}

/// Parse every tag, skipping the ones that fail.
pub fn parse_all(tags: &[String]) -> Vec<Directive> {
    tags.iter()
        .filter_map(|tag| match parse_directive(tag) {
            Ok(directive) => Some(directive),
            Err(e) => {
                tracing::warn!(tag = %tag, error = %e, "skipping directive");
                None
            }
        })
        .collect()
}

/// Apply a directive to the knowledge base.
pub fn apply(kb: &mut KnowledgeBase, directive: &Directive) -> Result<(), DirectiveError> {
    match directive {
        Directive::CurrencyChange { amount } => {
            let currency = &mut kb.player_stats.currency;
            *currency = currency.saturating_add(*amount).max(0);
        }
        Directive::AdvanceDate { days } => kb.advance_date(*days),
        Directive::ItemAcquired {
            name,
            quantity,
            value,
        } => {
            let item = match kb.find_item_by_name(name) {
                Some(held) => {
                    let mut item = held.clone();
                    item.quantity = *quantity;
                    item
                }
                None => Item::new(
                    name.clone(),
                    ItemKind::Miscellaneous {
                        usable: false,
                        consumable: false,
                    },
                )
                .with_value(*value),
            };
            kb.add_item(item.with_quantity((*quantity).max(1)));
        }
        Directive::QuestAssigned { title, description } => {
            let exists = kb.active_quests().any(|q| q.title.eq_ignore_ascii_case(title));
            if !exists {
                kb.all_quests.push(Quest::new(title.clone(), description.clone()));
            }
        }
        Directive::QuestCompleted { title } => {
            let quest = kb
                .all_quests
                .iter_mut()
                .find(|q| q.status == QuestStatus::Active && q.title.eq_ignore_ascii_case(title))
                .ok_or_else(|| DirectiveError::UnknownQuest(title.clone()))?;
            quest.complete();
        }
        Directive::LocationChange { name } => {
            let id = match kb.find_location_by_name(name) {
                Some(location) => location.id.clone(),
                None => {
                    let location = Location::new(name.clone(), LocationType::Default);
                    let id = location.id.clone();
                    kb.discovered_locations.push(location);
                    id
                }
            };
            if let Some(location) = kb.discovered_locations.iter_mut().find(|l| l.id == id) {
                location.visited = true;
            }
            kb.current_location_id = Some(id);
        }
    }
    Ok(())
}

/// Split `key=value, key="quoted, value"` into a map. `None` on unbalanced quotes
/// or a pair without `=`.
fn parse_args(input: &str) -> Option<BTreeMap<String, String>> {
    let mut args = BTreeMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            return Some(args);
        }

        let mut key = String::new();
        let mut has_value = false;
        for c in chars.by_ref() {
            if c == '=' {
                has_value = true;
                break;
            }
            if c == ',' {
                return None;
            }
            key.push(c);
        }
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() || !has_value {
            return None;
        }

        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                value.push(c);
            }
            if !closed {
                return None;
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        args.insert(key, value);
    }
}

fn required<'a>(
    directive: &'static str,
    args: &'a BTreeMap<String, String>,
    key: &'static str,
) -> Result<&'a str, DirectiveError> {
    args.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(DirectiveError::MissingArgument { directive, key })
}

fn parse_number<T: std::str::FromStr>(
    directive: &'static str,
    args: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<T, DirectiveError> {
    optional_number(directive, args, key)?.ok_or(DirectiveError::MissingArgument { directive, key })
}

fn optional_number<T: std::str::FromStr>(
    directive: &'static str,
    args: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<T>, DirectiveError> {
    match args.get(key) {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
            trimmed
                .parse()
                .map(Some)
                .map_err(|_| DirectiveError::InvalidArgument {
                    directive,
                    key,
                    value: raw.clone(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_change() {
        assert_eq!(
            parse_directive("CURRENCY_CHANGE: amount=-10").unwrap(),
            Directive::CurrencyChange { amount: -10 }
        );
        assert_eq!(
            parse_directive("[currency_change: amount=+60]").unwrap(),
            Directive::CurrencyChange { amount: 60 }
        );
    }

    #[test]
    fn test_parse_quoted_values() {
        let directive =
            parse_directive(r#"[ITEM_ACQUIRED: name="Jade Slip, Cracked", quantity=2, value=15]"#)
                .unwrap();
        assert_eq!(
            directive,
            Directive::ItemAcquired {
                name: "Jade Slip, Cracked".into(),
                quantity: 2,
                value: 15,
            }
        );

        assert_eq!(
            parse_directive("ITEM_ACQUIRED: name=Spirit Herb").unwrap(),
            Directive::ItemAcquired {
                name: "Spirit Herb".into(),
                quantity: 1,
                value: 0,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_directive("  []  "), Err(DirectiveError::Empty));
        assert!(matches!(
            parse_directive("SUMMON_DRAGON: size=huge"),
            Err(DirectiveError::Unknown(name)) if name == "SUMMON_DRAGON"
        ));
        assert!(matches!(
            parse_directive("ADVANCE_DATE: days=soon"),
            Err(DirectiveError::InvalidArgument { key: "days", .. })
        ));
        assert!(matches!(
            parse_directive("QUEST_COMPLETED:"),
            Err(DirectiveError::MissingArgument { key: "title", .. })
        ));
        assert!(matches!(
            parse_directive(r#"LOCATION_CHANGE: name="Unclosed"#),
            Err(DirectiveError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_all_skips_bad_tags() {
        let tags = vec![
            "CURRENCY_CHANGE: amount=5".to_string(),
            "NONSENSE".to_string(),
            "ADVANCE_DATE: days=2".to_string(),
        ];
        assert_eq!(
            parse_all(&tags),
            vec![
                Directive::CurrencyChange { amount: 5 },
                Directive::AdvanceDate { days: 2 },
            ]
        );
    }

    #[test]
    fn test_apply_currency_floors_at_zero() {
        let mut kb = KnowledgeBase::new();
        kb.player_stats.currency = 30;
        apply(&mut kb, &Directive::CurrencyChange { amount: -50 }).unwrap();
        assert_eq!(kb.player_stats.currency, 0);
    }

    #[test]
    fn test_apply_items_stack() {
        let mut kb = KnowledgeBase::new();
        let acquire = Directive::ItemAcquired {
            name: "Spirit Herb".into(),
            quantity: 2,
            value: 5,
        };
        apply(&mut kb, &acquire).unwrap();
        apply(&mut kb, &acquire).unwrap();
        assert_eq!(kb.inventory.len(), 1);
        assert_eq!(kb.inventory[0].quantity, 4);
        assert_eq!(kb.inventory[0].value, 5);
    }

    #[test]
    fn test_apply_huge_quantities_saturate() {
        let mut kb = KnowledgeBase::new();
        let tag = "ITEM_ACQUIRED: name=Pebble, quantity=4294967295".to_string();
        for directive in parse_all(&[tag.clone(), tag]) {
            apply(&mut kb, &directive).unwrap();
        }
        assert_eq!(kb.inventory.len(), 1);
        assert_eq!(kb.inventory[0].quantity, u32::MAX);

        kb.player_stats.currency = i64::MAX - 1;
        apply(&mut kb, &Directive::CurrencyChange { amount: i64::MAX }).unwrap();
        assert_eq!(kb.player_stats.currency, i64::MAX);
    }

    #[test]
    fn test_apply_quests() {
        let mut kb = KnowledgeBase::new();
        let assign = Directive::QuestAssigned {
            title: "Find the lost disciple".into(),
            description: String::new(),
        };
        apply(&mut kb, &assign).unwrap();
        apply(&mut kb, &assign).unwrap();
        assert_eq!(kb.all_quests.len(), 1);

        apply(
            &mut kb,
            &Directive::QuestCompleted {
                title: "find the lost disciple".into(),
            },
        )
        .unwrap();
        assert_eq!(kb.active_quests().count(), 0);
        assert_eq!(
            apply(
                &mut kb,
                &Directive::QuestCompleted {
                    title: "Find the lost disciple".into()
                }
            ),
            Err(DirectiveError::UnknownQuest("Find the lost disciple".into()))
        );
    }

    #[test]
    fn test_apply_location_change_discovers() {
        let mut kb = KnowledgeBase::new();
        apply(
            &mut kb,
            &Directive::LocationChange {
                name: "Thanh Vân Peak".into(),
            },
        )
        .unwrap();
        let here = kb.current_location().unwrap();
        assert_eq!(here.name, "Thanh Vân Peak");
        assert!(here.visited);

        apply(
            &mut kb,
            &Directive::LocationChange {
                name: "thanh vân peak".into(),
            },
        )
        .unwrap();
        assert_eq!(kb.discovered_locations.len(), 1);
    }

    #[test]
    fn test_apply_advance_date() {
        let mut kb = KnowledgeBase::new();
        let before = kb.world_date;
        apply(&mut kb, &Directive::AdvanceDate { days: 31 }).unwrap();
        assert_eq!(kb.world_date, before.add_days(31));
    }
}
