use std::cmp::Ordering;
use std::env;
use std::sync::OnceLock;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::{locale, Locale};

static COLLATOR: OnceLock<Collator> = OnceLock::new();

/// Shared collator for every string and rune comparison in the language,
/// built once from the host locale.
fn global_collator() -> &'static Collator {
    COLLATOR.get_or_init(|| new_collator(env::var("LANG").ok().as_deref()))
}

fn new_collator(lang: Option<&str>) -> Collator {
    let locale = match lang.filter(|tag| !tag.is_empty()) {
        Some(tag) => parse_locale_tag(tag),
        None => locale!("en-US"),
    };

    Collator::try_new(&locale.into(), CollatorOptions::new())
        .expect("collation data is bundled for every locale")
}

/// LANG carries values like `pl_PL.UTF-8`; only the five-character
/// language_REGION prefix matters.
fn parse_locale_tag(tag: &str) -> Locale {
    let tag: String = tag
        .chars()
        .take(5)
        .map(|ch| if ch == '_' { '-' } else { ch })
        .collect();

    match tag.parse() {
        Ok(locale) => locale,
        Err(_) => {
            eprintln!("Cannot parse locale {:?}, using \"en-US\" instead", tag);
            locale!("en-US")
        }
    }
}

pub fn compare_strings(a: &[char], b: &[char]) -> Ordering {
    compare_with(global_collator(), a, b)
}

pub fn compare_runes(a: char, b: char) -> Ordering {
    compare_with(global_collator(), &[a], &[b])
}

fn compare_with(collator: &Collator, a: &[char], b: &[char]) -> Ordering {
    let a: String = a.iter().collect();
    let b: String = b.iter().collect();
    collator.compare(&a, &b)
}
