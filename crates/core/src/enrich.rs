//! Rewrite prose so glossary terms become `{key}` references.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::glossary::GlossaryIndex;

fn re_tag_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{.*?\}").unwrap())
}

fn re_tag_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^}]+)\}").unwrap())
}

pub struct TextEnricher {
    index: GlossaryIndex,
}

impl TextEnricher {
    pub fn new(index: GlossaryIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &GlossaryIndex {
        &self.index
    }

    /// Replace every whole-word glossary term with `{key}`.
    ///
    /// Text already inside braces is copied verbatim, so applying this twice
    /// gives the same result as applying it once.
    pub fn enrich(&self, text: &str) -> String {
        let Some(matcher) = self.index.matcher() else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for tag in re_tag_span().find_iter(text) {
            out.push_str(&self.replace_terms(matcher, &text[last..tag.start()]));
            out.push_str(tag.as_str());
            last = tag.end();
        }
        out.push_str(&self.replace_terms(matcher, &text[last..]));
        out
    }

    fn replace_terms<'t>(&self, matcher: &Regex, span: &'t str) -> Cow<'t, str> {
        matcher.replace_all(span, |caps: &Captures| {
            let matched = &caps[0];
            match self.index.key_for(matched) {
                Some(key) => format!("{{{key}}}"),
                None => matched.to_string(),
            }
        })
    }

    /// Keys referenced as `{key}` in `text`, in order of appearance.
    pub fn tagged_keys(text: &str) -> Vec<String> {
        re_tag_key()
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::Glossary;

    const GLOSSARY: &str = r#"
guardia:
  term: guardia
  type: Garde
guardia_di_testa:
  term: guardia di testa
  type: Garde
mandritto:
  term: Mandritto
  type: Coup
falso:
  term: falso
  type: Coup
"#;

    fn enricher() -> TextEnricher {
        let glossary = Glossary::from_yaml_str(GLOSSARY).unwrap();
        TextEnricher::new(GlossaryIndex::new(&glossary).unwrap())
    }

    #[test]
    fn test_longest_match_wins() {
        assert_eq!(
            enricher().enrich("In guardia di testa si para"),
            "In {guardia_di_testa} si para"
        );
    }

    #[test]
    fn test_replacement_uses_key_not_surface_form() {
        assert_eq!(
            enricher().enrich("Tira un MANDRITTO, poi un mandritto."),
            "Tira un {mandritto}, poi un {mandritto}."
        );
    }

    #[test]
    fn test_existing_tags_are_not_rescanned() {
        let text = "Dalla {guardia} fa un falso";
        assert_eq!(enricher().enrich(text), "Dalla {guardia} fa un {falso}");
        let text = "Vedi {nota sulla guardia} qui";
        assert_eq!(enricher().enrich(text), text);
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let enricher = enricher();
        let inputs = [
            "In guardia di testa si para con un falso.",
            "Guardia\nmandritto {falso} guardia di testa",
            "{ guardia senza chiusura e falso",
            "niente da fare qui",
            "",
        ];
        for input in inputs {
            let once = enricher.enrich(input);
            assert_eq!(enricher.enrich(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_words_containing_terms_are_untouched() {
        assert_eq!(enricher().enrich("falsamente"), "falsamente");
    }

    #[test]
    fn test_empty_glossary_returns_input() {
        let glossary = Glossary::from_yaml_str("").unwrap();
        let enricher = TextEnricher::new(GlossaryIndex::new(&glossary).unwrap());
        assert_eq!(enricher.enrich("guardia di testa"), "guardia di testa");
    }

    #[test]
    fn test_tagged_keys_in_order() {
        assert_eq!(
            TextEnricher::tagged_keys("{falso} poi {guardia} e {falso}"),
            vec!["falso", "guardia", "falso"]
        );
        assert!(TextEnricher::tagged_keys("nessun riferimento {}").is_empty());
    }
}
