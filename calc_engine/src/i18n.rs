//! # Translation & Interpolation
//!
//! Per-locale text bundles carried by every calculator configuration (`t`), the
//! [`Translator`] view handed to compute functions, and `{placeholder}`
//! interpolation.
//!
//! Missing text never blocks rendering. Lookups fall back from the requested
//! locale to its language (`es-MX` → `es`), then to the configuration's default
//! locale, then to the raw key. Each fallback past the language step is logged.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use calc_engine::i18n::interpolate;
//!
//! let mut vars = BTreeMap::new();
//! vars.insert("tipAmount".to_string(), "$13.50".to_string());
//!
//! let text = interpolate("Leave {tipAmount} ({tipPercent})", &vars);
//! assert_eq!(text, "Leave $13.50 ({tipPercent})");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text for one input field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputText {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Option value → display label, for enumerated inputs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Text for one result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultText {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything a calculator says in one locale.
///
/// Marketing copy, SEO and FAQ text ride along untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationBundle {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputText>,
    #[serde(default)]
    pub results: BTreeMap<String, ResultText>,
    /// Named templates: `summary`, table headings, ...
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
    /// Dynamic phrases chosen at compute time (`"overweight"`, `"sedentary"`)
    #[serde(default)]
    pub phrases: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Substitute `{name}` placeholders from `vars`.
///
/// Unknown placeholders and unbalanced braces are left as literal text.
pub fn interpolate(template: &str, vars: &BTreeMap<String, String>) -> String {
    interpolate_with(template, |key| vars.get(key).cloned())
}

/// Substitute `{name}` placeholders using a lookup function.
pub fn interpolate_with<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['}', '{']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match lookup(key.trim()) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Pick the bundle for `locale` from `bundles`.
///
/// Tries the exact tag, then the language subtag. Returns the key that matched.
pub fn select_bundle<'a>(
    bundles: &'a BTreeMap<String, TranslationBundle>,
    locale: &str,
) -> Option<(&'a str, &'a TranslationBundle)> {
    let exact = bundles.get_key_value(locale);
    let language = || {
        let lang = locale.split(['-', '_']).next().unwrap_or(locale);
        bundles.get_key_value(lang)
    };
    exact
        .or_else(language)
        .map(|(key, bundle)| (key.as_str(), bundle))
}

/// Locale-resolved view over a calculator's bundles (the `t` of a compute call).
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    locale: &'a str,
    primary: &'a TranslationBundle,
    fallback: &'a TranslationBundle,
    calculator: &'a str,
}

impl<'a> Translator<'a> {
    /// Build a translator. `fallback` is the configuration's default-locale bundle.
    pub fn new(
        calculator: &'a str,
        locale: &'a str,
        primary: &'a TranslationBundle,
        fallback: &'a TranslationBundle,
    ) -> Self {
        Translator {
            locale,
            primary,
            fallback,
            calculator,
        }
    }

    /// Locale this translator resolved to
    pub fn locale(&self) -> &'a str {
        self.locale
    }

    /// The primary bundle
    pub fn bundle(&self) -> &'a TranslationBundle {
        self.primary
    }

    pub fn title(&self) -> &'a str {
        if self.primary.title.is_empty() {
            &self.fallback.title
        } else {
            &self.primary.title
        }
    }

    /// Named template (`"summary"`, ...), falling back to the default locale.
    pub fn format(&self, slot: &str) -> Option<&'a str> {
        self.lookup(slot, |b| b.formats.get(slot).map(String::as_str))
    }

    /// Result label, or the result id when no bundle has one.
    pub fn result_label(&self, id: &str) -> String {
        self.lookup(id, |b| b.results.get(id).map(|r| r.label.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    /// Input label, or the input id.
    pub fn input_label(&self, id: &str) -> String {
        self.lookup(id, |b| b.inputs.get(id).map(|i| i.label.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    /// Label for one option of an enumerated input, or the option value.
    pub fn option_label(&self, input: &str, value: &str) -> String {
        self.lookup(value, |b| {
            b.inputs
                .get(input)
                .and_then(|i| i.options.get(value))
                .map(String::as_str)
        })
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
    }

    /// Translate a dynamic phrase chosen at compute time.
    ///
    /// Falls back to the default locale, then to `key` itself.
    pub fn phrase(&self, key: &str) -> String {
        self.lookup(key, |b| b.phrases.get(key).map(String::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Interpolate a named template with `vars`. Empty when the template is missing.
    pub fn render(&self, slot: &str, vars: &BTreeMap<String, String>) -> String {
        self.format(slot)
            .map(|template| interpolate(template, vars))
            .unwrap_or_default()
    }

    fn lookup<F>(&self, key: &str, get: F) -> Option<&'a str>
    where
        F: Fn(&'a TranslationBundle) -> Option<&'a str>,
    {
        if let Some(text) = get(self.primary) {
            return Some(text);
        }
        let fallback = get(self.fallback);
        if fallback.is_some() {
            tracing::warn!(
                calculator = self.calculator,
                locale = self.locale,
                key,
                "missing translation, using default locale"
            );
        } else {
            tracing::warn!(
                calculator = self.calculator,
                locale = self.locale,
                key,
                "missing translation in every locale, using raw key"
            );
        }
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_interpolate_replaces_known_placeholders() {
        let text = interpolate(
            "Pay {monthlyPayment} for {loanTerm} months",
            &vars(&[("monthlyPayment", "$472.32"), ("loanTerm", "60")]),
        );
        assert_eq!(text, "Pay $472.32 for 60 months");
    }

    #[test]
    fn test_interpolate_leaves_unknown_and_broken_braces() {
        let v = vars(&[("a", "1")]);
        assert_eq!(interpolate("{a} {b}", &v), "1 {b}");
        assert_eq!(interpolate("open { brace {a}", &v), "open { brace 1");
        assert_eq!(interpolate("dangling {a", &v), "dangling {a");
        assert_eq!(interpolate("{}", &v), "{}");
        assert_eq!(interpolate("no placeholders", &v), "no placeholders");
    }

    #[test]
    fn test_interpolate_handles_unicode() {
        let v = vars(&[("x", "ü")]);
        assert_eq!(interpolate("Größe: {x} ok", &v), "Größe: ü ok");
    }

    fn bundle(title: &str, summary: Option<&str>, phrase: Option<(&str, &str)>) -> TranslationBundle {
        let mut b = TranslationBundle {
            title: title.to_string(),
            ..Default::default()
        };
        if let Some(s) = summary {
            b.formats.insert("summary".to_string(), s.to_string());
        }
        if let Some((k, v)) = phrase {
            b.phrases.insert(k.to_string(), v.to_string());
        }
        b.results.insert(
            "bmi".to_string(),
            ResultText {
                label: format!("{title} BMI"),
                description: None,
            },
        );
        b
    }

    #[test]
    fn test_select_bundle_language_fallback() {
        let mut bundles = BTreeMap::new();
        bundles.insert("en".to_string(), bundle("English", None, None));
        bundles.insert("es".to_string(), bundle("Español", None, None));

        assert_eq!(select_bundle(&bundles, "es-MX").unwrap().0, "es");
        assert_eq!(select_bundle(&bundles, "en").unwrap().0, "en");
        assert!(select_bundle(&bundles, "fr").is_none());
    }

    #[test]
    fn test_translator_falls_back_to_default_then_key() {
        let en = bundle("English", Some("BMI {bmi}"), Some(("obese", "Obese")));
        let es = bundle("Español", None, None);
        let t = Translator::new("bmi", "es", &es, &en);

        assert_eq!(t.title(), "Español");
        assert_eq!(t.format("summary"), Some("BMI {bmi}"));
        assert_eq!(t.phrase("obese"), "Obese");
        assert_eq!(t.phrase("unknownPhrase"), "unknownPhrase");
        assert_eq!(t.result_label("bmi"), "Español BMI");
        assert_eq!(t.input_label("weight"), "weight");
        assert_eq!(t.option_label("gender", "male"), "male");
    }

    #[test]
    fn test_render_template() {
        let en = bundle("English", Some("Your BMI is {bmi}"), None);
        let t = Translator::new("bmi", "en", &en, &en);
        assert_eq!(t.render("summary", &vars(&[("bmi", "22.5")])), "Your BMI is 22.5");
        assert_eq!(t.render("missing", &vars(&[])), "");
    }

    #[test]
    fn test_bundle_keeps_extra_content() {
        let json = r#"{"title":"Tip","seo":{"keywords":["tip"]},"results":{}}"#;
        let b: TranslationBundle = serde_json::from_str(json).unwrap();
        assert!(b.extra.contains_key("seo"));
        let back = serde_json::to_string(&b).unwrap();
        assert!(back.contains("\"seo\""));
    }
}
