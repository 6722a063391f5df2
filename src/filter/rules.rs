//! Rule tables for the tech-relevance classifier.
//!
//! A [`RuleTable`] is an ordered list of [`Rule`]s. Every rule names a set of
//! terms, how they are matched, and what a match means. The table is
//! evaluated as a whole: all matching rules are collected, then resolved by
//! [`RuleTable::evaluate`] using a fixed precedence:
//!
//! 1. a matched hard exclusion vetoes the article
//! 2. a matched overridable exclusion vetoes it unless a strong inclusion
//!    also matched
//! 3. any matched inclusion includes it
//! 4. otherwise the table has no opinion
use crate::util::contains_word;
use serde::{Deserialize, Serialize};

/// How a rule's terms are compared against the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Whole-value equality. Used for category names.
    Exact,
    /// Term bounded by non-alphanumeric characters.
    Word,
    /// Plain substring.
    Substring,
}

/// What a matched rule contributes to the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleAction {
    /// Evidence for inclusion. Strong inclusions cancel overridable exclusions.
    Include {
        #[serde(default)]
        strong: bool,
    },
    /// Evidence against inclusion. Non-overridable exclusions always win.
    Exclude {
        #[serde(default)]
        overridable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub action: RuleAction,
    #[serde(default = "default_match_mode")]
    pub matching: MatchMode,
    pub terms: Vec<String>,
}

fn default_match_mode() -> MatchMode {
    MatchMode::Word
}

impl Rule {
    pub fn new(name: &str, action: RuleAction, matching: MatchMode, terms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            action,
            matching,
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// Returns the first term matching any of the inputs.
    ///
    /// Inputs must already be lower-cased.
    pub fn first_match<'a>(&'a self, inputs: &[String]) -> Option<&'a str> {
        self.terms
            .iter()
            .find(|term| {
                let term = term.as_str();
                inputs.iter().any(|input| match self.matching {
                    MatchMode::Exact => input == term,
                    MatchMode::Word => contains_word(input, term),
                    MatchMode::Substring => input.contains(term),
                })
            })
            .map(String::as_str)
    }

    fn is_strong_include(&self) -> bool {
        matches!(self.action, RuleAction::Include { strong: true })
    }
}

/// A rule that fired, with the term that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule: String,
    pub term: String,
}

/// Result of evaluating one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableVerdict {
    Include(RuleHit),
    Exclude(RuleHit),
    NoSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    pub rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Lower-cases every term so matching stays case-insensitive even for
    /// tables loaded from configuration.
    pub fn normalized(mut self) -> Self {
        for rule in &mut self.rules {
            for term in &mut rule.terms {
                *term = term.trim().to_lowercase();
            }
            rule.terms.retain(|t| !t.is_empty());
        }
        self
    }

    /// Evaluates the table against lower-cased inputs.
    pub fn evaluate(&self, inputs: &[String]) -> TableVerdict {
        let hits: Vec<(&Rule, &str)> = self
            .rules
            .iter()
            .filter_map(|rule| rule.first_match(inputs).map(|term| (rule, term)))
            .collect();

        let hit = |(rule, term): &(&Rule, &str)| RuleHit {
            rule: rule.name.clone(),
            term: term.to_string(),
        };

        if let Some(h) = hits
            .iter()
            .find(|(r, _)| matches!(r.action, RuleAction::Exclude { overridable: false }))
        {
            return TableVerdict::Exclude(hit(h));
        }

        let strong = hits.iter().any(|(r, _)| r.is_strong_include());
        if !strong {
            if let Some(h) = hits
                .iter()
                .find(|(r, _)| matches!(r.action, RuleAction::Exclude { overridable: true }))
            {
                return TableVerdict::Exclude(hit(h));
            }
        }

        // Prefer reporting the strong inclusion when there is one
        let include = hits
            .iter()
            .find(|(r, _)| r.is_strong_include())
            .or_else(|| {
                hits.iter()
                    .find(|(r, _)| matches!(r.action, RuleAction::Include { .. }))
            });

        match include {
            Some(h) => TableVerdict::Include(hit(h)),
            None => TableVerdict::NoSignal,
        }
    }

    /// Default table for feed-supplied categories.
    pub fn default_categories() -> Self {
        use MatchMode::{Exact, Substring};
        Self::new(vec![
            Rule::new(
                "non-tech-category",
                RuleAction::Exclude { overridable: false },
                Substring,
                &[
                    "entertainment",
                    "film",
                    "tv shows",
                    "streaming",
                    "games review",
                    "sports",
                    "health",
                    "medical",
                    "climate",
                    "environment",
                    "culture",
                    "food",
                    "travel",
                    "lifestyle",
                    "speech",
                ],
            ),
            Rule::new(
                "politics-category",
                RuleAction::Exclude { overridable: true },
                Exact,
                &["politics", "policy"],
            ),
            Rule::new(
                "tech-company-category",
                RuleAction::Include { strong: true },
                Exact,
                &[
                    "apple",
                    "google",
                    "microsoft",
                    "meta",
                    "intel",
                    "nvidia",
                    "amd",
                    "samsung",
                    "openai",
                    "tesla",
                    "amazon",
                ],
            ),
            Rule::new(
                "tech-category",
                RuleAction::Include { strong: false },
                Exact,
                &[
                    "tech",
                    "ai",
                    "hardware",
                    "software",
                    "gadgets",
                    "cybersecurity",
                    "gaming",
                ],
            ),
        ])
    }

    /// Default table for the title + summary text.
    pub fn default_keywords() -> Self {
        use MatchMode::Word;
        Self::new(vec![
            Rule::new(
                "entertainment-terms",
                RuleAction::Exclude { overridable: true },
                Word,
                &[
                    "movie",
                    "film",
                    "tv show",
                    "celebrity",
                    "entertainment industry",
                    "box office",
                    "sports",
                    "football",
                    "basketball",
                    "olympics",
                    "game review",
                ],
            ),
            Rule::new(
                "politics-terms",
                RuleAction::Exclude { overridable: true },
                Word,
                &[
                    "politics",
                    "government",
                    "election",
                    "senate",
                    "congress",
                    "parliament",
                    "campaign",
                ],
            ),
            Rule::new(
                "health-climate-terms",
                RuleAction::Exclude { overridable: true },
                Word,
                &[
                    "climate change",
                    "global warming",
                    "health crisis",
                    "pandemic",
                ],
            ),
            Rule::new(
                "tech-companies",
                RuleAction::Include { strong: true },
                Word,
                &[
                    "apple",
                    "google",
                    "microsoft",
                    "meta",
                    "amazon",
                    "tesla",
                    "nvidia",
                    "intel",
                    "amd",
                    "openai",
                    "anthropic",
                    "samsung",
                    "qualcomm",
                    "artificial intelligence",
                    "machine learning",
                ],
            ),
            Rule::new(
                "tech-concepts",
                RuleAction::Include { strong: false },
                Word,
                &[
                    "ai",
                    "blockchain",
                    "cryptocurrency",
                    "quantum computing",
                    "robotics",
                    "automation",
                    "cybersecurity",
                    "vr",
                    "ar",
                    "virtual reality",
                    "augmented reality",
                    "cloud",
                    "cloud computing",
                    "api",
                    "programming",
                    "software development",
                    "operating system",
                    "app store",
                ],
            ),
            Rule::new(
                "devices",
                RuleAction::Include { strong: false },
                Word,
                &[
                    "smartphone",
                    "iphone",
                    "android",
                    "laptop",
                    "tablet",
                    "processor",
                    "chip",
                    "semiconductor",
                    "cpu",
                    "gpu",
                    "smartwatch",
                    "drone",
                    "console",
                ],
            ),
            Rule::new(
                "platforms",
                RuleAction::Include { strong: false },
                Word,
                &["steam", "playstation", "xbox", "nintendo switch"],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_lowercase()).collect()
    }

    #[test]
    fn test_hard_exclusion_beats_strong_inclusion() {
        let table = RuleTable::default_categories();
        let verdict = table.evaluate(&inputs(&["Apple", "Entertainment"]));
        assert!(matches!(verdict, TableVerdict::Exclude(ref h) if h.rule == "non-tech-category"));
    }

    #[test]
    fn test_soft_exclusion_beats_weak_inclusion() {
        let table = RuleTable::default_categories();
        let verdict = table.evaluate(&inputs(&["Tech", "Politics"]));
        assert!(matches!(verdict, TableVerdict::Exclude(ref h) if h.term == "politics"));
    }

    #[test]
    fn test_strong_inclusion_overrides_soft_exclusion() {
        let table = RuleTable::default_categories();
        let verdict = table.evaluate(&inputs(&["Tech", "Apple", "Policy"]));
        assert!(matches!(verdict, TableVerdict::Include(ref h) if h.term == "apple"));
    }

    #[test]
    fn test_substring_category_exclusion() {
        let table = RuleTable::default_categories();
        // "Health" appears inside a compound category name
        let verdict = table.evaluate(&inputs(&["Tech", "Health & Fitness"]));
        assert!(matches!(verdict, TableVerdict::Exclude(_)));
    }

    #[test]
    fn test_no_signal_for_unrelated_categories() {
        let table = RuleTable::default_categories();
        assert_eq!(
            table.evaluate(&inputs(&["Featured", "Report"])),
            TableVerdict::NoSignal
        );
    }

    #[test]
    fn test_keyword_word_matching() {
        let table = RuleTable::default_keywords();
        assert!(matches!(
            table.evaluate(&inputs(&["Apple unveils new chip"])),
            TableVerdict::Include(ref h) if h.term == "apple"
        ));
        // "ai" inside "said" does not count
        assert_eq!(
            table.evaluate(&inputs(&["She said hello"])),
            TableVerdict::NoSignal
        );
    }

    #[test]
    fn test_keyword_strong_company_overrides_politics() {
        let table = RuleTable::default_keywords();
        let verdict = table.evaluate(&inputs(&["Government fines Google over search deals"]));
        assert!(matches!(verdict, TableVerdict::Include(ref h) if h.term == "google"));
    }

    #[test]
    fn test_keyword_politics_vetoes_weak_inclusion() {
        let table = RuleTable::default_keywords();
        let verdict = table.evaluate(&inputs(&["Senate hearing on smartphone addiction"]));
        assert!(matches!(verdict, TableVerdict::Exclude(ref h) if h.term == "senate"));
    }

    #[test]
    fn test_normalized_lowercases_config_terms() {
        let table = RuleTable::new(vec![Rule {
            name: "custom".into(),
            action: RuleAction::Include { strong: false },
            matching: MatchMode::Exact,
            terms: vec!["  Robotics ".into(), "".into()],
        }])
        .normalized();
        assert_eq!(table.rules[0].terms, vec!["robotics".to_string()]);
        assert!(matches!(
            table.evaluate(&inputs(&["ROBOTICS"])),
            TableVerdict::Include(_)
        ));
    }

    #[test]
    fn test_rule_table_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            rules: RuleTable,
        }

        let toml_str = r#"
[[rules]]
name = "ban"
terms = ["crypto"]
action = { kind = "exclude" }

[[rules]]
name = "want"
matching = "exact"
terms = ["rust"]
action = { kind = "include", strong = true }
"#;
        let wrapper: Wrapper = toml::from_str(toml_str).unwrap();
        let rules = &wrapper.rules.rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].matching, MatchMode::Word);
        assert_eq!(rules[0].action, RuleAction::Exclude { overridable: false });
        assert_eq!(rules[1].action, RuleAction::Include { strong: true });
    }
}
