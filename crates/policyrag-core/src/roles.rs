//! Heuristic tagging of responsible organizational roles.

use std::collections::BTreeSet;

/// Tags a chunk of policy text with the roles it mentions.
///
/// Implementations must be pure: no I/O, no external calls, no failure
/// modes. An empty set means nothing was detected. The pipeline only
/// depends on this trait, so the heuristic can be swapped without touching
/// the ingestion contract.
pub trait RoleTagger: Send + Sync {
    fn tag(&self, text: &str) -> BTreeSet<String>;
}

/// (canonical label, lowercase phrases matched as substrings, acronyms
/// matched as whole tokens only).
const ROLE_RULES: &[(&str, &[&str], &[&str])] = &[
    (
        "Chief Information Security Officer",
        &["chief information security officer"],
        &["ciso"],
    ),
    (
        "Data Protection Officer",
        &["data protection officer"],
        &["dpo"],
    ),
    (
        "Security Team",
        &["security team", "information security function"],
        &[],
    ),
    (
        "Incident Response Team",
        &["incident response team", "incident response"],
        &["csirt"],
    ),
    (
        "IT Operations",
        &[
            "it operations",
            "it department",
            "system administrator",
            "system administrators",
        ],
        &[],
    ),
    (
        "Compliance Officer",
        &["compliance officer", "compliance team"],
        &[],
    ),
    ("Risk Management", &["risk management", "risk owner"], &[]),
    ("Human Resources", &["human resources"], &[]),
    (
        "Legal",
        &["legal counsel", "legal department", "legal team"],
        &[],
    ),
    (
        "Management",
        &[
            "senior management",
            "executive management",
            "management board",
            "top management",
        ],
        &[],
    ),
    (
        "Data Owner",
        &["data owner", "information owner", "asset owner"],
        &[],
    ),
    ("Internal Audit", &["internal audit", "internal auditor"], &[]),
    (
        "Employees",
        &["all employees", "all staff", "all personnel"],
        &[],
    ),
];

/// Default tagger: fixed keyword/phrase table against lowercased text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRoleTagger;

impl KeywordRoleTagger {
    pub fn new() -> Self {
        Self
    }
}

impl RoleTagger for KeywordRoleTagger {
    fn tag(&self, text: &str) -> BTreeSet<String> {
        let lower = text.to_lowercase();
        // Token set built lazily; only needed when a rule carries acronyms.
        let mut tokens: Option<BTreeSet<&str>> = None;
        let mut roles = BTreeSet::new();
        for (label, phrases, acronyms) in ROLE_RULES {
            let mut hit = phrases.iter().any(|p| lower.contains(p));
            if !hit && !acronyms.is_empty() {
                let toks = tokens.get_or_insert_with(|| {
                    lower
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|t| !t.is_empty())
                        .collect()
                });
                hit = acronyms.iter().any(|a| toks.contains(a));
            }
            if hit {
                roles.insert((*label).to_string());
            }
        }
        roles
    }
}
