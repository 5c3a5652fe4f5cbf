use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Money,
    Loss,
    Expense,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Money => "Money",
            Category::Loss => "Loss",
            Category::Expense => "Expense",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fourteen transit rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    #[serde(rename = "money_1")]
    Money1,
    #[serde(rename = "money_2")]
    Money2,
    #[serde(rename = "money_3")]
    Money3,
    #[serde(rename = "money_4")]
    Money4,
    #[serde(rename = "money_5")]
    Money5,
    #[serde(rename = "money_6")]
    Money6,
    #[serde(rename = "money_7")]
    Money7,
    #[serde(rename = "money_8")]
    Money8,
    #[serde(rename = "loss_1")]
    Loss1,
    #[serde(rename = "loss_2")]
    Loss2,
    #[serde(rename = "loss_3")]
    Loss3,
    #[serde(rename = "loss_4")]
    Loss4,
    #[serde(rename = "loss_5")]
    Loss5,
    #[serde(rename = "loss_6")]
    Loss6,
}

impl RuleId {
    pub const ALL: [RuleId; 14] = [
        RuleId::Money1,
        RuleId::Money2,
        RuleId::Money3,
        RuleId::Money4,
        RuleId::Money5,
        RuleId::Money6,
        RuleId::Money7,
        RuleId::Money8,
        RuleId::Loss1,
        RuleId::Loss2,
        RuleId::Loss3,
        RuleId::Loss4,
        RuleId::Loss5,
        RuleId::Loss6,
    ];

    /// Configuration key, e.g. `money_1`.
    pub fn key(self) -> &'static str {
        match self {
            RuleId::Money1 => "money_1",
            RuleId::Money2 => "money_2",
            RuleId::Money3 => "money_3",
            RuleId::Money4 => "money_4",
            RuleId::Money5 => "money_5",
            RuleId::Money6 => "money_6",
            RuleId::Money7 => "money_7",
            RuleId::Money8 => "money_8",
            RuleId::Loss1 => "loss_1",
            RuleId::Loss2 => "loss_2",
            RuleId::Loss3 => "loss_3",
            RuleId::Loss4 => "loss_4",
            RuleId::Loss5 => "loss_5",
            RuleId::Loss6 => "loss_6",
        }
    }

    /// Label shown in event rows.
    pub fn label(self) -> &'static str {
        match self {
            RuleId::Money1 => "Rule #1",
            RuleId::Money2 => "Rule #2",
            RuleId::Money3 => "Rule #3",
            RuleId::Money4 => "Rule #4",
            RuleId::Money5 => "Rule #5",
            RuleId::Money6 => "Rule #6",
            RuleId::Money7 => "Rule #7",
            RuleId::Money8 => "Rule #8",
            RuleId::Loss1 => "Loss #1",
            RuleId::Loss2 => "Loss #2",
            RuleId::Loss3 => "Loss #3",
            RuleId::Loss4 => "Loss #4",
            RuleId::Loss5 => "Loss #5",
            RuleId::Loss6 => "Loss #6",
        }
    }

    pub fn category(self) -> Category {
        match self {
            RuleId::Money1
            | RuleId::Money2
            | RuleId::Money3
            | RuleId::Money4
            | RuleId::Money5
            | RuleId::Money6
            | RuleId::Money7
            | RuleId::Money8 => Category::Money,
            RuleId::Loss5 => Category::Expense,
            _ => Category::Loss,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        RuleId::ALL
            .iter()
            .copied()
            .find(|rule| rule.key() == wanted)
            .ok_or_else(|| format!("Unknown rule: {}", s))
    }
}

/// Enabled rules. Defaults to all fourteen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    enabled: BTreeSet<RuleId>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::all()
    }
}

impl RuleSet {
    pub fn all() -> Self {
        Self {
            enabled: RuleId::ALL.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            enabled: BTreeSet::new(),
        }
    }

    pub fn only(rules: &[RuleId]) -> Self {
        Self {
            enabled: rules.iter().copied().collect(),
        }
    }

    pub fn set(&mut self, rule: RuleId, enabled: bool) {
        if enabled {
            self.enabled.insert(rule);
        } else {
            self.enabled.remove(&rule);
        }
    }

    pub fn is_enabled(&self, rule: RuleId) -> bool {
        self.enabled.contains(&rule)
    }

    /// Enabled rules in rule order.
    pub fn iter(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.enabled.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}
